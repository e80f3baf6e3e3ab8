use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use std::sync::Arc;

use crate::{ServerError, account, budgets, categories, summary, transactions};
use engine::{Engine, EngineError};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Bearer-token middleware.
///
/// Resolves `Authorization: Bearer <token>` to the owning user and attaches
/// it as a request extension. A missing header and an unknown token produce
/// the same 401.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Bearer>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(TypedHeader(bearer)) = auth_header else {
        return Err(EngineError::InvalidCredentials.into());
    };

    let user = state
        .engine
        .user_by_token(bearer.token())
        .await?
        .ok_or(EngineError::InvalidCredentials)?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route(
            "/categories/",
            get(categories::list).post(categories::create),
        )
        .route(
            "/categories/{id}/",
            get(categories::detail)
                .put(categories::update)
                .patch(categories::update)
                .delete(categories::remove),
        )
        .route(
            "/transactions/",
            get(transactions::list).post(transactions::create),
        )
        .route(
            "/transactions/{id}/",
            get(transactions::detail)
                .put(transactions::update)
                .patch(transactions::update)
                .delete(transactions::remove),
        )
        .route("/budgets/", get(budgets::list).post(budgets::create))
        .route(
            "/budgets/{id}/",
            get(budgets::detail)
                .put(budgets::update)
                .patch(budgets::update)
                .delete(budgets::remove),
        )
        .route("/summary/", get(summary::get_summary))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .route("/register/", post(account::register))
        .route("/login/", post(account::login))
        .with_state(state)
}

pub async fn run(engine: Engine) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode, header};
    use http_body_util::BodyExt;
    use migration::MigratorTrait;
    use sea_orm::Database;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn test_router() -> Router {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let engine = Engine::builder().database(db).build().await.unwrap();
        router(ServerState {
            engine: Arc::new(engine),
        })
    }

    async fn send(
        router: &Router,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = HttpRequest::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn register(router: &Router, username: &str) -> String {
        let (status, body) = send(
            router,
            "POST",
            "/register/",
            None,
            Some(json!({"username": username, "password": "correct-horse"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["token"].as_str().unwrap().to_string()
    }

    async fn create_transaction(
        router: &Router,
        token: &str,
        category: &str,
        amount: &str,
        date: &str,
        kind: &str,
    ) -> Value {
        let (status, body) = send(
            router,
            "POST",
            "/transactions/",
            Some(token),
            Some(json!({
                "category": {"name": category},
                "amount": amount,
                "date": date,
                "description": "",
                "transaction_type": kind,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    #[tokio::test]
    async fn register_issues_token_and_login_returns_the_same_one() {
        let router = test_router().await;
        let token = register(&router, "alice").await;

        let (status, body) = send(
            &router,
            "POST",
            "/login/",
            None,
            Some(json!({"username": "alice", "password": "correct-horse"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token"].as_str().unwrap(), token);
    }

    #[tokio::test]
    async fn duplicate_username_is_a_field_error() {
        let router = test_router().await;
        register(&router, "alice").await;

        let (status, body) = send(
            &router,
            "POST",
            "/register/",
            None,
            Some(json!({"username": "alice", "password": "another-pass"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["username"][0].as_str().unwrap(),
            "A user with this username already exists."
        );
    }

    #[tokio::test]
    async fn short_password_is_a_field_error() {
        let router = test_router().await;
        let (status, body) = send(
            &router,
            "POST",
            "/register/",
            None,
            Some(json!({"username": "bob", "password": "short"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["password"][0].as_str().unwrap(),
            "Password must be at least 8 characters long."
        );
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_fail_alike() {
        let router = test_router().await;
        register(&router, "alice").await;

        let (status, body) = send(
            &router,
            "POST",
            "/login/",
            None,
            Some(json!({"username": "alice", "password": "wrong-horse!"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"].as_str().unwrap(), "Invalid credentials");

        let (status, other) = send(
            &router,
            "POST",
            "/login/",
            None,
            Some(json!({"username": "nobody", "password": "wrong-horse!"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(other, body);
    }

    #[tokio::test]
    async fn missing_or_bogus_token_is_401() {
        let router = test_router().await;

        let (status, _) = send(&router, "GET", "/categories/", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&router, "GET", "/categories/", Some("bogus"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn category_crud_roundtrip() {
        let router = test_router().await;
        let token = register(&router, "alice").await;

        let (status, created) = send(
            &router,
            "POST",
            "/categories/",
            Some(&token),
            Some(json!({"name": "Food"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["name"], "Food");
        let id = created["id"].as_str().unwrap().to_string();

        let (status, listed) = send(&router, "GET", "/categories/", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let (status, renamed) = send(
            &router,
            "PATCH",
            &format!("/categories/{id}/"),
            Some(&token),
            Some(json!({"name": "Groceries"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(renamed["name"], "Groceries");

        let (status, _) = send(
            &router,
            "DELETE",
            &format!("/categories/{id}/"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, listed) = send(&router, "GET", "/categories/", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(listed.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_category_name_is_a_field_error() {
        let router = test_router().await;
        let token = register(&router, "alice").await;

        let (status, body) = send(
            &router,
            "POST",
            "/categories/",
            Some(&token),
            Some(json!({"name": "  "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["name"][0].as_str().unwrap(), "This field may not be blank.");
    }

    #[tokio::test]
    async fn foreign_ids_look_like_missing_records() {
        let router = test_router().await;
        let alice = register(&router, "alice").await;
        let mallory = register(&router, "mallory").await;

        let (_, category) = send(
            &router,
            "POST",
            "/categories/",
            Some(&alice),
            Some(json!({"name": "Food"})),
        )
        .await;
        let category_id = category["id"].as_str().unwrap().to_string();

        let transaction =
            create_transaction(&router, &alice, "Food", "10.00", "2026-08-01", "expense").await;
        let transaction_id = transaction["id"].as_str().unwrap().to_string();

        let (_, budget) = send(
            &router,
            "POST",
            "/budgets/",
            Some(&alice),
            Some(json!({"amount": "500.00", "month": "2026-08"})),
        )
        .await;
        let budget_id = budget["id"].as_str().unwrap().to_string();

        for (path, body) in [
            (format!("/categories/{category_id}/"), json!({"name": "X"})),
            (
                format!("/transactions/{transaction_id}/"),
                json!({"amount": "1.00"}),
            ),
            (format!("/budgets/{budget_id}/"), json!({"amount": "1.00"})),
        ] {
            let (status, _) = send(&router, "GET", &path, Some(&mallory), None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "GET {path}");

            let (status, _) = send(&router, "PATCH", &path, Some(&mallory), Some(body)).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "PATCH {path}");

            let (status, _) = send(&router, "DELETE", &path, Some(&mallory), None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "DELETE {path}");
        }

        // Nothing of alice's was touched.
        let (_, listed) = send(&router, "GET", "/categories/", Some(&alice), None).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn nested_category_is_created_once_and_reused() {
        let router = test_router().await;
        let token = register(&router, "alice").await;

        create_transaction(&router, &token, "Food", "10.00", "2026-08-01", "expense").await;
        create_transaction(&router, &token, "Food", "20.00", "2026-08-02", "expense").await;

        let (_, listed) = send(&router, "GET", "/categories/", Some(&token), None).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["name"], "Food");
    }

    #[tokio::test]
    async fn transaction_list_filters_combine() {
        let router = test_router().await;
        let token = register(&router, "alice").await;

        create_transaction(&router, &token, "Food", "10.00", "2026-08-01", "expense").await;
        create_transaction(&router, &token, "Food", "20.00", "2026-08-02", "expense").await;
        create_transaction(&router, &token, "Rent", "20.00", "2026-08-02", "expense").await;

        let (status, body) = send(
            &router,
            "GET",
            "/transactions/?date=2026-08-02",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);

        let (status, body) = send(
            &router,
            "GET",
            "/transactions/?category=Food&date=2026-08-02&amount=20.00",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["results"][0]["category"]["name"], "Food");
        assert_eq!(body["results"][0]["amount"], "20.00");
    }

    #[tokio::test]
    async fn transaction_list_paginates() {
        let router = test_router().await;
        let token = register(&router, "alice").await;

        for day in 1..=12 {
            create_transaction(
                &router,
                &token,
                "Food",
                "1.00",
                &format!("2026-08-{day:02}"),
                "expense",
            )
            .await;
        }

        let (status, body) = send(&router, "GET", "/transactions/", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 12);
        assert_eq!(body["results"].as_array().unwrap().len(), 10);
        assert_eq!(body["next"], 2);
        assert_eq!(body["previous"], Value::Null);

        let (status, body) =
            send(&router, "GET", "/transactions/?page=2", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"].as_array().unwrap().len(), 2);
        assert_eq!(body["next"], Value::Null);
        assert_eq!(body["previous"], 1);

        let (status, _) = send(&router, "GET", "/transactions/?page=3", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &router,
            "GET",
            "/transactions/?page_size=5",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn transaction_partial_update_keeps_absent_fields() {
        let router = test_router().await;
        let token = register(&router, "alice").await;

        let created =
            create_transaction(&router, &token, "Food", "10.00", "2026-08-01", "expense").await;
        let id = created["id"].as_str().unwrap().to_string();

        let (status, updated) = send(
            &router,
            "PATCH",
            &format!("/transactions/{id}/"),
            Some(&token),
            Some(json!({"amount": "15.00"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["amount"], "15.00");
        assert_eq!(updated["date"], "2026-08-01");
        assert_eq!(updated["category"]["name"], "Food");
        assert_eq!(updated["transaction_type"], "expense");

        // Re-pointing the category reuses the lookup-or-create path.
        let (status, updated) = send(
            &router,
            "PATCH",
            &format!("/transactions/{id}/"),
            Some(&token),
            Some(json!({"category": {"name": "Dining"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["category"]["name"], "Dining");

        let (_, categories) = send(&router, "GET", "/categories/", Some(&token), None).await;
        assert_eq!(categories.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn invalid_transaction_type_is_a_field_error() {
        let router = test_router().await;
        let token = register(&router, "alice").await;

        let (status, body) = send(
            &router,
            "POST",
            "/transactions/",
            Some(&token),
            Some(json!({
                "category": {"name": "Food"},
                "amount": "10.00",
                "date": "2026-08-01",
                "transaction_type": "transfer",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["transaction_type"][0].as_str().unwrap(),
            "\"transfer\" is not a valid choice."
        );
    }

    #[tokio::test]
    async fn budget_upsert_keeps_the_row_and_still_returns_201() {
        let router = test_router().await;
        let token = register(&router, "alice").await;

        let (status, first) = send(
            &router,
            "POST",
            "/budgets/",
            Some(&token),
            Some(json!({"amount": "500.00", "month": "2026-08"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, second) = send(
            &router,
            "POST",
            "/budgets/",
            Some(&token),
            Some(json!({"amount": "750.00", "month": "2026-08"})),
        )
        .await;
        // Creation status is kept on overwrite for client compatibility.
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(second["id"], first["id"]);
        assert_eq!(second["amount"], "750.00");

        let (_, listed) = send(&router, "GET", "/budgets/?month=2026-08", Some(&token), None).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["amount"], "750.00");
    }

    #[tokio::test]
    async fn budget_month_is_validated() {
        let router = test_router().await;
        let token = register(&router, "alice").await;

        let (status, body) = send(
            &router,
            "POST",
            "/budgets/",
            Some(&token),
            Some(json!({"amount": "500.00", "month": "august"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["month"][0].as_str().unwrap(),
            "Month must use the YYYY-MM format."
        );
    }

    #[tokio::test]
    async fn summary_reports_totals_balance_and_current_month_budget() {
        let router = test_router().await;
        let token = register(&router, "alice").await;

        let (status, body) = send(&router, "GET", "/summary/", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_income"], "0.00");
        assert_eq!(body["total_expenses"], "0.00");
        assert_eq!(body["balance"], "0.00");
        assert_eq!(body["budget"], "0.00");

        create_transaction(&router, &token, "Salary", "100.00", "2026-08-01", "income").await;
        create_transaction(&router, &token, "Food", "40.00", "2026-08-02", "expense").await;

        let current_month = chrono::Utc::now().format("%Y-%m").to_string();
        send(
            &router,
            "POST",
            "/budgets/",
            Some(&token),
            Some(json!({"amount": "300.00", "month": current_month})),
        )
        .await;

        let (status, body) = send(&router, "GET", "/summary/", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_income"], "100.00");
        assert_eq!(body["total_expenses"], "40.00");
        assert_eq!(body["balance"], "60.00");
        assert_eq!(body["budget"], "300.00");
    }

    #[tokio::test]
    async fn deleting_a_category_in_use_is_a_conflict() {
        let router = test_router().await;
        let token = register(&router, "alice").await;

        create_transaction(&router, &token, "Food", "10.00", "2026-08-01", "expense").await;
        let (_, categories) = send(&router, "GET", "/categories/", Some(&token), None).await;
        let id = categories[0]["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &router,
            "DELETE",
            &format!("/categories/{id}/"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }
}
