use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{run, run_with_listener, spawn_with_listener};

mod account;
mod budgets;
mod categories;
mod server;
mod summary;
mod transactions;

pub mod types {
    pub mod account {
        pub use api_types::account::{Credentials, TokenResponse};
    }

    pub mod category {
        pub use api_types::category::{CategoryNew, CategoryUpdate, CategoryView};
    }

    pub mod transaction {
        pub use api_types::transaction::{
            CategoryRef, TransactionKind, TransactionListQuery, TransactionListResponse,
            TransactionNew, TransactionUpdate, TransactionView,
        };
    }

    pub mod budget {
        pub use api_types::budget::{BudgetListQuery, BudgetNew, BudgetUpdate, BudgetView};
    }

    pub mod summary {
        pub use api_types::summary::SummaryResponse;
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Validation { .. } => StatusCode::BAD_REQUEST,
        EngineError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Conflict(_) => StatusCode::CONFLICT,
        EngineError::PasswordHash(_) | EngineError::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::PasswordHash(hash_err) => {
            tracing::error!("credential hashing error: {hash_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        match self {
            // Field-keyed validation body, e.g. {"password": ["..."]}.
            ServerError::Engine(EngineError::Validation { field, message }) => {
                let mut errors = serde_json::Map::new();
                errors.insert(field.to_string(), serde_json::json!([message]));
                (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::Value::Object(errors)),
                )
                    .into_response()
            }
            ServerError::Engine(err) => {
                let status = status_for_engine_error(&err);
                let error = message_for_engine_error(err);
                (status, Json(Error { error })).into_response()
            }
            ServerError::Generic(err) => {
                (StatusCode::BAD_REQUEST, Json(Error { error: err })).into_response()
            }
        }
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
