//! Budgets API endpoints.

use api_types::budget::{BudgetListQuery, BudgetNew, BudgetUpdate, BudgetView};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::AuthUser;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn map_budget(budget: engine::Budget) -> BudgetView {
    BudgetView {
        id: budget.id,
        amount: budget.amount.to_string(),
        month: budget.month,
    }
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Query(query): Query<BudgetListQuery>,
) -> Result<Json<Vec<BudgetView>>, ServerError> {
    let budgets = state
        .engine
        .list_budgets(&user.username, query.month.as_deref())
        .await?
        .into_iter()
        .map(map_budget)
        .collect();
    Ok(Json(budgets))
}

/// Create-or-overwrite for the caller's month. The status is CREATED in both
/// branches, matching what clients of the original API expect.
pub async fn create(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Json(payload): Json<BudgetNew>,
) -> Result<(StatusCode, Json<BudgetView>), ServerError> {
    let budget = state
        .engine
        .upsert_budget(
            &user.username,
            payload.amount.as_deref(),
            payload.month.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(map_budget(budget))))
}

pub async fn detail(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(budget_id): Path<Uuid>,
) -> Result<Json<BudgetView>, ServerError> {
    let budget = state.engine.budget(&user.username, budget_id).await?;
    Ok(Json(map_budget(budget)))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(budget_id): Path<Uuid>,
    Json(payload): Json<BudgetUpdate>,
) -> Result<Json<BudgetView>, ServerError> {
    let budget = state
        .engine
        .update_budget(
            &user.username,
            budget_id,
            payload.amount.as_deref(),
            payload.month.as_deref(),
        )
        .await?;
    Ok(Json(map_budget(budget)))
}

pub async fn remove(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(budget_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_budget(&user.username, budget_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
