//! Summary API endpoint.

use api_types::summary::SummaryResponse;
use axum::{Extension, Json, extract::State};
use chrono::Utc;
use engine::AuthUser;

use crate::{ServerError, server::ServerState};

/// Handle requests for the caller's aggregate summary.
pub async fn get_summary(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
) -> Result<Json<SummaryResponse>, ServerError> {
    // The month is derived from the server clock, never from client input.
    let current_month = Utc::now().format("%Y-%m").to_string();
    let summary = state.engine.summary(&user.username, &current_month).await?;

    Ok(Json(SummaryResponse {
        total_income: summary.total_income.to_string(),
        total_expenses: summary.total_expenses.to_string(),
        balance: summary.balance.to_string(),
        budget: summary.budget.to_string(),
    }))
}
