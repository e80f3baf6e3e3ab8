//! Categories API endpoints.

use api_types::category::{CategoryNew, CategoryUpdate, CategoryView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::AuthUser;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn map_category(category: engine::Category) -> CategoryView {
    CategoryView {
        id: category.id,
        name: category.name,
    }
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<CategoryView>>, ServerError> {
    let categories = state
        .engine
        .list_categories(&user.username)
        .await?
        .into_iter()
        .map(map_category)
        .collect();
    Ok(Json(categories))
}

pub async fn create(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Json(payload): Json<CategoryNew>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let category = state
        .engine
        .create_category(&user.username, payload.name.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(map_category(category))))
}

pub async fn detail(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
) -> Result<Json<CategoryView>, ServerError> {
    let category = state.engine.category(&user.username, category_id).await?;
    Ok(Json(map_category(category)))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<CategoryUpdate>,
) -> Result<Json<CategoryView>, ServerError> {
    let category = state
        .engine
        .update_category(&user.username, category_id, payload.name.as_deref())
        .await?;
    Ok(Json(map_category(category)))
}

pub async fn remove(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_category(&user.username, category_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
