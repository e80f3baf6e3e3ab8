//! Transactions API endpoints.

use api_types::category::CategoryView;
use api_types::transaction::{
    TransactionKind as ApiKind, TransactionListQuery, TransactionListResponse, TransactionNew,
    TransactionUpdate, TransactionView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{AuthUser, EngineError, TransactionDraft, TransactionListFilter};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

const DEFAULT_PAGE_SIZE: u64 = 10;
const MAX_PAGE_SIZE: u64 = 100;

fn map_kind(kind: engine::TransactionKind) -> ApiKind {
    match kind {
        engine::TransactionKind::Income => ApiKind::Income,
        engine::TransactionKind::Expense => ApiKind::Expense,
    }
}

fn map_transaction(tx: engine::Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        category: CategoryView {
            id: tx.category.id,
            name: tx.category.name,
        },
        amount: tx.amount.to_string(),
        date: tx.date,
        description: tx.description,
        transaction_type: map_kind(tx.kind),
    }
}

fn draft_from_new(payload: TransactionNew) -> TransactionDraft {
    TransactionDraft {
        category: payload.category.map(|category| category.name),
        amount: payload.amount,
        date: payload.date,
        description: payload.description,
        transaction_type: payload.transaction_type,
    }
}

fn draft_from_update(payload: TransactionUpdate) -> TransactionDraft {
    TransactionDraft {
        category: payload.category.map(|category| category.name),
        amount: payload.amount,
        date: payload.date,
        description: payload.description,
        transaction_type: payload.transaction_type,
    }
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let invalid_page = || ServerError::Engine(EngineError::KeyNotFound("page".to_string()));

    let page = query.page.unwrap_or(1);
    if page == 0 {
        return Err(invalid_page());
    }
    let page_size = match query.page_size {
        Some(0) | None => DEFAULT_PAGE_SIZE,
        Some(size) => size.min(MAX_PAGE_SIZE),
    };
    let offset = (page - 1).checked_mul(page_size).ok_or_else(invalid_page)?;

    let filter = TransactionListFilter {
        category: query.category,
        date: query.date,
        amount: query.amount,
    };
    let (transactions, count) = state
        .engine
        .list_transactions(&user.username, &filter, offset, page_size)
        .await?;

    // Past-the-end pages are a 404; an empty first page is fine.
    if transactions.is_empty() && page > 1 {
        return Err(invalid_page());
    }

    let next = (page * page_size < count).then_some(page + 1);
    let previous = (page > 1).then_some(page - 1);

    Ok(Json(TransactionListResponse {
        count,
        next,
        previous,
        results: transactions.into_iter().map(map_transaction).collect(),
    }))
}

pub async fn create(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let transaction = state
        .engine
        .create_transaction(&user.username, &draft_from_new(payload))
        .await?;
    Ok((StatusCode::CREATED, Json(map_transaction(transaction))))
}

pub async fn detail(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let transaction = state
        .engine
        .transaction(&user.username, transaction_id)
        .await?;
    Ok(Json(map_transaction(transaction)))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<TransactionView>, ServerError> {
    let transaction = state
        .engine
        .update_transaction(&user.username, transaction_id, &draft_from_update(payload))
        .await?;
    Ok(Json(map_transaction(transaction)))
}

pub async fn remove(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_transaction(&user.username, transaction_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
