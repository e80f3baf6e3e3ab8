use chrono::Utc;
use sea_orm::{
    ActiveValue, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Transaction, TransactionKind, categories, transactions,
};

use super::{Engine, parse_amount, parse_date, require_field, with_tx};

/// Input for creating or partially updating a transaction.
///
/// Everything is optional: on create, missing required fields become field
/// errors; on update, a missing field keeps its stored value. For
/// `category` the outer option says whether the field was provided at all,
/// the inner one is the (possibly absent) name inside it.
#[derive(Clone, Debug, Default)]
pub struct TransactionDraft {
    pub category: Option<Option<String>>,
    pub amount: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub transaction_type: Option<String>,
}

/// Exact-match filters for listing transactions.
///
/// Filters are ANDed; absent fields impose no constraint. `category` matches
/// the category *name*, `date`/`amount` the stored values.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub category: Option<String>,
    pub date: Option<String>,
    pub amount: Option<String>,
}

fn parse_positive_amount(value: &str) -> ResultEngine<crate::MoneyCents> {
    let amount = parse_amount(value)?;
    if !amount.is_positive() {
        return Err(EngineError::validation(
            "amount",
            "Ensure this value is greater than 0.",
        ));
    }
    Ok(amount)
}

impl Engine {
    /// Lists the caller's transactions in creation order, filtered and
    /// windowed. Returns the page plus the total row count before windowing.
    pub async fn list_transactions(
        &self,
        user_id: &str,
        filter: &TransactionListFilter,
        offset: u64,
        limit: u64,
    ) -> ResultEngine<(Vec<Transaction>, u64)> {
        let date = filter.date.as_deref().map(parse_date).transpose()?;
        let amount = filter.amount.as_deref().map(parse_amount).transpose()?;

        let mut query = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id.to_string()));

        if let Some(name) = &filter.category {
            // Matching by name, not id: duplicate names (possible via the
            // direct create path) all match, like a join on the name column.
            let ids: Vec<String> = categories::Entity::find()
                .filter(categories::Column::UserId.eq(user_id.to_string()))
                .filter(categories::Column::Name.eq(name.clone()))
                .all(&self.database)
                .await?
                .into_iter()
                .map(|category| category.id)
                .collect();
            query = query.filter(transactions::Column::CategoryId.is_in(ids));
        }
        if let Some(date) = date {
            query = query.filter(transactions::Column::Date.eq(date));
        }
        if let Some(amount) = amount {
            query = query.filter(transactions::Column::AmountMinor.eq(amount.cents()));
        }

        let total = query.clone().count(&self.database).await?;

        let rows = query
            .find_also_related(categories::Entity)
            .order_by_asc(transactions::Column::CreatedAt)
            .order_by_asc(transactions::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.database)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for (model, category) in rows {
            let category = category
                .ok_or_else(|| EngineError::KeyNotFound("category".to_string()))?;
            out.push(Transaction::try_from((model, category))?);
        }
        Ok((out, total))
    }

    /// Creates a transaction, resolving its category by lookup-or-create
    /// within the same transaction as the insert.
    pub async fn create_transaction(
        &self,
        user_id: &str,
        draft: &TransactionDraft,
    ) -> ResultEngine<Transaction> {
        let amount = parse_positive_amount(require_field(draft.amount.as_deref(), "amount")?)?;
        let date = parse_date(require_field(draft.date.as_deref(), "date")?)?;
        let kind = TransactionKind::try_from(require_field(
            draft.transaction_type.as_deref(),
            "transaction_type",
        )?)?;
        let description = draft.description.clone().unwrap_or_default();
        let category_name = draft.category.clone().flatten();

        with_tx!(self, |db_tx| {
            let category = self
                .resolve_category(&db_tx, user_id, category_name.as_deref())
                .await?;

            let id = Uuid::new_v4();
            let active = transactions::ActiveModel {
                id: ActiveValue::Set(id.to_string()),
                user_id: ActiveValue::Set(user_id.to_string()),
                category_id: ActiveValue::Set(category.id.clone()),
                kind: ActiveValue::Set(kind.as_str().to_string()),
                amount_minor: ActiveValue::Set(amount.cents()),
                date: ActiveValue::Set(date),
                description: ActiveValue::Set(description.clone()),
                created_at: ActiveValue::Set(Utc::now()),
            };
            let model = active.insert(&db_tx).await?;
            Transaction::try_from((model, category))
        })
    }

    /// Owner-scoped fetch, with the category joined in.
    pub async fn transaction(
        &self,
        user_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        let row = transactions::Entity::find_by_id(transaction_id.to_string())
            .filter(transactions::Column::UserId.eq(user_id.to_string()))
            .find_also_related(categories::Entity)
            .one(&self.database)
            .await?;
        let Some((model, Some(category))) = row else {
            return Err(EngineError::KeyNotFound("transaction".to_string()));
        };
        Transaction::try_from((model, category))
    }

    /// Partial update: provided fields overwrite, absent fields are kept.
    /// A provided category is re-resolved by name via lookup-or-create.
    pub async fn update_transaction(
        &self,
        user_id: &str,
        transaction_id: Uuid,
        draft: &TransactionDraft,
    ) -> ResultEngine<Transaction> {
        let amount = draft
            .amount
            .as_deref()
            .map(parse_positive_amount)
            .transpose()?;
        let date = draft.date.as_deref().map(parse_date).transpose()?;
        let kind = draft
            .transaction_type
            .as_deref()
            .map(TransactionKind::try_from)
            .transpose()?;

        with_tx!(self, |db_tx| {
            let model = transactions::Entity::find_by_id(transaction_id.to_string())
                .filter(transactions::Column::UserId.eq(user_id.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("transaction".to_string()))?;

            let changed = draft.category.is_some()
                || amount.is_some()
                || date.is_some()
                || kind.is_some()
                || draft.description.is_some();
            if !changed {
                let category = categories::Entity::find_by_id(model.category_id.clone())
                    .one(&db_tx)
                    .await?
                    .ok_or_else(|| EngineError::KeyNotFound("category".to_string()))?;
                return Transaction::try_from((model, category));
            }

            let mut active: transactions::ActiveModel = model.into();
            let resolved = match draft.category.clone() {
                Some(name) => {
                    let category = self
                        .resolve_category(&db_tx, user_id, name.as_deref())
                        .await?;
                    active.category_id = ActiveValue::Set(category.id.clone());
                    Some(category)
                }
                None => None,
            };
            if let Some(amount) = amount {
                active.amount_minor = ActiveValue::Set(amount.cents());
            }
            if let Some(date) = date {
                active.date = ActiveValue::Set(date);
            }
            if let Some(kind) = kind {
                active.kind = ActiveValue::Set(kind.as_str().to_string());
            }
            if let Some(description) = draft.description.clone() {
                active.description = ActiveValue::Set(description);
            }

            let model = active.update(&db_tx).await?;
            let category = match resolved {
                Some(category) => category,
                None => categories::Entity::find_by_id(model.category_id.clone())
                    .one(&db_tx)
                    .await?
                    .ok_or_else(|| EngineError::KeyNotFound("category".to_string()))?,
            };
            Transaction::try_from((model, category))
        })
    }

    /// Owner-scoped delete.
    pub async fn delete_transaction(
        &self,
        user_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<()> {
        let model = transactions::Entity::find_by_id(transaction_id.to_string())
            .filter(transactions::Column::UserId.eq(user_id.to_string()))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transaction".to_string()))?;
        model.delete(&self.database).await?;
        Ok(())
    }
}
