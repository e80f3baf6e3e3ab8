use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{Budget, EngineError, ResultEngine, budgets};

use super::{Engine, parse_amount, require_field, validate_month, with_tx};

fn parse_budget_amount(value: &str) -> ResultEngine<crate::MoneyCents> {
    let amount = parse_amount(value)?;
    if amount.is_negative() {
        return Err(EngineError::validation(
            "amount",
            "Ensure this value is greater than or equal to 0.",
        ));
    }
    Ok(amount)
}

impl Engine {
    /// Lists the caller's budgets in creation order, optionally narrowed to
    /// one month.
    pub async fn list_budgets(
        &self,
        user_id: &str,
        month: Option<&str>,
    ) -> ResultEngine<Vec<Budget>> {
        let mut query = budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id.to_string()))
            .order_by_asc(budgets::Column::CreatedAt)
            .order_by_asc(budgets::Column::Id);
        if let Some(month) = month {
            query = query.filter(budgets::Column::Month.eq(month.to_string()));
        }
        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(Budget::try_from)
            .collect()
    }

    /// Sets the budget for a month.
    ///
    /// At most one row exists per `(caller, month)`: a second set for the
    /// same month overwrites the amount in place and keeps the existing row
    /// id. The write goes through the store's conflict resolution on the
    /// `(user_id, month)` unique index, so two concurrent sets for the same
    /// month converge on a single row instead of racing a read-then-insert.
    pub async fn upsert_budget(
        &self,
        user_id: &str,
        amount: Option<&str>,
        month: Option<&str>,
    ) -> ResultEngine<Budget> {
        let amount = parse_budget_amount(require_field(amount, "amount")?)?;
        let month = validate_month(require_field(month, "month")?)?;

        with_tx!(self, |db_tx| {
            let active = budgets::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                user_id: ActiveValue::Set(user_id.to_string()),
                amount_minor: ActiveValue::Set(amount.cents()),
                month: ActiveValue::Set(month.clone()),
                created_at: ActiveValue::Set(Utc::now()),
            };
            budgets::Entity::insert(active)
                .on_conflict(
                    OnConflict::columns([budgets::Column::UserId, budgets::Column::Month])
                        .update_column(budgets::Column::AmountMinor)
                        .to_owned(),
                )
                .exec(&db_tx)
                .await?;

            let model = budgets::Entity::find()
                .filter(budgets::Column::UserId.eq(user_id.to_string()))
                .filter(budgets::Column::Month.eq(month.clone()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("budget".to_string()))?;
            Budget::try_from(model)
        })
    }

    /// Owner-scoped fetch.
    pub async fn budget(&self, user_id: &str, budget_id: Uuid) -> ResultEngine<Budget> {
        let model = budgets::Entity::find_by_id(budget_id.to_string())
            .filter(budgets::Column::UserId.eq(user_id.to_string()))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("budget".to_string()))?;
        Budget::try_from(model)
    }

    /// Partial update of amount and/or month. Moving a budget onto a month
    /// that already has one is a field error, keeping the one-row-per-month
    /// invariant intact.
    pub async fn update_budget(
        &self,
        user_id: &str,
        budget_id: Uuid,
        amount: Option<&str>,
        month: Option<&str>,
    ) -> ResultEngine<Budget> {
        let amount = amount.map(parse_budget_amount).transpose()?;
        let month = month.map(validate_month).transpose()?;

        with_tx!(self, |db_tx| {
            let model = budgets::Entity::find_by_id(budget_id.to_string())
                .filter(budgets::Column::UserId.eq(user_id.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("budget".to_string()))?;

            if let Some(month) = &month
                && *month != model.month
            {
                let occupied = budgets::Entity::find()
                    .filter(budgets::Column::UserId.eq(user_id.to_string()))
                    .filter(budgets::Column::Month.eq(month.clone()))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if occupied {
                    return Err(EngineError::validation(
                        "month",
                        "A budget for this month already exists.",
                    ));
                }
            }

            if amount.is_none() && month.is_none() {
                return Budget::try_from(model);
            }

            let mut active: budgets::ActiveModel = model.into();
            if let Some(amount) = amount {
                active.amount_minor = ActiveValue::Set(amount.cents());
            }
            if let Some(month) = month.clone() {
                active.month = ActiveValue::Set(month);
            }
            let model = active.update(&db_tx).await?;
            Budget::try_from(model)
        })
    }

    /// Owner-scoped delete.
    pub async fn delete_budget(&self, user_id: &str, budget_id: Uuid) -> ResultEngine<()> {
        let model = budgets::Entity::find_by_id(budget_id.to_string())
            .filter(budgets::Column::UserId.eq(user_id.to_string()))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("budget".to_string()))?;
        model.delete(&self.database).await?;
        Ok(())
    }
}
