use sea_orm::{ConnectionTrait, QueryFilter, Statement, prelude::*};

use crate::{MoneyCents, ResultEngine, TransactionKind, budgets};

use super::Engine;

/// Aggregate totals over a user's transactions plus the budget for the
/// current calendar month.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Summary {
    pub total_income: MoneyCents,
    pub total_expenses: MoneyCents,
    pub balance: MoneyCents,
    pub budget: MoneyCents,
}

impl Engine {
    /// Computes income/expense totals and the budget for `current_month`
    /// ("YYYY-MM"). The month comes from the server clock, never from the
    /// client.
    pub async fn summary(&self, user_id: &str, current_month: &str) -> ResultEngine<Summary> {
        let total_income = self.sum_amounts(user_id, TransactionKind::Income).await?;
        let total_expenses = self.sum_amounts(user_id, TransactionKind::Expense).await?;

        let budget = budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id.to_string()))
            .filter(budgets::Column::Month.eq(current_month.to_string()))
            .one(&self.database)
            .await?
            .map(|model| MoneyCents::new(model.amount_minor))
            .unwrap_or(MoneyCents::ZERO);

        Ok(Summary {
            total_income,
            total_expenses,
            balance: total_income - total_expenses,
            budget,
        })
    }

    async fn sum_amounts(&self, user_id: &str, kind: TransactionKind) -> ResultEngine<MoneyCents> {
        let backend = self.database.get_database_backend();
        let stmt = Statement::from_sql_and_values(
            backend,
            "SELECT COALESCE(SUM(amount_minor), 0) AS sum \
             FROM transactions \
             WHERE user_id = ? AND kind = ?",
            vec![user_id.into(), kind.as_str().into()],
        );
        let row = self.database.query_one(stmt).await?;
        let sum: i64 = row.and_then(|r| r.try_get("", "sum").ok()).unwrap_or(0);
        Ok(MoneyCents::new(sum))
    }
}
