use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod account {
    use super::*;

    /// Request body for both `/register/` and `/login/`.
    ///
    /// Fields are optional so that a missing field surfaces as a field-keyed
    /// validation error instead of a body rejection.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct Credentials {
        pub username: Option<String>,
        pub password: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TokenResponse {
        pub token: String,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: Option<String>,
    }

    /// Body for PUT/PATCH on a category. Omitted fields keep their value.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryUpdate {
        pub name: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub name: String,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Income,
        Expense,
    }

    /// Nested category reference: transactions address categories by name
    /// and the server resolves (or creates) the record for the caller.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryRef {
        pub name: Option<String>,
    }

    /// Amounts cross the wire as decimal strings ("12.34"). The
    /// `transaction_type` stays a plain string so an invalid choice becomes a
    /// field error rather than a deserialization failure.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub category: Option<CategoryRef>,
        pub amount: Option<String>,
        pub date: Option<String>,
        pub description: Option<String>,
        pub transaction_type: Option<String>,
    }

    /// Body for PUT/PATCH. Omitted fields keep their value; a provided
    /// `category` is re-resolved by name.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        pub category: Option<CategoryRef>,
        pub amount: Option<String>,
        pub date: Option<String>,
        pub description: Option<String>,
        pub transaction_type: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub category: super::category::CategoryView,
        pub amount: String,
        pub date: NaiveDate,
        pub description: String,
        pub transaction_type: TransactionKind,
    }

    /// Exact-match filters; absent parameters impose no constraint.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionListQuery {
        pub category: Option<String>,
        pub date: Option<String>,
        pub amount: Option<String>,
        pub page: Option<u64>,
        pub page_size: Option<u64>,
    }

    /// Page-number pagination envelope. `next`/`previous` are page numbers,
    /// null at either end.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub count: u64,
        pub next: Option<u64>,
        pub previous: Option<u64>,
        pub results: Vec<TransactionView>,
    }
}

pub mod budget {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetNew {
        pub amount: Option<String>,
        pub month: Option<String>,
    }

    /// Body for PUT/PATCH. Omitted fields keep their value.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetUpdate {
        pub amount: Option<String>,
        pub month: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetView {
        pub id: Uuid,
        pub amount: String,
        /// Period key, "YYYY-MM".
        pub month: String,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BudgetListQuery {
        pub month: Option<String>,
    }
}

pub mod summary {
    use super::*;

    /// Aggregate over the caller's transactions plus the current-month
    /// budget. All four values are decimal strings.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SummaryResponse {
        pub total_income: String,
        pub total_expenses: String,
        pub balance: String,
        pub budget: String,
    }
}
