//! Transaction primitives.
//!
//! A transaction records an unsigned magnitude in cents; the sign of the
//! event comes from its [`TransactionKind`], never from the stored value.

use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Category, EngineError, MoneyCents};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::validation(
                "transaction_type",
                format!("\"{other}\" is not a valid choice."),
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub category_id: String,
    pub kind: String,
    pub amount_minor: i64,
    pub date: Date,
    pub description: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id"
    )]
    Categories,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub id: Uuid,
    pub category: Category,
    pub amount: MoneyCents,
    pub date: NaiveDate,
    pub description: String,
    pub kind: TransactionKind,
}

impl TryFrom<(Model, super::categories::Model)> for Transaction {
    type Error = EngineError;

    fn try_from(
        (model, category): (Model, super::categories::Model),
    ) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("transaction".to_string()))?,
            category: Category::try_from(category)?,
            amount: MoneyCents::new(model.amount_minor),
            date: model.date,
            description: model.description,
            kind: TransactionKind::try_from(model.kind.as_str())?,
        })
    }
}
