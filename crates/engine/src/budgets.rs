//! Monthly budgets.
//!
//! At most one row per `(user_id, month)`; the unique index backs the upsert
//! in `ops::budgets` so concurrent sets for the same month converge on a
//! single row.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::{EngineError, MoneyCents};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub amount_minor: i64,
    pub month: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Budget {
    pub id: Uuid,
    pub amount: MoneyCents,
    pub month: String,
}

impl TryFrom<Model> for Budget {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("budget".to_string()))?,
            amount: MoneyCents::new(model.amount_minor),
            month: model.month,
        })
    }
}
