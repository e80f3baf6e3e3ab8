use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{Category, EngineError, ResultEngine, categories, transactions};

use super::{Engine, require_field, with_tx};

impl Engine {
    /// Lists the caller's categories in creation order.
    pub async fn list_categories(&self, user_id: &str) -> ResultEngine<Vec<Category>> {
        let models = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id.to_string()))
            .order_by_asc(categories::Column::CreatedAt)
            .order_by_asc(categories::Column::Id)
            .all(&self.database)
            .await?;
        models.into_iter().map(Category::try_from).collect()
    }

    /// Creates a category owned by the caller.
    ///
    /// This path does not deduplicate by name; only transaction-nested
    /// references go through [`Engine::resolve_category`].
    pub async fn create_category(
        &self,
        user_id: &str,
        name: Option<&str>,
    ) -> ResultEngine<Category> {
        let name = require_field(name, "name")?.to_string();
        let id = Uuid::new_v4();

        let active = categories::ActiveModel {
            id: ActiveValue::Set(id.to_string()),
            user_id: ActiveValue::Set(user_id.to_string()),
            name: ActiveValue::Set(name.clone()),
            created_at: ActiveValue::Set(Utc::now()),
        };
        active.insert(&self.database).await?;

        Ok(Category { id, name })
    }

    /// Owner-scoped fetch: an id owned by someone else is the same
    /// "not found" as an unknown id.
    pub async fn category(&self, user_id: &str, category_id: Uuid) -> ResultEngine<Category> {
        let model = categories::Entity::find_by_id(category_id.to_string())
            .filter(categories::Column::UserId.eq(user_id.to_string()))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category".to_string()))?;
        Category::try_from(model)
    }

    /// Renames a category. `None` keeps the stored name.
    pub async fn update_category(
        &self,
        user_id: &str,
        category_id: Uuid,
        name: Option<&str>,
    ) -> ResultEngine<Category> {
        let name = match name {
            Some(value) => Some(require_field(Some(value), "name")?.to_string()),
            None => None,
        };

        with_tx!(self, |db_tx| {
            let model = categories::Entity::find_by_id(category_id.to_string())
                .filter(categories::Column::UserId.eq(user_id.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("category".to_string()))?;

            match name.clone() {
                Some(name) => {
                    let mut active: categories::ActiveModel = model.into();
                    active.name = ActiveValue::Set(name);
                    let model = active.update(&db_tx).await?;
                    Category::try_from(model)
                }
                None => Category::try_from(model),
            }
        })
    }

    /// Deletes a category. Transactions keep a required reference to their
    /// category, so a category that still backs transactions is a conflict.
    pub async fn delete_category(&self, user_id: &str, category_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = categories::Entity::find_by_id(category_id.to_string())
                .filter(categories::Column::UserId.eq(user_id.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("category".to_string()))?;

            let in_use = transactions::Entity::find()
                .filter(transactions::Column::CategoryId.eq(model.id.clone()))
                .count(&db_tx)
                .await?;
            if in_use > 0 {
                return Err(EngineError::Conflict(
                    "category is referenced by transactions".to_string(),
                ));
            }

            model.delete(&db_tx).await?;
            Ok(())
        })
    }

    /// Lookup-or-create scoped to `(caller, name)`.
    ///
    /// Runs inside the caller's transaction so the category insert and the
    /// row referencing it commit together. When duplicates exist (possible
    /// via the direct create path) the oldest one wins.
    pub(super) async fn resolve_category(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        name: Option<&str>,
    ) -> ResultEngine<categories::Model> {
        let name = require_field(name, "category")?;

        if let Some(model) = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id.to_string()))
            .filter(categories::Column::Name.eq(name.to_string()))
            .order_by_asc(categories::Column::CreatedAt)
            .one(db_tx)
            .await?
        {
            return Ok(model);
        }

        let active = categories::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            user_id: ActiveValue::Set(user_id.to_string()),
            name: ActiveValue::Set(name.to_string()),
            created_at: ActiveValue::Set(Utc::now()),
        };
        Ok(active.insert(db_tx).await?)
    }
}
