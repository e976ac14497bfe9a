use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    Category, EngineError, ResultEngine, TransactionKind, categories,
    util::{normalize_name_key, optional_text, required_text},
};

use super::Engine;

const NAME_MAX_CHARS: usize = 50;

/// Fields accepted when creating a category.
#[derive(Clone, Debug)]
pub struct CategoryDraft {
    pub name: String,
    pub kind: TransactionKind,
    pub color: Option<String>,
    pub icon: Option<String>,
}

impl Engine {
    /// Categories of a user sorted by name, optionally restricted to one kind.
    pub async fn list_categories(
        &self,
        user_id: Uuid,
        kind: Option<TransactionKind>,
    ) -> ResultEngine<Vec<Category>> {
        let mut query = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .order_by_asc(categories::Column::NameNorm);
        if let Some(kind) = kind {
            query = query.filter(categories::Column::Kind.eq(kind.as_str()));
        }

        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(Category::try_from)
            .collect()
    }

    /// Create a category. Names are unique per user and type, ignoring case
    /// and accents.
    pub async fn create_category(
        &self,
        user_id: Uuid,
        draft: CategoryDraft,
    ) -> ResultEngine<Category> {
        let name = required_text(&draft.name, "name", Some(NAME_MAX_CHARS))?;
        let name_norm = normalize_name_key(&name)
            .ok_or_else(|| EngineError::Validation("name is required".to_string()))?;

        let taken = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .filter(categories::Column::Kind.eq(draft.kind.as_str()))
            .filter(categories::Column::NameNorm.eq(name_norm.clone()))
            .one(&self.database)
            .await?;
        if taken.is_some() {
            return Err(EngineError::ExistingKey(name));
        }

        let now = Utc::now();
        let model = categories::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            user_id: ActiveValue::Set(user_id),
            name: ActiveValue::Set(name),
            name_norm: ActiveValue::Set(name_norm),
            kind: ActiveValue::Set(draft.kind.as_str().to_string()),
            color: ActiveValue::Set(
                optional_text(draft.color.as_deref())
                    .unwrap_or_else(|| categories::DEFAULT_COLOR.to_string()),
            ),
            icon: ActiveValue::Set(
                optional_text(draft.icon.as_deref())
                    .unwrap_or_else(|| categories::DEFAULT_ICON.to_string()),
            ),
            is_default: ActiveValue::Set(false),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        }
        .insert(&self.database)
        .await?;

        Category::try_from(model)
    }

    /// Delete a category. Transactions keep their category label.
    pub async fn delete_category(&self, user_id: Uuid, category_id: Uuid) -> ResultEngine<()> {
        let res = categories::Entity::delete_many()
            .filter(categories::Column::Id.eq(category_id))
            .filter(categories::Column::UserId.eq(user_id))
            .exec(&self.database)
            .await?;
        if res.rows_affected == 0 {
            return Err(EngineError::KeyNotFound("category".to_string()));
        }
        Ok(())
    }
}
