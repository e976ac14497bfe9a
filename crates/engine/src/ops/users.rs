use chrono::Utc;
use sea_orm::{ActiveValue, Condition, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ExternalProfile, ResultEngine, User, UserRole, categories, users,
    util::{optional_text, required_text},
};

use super::{Engine, with_tx};

const GOOGLE_PROVIDER: &str = "google";

impl Engine {
    /// Resolve the local user for a profile returned by the identity provider.
    ///
    /// Matches by external id or email. A user found by email only gets the
    /// external id linked; an unknown profile creates a new user seeded with the
    /// default categories.
    pub async fn sign_in_external(&self, profile: ExternalProfile) -> ResultEngine<User> {
        let external_id = required_text(&profile.external_id, "external id", None)?;
        let email = required_text(&profile.email, "email", None)?.to_lowercase();
        let name = optional_text(Some(&profile.name)).unwrap_or_else(|| email.clone());

        with_tx!(self, |db_tx| {
            let existing = users::Entity::find()
                .filter(
                    Condition::any()
                        .add(users::Column::GoogleId.eq(external_id.clone()))
                        .add(users::Column::Email.eq(email.clone())),
                )
                .one(&db_tx)
                .await?;

            let now = Utc::now();
            let model = match existing {
                Some(model) if model.google_id.is_some() => model,
                Some(model) => {
                    tracing::info!(user_id = %model.id, "linking external identity to existing user");
                    let mut active: users::ActiveModel = model.into();
                    active.google_id = ActiveValue::Set(Some(external_id.clone()));
                    active.provider = ActiveValue::Set(GOOGLE_PROVIDER.to_string());
                    active.updated_at = ActiveValue::Set(now);
                    active.update(&db_tx).await?
                }
                None => {
                    let id = Uuid::new_v4();
                    let model = users::ActiveModel {
                        id: ActiveValue::Set(id),
                        google_id: ActiveValue::Set(Some(external_id.clone())),
                        name: ActiveValue::Set(name.clone()),
                        email: ActiveValue::Set(email.clone()),
                        provider: ActiveValue::Set(GOOGLE_PROVIDER.to_string()),
                        role: ActiveValue::Set(UserRole::User.as_str().to_string()),
                        created_at: ActiveValue::Set(now),
                        updated_at: ActiveValue::Set(now),
                    }
                    .insert(&db_tx)
                    .await?;

                    categories::Entity::insert_many(categories::default_active_models(id, now))
                        .exec_without_returning(&db_tx)
                        .await?;
                    tracing::info!(user_id = %id, "created user on first sign-in");
                    model
                }
            };

            User::try_from(model)
        })
    }

    /// Look up a user by id.
    pub async fn user(&self, user_id: Uuid) -> ResultEngine<User> {
        let model = users::Entity::find_by_id(user_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user".to_string()))?;
        User::try_from(model)
    }
}
