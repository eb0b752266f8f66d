//! # Users
//!
//! Registration and the administrator's activation toggle. Credentials and
//! sessions live outside the engine.

use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::Engine;
use duka_core::numbering::new_id;
use duka_core::validation::{normalize_optional, validate_phone, validate_text};
use duka_core::{ActingUser, NewUser, User, DEFAULT_LANGUAGE};

#[derive(Debug, Clone, Copy)]
pub struct Users<'a> {
    engine: &'a Engine,
}

impl<'a> Users<'a> {
    pub(crate) fn new(engine: &'a Engine) -> Self {
        Users { engine }
    }

    /// Registers a user. A phone number already in use is a `Conflict`.
    pub async fn register_user(&self, request: NewUser) -> EngineResult<User> {
        let language = match normalize_optional(request.language.as_deref()) {
            Some(language) => validate_text("language", &language, 8)?,
            None => DEFAULT_LANGUAGE.to_string(),
        };

        let user = User {
            id: new_id(),
            phone: validate_phone(&request.phone)?,
            name: validate_text("name", &request.name, 100)?,
            email: normalize_optional(request.email.as_deref()),
            role: request.role,
            is_active: true,
            language,
            created_at: self.engine.now(),
        };

        self.engine.db().users().insert(&user).await?;
        info!(user_id = %user.id, role = user.role.as_str(), "User registered");
        Ok(user)
    }

    /// Activates or deactivates an account. Administrators only; to anyone
    /// else the user does not exist.
    pub async fn set_user_active(&self, actor: &ActingUser, user_id: &str, is_active: bool) -> EngineResult<User> {
        if !actor.is_admin() {
            return Err(EngineError::not_found("User", user_id));
        }

        self.engine.db().users().set_active(user_id, is_active).await?;
        info!(user_id, is_active, by = %actor.user_id, "User activation changed");

        self.get_user(actor, user_id).await
    }

    /// Administrators see every user, vendors only themselves.
    pub async fn list_users(&self, actor: &ActingUser) -> EngineResult<Vec<User>> {
        if actor.is_admin() {
            return Ok(self.engine.db().users().list().await?);
        }

        Ok(self
            .engine
            .db()
            .users()
            .get_by_id(&actor.user_id)
            .await?
            .into_iter()
            .collect())
    }

    pub async fn get_user(&self, actor: &ActingUser, user_id: &str) -> EngineResult<User> {
        if !actor.is_admin() && actor.user_id != user_id {
            return Err(EngineError::not_found("User", user_id));
        }

        self.engine
            .db()
            .users()
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| EngineError::not_found("User", user_id))
    }
}
