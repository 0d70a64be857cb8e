use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

use crate::{
    auth::UserStatus,
    db::{
        Executor,
        dao::{DaoLayerError, NewUser, UserDao},
        entities::user,
    },
    error::AppError,
};

/// User storage as seen by the auth flows. Every lookup skips soft-deleted
/// rows.
#[derive(Clone)]
pub struct UserService {
    user_dao: UserDao,
}

impl UserService {
    pub fn new(user_dao: UserDao) -> Self {
        Self { user_dao }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<user::Model>, AppError> {
        Ok(self.user_dao.find_active_by_id(id).await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, AppError> {
        Ok(self.user_dao.find_active_by_email(email).await?)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<user::Model>, AppError> {
        Ok(self.user_dao.find_active_by_username(username).await?)
    }

    /// Returns `None` when an active user already holds the username or
    /// email. The database enforces this even for concurrent inserts.
    pub async fn create_user<C>(
        &self,
        conn: &C,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<user::Model>, AppError>
    where
        C: Executor,
    {
        let new_user = NewUser {
            username,
            email,
            password_hash,
            status: UserStatus::Active.as_str(),
        };
        match self.user_dao.create_user(conn, new_user).await {
            Ok(user) => Ok(Some(user)),
            Err(DaoLayerError::Conflict { .. }) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn set_last_login<C>(
        &self,
        conn: &C,
        user_id: Uuid,
        at: DateTime<FixedOffset>,
    ) -> Result<(), AppError>
    where
        C: Executor,
    {
        Ok(self.user_dao.set_last_login(conn, user_id, at).await?)
    }

    /// Existing tokens are left alone; the auth middleware enforces status.
    pub async fn set_status(&self, user_id: Uuid, status: UserStatus) -> Result<(), AppError> {
        Ok(self.user_dao.set_status(user_id, status.as_str()).await?)
    }

    pub async fn soft_delete(&self, user_id: Uuid) -> Result<(), AppError> {
        Ok(self.user_dao.soft_delete(user_id).await?)
    }
}
