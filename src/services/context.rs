use sea_orm::DatabaseConnection;

use crate::{
    db::dao::DaoContext,
    services::{auth_service::AuthService, token_store::TokenStore, user_service::UserService},
    state::AppState,
};

#[derive(Clone)]
pub struct ServiceContext {
    daos: DaoContext,
}

impl ServiceContext {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self {
            daos: DaoContext::new(db),
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(&state.db)
    }

    pub fn user(&self) -> UserService {
        UserService::new(self.daos.user())
    }

    pub fn token_store(&self, refresh_ttl_days: i64) -> TokenStore {
        TokenStore::new(self.daos.refresh_token(), refresh_ttl_days)
    }

    pub fn auth(&self, state: &AppState) -> AuthService {
        AuthService::new(
            self.daos.db().clone(),
            self.user(),
            self.token_store(state.config.auth.refresh_token_ttl_days),
            state.signer.clone(),
            state.passwords.clone(),
        )
    }
}
