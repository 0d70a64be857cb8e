use chrono::Utc;
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        AccessPayload, AuthSession, AuthUser, ClientInfo, PasswordPolicy, TokenSigner, UserStatus,
        tokens::generate_refresh_token, verify_password,
    },
    db::entities::user,
    error::AppError,
    services::{token_store::TokenStore, user_service::UserService},
};

const USERNAME_TAKEN: &str = "Username already exists";
const EMAIL_TAKEN: &str = "Email already exists";
const BAD_CREDENTIALS: &str = "Invalid email or password";
const ACCOUNT_INACTIVE: &str = "Account is not active";
const BAD_REFRESH_TOKEN: &str = "Invalid or expired refresh token";
const USER_NOT_FOUND: &str = "User not found";

#[derive(Debug, Clone, Copy)]
pub struct RegisterInput<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Copy)]
pub struct LoginInput<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Registration, login and the refresh-token chain. Multi-row writes run in
/// one transaction; access tokens are minted only after commit.
#[derive(Clone)]
pub struct AuthService {
    db: DatabaseConnection,
    users: UserService,
    tokens: TokenStore,
    signer: TokenSigner,
    passwords: PasswordPolicy,
}

impl AuthService {
    pub fn new(
        db: DatabaseConnection,
        users: UserService,
        tokens: TokenStore,
        signer: TokenSigner,
        passwords: PasswordPolicy,
    ) -> Self {
        Self {
            db,
            users,
            tokens,
            signer,
            passwords,
        }
    }

    pub async fn register(
        &self,
        input: RegisterInput<'_>,
        client: &ClientInfo,
    ) -> Result<AuthSession, AppError> {
        self.ensure_available(input).await?;

        let password_hash = self.passwords.hash(input.password).await?;
        let refresh_token = generate_refresh_token();

        let txn = self.db.begin().await?;
        let created = self
            .users
            .create_user(&txn, input.username, input.email, &password_hash)
            .await?;
        let Some(user) = created else {
            // Lost a race with a concurrent registration.
            txn.rollback().await?;
            self.ensure_available(input).await?;
            return Err(AppError::bad_request(USERNAME_TAKEN));
        };
        self.tokens
            .store(&txn, user.id, &refresh_token, client)
            .await?;
        txn.commit().await?;

        info!(user_id = %user.id, "user registered");
        self.session_for(&user, refresh_token)
    }

    pub async fn login(
        &self,
        input: LoginInput<'_>,
        client: &ClientInfo,
    ) -> Result<AuthSession, AppError> {
        let Some(user) = self.users.find_by_email(input.email).await? else {
            // Pay the same argon2 cost as a real account.
            verify_password(input.password, self.passwords.dummy_hash()).await?;
            return Err(AppError::unauthorized(BAD_CREDENTIALS));
        };

        if !status_of(&user).is_active() {
            warn!(user_id = %user.id, status = %user.status, "login rejected for inactive account");
            return Err(AppError::unauthorized(ACCOUNT_INACTIVE));
        }

        if !verify_password(input.password, &user.password_hash).await? {
            return Err(AppError::unauthorized(BAD_CREDENTIALS));
        }

        let refresh_token = generate_refresh_token();
        let txn = self.db.begin().await?;
        self.users
            .set_last_login(&txn, user.id, Utc::now().fixed_offset())
            .await?;
        self.tokens
            .store(&txn, user.id, &refresh_token, client)
            .await?;
        txn.commit().await?;

        info!(user_id = %user.id, "user logged in");
        self.session_for(&user, refresh_token)
    }

    /// Exchanges a refresh token for a new pair. The presented token is
    /// single-use: the conditional `mark_replaced` lets exactly one caller
    /// rotate it.
    pub async fn refresh(
        &self,
        raw_token: &str,
        client: &ClientInfo,
    ) -> Result<AuthSession, AppError> {
        let record = self
            .tokens
            .find(raw_token)
            .await?
            .ok_or_else(|| AppError::unauthorized(BAD_REFRESH_TOKEN))?;

        let user = self
            .users
            .find_by_id(record.user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized(USER_NOT_FOUND))?;

        if !status_of(&user).is_active() {
            return Err(AppError::unauthorized(ACCOUNT_INACTIVE));
        }

        let successor_id = Uuid::new_v4();
        let refresh_token = generate_refresh_token();

        let txn = self.db.begin().await?;
        let rotated = self
            .tokens
            .mark_replaced(&txn, record.id, successor_id)
            .await?;
        if !rotated {
            txn.rollback().await?;
            warn!(user_id = %user.id, token_id = %record.id, "refresh token already rotated");
            return Err(AppError::unauthorized(BAD_REFRESH_TOKEN));
        }
        self.tokens
            .store_as(&txn, successor_id, user.id, &refresh_token, client)
            .await?;
        txn.commit().await?;

        info!(user_id = %user.id, token_id = %successor_id, "refresh token rotated");
        self.session_for(&user, refresh_token)
    }

    /// Revokes one refresh token. Unknown or already revoked tokens are not
    /// an error.
    pub async fn logout(&self, raw_token: &str) -> Result<(), AppError> {
        let revoked = self.tokens.revoke_one(raw_token).await?;
        info!(revoked, "logout");
        Ok(())
    }

    pub async fn logout_all(&self, user_id: Uuid) -> Result<u64, AppError> {
        let revoked = self.tokens.revoke_all_for_user(user_id).await?;
        info!(user_id = %user_id, revoked, "logged out from all devices");
        Ok(revoked)
    }

    async fn ensure_available(&self, input: RegisterInput<'_>) -> Result<(), AppError> {
        if self.users.find_by_username(input.username).await?.is_some() {
            return Err(AppError::bad_request(USERNAME_TAKEN));
        }
        if self.users.find_by_email(input.email).await?.is_some() {
            return Err(AppError::bad_request(EMAIL_TAKEN));
        }
        Ok(())
    }

    fn session_for(
        &self,
        user: &user::Model,
        refresh_token: String,
    ) -> Result<AuthSession, AppError> {
        let access_token = self.signer.sign(&AccessPayload::from(user))?;
        Ok(AuthSession {
            user: AuthUser::from(user),
            access_token,
            refresh_token,
        })
    }
}

fn status_of(user: &user::Model) -> UserStatus {
    UserStatus::try_from(user.status.as_str()).unwrap_or(UserStatus::Inactive)
}
