use chrono::{DateTime, FixedOffset};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::Executor;
use crate::db::entities::{prelude::RefreshToken, refresh_token};

#[derive(Clone)]
pub struct RefreshTokenDao {
    db: DatabaseConnection,
}

#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<FixedOffset>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

impl DaoBase for RefreshTokenDao {
    type Entity = RefreshToken;

    fn from_db(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl RefreshTokenDao {
    pub async fn create_token<C>(
        &self,
        conn: &C,
        token: NewRefreshToken,
    ) -> DaoResult<refresh_token::Model>
    where
        C: Executor,
    {
        let model = refresh_token::ActiveModel {
            user_id: Set(token.user_id),
            token_hash: Set(token.token_hash),
            expires_at: Set(token.expires_at),
            revoked: Set(false),
            revoked_at: Set(None),
            replaced_by_token: Set(None),
            user_agent: Set(token.user_agent),
            ip_address: Set(token.ip_address),
            ..Default::default()
        };
        self.create_in(conn, token.id, model).await
    }

    /// Looks up a record that has been neither revoked nor rotated. Expiry is
    /// left to the caller.
    pub async fn find_usable_by_hash(
        &self,
        token_hash: &str,
    ) -> DaoResult<Option<refresh_token::Model>> {
        RefreshToken::find()
            .filter(refresh_token::Column::TokenHash.eq(token_hash))
            .filter(refresh_token::Column::Revoked.eq(false))
            .filter(refresh_token::Column::ReplacedByToken.is_null())
            .one(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    /// Points `old_id` at its successor only while it is still unrotated and
    /// unrevoked. Returns `false` when another caller got there first.
    pub async fn mark_replaced<C>(
        &self,
        conn: &C,
        old_id: Uuid,
        new_id: Uuid,
        now: DateTime<FixedOffset>,
    ) -> DaoResult<bool>
    where
        C: Executor,
    {
        let result = RefreshToken::update_many()
            .col_expr(
                refresh_token::Column::ReplacedByToken,
                Expr::value(Some(new_id)),
            )
            .col_expr(refresh_token::Column::UpdatedAt, Expr::value(now))
            .filter(refresh_token::Column::Id.eq(old_id))
            .filter(refresh_token::Column::ReplacedByToken.is_null())
            .filter(refresh_token::Column::Revoked.eq(false))
            .exec(conn)
            .await
            .map_err(DaoLayerError::Db)?;

        Ok(result.rows_affected == 1)
    }

    pub async fn revoke_by_hash(
        &self,
        token_hash: &str,
        now: DateTime<FixedOffset>,
    ) -> DaoResult<u64> {
        let result = RefreshToken::update_many()
            .col_expr(refresh_token::Column::Revoked, Expr::value(true))
            .col_expr(refresh_token::Column::RevokedAt, Expr::value(Some(now)))
            .col_expr(refresh_token::Column::UpdatedAt, Expr::value(now))
            .filter(refresh_token::Column::TokenHash.eq(token_hash))
            .filter(refresh_token::Column::Revoked.eq(false))
            .exec(&self.db)
            .await
            .map_err(DaoLayerError::Db)?;

        Ok(result.rows_affected)
    }

    pub async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<FixedOffset>,
    ) -> DaoResult<u64> {
        let result = RefreshToken::update_many()
            .col_expr(refresh_token::Column::Revoked, Expr::value(true))
            .col_expr(refresh_token::Column::RevokedAt, Expr::value(Some(now)))
            .col_expr(refresh_token::Column::UpdatedAt, Expr::value(now))
            .filter(refresh_token::Column::UserId.eq(user_id))
            .filter(refresh_token::Column::Revoked.eq(false))
            .exec(&self.db)
            .await
            .map_err(DaoLayerError::Db)?;

        Ok(result.rows_affected)
    }

    pub async fn delete_expired_and_revoked(&self, now: DateTime<FixedOffset>) -> DaoResult<u64> {
        let result = RefreshToken::delete_many()
            .filter(refresh_token::Column::ExpiresAt.lt(now))
            .filter(refresh_token::Column::Revoked.eq(true))
            .exec(&self.db)
            .await
            .map_err(DaoLayerError::Db)?;

        Ok(result.rows_affected)
    }
}
