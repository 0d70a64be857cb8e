use chrono::Utc;
use uuid::Uuid;

use crate::{
    auth::{
        ClientInfo,
        tokens::{hash_refresh_token, refresh_token_expiry},
    },
    db::{
        Executor,
        dao::{NewRefreshToken, RefreshTokenDao},
        entities::refresh_token,
    },
    error::AppError,
};

/// Persistence for refresh-token records. Raw secrets only pass through;
/// rows are keyed by their SHA-256 digest.
#[derive(Clone)]
pub struct TokenStore {
    dao: RefreshTokenDao,
    ttl_days: i64,
}

impl TokenStore {
    pub fn new(dao: RefreshTokenDao, ttl_days: i64) -> Self {
        Self { dao, ttl_days }
    }

    pub async fn store<C>(
        &self,
        conn: &C,
        user_id: Uuid,
        raw_token: &str,
        client: &ClientInfo,
    ) -> Result<refresh_token::Model, AppError>
    where
        C: Executor,
    {
        self.store_as(conn, Uuid::new_v4(), user_id, raw_token, client)
            .await
    }

    pub async fn store_as<C>(
        &self,
        conn: &C,
        id: Uuid,
        user_id: Uuid,
        raw_token: &str,
        client: &ClientInfo,
    ) -> Result<refresh_token::Model, AppError>
    where
        C: Executor,
    {
        let record = NewRefreshToken {
            id,
            user_id,
            token_hash: hash_refresh_token(raw_token),
            expires_at: refresh_token_expiry(self.ttl_days),
            user_agent: client.user_agent.clone(),
            ip_address: client.ip_address.clone(),
        };
        Ok(self.dao.create_token(conn, record).await?)
    }

    /// The only validity gate for refresh tokens: unknown, revoked, rotated
    /// and expired records all come back as `None`.
    pub async fn find(&self, raw_token: &str) -> Result<Option<refresh_token::Model>, AppError> {
        let record = self
            .dao
            .find_usable_by_hash(&hash_refresh_token(raw_token))
            .await?;

        let now = Utc::now().fixed_offset();
        Ok(record.filter(|record| record.expires_at > now))
    }

    pub async fn mark_replaced<C>(
        &self,
        conn: &C,
        old_id: Uuid,
        new_id: Uuid,
    ) -> Result<bool, AppError>
    where
        C: Executor,
    {
        let now = Utc::now().fixed_offset();
        Ok(self.dao.mark_replaced(conn, old_id, new_id, now).await?)
    }

    pub async fn revoke_one(&self, raw_token: &str) -> Result<u64, AppError> {
        let now = Utc::now().fixed_offset();
        Ok(self
            .dao
            .revoke_by_hash(&hash_refresh_token(raw_token), now)
            .await?)
    }

    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, AppError> {
        let now = Utc::now().fixed_offset();
        Ok(self.dao.revoke_all_for_user(user_id, now).await?)
    }

    /// Deletes records that are both expired and revoked. Expired but
    /// unrevoked records stay.
    pub async fn purge_expired_and_revoked(&self) -> Result<u64, AppError> {
        let now = Utc::now().fixed_offset();
        Ok(self.dao.delete_expired_and_revoked(now).await?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    };
    use uuid::Uuid;

    use crate::{
        auth::{ClientInfo, tokens::generate_refresh_token},
        db::entities::{prelude::RefreshToken, refresh_token},
        services::ServiceContext,
        test_helpers::{seed_user, test_db},
    };

    use super::TokenStore;

    async fn fixture() -> (DatabaseConnection, TokenStore, Uuid) {
        let db = test_db().await;
        let user = seed_user(&db, "alice", "alice@example.com").await;
        let store = ServiceContext::new(&db).token_store(7);
        (db, store, user.id)
    }

    async fn force_expired(db: &DatabaseConnection, id: Uuid) {
        let record = RefreshToken::find_by_id(id)
            .one(db)
            .await
            .expect("query should succeed")
            .expect("record should exist");
        let mut active: refresh_token::ActiveModel = record.into();
        active.expires_at = Set((Utc::now() - Duration::hours(1)).fixed_offset());
        active.update(db).await.expect("update should succeed");
    }

    #[tokio::test]
    async fn store_keeps_only_the_hash_and_client_metadata() {
        let (db, store, user_id) = fixture().await;
        let raw = generate_refresh_token();
        let client = ClientInfo {
            user_agent: Some("curl/8.0".to_string()),
            ip_address: Some("203.0.113.7".to_string()),
        };

        let record = store
            .store(&db, user_id, &raw, &client)
            .await
            .expect("store should succeed");

        assert_ne!(record.token_hash, raw);
        assert_eq!(record.token_hash.len(), 64);
        assert_eq!(record.user_agent.as_deref(), Some("curl/8.0"));
        assert_eq!(record.ip_address.as_deref(), Some("203.0.113.7"));
        assert!(!record.revoked);
    }

    #[tokio::test]
    async fn find_returns_stored_token() {
        let (db, store, user_id) = fixture().await;
        let raw = generate_refresh_token();
        let stored = store
            .store(&db, user_id, &raw, &ClientInfo::default())
            .await
            .expect("store should succeed");

        let found = store.find(&raw).await.expect("find should succeed");
        assert_eq!(found.map(|r| r.id), Some(stored.id));
        assert!(store.find("unknown").await.expect("find").is_none());
    }

    #[tokio::test]
    async fn find_ignores_expired_tokens() {
        let (db, store, user_id) = fixture().await;
        let raw = generate_refresh_token();
        let stored = store
            .store(&db, user_id, &raw, &ClientInfo::default())
            .await
            .expect("store should succeed");
        force_expired(&db, stored.id).await;

        assert!(store.find(&raw).await.expect("find").is_none());
    }

    #[tokio::test]
    async fn mark_replaced_succeeds_once_and_hides_the_token() {
        let (db, store, user_id) = fixture().await;
        let raw = generate_refresh_token();
        let stored = store
            .store(&db, user_id, &raw, &ClientInfo::default())
            .await
            .expect("store should succeed");

        let first = store
            .mark_replaced(&db, stored.id, Uuid::new_v4())
            .await
            .expect("update should succeed");
        let second = store
            .mark_replaced(&db, stored.id, Uuid::new_v4())
            .await
            .expect("update should succeed");

        assert!(first);
        assert!(!second);
        assert!(store.find(&raw).await.expect("find").is_none());

        let record = RefreshToken::find_by_id(stored.id)
            .one(&db)
            .await
            .expect("query should succeed")
            .expect("record should still exist");
        assert!(!record.revoked, "replacement does not revoke");
    }

    #[tokio::test]
    async fn revoke_one_is_idempotent() {
        let (db, store, user_id) = fixture().await;
        let raw = generate_refresh_token();
        store
            .store(&db, user_id, &raw, &ClientInfo::default())
            .await
            .expect("store should succeed");

        assert_eq!(store.revoke_one(&raw).await.expect("revoke"), 1);
        assert_eq!(store.revoke_one(&raw).await.expect("revoke"), 0);
        assert!(store.find(&raw).await.expect("find").is_none());
    }

    #[tokio::test]
    async fn revoke_all_for_user_leaves_other_users_alone() {
        let (db, store, user_id) = fixture().await;
        let other = seed_user(&db, "bob", "bob@example.com").await;
        let mine = [generate_refresh_token(), generate_refresh_token()];
        for raw in &mine {
            store
                .store(&db, user_id, raw, &ClientInfo::default())
                .await
                .expect("store should succeed");
        }
        let theirs = generate_refresh_token();
        store
            .store(&db, other.id, &theirs, &ClientInfo::default())
            .await
            .expect("store should succeed");

        let revoked = store
            .revoke_all_for_user(user_id)
            .await
            .expect("revoke should succeed");

        assert_eq!(revoked, 2);
        for raw in &mine {
            assert!(store.find(raw).await.expect("find").is_none());
        }
        assert!(store.find(&theirs).await.expect("find").is_some());
    }

    #[tokio::test]
    async fn purge_only_deletes_expired_and_revoked() {
        let (db, store, user_id) = fixture().await;
        let client = ClientInfo::default();

        let expired_revoked = generate_refresh_token();
        let expired_only = generate_refresh_token();
        let revoked_only = generate_refresh_token();
        let a = store
            .store(&db, user_id, &expired_revoked, &client)
            .await
            .expect("store");
        let b = store
            .store(&db, user_id, &expired_only, &client)
            .await
            .expect("store");
        let c = store
            .store(&db, user_id, &revoked_only, &client)
            .await
            .expect("store");
        store.revoke_one(&expired_revoked).await.expect("revoke");
        store.revoke_one(&revoked_only).await.expect("revoke");
        force_expired(&db, a.id).await;
        force_expired(&db, b.id).await;

        let purged = store
            .purge_expired_and_revoked()
            .await
            .expect("purge should succeed");
        assert_eq!(purged, 1);

        let remaining: Vec<Uuid> = RefreshToken::find()
            .filter(refresh_token::Column::UserId.eq(user_id))
            .all(&db)
            .await
            .expect("query should succeed")
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.contains(&b.id));
        assert!(remaining.contains(&c.id));
    }
}
