use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, FromQueryResult, IntoActiveModel};
use uuid::Uuid;

use super::base_traits::{HasIdActiveModel, TimestampedActiveModel};
use super::error::{DaoLayerError, DaoResult};
use crate::db::Executor;

#[async_trait::async_trait]
pub trait DaoBase: Clone + Send + Sync + Sized
where
    <Self::Entity as EntityTrait>::Model:
        FromQueryResult + IntoActiveModel<<Self::Entity as EntityTrait>::ActiveModel> + Send + Sync,
    <Self::Entity as EntityTrait>::ActiveModel:
        ActiveModelTrait<Entity = Self::Entity> + HasIdActiveModel + TimestampedActiveModel + Send,
{
    type Entity: EntityTrait + Send + Sync;

    fn from_db(db: DatabaseConnection) -> Self;

    fn new(db: &DatabaseConnection) -> Self {
        Self::from_db(db.clone())
    }

    fn db(&self) -> &DatabaseConnection;

    /// Inserts `data` under `id` through `conn`, which may be the pool or an
    /// open transaction.
    async fn create_in<C>(
        &self,
        conn: &C,
        id: Uuid,
        data: <Self::Entity as EntityTrait>::ActiveModel,
    ) -> DaoResult<<Self::Entity as EntityTrait>::Model>
    where
        C: Executor,
    {
        let now = Utc::now().fixed_offset();
        let mut active = data;
        active.set_id(id);
        active.set_created_at(now);
        active.set_updated_at(now);
        active.insert(conn).await.map_err(DaoLayerError::Db)
    }
}
