use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::Executor;
use crate::db::entities::{prelude::User, user};

#[derive(Clone)]
pub struct UserDao {
    db: DatabaseConnection,
}

#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub status: &'a str,
}

impl DaoBase for UserDao {
    type Entity = User;

    fn from_db(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl UserDao {
    pub async fn find_active_by_username(&self, username: &str) -> DaoResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Username.eq(username))
            .filter(user::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn find_active_by_email(&self, email: &str) -> DaoResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .filter(user::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn find_active_by_id(&self, id: Uuid) -> DaoResult<Option<user::Model>> {
        User::find_by_id(id)
            .filter(user::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn create_user<C>(&self, conn: &C, new_user: NewUser<'_>) -> DaoResult<user::Model>
    where
        C: Executor,
    {
        let model = user::ActiveModel {
            username: Set(new_user.username.to_string()),
            email: Set(new_user.email.to_string()),
            password_hash: Set(new_user.password_hash.to_string()),
            status: Set(new_user.status.to_string()),
            email_verified: Set(false),
            last_login_at: Set(None),
            deleted_at: Set(None),
            ..Default::default()
        };
        self.create_in(conn, Uuid::new_v4(), model)
            .await
            .map_err(|err| match err {
                DaoLayerError::Db(db_err)
                    if matches!(
                        db_err.sql_err(),
                        Some(SqlErr::UniqueConstraintViolation(_))
                    ) =>
                {
                    DaoLayerError::Conflict { entity: "user" }
                }
                other => other,
            })
    }

    pub async fn set_last_login<C>(
        &self,
        conn: &C,
        id: Uuid,
        at: DateTime<FixedOffset>,
    ) -> DaoResult<()>
    where
        C: Executor,
    {
        let result = User::update_many()
            .col_expr(user::Column::LastLoginAt, Expr::value(Some(at)))
            .col_expr(user::Column::UpdatedAt, Expr::value(at))
            .filter(user::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(DaoLayerError::Db)?;

        ensure_found(result.rows_affected, id)
    }

    pub async fn set_status(&self, id: Uuid, status: &str) -> DaoResult<()> {
        let result = User::update_many()
            .col_expr(user::Column::Status, Expr::value(status))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
            .filter(user::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(DaoLayerError::Db)?;

        ensure_found(result.rows_affected, id)
    }

    pub async fn soft_delete(&self, id: Uuid) -> DaoResult<()> {
        let now = Utc::now().fixed_offset();
        let result = User::update_many()
            .col_expr(user::Column::DeletedAt, Expr::value(Some(now)))
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(DaoLayerError::Db)?;

        ensure_found(result.rows_affected, id)
    }
}

fn ensure_found(rows_affected: u64, id: Uuid) -> DaoResult<()> {
    if rows_affected == 0 {
        return Err(DaoLayerError::NotFound {
            entity: std::any::type_name::<User>(),
            id,
        });
    }
    Ok(())
}
