use std::time::Duration;

use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, error, info};

use super::token_store::TokenStore;

/// Sweeps expired-and-revoked refresh tokens once immediately and then on
/// every tick. Failures are logged and the loop keeps going.
pub fn spawn_token_cleanup(store: TokenStore, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            sweep(&store).await;
        }
    })
}

pub(crate) async fn sweep(store: &TokenStore) -> Option<u64> {
    match store.purge_expired_and_revoked().await {
        Ok(0) => {
            debug!("token cleanup found nothing to delete");
            Some(0)
        }
        Ok(deleted) => {
            info!(deleted, "deleted expired and revoked refresh tokens");
            Some(deleted)
        }
        Err(err) => {
            error!(error = %err, "refresh token cleanup failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};

    use super::{spawn_token_cleanup, sweep};
    use crate::services::ServiceContext;

    #[tokio::test]
    async fn sweep_swallows_storage_errors() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_errors([DbErr::Custom("connection reset".to_string())])
            .into_connection();
        let store = ServiceContext::new(&db).token_store(7);

        assert_eq!(sweep(&store).await, None);
    }

    #[tokio::test]
    async fn sweep_reports_deleted_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 4,
            }])
            .into_connection();
        let store = ServiceContext::new(&db).token_store(7);

        assert_eq!(sweep(&store).await, Some(4));
    }

    #[tokio::test]
    async fn task_keeps_running_after_a_failed_sweep() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_errors([DbErr::Custom("connection reset".to_string())])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let store = ServiceContext::new(&db).token_store(7);

        let handle = spawn_token_cleanup(store, Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!handle.is_finished());
        handle.abort();
    }
}
