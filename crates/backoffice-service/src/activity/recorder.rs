//! Queued listener turning auth events into activity rows.
//!
//! Events go through a bounded channel to a single consumer task, so rows
//! are appended in the order events were recorded: a logout is never
//! written before the login that preceded it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use backoffice_auth::{RbacEnforcer, SystemPermission};
use backoffice_core::config::ActivityConfig;
use backoffice_core::error::AppError;
use backoffice_core::events::AuthEvent;
use backoffice_core::result::AppResult;
use backoffice_database::ActivityStore;
use backoffice_entity::activity::CreateUserActivity;

use crate::context::RequestContext;

enum Command {
    Record(AuthEvent),
    Flush(oneshot::Sender<()>),
}

/// Records login/logout activity on a background task.
pub struct ActivityRecorder {
    sender: mpsc::Sender<Command>,
    worker: JoinHandle<u64>,
    store: Arc<dyn ActivityStore>,
    rbac: Arc<RbacEnforcer>,
}

impl std::fmt::Debug for ActivityRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityRecorder")
            .field("capacity", &self.sender.max_capacity())
            .finish_non_exhaustive()
    }
}

impl ActivityRecorder {
    /// Spawn the consumer task. Must be called inside a Tokio runtime.
    pub fn start(
        store: Arc<dyn ActivityStore>,
        rbac: Arc<RbacEnforcer>,
        config: &ActivityConfig,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let worker = tokio::spawn(consume(Arc::clone(&store), receiver));
        info!(capacity = config.queue_capacity, "Activity recorder started");

        Self {
            sender,
            worker,
            store,
            rbac,
        }
    }

    /// Queue an auth event. Waits while the queue is full.
    pub async fn record(&self, event: AuthEvent) -> AppResult<()> {
        self.sender
            .send(Command::Record(event))
            .await
            .map_err(|_| AppError::internal("Activity recorder has shut down"))
    }

    /// Wait until every event queued so far has been written.
    pub async fn flush(&self) -> AppResult<()> {
        let (ack, done) = oneshot::channel();
        self.sender
            .send(Command::Flush(ack))
            .await
            .map_err(|_| AppError::internal("Activity recorder has shut down"))?;
        done.await
            .map_err(|_| AppError::internal("Activity recorder stopped before flushing"))
    }

    /// Bulk-delete activity rows older than `before`, or every row when
    /// `before` is `None`. Pending events are written first.
    pub async fn purge(
        &self,
        ctx: &RequestContext,
        before: Option<DateTime<Utc>>,
    ) -> AppResult<u64> {
        self.rbac
            .require_permission(&ctx.permissions, SystemPermission::ManageUsers)?;
        self.flush().await?;

        let purged = self.store.purge_activities(before).await?;
        info!(admin_id = %ctx.user_id, before = ?before, purged, "User activity purged");
        Ok(purged)
    }

    /// Close the queue, drain it and stop the consumer.
    ///
    /// Returns how many rows the consumer appended over its lifetime.
    pub async fn shutdown(self) -> AppResult<u64> {
        drop(self.sender);
        let recorded = self
            .worker
            .await
            .map_err(|e| AppError::internal(format!("Activity recorder task failed: {e}")))?;
        info!(recorded, "Activity recorder stopped");
        Ok(recorded)
    }
}

async fn consume(store: Arc<dyn ActivityStore>, mut receiver: mpsc::Receiver<Command>) -> u64 {
    let mut recorded = 0;

    while let Some(command) = receiver.recv().await {
        match command {
            Command::Record(event) => {
                let data = CreateUserActivity::from(event);
                match store.append_activity(&data).await {
                    Ok(activity) => {
                        recorded += 1;
                        debug!(
                            user_id = %activity.user_id,
                            activity_type = %activity.activity_type,
                            "User activity recorded"
                        );
                    }
                    Err(e) => {
                        error!(
                            user_id = %data.user_id,
                            activity_type = %data.activity_type,
                            error = %e,
                            "Failed to record user activity"
                        );
                    }
                }
            }
            Command::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }

    recorded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use backoffice_core::types::id::UserId;
    use backoffice_database::MemoryStore;
    use backoffice_entity::activity::ActivityType;
    use chrono::Duration;

    fn login(user_id: UserId, at: DateTime<Utc>) -> AuthEvent {
        AuthEvent::Login {
            user_id,
            ip_address: Some("127.0.0.1".into()),
            user_agent: Some("Mozilla/5.0".into()),
            at,
        }
    }

    fn logout(user_id: UserId, at: DateTime<Utc>) -> AuthEvent {
        AuthEvent::Logout {
            user_id,
            ip_address: Some("127.0.0.1".into()),
            user_agent: Some("Mozilla/5.0".into()),
            at,
        }
    }

    #[tokio::test]
    async fn test_events_written_in_order() {
        let store = MemoryStore::new();
        let recorder = ActivityRecorder::start(
            Arc::new(store.clone()),
            testing::rbac(),
            &ActivityConfig { queue_capacity: 2 },
        );
        let user = UserId::new();
        let now = Utc::now();

        for i in 0..5 {
            recorder.record(login(user, now + Duration::seconds(i * 2))).await.unwrap();
            recorder
                .record(logout(user, now + Duration::seconds(i * 2 + 1)))
                .await
                .unwrap();
        }
        assert_eq!(recorder.shutdown().await.unwrap(), 10);

        let kinds: Vec<ActivityType> = store
            .activities()
            .await
            .iter()
            .map(|a| a.activity_type)
            .collect();
        assert_eq!(kinds.len(), 10);
        for pair in kinds.chunks(2) {
            assert_eq!(pair, [ActivityType::Login, ActivityType::Logout]);
        }
    }

    #[tokio::test]
    async fn test_purge_flushes_pending_events_first() {
        let store = MemoryStore::new();
        let recorder = ActivityRecorder::start(
            Arc::new(store.clone()),
            testing::rbac(),
            &ActivityConfig::default(),
        );
        let user = UserId::new();
        let old = Utc::now() - Duration::days(30);
        recorder.record(login(user, old)).await.unwrap();
        recorder.record(logout(user, Utc::now())).await.unwrap();

        let purged = recorder
            .purge(&testing::admin_ctx(), Some(Utc::now() - Duration::days(7)))
            .await
            .unwrap();

        assert_eq!(purged, 1);
        assert_eq!(store.activities().await.len(), 1);
        recorder.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_purge_requires_manage_users() {
        let store = MemoryStore::new();
        let recorder = ActivityRecorder::start(
            Arc::new(store),
            testing::rbac(),
            &ActivityConfig::default(),
        );
        let ctx = testing::ctx_with(UserId::new(), vec!["manage roles".into()]);

        assert!(recorder.purge(&ctx, None).await.is_err());
        recorder.shutdown().await.unwrap();
    }
}
