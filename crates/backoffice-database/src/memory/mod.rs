//! In-memory store implementing every store trait.
//!
//! Suitable for single-process use and for service tests. Writes are
//! staged on a copy of the state and swapped in only when the whole unit
//! of work succeeds, so a failed write leaves the store untouched.

mod content;
mod rbac;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::warn;

use backoffice_core::error::AppError;
use backoffice_core::result::AppResult;
use backoffice_core::types::id::{MetaTagId, PermissionId, RoleId, UserId};
use backoffice_core::types::pagination::PageResponse;
use backoffice_core::types::query::ListQuery;
use backoffice_entity::activity::UserActivity;
use backoffice_entity::audit::AuditLogEntry;
use backoffice_entity::meta_tag::MetaTag;
use backoffice_entity::permission::Permission;
use backoffice_entity::role::Role;
use backoffice_entity::user::User;

/// Everything the store holds.
#[derive(Debug, Clone, Default)]
struct State {
    users: BTreeMap<UserId, User>,
    roles: BTreeMap<RoleId, Role>,
    permissions: BTreeMap<PermissionId, Permission>,
    role_permissions: BTreeSet<(RoleId, PermissionId)>,
    user_roles: BTreeSet<(UserId, RoleId)>,
    meta_tags: BTreeMap<MetaTagId, MetaTag>,
    activities: Vec<UserActivity>,
    audit: Vec<AuditLogEntry>,
}

/// In-memory store using a Tokio mutex for thread safety.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    fail_writes: Arc<AtomicBool>,
    fail_audit: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every user/role/permission/meta-tag write fail after staging,
    /// as if the database went away mid-transaction.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every audit append fail.
    pub fn fail_audit(&self, fail: bool) {
        self.fail_audit.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of every recorded activity in insertion order.
    pub async fn activities(&self) -> Vec<UserActivity> {
        self.state.lock().await.activities.clone()
    }

    /// Snapshot of every audit entry in insertion order.
    pub async fn audit_entries(&self) -> Vec<AuditLogEntry> {
        self.state.lock().await.audit.clone()
    }

    async fn read<T>(&self, f: impl FnOnce(&State) -> T) -> T {
        let state = self.state.lock().await;
        f(&state)
    }

    /// Run `f` against a staged copy and commit it only on success.
    async fn write<T>(&self, f: impl FnOnce(&mut State) -> AppResult<T>) -> AppResult<T> {
        let mut state = self.state.lock().await;
        let mut staged = state.clone();
        let value = f(&mut staged)?;

        if self.fail_writes.load(Ordering::SeqCst) {
            warn!("Memory store write failure injected, discarding staged changes");
            return Err(AppError::database("Storage unavailable"));
        }

        *state = staged;
        Ok(value)
    }
}

/// Filter, order newest first and paginate an in-memory listing.
fn paginate<T, F, K>(rows: Vec<T>, query: &ListQuery, fields: F, key: K) -> PageResponse<T>
where
    T: serde::Serialize,
    F: Fn(&T) -> Vec<&str>,
    K: Fn(&T) -> (DateTime<Utc>, uuid::Uuid),
{
    let mut matching: Vec<T> = rows
        .into_iter()
        .filter(|row| query.matches(fields(row)))
        .collect();
    matching.sort_by_key(|row| std::cmp::Reverse(key(row)));

    let page = &query.page;
    let total = matching.len() as u64;
    let items = matching
        .into_iter()
        .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
        .take(usize::try_from(page.limit()).unwrap_or(usize::MAX))
        .collect();

    PageResponse::new(items, page.page, page.page_size, total)
}
