//! Role hierarchy, capability checks and role-gated collection access.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::collection::CollectionStore;
use crate::error::{Result, StoreError};
use crate::kv::KeyValueStore;
use crate::query::{ListOptions, Page};
use crate::record::Record;

/// Key the current user is persisted under.
pub const CURRENT_USER_KEY: &str = "current-user";

/// Ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    ReadOnly,
    Staff,
    Manager,
    Admin,
}

impl Role {
    pub fn rank(self) -> u8 {
        match self {
            Role::ReadOnly => 1,
            Role::Staff => 2,
            Role::Manager => 3,
            Role::Admin => 4,
        }
    }

    /// True when this role is at least as privileged as `required`.
    pub fn has_permission(self, required: Role) -> bool {
        self.rank() >= required.rank()
    }

    pub fn can(self, action: Action) -> bool {
        self.has_permission(action.required_role())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::ReadOnly => "ReadOnly",
            Role::Staff => "Staff",
            Role::Manager => "Manager",
            Role::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "readonly" | "read-only" | "read_only" => Ok(Role::ReadOnly),
            "staff" => Ok(Role::Staff),
            "manager" => Ok(Role::Manager),
            "admin" => Ok(Role::Admin),
            _ => Err(StoreError::State(format!("unknown role {s:?}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Edit,
    Delete,
    Approve,
    ManageUsers,
    ViewReports,
    Export,
}

impl Action {
    pub fn required_role(self) -> Role {
        match self {
            Action::Create | Action::Edit | Action::ViewReports | Action::Export => Role::Staff,
            Action::Delete | Action::Approve => Role::Manager,
            Action::ManageUsers => Role::Admin,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::Approve => "approve",
            Action::ManageUsers => "manage users for",
            Action::ViewReports => "view reports on",
            Action::Export => "export",
        })
    }
}

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl Default for CurrentUser {
    fn default() -> Self {
        Self {
            id: "1".into(),
            name: "Admin User".into(),
            email: "admin@erp.local".into(),
            role: Role::Admin,
            avatar: None,
        }
    }
}

impl CurrentUser {
    /// Load the persisted user, or the default admin when none is stored or
    /// the stored value does not parse.
    pub fn load<K: KeyValueStore>(kv: &K) -> Self {
        match kv.get(CURRENT_USER_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!(error = %err, "failed to parse saved user");
                Self::default()
            }),
            Ok(None) => Self::default(),
            Err(err) => {
                warn!(error = %err, "failed to read saved user");
                Self::default()
            }
        }
    }

    pub fn save<K: KeyValueStore>(&self, kv: &K) -> Result<()> {
        let raw = serde_json::to_string(self).map_err(|e| StoreError::Serde(e.to_string()))?;
        kv.set(CURRENT_USER_KEY, &raw)?;
        Ok(())
    }

    /// Switch role and persist the change.
    pub fn change_role<K: KeyValueStore>(&mut self, kv: &K, role: Role) -> Result<()> {
        info!(user = %self.id, from = %self.role, to = %role, "changing role");
        self.role = role;
        self.save(kv)
    }

    pub fn can(&self, action: Action) -> bool {
        self.role.can(action)
    }
}

/// A collection store seen through one role.
///
/// Reads are always allowed; `create` needs `Action::Create`, `update` needs
/// `Action::Edit`, `remove` and `bulk_delete` need `Action::Delete`.
pub struct GuardedCollection<K> {
    store: Arc<CollectionStore<K>>,
    role: Role,
}

impl<K> Clone for GuardedCollection<K> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            role: self.role,
        }
    }
}

impl<K: KeyValueStore> GuardedCollection<K> {
    pub fn new(store: Arc<CollectionStore<K>>, role: Role) -> Self {
        Self { store, role }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn store(&self) -> &Arc<CollectionStore<K>> {
        &self.store
    }

    fn authorize(&self, action: Action) -> Result<()> {
        if self.role.can(action) {
            return Ok(());
        }
        warn!(role = %self.role, %action, collection = %self.store.entity_key(), "forbidden");
        Err(StoreError::Forbidden {
            role: self.role,
            action,
            collection: self.store.entity_key().to_string(),
        })
    }

    pub async fn create(&self, item: Record) -> Result<Record> {
        self.authorize(Action::Create)?;
        self.store.create(item).await
    }

    pub async fn read(&self, id: &str) -> Result<Option<Record>> {
        self.store.read(id).await
    }

    pub async fn update(&self, id: &str, patch: Record) -> Result<Record> {
        self.authorize(Action::Edit)?;
        self.store.update(id, patch).await
    }

    pub async fn remove(&self, id: &str) -> Result<bool> {
        self.authorize(Action::Delete)?;
        self.store.remove(id).await
    }

    pub async fn bulk_delete<S: AsRef<str>>(&self, ids: &[S]) -> Result<bool> {
        self.authorize(Action::Delete)?;
        self.store.bulk_delete(ids).await
    }

    pub async fn list(&self, options: ListOptions) -> Result<Page<Record>> {
        self.store.list(options).await
    }
}
