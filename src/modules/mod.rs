//! The ERP modules: typed views, seed collections and form rules.

pub mod accounting;
pub mod hr;
pub mod inventory;
pub mod purchases;
pub mod reports;
pub mod sales;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::collection::{CollectionStore, Collections};
use crate::error::{Result, StoreError};
use crate::kv::KeyValueStore;
use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Module {
    Inventory,
    Sales,
    Purchases,
    Accounting,
    Hr,
    Reports,
}

impl Module {
    pub const ALL: [Module; 6] = [
        Module::Inventory,
        Module::Sales,
        Module::Purchases,
        Module::Accounting,
        Module::Hr,
        Module::Reports,
    ];

    /// Entity key of the module's collection.
    pub fn key(self) -> &'static str {
        match self {
            Module::Inventory => "inventory",
            Module::Sales => "sales",
            Module::Purchases => "purchases",
            Module::Accounting => "accounting",
            Module::Hr => "hr",
            Module::Reports => "reports",
        }
    }

    /// REST collection path of the module's backend resource. Reports have
    /// no CRUD resource, only the report endpoints.
    pub fn api_path(self) -> Option<&'static str> {
        match self {
            Module::Inventory => Some("/api/v1/inventory/"),
            Module::Sales => Some("/api/v1/sales/"),
            Module::Purchases => Some("/api/v1/purchases/"),
            Module::Accounting => Some("/api/v1/accounting/"),
            Module::Hr => Some("/api/v1/hr/employees"),
            Module::Reports => None,
        }
    }

    /// Default collection used when nothing is persisted yet.
    pub fn seed(self) -> Vec<Record> {
        match self {
            Module::Inventory => inventory::seed(),
            Module::Sales => sales::seed(),
            Module::Purchases => purchases::seed(),
            Module::Accounting => accounting::seed(),
            Module::Hr => hr::seed(),
            Module::Reports => reports::seed(),
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Module {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        Module::ALL
            .into_iter()
            .find(|m| m.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| StoreError::State(format!("unknown module {s:?}")))
    }
}

impl<K: KeyValueStore + Clone> Collections<K> {
    /// Open a module's collection, seeding it from the module's defaults.
    pub fn open_module(&self, module: Module) -> Result<Arc<CollectionStore<K>>> {
        self.open(module.key(), || module.seed())
    }
}

/// Round to whole cents.
pub(crate) fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
