//! Typed views, validation and role-gated access over module collections.

use std::sync::Arc;

use erp_store::modules::accounting::{self, LedgerEntry};
use erp_store::modules::inventory::{self, InventoryItem};
use erp_store::modules::sales::{LineItem, SalesOrder};
use erp_store::{
    Action, Collections, CurrentUser, EntityView, FormRules, GuardedCollection,
    InMemoryKeyValueStore, ListOptions, Module, Record, Role, Rule, SortOrder, StoreError,
    StoreOptions,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

fn collections() -> Collections<InMemoryKeyValueStore> {
    Collections::new(InMemoryKeyValueStore::new(), StoreOptions::immediate())
}

fn desk() -> InventoryItem {
    let mut item = InventoryItem::new("Desk", "FUR-DESK-900", "Furniture");
    item.quantity = 4;
    item.unit_price = 250.0;
    item
}

#[tokio::test]
async fn typed_create_validates_and_assigns_id() {
    let collections = collections();
    let inventory = collections
        .open_typed::<InventoryItem>(inventory::seed)
        .unwrap();

    let created = inventory.create(&desk()).await.unwrap();
    assert!(!created.id.is_empty());
    assert!(created.created_at.is_some());
    assert_eq!(created.name, "Desk");

    let read = inventory.read(&created.id).await.unwrap().unwrap();
    assert_eq!(read, created);
    assert_eq!(inventory.store().len(), 6);
}

#[tokio::test]
async fn invalid_view_is_rejected_before_any_write() {
    let collections = collections();
    let inventory = collections
        .open_typed::<InventoryItem>(inventory::seed)
        .unwrap();
    let revision = inventory.store().snapshot().revision;

    let mut item = InventoryItem::new("", "SKU-1", "Misc");
    item.quantity = -1;
    let errors = match inventory.create(&item).await {
        Err(StoreError::Validation(errors)) => errors,
        other => panic!("expected validation error, got {other:?}"),
    };
    assert_eq!(errors.get("name"), Some("This field is required"));
    assert_eq!(errors.get("quantity"), Some("Must be a non-negative number"));
    assert_eq!(errors.get("unit_price"), Some("Must be a positive number"));
    assert!(errors.get("sku").is_none());
    assert_eq!(inventory.store().snapshot().revision, revision);
}

#[tokio::test]
async fn typed_update_validates_the_merged_record() {
    let collections = collections();
    let inventory = collections
        .open_typed::<InventoryItem>(inventory::seed)
        .unwrap();

    let err = inventory
        .update("inv-001", Record::new().with("unit_price", 0))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    let updated = inventory
        .update("inv-001", Record::new().with("quantity", 3))
        .await
        .unwrap();
    assert_eq!(updated.quantity, 3);
    assert!(updated.needs_reorder());
    assert_eq!(updated.sku, "LAP-XPS15-001");
}

#[tokio::test]
async fn typed_save_replaces_fields() {
    let collections = collections();
    let inventory = collections
        .open_typed::<InventoryItem>(inventory::seed)
        .unwrap();

    let mut item = inventory.read("inv-004").await.unwrap().unwrap();
    item.status = "discontinued".into();
    let saved = inventory.save("inv-004", &item).await.unwrap();

    assert_eq!(saved.id, "inv-004");
    assert_eq!(saved.status, "discontinued");
    assert_ne!(saved.updated_at, item.updated_at);
    assert_eq!(saved.created_at, item.created_at);
}

#[tokio::test]
async fn typed_save_clears_optional_fields() {
    let collections = collections();
    let inventory = collections
        .open_typed::<InventoryItem>(inventory::seed)
        .unwrap();

    let mut item = inventory.read("inv-001").await.unwrap().unwrap();
    item.supplier_id = None;
    item.supplier_name = None;
    let saved = inventory.save("inv-001", &item).await.unwrap();

    assert_eq!(saved.supplier_id, None);
    assert_eq!(saved.supplier_name, None);
    assert_eq!(saved.created_at, item.created_at);

    let stored = inventory.store().read("inv-001").await.unwrap().unwrap();
    assert!(!stored.contains("supplier_id"));
    assert!(!stored.contains("supplier_name"));
    assert_eq!(stored.get_str("sku"), Some("LAP-XPS15-001"));
}

#[tokio::test]
async fn typed_save_rejects_invalid_views() {
    let collections = collections();
    let inventory = collections
        .open_typed::<InventoryItem>(inventory::seed)
        .unwrap();

    let mut item = inventory.read("inv-001").await.unwrap().unwrap();
    item.name.clear();
    let err = inventory.save("inv-001", &item).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    let stored = inventory.read("inv-001").await.unwrap().unwrap();
    assert_eq!(stored.name, "Laptop Computer - Dell XPS 15");
}

#[tokio::test]
async fn typed_update_validates_against_the_latest_record() {
    let collections = collections();
    let inventory = collections
        .open_typed::<InventoryItem>(inventory::seed)
        .unwrap();
    let raw = inventory.store().clone();

    // A queued raw write lands before the typed update's merge.
    let (cleared, rejected) = tokio::join!(
        raw.update("inv-001", Record::new().with("unit_price", 0)),
        inventory.update("inv-001", Record::new().with("quantity", 2)),
    );
    cleared.unwrap();
    assert!(matches!(rejected, Err(StoreError::Validation(_))));
    assert_eq!(
        raw.read("inv-001").await.unwrap().unwrap().get("quantity"),
        Some(&json!(45))
    );
}

#[tokio::test]
async fn typed_list_uses_module_filters() {
    let collections = collections();
    let inventory = collections
        .open_typed::<InventoryItem>(inventory::seed)
        .unwrap();

    let low = inventory
        .list(
            ListOptions::new()
                .filter(inventory::low_stock)
                .sort_by("quantity")
                .sort_order(SortOrder::Asc),
        )
        .await
        .unwrap();
    let ids: Vec<&str> = low.data.iter().map(|item| item.id.as_str()).collect();
    assert_eq!(ids, vec!["inv-005", "inv-002"]);

    let found = inventory
        .list(ListOptions::new().filter(inventory::search("LOGITECH")))
        .await
        .unwrap();
    assert_eq!(found.pagination.total, 1);
    assert_eq!(found.data[0].id, "inv-003");
}

#[tokio::test]
async fn sales_order_totals_follow_line_items() {
    let collections = collections();
    let sales = collections
        .open_module(Module::Sales)
        .unwrap()
        .typed::<SalesOrder>();

    let mut order = sales.read("sale-001").await.unwrap().unwrap();
    order.items.push(LineItem {
        id: None,
        name: "Docking Station".into(),
        quantity: 2,
        unit_price: 150.0,
    });
    order.recalculate();

    let saved = sales.save(&order.id.clone(), &order).await.unwrap();
    assert_eq!(saved.subtotal, 14299.80);
    assert_eq!(saved.tax, 1143.98);
    assert_eq!(saved.total, 15443.78);
}

#[tokio::test]
async fn ledger_summary_over_stored_entries() {
    let collections = collections();
    let ledger = collections
        .open_module(Module::Accounting)
        .unwrap()
        .typed::<LedgerEntry>();

    let entries = ledger.list(ListOptions::new().page_size(100)).await.unwrap().data;
    let summary = accounting::summarize(&entries);
    assert_eq!(summary.credits, 35639.35);
    assert_eq!(summary.debits, 79748.0);
    assert_eq!(summary.balance, -44108.65);
}

#[tokio::test]
async fn every_module_opens_and_converts() {
    let collections = collections();
    for module in Module::ALL {
        let store = collections.open_module(module).unwrap();
        assert_eq!(store.entity_key(), module.key());
        assert!(!store.is_empty(), "{module} has no seed");
    }
    assert_eq!(collections.keys().len(), Module::ALL.len());
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EntityView)]
#[entity(collection = "vendors", rules = "vendor_rules")]
struct Vendor {
    #[entity(id)]
    #[serde(rename = "id", default)]
    code: String,
    name: String,
    email: String,
}

fn vendor_rules() -> FormRules {
    FormRules::new()
        .field("name", [Rule::Required, Rule::MinLength(2)])
        .field("email", [Rule::Email])
}

#[derive(Debug, Clone, Serialize, Deserialize, EntityView)]
struct Warehouse {
    #[serde(default)]
    id: String,
    city: String,
}

#[test]
fn derived_views_describe_their_collection() {
    assert_eq!(Vendor::COLLECTION, "vendors");
    assert_eq!(Warehouse::COLLECTION, "warehouse");

    let vendor = Vendor {
        code: "v-1".into(),
        name: "Acme".into(),
        email: "sales@acme.test".into(),
    };
    assert_eq!(vendor.id(), "v-1");
    assert_eq!(vendor.to_record().unwrap().id(), Some("v-1"));
    assert!(Warehouse::rules().check(&Record::new()).is_empty());
}

#[tokio::test]
async fn derived_rules_apply_to_custom_views() {
    let collections = collections();
    let vendors = collections.open_typed::<Vendor>(Vec::new).unwrap();

    let result = vendors
        .create(&Vendor {
            code: String::new(),
            name: "A".into(),
            email: "not-an-email".into(),
        })
        .await;
    let errors = match result {
        Err(StoreError::Validation(errors)) => errors,
        other => panic!("expected validation error, got {other:?}"),
    };
    assert_eq!(errors.len(), 2);
    assert_eq!(errors.get("name"), Some("Must be at least 2 characters"));

    let created = vendors
        .create(&Vendor {
            code: "v-9".into(),
            name: "Acme".into(),
            email: "sales@acme.test".into(),
        })
        .await
        .unwrap();
    assert_eq!(created.code, "v-9");
}

#[tokio::test]
async fn read_only_role_cannot_mutate() {
    let collections = collections();
    let store = collections.open_module(Module::Inventory).unwrap();
    let guarded = GuardedCollection::new(store.clone(), Role::ReadOnly);

    assert!(guarded.read("inv-001").await.unwrap().is_some());
    assert_eq!(guarded.list(ListOptions::new()).await.unwrap().pagination.total, 5);

    let err = guarded.create(Record::new().with("name", "x")).await.unwrap_err();
    assert_eq!(
        err,
        StoreError::Forbidden {
            role: Role::ReadOnly,
            action: Action::Create,
            collection: "inventory".into(),
        }
    );
    assert!(guarded.update("inv-001", Record::new()).await.is_err());
    assert!(guarded.remove("inv-001").await.is_err());
    assert_eq!(store.len(), 5);
}

#[tokio::test]
async fn staff_edits_but_manager_deletes() {
    let collections = collections();
    let store = collections.open_module(Module::Inventory).unwrap();

    let staff = GuardedCollection::new(store.clone(), Role::Staff);
    staff
        .update("inv-002", Record::new().with("quantity", 30))
        .await
        .unwrap();
    let err = staff.bulk_delete(&["inv-001", "inv-002"]).await.unwrap_err();
    assert!(matches!(err, StoreError::Forbidden { action: Action::Delete, .. }));

    let manager = GuardedCollection::new(store.clone(), Role::Manager);
    manager.bulk_delete(&["inv-001", "inv-002"]).await.unwrap();
    assert_eq!(store.len(), 3);
}

#[tokio::test]
async fn saved_user_role_gates_access() {
    let kv = InMemoryKeyValueStore::new();
    let collections = Collections::new(kv.clone(), StoreOptions::immediate());

    let mut user = CurrentUser::load(&kv);
    assert_eq!(user.role, Role::Admin);
    user.change_role(&kv, Role::Staff).unwrap();

    let user = CurrentUser::load(&kv);
    assert_eq!(user.role, Role::Staff);
    assert!(!user.can(Action::Delete));

    let store: Arc<_> = collections.open_module(Module::Hr).unwrap();
    let guarded = GuardedCollection::new(store, user.role);
    assert!(guarded.remove("emp-001").await.is_err());
    assert_eq!(
        guarded.store().read("emp-001").await.unwrap().map(|r| r.get("id").cloned()),
        Some(Some(json!("emp-001")))
    );
}
