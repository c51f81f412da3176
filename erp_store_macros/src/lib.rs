mod entity_view;

use proc_macro::TokenStream;

/// Derive macro for the `EntityView` trait.
///
/// # Usage
///
/// ```ignore
/// #[derive(Clone, Serialize, Deserialize, EntityView)]
/// #[entity(collection = "inventory", rules = "inventory_rules")]
/// struct InventoryItem {
///     #[serde(default)]
///     pub id: String,
///     pub name: String,
///     pub quantity: i64,
/// }
/// ```
///
/// - `#[entity(collection = "...")]` sets the entity key. Defaults to the
///   snake_case struct name.
/// - `#[entity(rules = "path::to::fn")]` names a `fn() -> FormRules` checked
///   before create and update. Defaults to no rules.
/// - `#[entity(id)]` marks the id field. Defaults to a field named `id`.
#[proc_macro_derive(EntityView, attributes(entity))]
pub fn derive_entity_view(input: TokenStream) -> TokenStream {
    entity_view::derive(input)
}
