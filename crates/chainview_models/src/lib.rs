//! Data model for the chainview service/project tree: the closed item-type
//! registry, the typed tree items, and the creator layer that turns untyped
//! persisted records back into typed items.

pub mod creators;
pub mod item_type;
pub mod tree_items;

pub use creators::{
    base_fields, create, create_from_record, creator_for, FieldKind, FieldSpec, ItemCreator,
    Record, ValidationError,
};
pub use item_type::ItemType;
pub use tree_items::{
    CommandItem, DataManagerProject, InfuraProject, LabeledItem, LocalProject, NetworkNode,
    ProviderProject, ServiceGroup, TreeItem,
};
