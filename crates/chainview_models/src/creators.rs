//! Creator layer: validates untyped persisted records and rebuilds typed
//! [`TreeItem`]s from them.
//!
//! Each live [`ItemType`] has exactly one stateless creator. A creator
//! declares its required-field schema (always the base fields plus its own,
//! appended, never replaced) and builds the typed item from a record that
//! has already passed validation. [`create`] is the only entry point and
//! fixes the order: tag lookup → validate → build → children.

use serde_json::Value;
use thiserror::Error;

use crate::item_type::ItemType;
use crate::tree_items::{
    CommandItem, DataManagerProject, InfuraProject, LabeledItem, LocalProject, NetworkNode,
    ProviderProject, ServiceGroup, TreeItem,
};

/// An untyped record as stored in the tree file or assembled by a command
/// flow. Untrusted until validated.
pub type Record = serde_json::Map<String, Value>;

// ---------------------------------------------------------------------------
// Field schema
// ---------------------------------------------------------------------------

/// Runtime type a required field must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A JSON string.
    Str,
    /// A non-negative JSON integer.
    Number,
    /// A JSON array of strings.
    StrArray,
}

impl FieldKind {
    fn name(&self) -> &'static str {
        match self {
            Self::Str => "string",
            Self::Number => "number",
            Self::StrArray => "string array",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Str => value.is_string(),
            Self::Number => value.is_u64(),
            Self::StrArray => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
        }
    }
}

/// One entry of a creator's required-field schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// The fields every kind requires, in schema order. Concrete creators append
/// to this list; they never remove or reorder its entries.
pub fn base_fields() -> Vec<FieldSpec> {
    vec![FieldSpec::new("label", FieldKind::Str)]
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a raw record was rejected before construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("record has no numeric `itemType` tag")]
    MissingTag,

    #[error("unknown item type tag {0}")]
    UnknownItemType(i64),

    #[error("missing required field `{0}`")]
    MissingField(String),

    #[error("field `{field}` must be a {expected}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
    },

    #[error("field `{field}` value {value} does not fit a {expected}")]
    OutOfRange {
        field: String,
        value: u64,
        expected: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Creator trait & dispatch
// ---------------------------------------------------------------------------

/// Builds one concrete kind of tree item from a validated record.
///
/// Creators hold no state and are safe to use from concurrent flows.
pub trait ItemCreator: Sync {
    /// The kind this creator produces.
    fn item_type(&self) -> ItemType;

    /// Required-field schema. The default is the common base set; concrete
    /// kinds extend it by appending.
    fn required_fields(&self) -> Vec<FieldSpec> {
        base_fields()
    }

    /// Construct the typed item. The record is guaranteed to satisfy
    /// [`ItemCreator::required_fields`]; this must not re-validate.
    fn build(&self, record: &Record) -> Result<TreeItem, ValidationError>;
}

/// Dispatch table over the closed creator set.
pub fn creator_for(item_type: ItemType) -> &'static dyn ItemCreator {
    match item_type {
        ItemType::Nullable => &NullableCreator,
        ItemType::Command => &CommandCreator,
        ItemType::Member => &MemberCreator,
        ItemType::LocalService => &LocalServiceCreator,
        ItemType::LocalProject => &LocalProjectCreator,
        ItemType::LocalNetworkNode => &LocalNetworkNodeCreator,
        ItemType::InfuraService => &InfuraServiceCreator,
        ItemType::InfuraProject => &InfuraProjectCreator,
        ItemType::InfuraNetworkNode => &InfuraNetworkNodeCreator,
        ItemType::InfuraLayer => &InfuraLayerCreator,
        ItemType::ProviderService => &ProviderServiceCreator,
        ItemType::ProviderProject => &ProviderProjectCreator,
        ItemType::DataManagerService => &DataManagerServiceCreator,
        ItemType::DataManagerProject => &DataManagerProjectCreator,
        ItemType::DataManagerApplication => &DataManagerApplicationCreator,
        ItemType::DataManagerInputGroup => &DataManagerInputGroupCreator,
        ItemType::DataManagerOutputGroup => &DataManagerOutputGroupCreator,
    }
}

/// Build a typed tree item from a raw JSON value, children included.
pub fn create(value: &Value) -> Result<TreeItem, ValidationError> {
    let record = value.as_object().ok_or(ValidationError::NotAnObject)?;
    create_from_record(record)
}

/// Build a typed tree item from a raw record, children included.
///
/// Order is fixed: resolve the tag, validate every required field
/// (all-or-nothing, no side effects before success), build, then recurse
/// into `children`.
pub fn create_from_record(record: &Record) -> Result<TreeItem, ValidationError> {
    let tag = record
        .get("itemType")
        .and_then(Value::as_i64)
        .ok_or(ValidationError::MissingTag)?;
    // Keep the full-width tag: narrowing before the lookup would let an
    // out-of-range value alias onto a live kind.
    let item_type = i32::try_from(tag)
        .ok()
        .and_then(|tag| ItemType::try_from(tag).ok())
        .ok_or(ValidationError::UnknownItemType(tag))?;

    let creator = creator_for(item_type);
    validate(record, &creator.required_fields())?;
    let mut item = creator.build(record)?;

    if let Some(children) = record.get("children").and_then(Value::as_array) {
        for child in children {
            item.add_child(create(child)?);
        }
    }
    Ok(item)
}

/// Check every required field for presence and runtime type. The first
/// failure aborts; nothing is constructed on a failed path.
fn validate(record: &Record, fields: &[FieldSpec]) -> Result<(), ValidationError> {
    for field in fields {
        match record.get(field.name) {
            None => return Err(ValidationError::MissingField(field.name.into())),
            Some(value) if !field.kind.matches(value) => {
                return Err(ValidationError::TypeMismatch {
                    field: field.name.into(),
                    expected: field.kind.name(),
                })
            }
            Some(_) => {}
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Validated-field accessors
// ---------------------------------------------------------------------------

// These run only after `validate` succeeded, so the defaults are unreachable;
// they exist to keep the builders panic-free.

fn str_field(record: &Record, name: &str) -> String {
    record
        .get(name)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn str_array_field(record: &Record, name: &str) -> Vec<String> {
    record
        .get(name)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn port_field(record: &Record, name: &str) -> Result<u16, ValidationError> {
    let value = record.get(name).and_then(Value::as_u64).unwrap_or_default();
    u16::try_from(value).map_err(|_| ValidationError::OutOfRange {
        field: name.into(),
        value,
        expected: "port number",
    })
}

// ---------------------------------------------------------------------------
// Concrete creators
// ---------------------------------------------------------------------------

struct NullableCreator;

impl ItemCreator for NullableCreator {
    fn item_type(&self) -> ItemType {
        ItemType::Nullable
    }

    fn build(&self, record: &Record) -> Result<TreeItem, ValidationError> {
        Ok(TreeItem::Nullable(LabeledItem::new(str_field(
            record, "label",
        ))))
    }
}

struct CommandCreator;

impl ItemCreator for CommandCreator {
    fn item_type(&self) -> ItemType {
        ItemType::Command
    }

    fn required_fields(&self) -> Vec<FieldSpec> {
        let mut fields = base_fields();
        fields.push(FieldSpec::new("commandId", FieldKind::Str));
        fields
    }

    fn build(&self, record: &Record) -> Result<TreeItem, ValidationError> {
        Ok(TreeItem::Command(CommandItem::new(
            str_field(record, "label"),
            str_field(record, "commandId"),
        )))
    }
}

struct MemberCreator;

impl ItemCreator for MemberCreator {
    fn item_type(&self) -> ItemType {
        ItemType::Member
    }

    fn build(&self, record: &Record) -> Result<TreeItem, ValidationError> {
        Ok(TreeItem::Member(LabeledItem::new(str_field(
            record, "label",
        ))))
    }
}

struct LocalServiceCreator;

impl ItemCreator for LocalServiceCreator {
    fn item_type(&self) -> ItemType {
        ItemType::LocalService
    }

    fn build(&self, _record: &Record) -> Result<TreeItem, ValidationError> {
        Ok(TreeItem::LocalService(ServiceGroup::default()))
    }
}

struct LocalProjectCreator;

impl ItemCreator for LocalProjectCreator {
    fn item_type(&self) -> ItemType {
        ItemType::LocalProject
    }

    fn required_fields(&self) -> Vec<FieldSpec> {
        let mut fields = base_fields();
        fields.push(FieldSpec::new("port", FieldKind::Number));
        fields
    }

    fn build(&self, record: &Record) -> Result<TreeItem, ValidationError> {
        Ok(TreeItem::LocalProject(LocalProject::new(
            str_field(record, "label"),
            port_field(record, "port")?,
        )))
    }
}

struct LocalNetworkNodeCreator;

impl ItemCreator for LocalNetworkNodeCreator {
    fn item_type(&self) -> ItemType {
        ItemType::LocalNetworkNode
    }

    fn required_fields(&self) -> Vec<FieldSpec> {
        let mut fields = base_fields();
        fields.push(FieldSpec::new("url", FieldKind::Str));
        fields.push(FieldSpec::new("networkId", FieldKind::Str));
        fields
    }

    fn build(&self, record: &Record) -> Result<TreeItem, ValidationError> {
        Ok(TreeItem::LocalNetworkNode(NetworkNode::new(
            str_field(record, "label"),
            str_field(record, "url"),
            str_field(record, "networkId"),
        )))
    }
}

struct InfuraServiceCreator;

impl ItemCreator for InfuraServiceCreator {
    fn item_type(&self) -> ItemType {
        ItemType::InfuraService
    }

    fn build(&self, _record: &Record) -> Result<TreeItem, ValidationError> {
        Ok(TreeItem::InfuraService(ServiceGroup::default()))
    }
}

struct InfuraProjectCreator;

impl ItemCreator for InfuraProjectCreator {
    fn item_type(&self) -> ItemType {
        ItemType::InfuraProject
    }

    fn required_fields(&self) -> Vec<FieldSpec> {
        let mut fields = base_fields();
        fields.push(FieldSpec::new("projectId", FieldKind::Str));
        fields
    }

    fn build(&self, record: &Record) -> Result<TreeItem, ValidationError> {
        Ok(TreeItem::InfuraProject(InfuraProject::new(
            str_field(record, "label"),
            str_field(record, "projectId"),
        )))
    }
}

struct InfuraNetworkNodeCreator;

impl ItemCreator for InfuraNetworkNodeCreator {
    fn item_type(&self) -> ItemType {
        ItemType::InfuraNetworkNode
    }

    fn required_fields(&self) -> Vec<FieldSpec> {
        let mut fields = base_fields();
        fields.push(FieldSpec::new("url", FieldKind::Str));
        fields.push(FieldSpec::new("networkId", FieldKind::Str));
        fields
    }

    fn build(&self, record: &Record) -> Result<TreeItem, ValidationError> {
        Ok(TreeItem::InfuraNetworkNode(NetworkNode::new(
            str_field(record, "label"),
            str_field(record, "url"),
            str_field(record, "networkId"),
        )))
    }
}

struct InfuraLayerCreator;

impl ItemCreator for InfuraLayerCreator {
    fn item_type(&self) -> ItemType {
        ItemType::InfuraLayer
    }

    fn build(&self, record: &Record) -> Result<TreeItem, ValidationError> {
        Ok(TreeItem::InfuraLayer(LabeledItem::new(str_field(
            record, "label",
        ))))
    }
}

struct ProviderServiceCreator;

impl ItemCreator for ProviderServiceCreator {
    fn item_type(&self) -> ItemType {
        ItemType::ProviderService
    }

    fn build(&self, _record: &Record) -> Result<TreeItem, ValidationError> {
        Ok(TreeItem::ProviderService(ServiceGroup::default()))
    }
}

struct ProviderProjectCreator;

impl ItemCreator for ProviderProjectCreator {
    fn item_type(&self) -> ItemType {
        ItemType::ProviderProject
    }

    fn required_fields(&self) -> Vec<FieldSpec> {
        let mut fields = base_fields();
        fields.push(FieldSpec::new("subscriptionId", FieldKind::Str));
        fields.push(FieldSpec::new("resourceGroup", FieldKind::Str));
        fields.push(FieldSpec::new("memberNames", FieldKind::StrArray));
        fields
    }

    fn build(&self, record: &Record) -> Result<TreeItem, ValidationError> {
        Ok(TreeItem::ProviderProject(ProviderProject::new(
            str_field(record, "label"),
            str_field(record, "subscriptionId"),
            str_field(record, "resourceGroup"),
            str_array_field(record, "memberNames"),
        )))
    }
}

struct DataManagerServiceCreator;

impl ItemCreator for DataManagerServiceCreator {
    fn item_type(&self) -> ItemType {
        ItemType::DataManagerService
    }

    fn build(&self, _record: &Record) -> Result<TreeItem, ValidationError> {
        Ok(TreeItem::DataManagerService(ServiceGroup::default()))
    }
}

struct DataManagerProjectCreator;

impl ItemCreator for DataManagerProjectCreator {
    fn item_type(&self) -> ItemType {
        ItemType::DataManagerProject
    }

    fn required_fields(&self) -> Vec<FieldSpec> {
        let mut fields = base_fields();
        fields.push(FieldSpec::new("subscriptionId", FieldKind::Str));
        fields.push(FieldSpec::new("resourceGroup", FieldKind::Str));
        fields
    }

    fn build(&self, record: &Record) -> Result<TreeItem, ValidationError> {
        Ok(TreeItem::DataManagerProject(DataManagerProject::new(
            str_field(record, "label"),
            str_field(record, "subscriptionId"),
            str_field(record, "resourceGroup"),
        )))
    }
}

struct DataManagerApplicationCreator;

impl ItemCreator for DataManagerApplicationCreator {
    fn item_type(&self) -> ItemType {
        ItemType::DataManagerApplication
    }

    fn build(&self, record: &Record) -> Result<TreeItem, ValidationError> {
        Ok(TreeItem::DataManagerApplication(LabeledItem::new(
            str_field(record, "label"),
        )))
    }
}

struct DataManagerInputGroupCreator;

impl ItemCreator for DataManagerInputGroupCreator {
    fn item_type(&self) -> ItemType {
        ItemType::DataManagerInputGroup
    }

    fn build(&self, record: &Record) -> Result<TreeItem, ValidationError> {
        Ok(TreeItem::DataManagerInputGroup(LabeledItem::new(
            str_field(record, "label"),
        )))
    }
}

struct DataManagerOutputGroupCreator;

impl ItemCreator for DataManagerOutputGroupCreator {
    fn item_type(&self) -> ItemType {
        ItemType::DataManagerOutputGroup
    }

    fn build(&self, record: &Record) -> Result<TreeItem, ValidationError> {
        Ok(TreeItem::DataManagerOutputGroup(LabeledItem::new(
            str_field(record, "label"),
        )))
    }
}
