use serde_json::{json, Value};

use crate::creators::Record;
use crate::item_type::ItemType;

// ---------------------------------------------------------------------------
// Concrete node types
// ---------------------------------------------------------------------------

/// A top-level service group. Its label is fixed by its kind; only the
/// children vary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceGroup {
    pub children: Vec<TreeItem>,
}

/// A generic labeled node (members, layers, data-manager groupings,
/// placeholders). Carries no kind-specific attributes beyond its label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledItem {
    pub label: String,
    pub children: Vec<TreeItem>,
}

impl LabeledItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
        }
    }
}

/// A node that triggers a host command when activated (e.g. the
/// "Connect to network" placeholder under an empty group).
#[derive(Debug, Clone, PartialEq)]
pub struct CommandItem {
    pub label: String,
    pub command_id: String,
    pub children: Vec<TreeItem>,
}

impl CommandItem {
    pub fn new(label: impl Into<String>, command_id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            command_id: command_id.into(),
            children: Vec::new(),
        }
    }
}

/// A project bound to a locally managed test network.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalProject {
    pub label: String,
    pub port: u16,
    pub children: Vec<TreeItem>,
}

impl LocalProject {
    pub fn new(label: impl Into<String>, port: u16) -> Self {
        Self {
            label: label.into(),
            port,
            children: Vec::new(),
        }
    }
}

/// A project hosted on Infura, identified by its remote project id.
#[derive(Debug, Clone, PartialEq)]
pub struct InfuraProject {
    pub label: String,
    pub project_id: String,
    pub children: Vec<TreeItem>,
}

impl InfuraProject {
    pub fn new(label: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            project_id: project_id.into(),
            children: Vec::new(),
        }
    }
}

/// A consortium project on a third-party provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderProject {
    pub label: String,
    pub subscription_id: String,
    pub resource_group: String,
    pub member_names: Vec<String>,
    pub children: Vec<TreeItem>,
}

impl ProviderProject {
    pub fn new(
        label: impl Into<String>,
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        member_names: Vec<String>,
    ) -> Self {
        Self {
            label: label.into(),
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            member_names,
            children: Vec::new(),
        }
    }
}

/// A data-manager instance bound to a subscription/resource group.
#[derive(Debug, Clone, PartialEq)]
pub struct DataManagerProject {
    pub label: String,
    pub subscription_id: String,
    pub resource_group: String,
    pub children: Vec<TreeItem>,
}

impl DataManagerProject {
    pub fn new(
        label: impl Into<String>,
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            children: Vec::new(),
        }
    }
}

/// An RPC endpoint node under a project (local or Infura).
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkNode {
    pub label: String,
    pub url: String,
    pub network_id: String,
    pub children: Vec<TreeItem>,
}

impl NetworkNode {
    pub fn new(
        label: impl Into<String>,
        url: impl Into<String>,
        network_id: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
            network_id: network_id.into(),
            children: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// TreeItem
// ---------------------------------------------------------------------------

/// A node in the persisted service/project tree. Closed set: every variant
/// corresponds to exactly one live [`ItemType`] tag and one creator.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeItem {
    Nullable(LabeledItem),
    Command(CommandItem),
    Member(LabeledItem),
    LocalService(ServiceGroup),
    LocalProject(LocalProject),
    LocalNetworkNode(NetworkNode),
    InfuraService(ServiceGroup),
    InfuraProject(InfuraProject),
    InfuraNetworkNode(NetworkNode),
    InfuraLayer(LabeledItem),
    ProviderService(ServiceGroup),
    ProviderProject(ProviderProject),
    DataManagerService(ServiceGroup),
    DataManagerProject(DataManagerProject),
    DataManagerApplication(LabeledItem),
    DataManagerInputGroup(LabeledItem),
    DataManagerOutputGroup(LabeledItem),
}

impl TreeItem {
    /// The kind tag of this node.
    pub fn item_type(&self) -> ItemType {
        match self {
            Self::Nullable(_) => ItemType::Nullable,
            Self::Command(_) => ItemType::Command,
            Self::Member(_) => ItemType::Member,
            Self::LocalService(_) => ItemType::LocalService,
            Self::LocalProject(_) => ItemType::LocalProject,
            Self::LocalNetworkNode(_) => ItemType::LocalNetworkNode,
            Self::InfuraService(_) => ItemType::InfuraService,
            Self::InfuraProject(_) => ItemType::InfuraProject,
            Self::InfuraNetworkNode(_) => ItemType::InfuraNetworkNode,
            Self::InfuraLayer(_) => ItemType::InfuraLayer,
            Self::ProviderService(_) => ItemType::ProviderService,
            Self::ProviderProject(_) => ItemType::ProviderProject,
            Self::DataManagerService(_) => ItemType::DataManagerService,
            Self::DataManagerProject(_) => ItemType::DataManagerProject,
            Self::DataManagerApplication(_) => ItemType::DataManagerApplication,
            Self::DataManagerInputGroup(_) => ItemType::DataManagerInputGroup,
            Self::DataManagerOutputGroup(_) => ItemType::DataManagerOutputGroup,
        }
    }

    /// Display label. Service groups have fixed labels; everything else
    /// carries its own.
    pub fn label(&self) -> &str {
        match self {
            Self::LocalService(_)
            | Self::InfuraService(_)
            | Self::ProviderService(_)
            | Self::DataManagerService(_) => self.item_type().label(),
            Self::Nullable(item)
            | Self::Member(item)
            | Self::InfuraLayer(item)
            | Self::DataManagerApplication(item)
            | Self::DataManagerInputGroup(item)
            | Self::DataManagerOutputGroup(item) => &item.label,
            Self::Command(item) => &item.label,
            Self::LocalProject(item) => &item.label,
            Self::LocalNetworkNode(item) | Self::InfuraNetworkNode(item) => &item.label,
            Self::InfuraProject(item) => &item.label,
            Self::ProviderProject(item) => &item.label,
            Self::DataManagerProject(item) => &item.label,
        }
    }

    /// UI-routing string the host uses to pick context-menu entries.
    pub fn context_value(&self) -> &'static str {
        match self {
            Self::Nullable(_) => "",
            Self::Command(_) => "command",
            Self::Member(_) => "member",
            Self::LocalService(_) => "local_service",
            Self::LocalProject(_) => "local_project",
            Self::LocalNetworkNode(_) => "local_network_node",
            Self::InfuraService(_) => "infura_service",
            Self::InfuraProject(_) => "infura_project",
            Self::InfuraNetworkNode(_) => "infura_network_node",
            Self::InfuraLayer(_) => "infura_layer",
            Self::ProviderService(_) => "provider_service",
            Self::ProviderProject(_) => "provider_project",
            Self::DataManagerService(_) => "data_manager_service",
            Self::DataManagerProject(_) => "data_manager_project",
            Self::DataManagerApplication(_) => "data_manager_application",
            Self::DataManagerInputGroup(_) => "data_manager_input_group",
            Self::DataManagerOutputGroup(_) => "data_manager_output_group",
        }
    }

    /// Child nodes, outermost first.
    pub fn children(&self) -> &[TreeItem] {
        match self {
            Self::Nullable(item)
            | Self::Member(item)
            | Self::InfuraLayer(item)
            | Self::DataManagerApplication(item)
            | Self::DataManagerInputGroup(item)
            | Self::DataManagerOutputGroup(item) => &item.children,
            Self::Command(item) => &item.children,
            Self::LocalService(item)
            | Self::InfuraService(item)
            | Self::ProviderService(item)
            | Self::DataManagerService(item) => &item.children,
            Self::LocalProject(item) => &item.children,
            Self::LocalNetworkNode(item) | Self::InfuraNetworkNode(item) => &item.children,
            Self::InfuraProject(item) => &item.children,
            Self::ProviderProject(item) => &item.children,
            Self::DataManagerProject(item) => &item.children,
        }
    }

    fn children_mut(&mut self) -> &mut Vec<TreeItem> {
        match self {
            Self::Nullable(item)
            | Self::Member(item)
            | Self::InfuraLayer(item)
            | Self::DataManagerApplication(item)
            | Self::DataManagerInputGroup(item)
            | Self::DataManagerOutputGroup(item) => &mut item.children,
            Self::Command(item) => &mut item.children,
            Self::LocalService(item)
            | Self::InfuraService(item)
            | Self::ProviderService(item)
            | Self::DataManagerService(item) => &mut item.children,
            Self::LocalProject(item) => &mut item.children,
            Self::LocalNetworkNode(item) | Self::InfuraNetworkNode(item) => &mut item.children,
            Self::InfuraProject(item) => &mut item.children,
            Self::ProviderProject(item) => &mut item.children,
            Self::DataManagerProject(item) => &mut item.children,
        }
    }

    /// Attach a child node. Ownership is exclusive: the caller hands the
    /// item over and it lives under this node until detached.
    pub fn add_child(&mut self, child: TreeItem) {
        self.children_mut().push(child);
    }

    /// Detach and return the first child with the given label, if any.
    pub fn remove_child(&mut self, label: &str) -> Option<TreeItem> {
        let children = self.children_mut();
        let index = children.iter().position(|c| c.label() == label)?;
        Some(children.remove(index))
    }

    /// First child with the given label.
    pub fn find_child(&self, label: &str) -> Option<&TreeItem> {
        self.children().iter().find(|c| c.label() == label)
    }

    /// Serialize this node (and its children) into the raw-record form the
    /// tree file stores. The inverse of [`crate::creators::create`].
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("itemType".into(), json!(i32::from(self.item_type())));
        record.insert("label".into(), json!(self.label()));

        match self {
            Self::Command(item) => {
                record.insert("commandId".into(), json!(item.command_id));
            }
            Self::LocalProject(item) => {
                record.insert("port".into(), json!(item.port));
            }
            Self::LocalNetworkNode(item) | Self::InfuraNetworkNode(item) => {
                record.insert("url".into(), json!(item.url));
                record.insert("networkId".into(), json!(item.network_id));
            }
            Self::InfuraProject(item) => {
                record.insert("projectId".into(), json!(item.project_id));
            }
            Self::ProviderProject(item) => {
                record.insert("subscriptionId".into(), json!(item.subscription_id));
                record.insert("resourceGroup".into(), json!(item.resource_group));
                record.insert("memberNames".into(), json!(item.member_names));
            }
            Self::DataManagerProject(item) => {
                record.insert("subscriptionId".into(), json!(item.subscription_id));
                record.insert("resourceGroup".into(), json!(item.resource_group));
            }
            _ => {}
        }

        let children: Vec<Value> = self
            .children()
            .iter()
            .map(|c| Value::Object(c.to_record()))
            .collect();
        record.insert("children".into(), Value::Array(children));
        record
    }
}
