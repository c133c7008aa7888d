//! Collaborator services for the chainview tree: the persistence store, the
//! local test-network controller, and the hosted-provider resource explorers.

pub mod explorers;
pub mod local_network;
pub mod tree_manager;

pub use explorers::{
    DataManagerResourceExplorer, ExplorerError, ExplorerRegistry, InfuraResourceExplorer,
    ProjectDescriptor, ProviderResourceExplorer, ResourceExplorer,
};
pub use local_network::{GanacheService, LocalNetwork, NetworkError, PortStatus};
pub use tree_manager::{StoreError, TreeManager};
