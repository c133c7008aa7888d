//! The connect-project and disconnect-project command flows.
//!
//! `connect_project` walks SelectGroup → service-specific flow → build via
//! the creator registry → attach + persist. Every prompt and every
//! local-network call is a suspension point; cancellation or failure at any
//! of them rejects the whole flow, and a rejected flow never leaves a
//! persisted change behind (a failed save rolls the in-memory attach back).

use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use chainview_core::error::ChainviewError;
use chainview_core::interaction::{Choice, PromptError, UserInteraction};
use chainview_models::{creators, ItemType, Record, TreeItem, ValidationError};
use chainview_services::explorers::{ExplorerError, ExplorerRegistry};
use chainview_services::local_network::{LocalNetwork, NetworkError, PortStatus};
use chainview_services::tree_manager::{StoreError, TreeManager};

/// Why a command flow was rejected. Nothing is retried; re-running the
/// command is the caller's decision.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("operation cancelled")]
    Cancelled,

    #[error("port {0} is occupied by an incompatible process")]
    PortConflict(u16),

    #[error("authentication unavailable for {0}")]
    AuthUnavailable(String),

    #[error("project `{0}` is already connected")]
    Duplicate(String),

    #[error("no resource explorer registered for {0:?}")]
    MissingCollaborator(ItemType),

    #[error("unknown service selection `{0}`")]
    UnknownSelection(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("local network error: {0}")]
    Network(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<PromptError> for ConnectError {
    fn from(_: PromptError) -> Self {
        Self::Cancelled
    }
}

impl From<ExplorerError> for ConnectError {
    fn from(err: ExplorerError) -> Self {
        match err {
            ExplorerError::Cancelled => Self::Cancelled,
            ExplorerError::AuthUnavailable(provider) => Self::AuthUnavailable(provider.into()),
            ExplorerError::Api(msg) => Self::Provider(msg),
            ExplorerError::Duplicate(label) => Self::Duplicate(label),
        }
    }
}

impl From<NetworkError> for ConnectError {
    fn from(err: NetworkError) -> Self {
        match err {
            NetworkError::PortConflict(port) => Self::PortConflict(port),
            other => Self::Network(other.to_string()),
        }
    }
}

/// Flatten a command rejection into the host-facing taxonomy, so frontends
/// route everything through [`ChainviewError::category`] and
/// [`ChainviewError::user_message`] without matching per-layer enums.
impl From<ConnectError> for ChainviewError {
    fn from(err: ConnectError) -> Self {
        match err {
            ConnectError::Cancelled => Self::Cancelled,
            ConnectError::PortConflict(port) => Self::PortConflict(port),
            ConnectError::AuthUnavailable(provider) => Self::AuthUnavailable(provider),
            ConnectError::Duplicate(_)
            | ConnectError::UnknownSelection(_)
            | ConnectError::InvalidInput(_) => Self::Validation(err.to_string()),
            ConnectError::Validation(e) => Self::Validation(e.to_string()),
            ConnectError::MissingCollaborator(_) => Self::Internal(err.to_string()),
            ConnectError::Provider(_) | ConnectError::Network(_) => Self::Network(err.to_string()),
            ConnectError::Store(e) => Self::Storage(e.to_string()),
        }
    }
}

/// The service command surface. Collaborators are injected per instance so
/// hosts and tests can wire their own.
pub struct ServiceCommands<'a> {
    tree: &'a mut TreeManager,
    interaction: &'a dyn UserInteraction,
    local_network: &'a dyn LocalNetwork,
    explorers: &'a ExplorerRegistry,
}

impl<'a> ServiceCommands<'a> {
    pub fn new(
        tree: &'a mut TreeManager,
        interaction: &'a dyn UserInteraction,
        local_network: &'a dyn LocalNetwork,
        explorers: &'a ExplorerRegistry,
    ) -> Self {
        Self {
            tree,
            interaction,
            local_network,
            explorers,
        }
    }

    /// Connect a new project under a service group and persist the tree.
    ///
    /// `focused` is the service group the host currently has selected, if
    /// any; without one the user is asked to pick a group first. Returns the
    /// newly attached project item.
    pub async fn connect_project(
        &mut self,
        focused: Option<ItemType>,
    ) -> Result<TreeItem, ConnectError> {
        let group_type = self.select_group(focused).await?;
        let existing: Vec<String> = self
            .tree
            .get_item(group_type)
            .map(|group| group.children().iter().map(|c| c.label().to_string()).collect())
            .unwrap_or_default();

        let record = match group_type {
            ItemType::LocalService => self.local_project_record(&existing).await?,
            service => self.hosted_project_record(service, &existing).await?,
        };

        // The creator registry is the only construction path; a malformed
        // record from any sub-flow dies here, before the tree is touched.
        let item = creators::create_from_record(&record)?;
        let label = item.label().to_string();

        self.tree.attach_child(group_type, item.clone())?;
        if let Err(err) = self.tree.save_state() {
            // Attach+persist is one logical unit: undo the attach so the
            // caller observes no change at all.
            let _ = self.tree.detach_child(group_type, &label);
            warn!(group = ?group_type, %label, error = %err, "Persist failed, attach rolled back");
            return Err(err.into());
        }

        info!(group = ?group_type, %label, "Project connected");
        Ok(item)
    }

    /// Disconnect a project from its group and persist the tree. Local
    /// projects also get their node stopped.
    pub async fn disconnect_project(
        &mut self,
        group_type: ItemType,
        label: &str,
    ) -> Result<(), ConnectError> {
        let item = self.tree.detach_child(group_type, label)?;

        if let Err(err) = self.tree.save_state() {
            let _ = self.tree.attach_child(group_type, item);
            warn!(group = ?group_type, %label, error = %err, "Persist failed, detach rolled back");
            return Err(err.into());
        }

        if let TreeItem::LocalProject(project) = &item {
            if let Err(err) = self.local_network.stop(project.port).await {
                warn!(port = project.port, error = %err, "Failed to stop local node");
            }
        }

        info!(group = ?group_type, %label, "Project disconnected");
        Ok(())
    }

    /// SelectGroup: resolve the target group from the focused node, or
    /// prompt over the known top-level service groups.
    async fn select_group(&self, focused: Option<ItemType>) -> Result<ItemType, ConnectError> {
        if let Some(item_type) = focused {
            if item_type.is_service() && self.tree.get_item(item_type).is_some() {
                return Ok(item_type);
            }
        }

        let options: Vec<Choice> = self
            .tree
            .items()
            .iter()
            .filter(|item| item.item_type().is_service())
            .map(|item| Choice::new(item.label()))
            .collect();
        let picked = self
            .interaction
            .choose("Select the service to connect to", &options)
            .await?;

        ItemType::services()
            .into_iter()
            .find(|service| service.label() == picked.label)
            .ok_or(ConnectError::UnknownSelection(picked.label))
    }

    /// Local sub-flow: prompt name and port, check the port, start the node.
    async fn local_project_record(&self, existing: &[String]) -> Result<Record, ConnectError> {
        let name_validator = move |input: &str| -> Result<(), String> {
            let trimmed = input.trim();
            if trimmed.is_empty() {
                return Err("Project name must not be empty".into());
            }
            if existing.iter().any(|label| label == trimmed) {
                return Err(format!("`{trimmed}` is already connected"));
            }
            Ok(())
        };
        let name = self
            .interaction
            .input_text("Enter the local project name", &name_validator)
            .await?;

        let port_validator = |input: &str| -> Result<(), String> {
            match input.trim().parse::<u16>() {
                Ok(port) if port >= 1 => Ok(()),
                _ => Err("Port must be a number between 1 and 65535".into()),
            }
        };
        let port_text = self
            .interaction
            .input_text("Enter the port", &port_validator)
            .await?;
        let port: u16 = port_text
            .trim()
            .parse()
            .map_err(|_| ConnectError::InvalidInput(port_text.clone()))?;

        if self.local_network.get_port_status(port).await == PortStatus::NotCompatible {
            return Err(ConnectError::PortConflict(port));
        }
        self.local_network.start(port).await?;

        let mut record = Record::new();
        record.insert("itemType".into(), json!(i32::from(ItemType::LocalProject)));
        record.insert("label".into(), json!(name.trim()));
        record.insert("port".into(), json!(port));
        Ok(record)
    }

    /// Hosted sub-flow: delegate to the group's resource explorer.
    async fn hosted_project_record(
        &self,
        service: ItemType,
        existing: &[String],
    ) -> Result<Record, ConnectError> {
        let project_kind = service
            .project_kind()
            .ok_or(ConnectError::MissingCollaborator(service))?;
        let explorer = self
            .explorers
            .get(service)
            .ok_or(ConnectError::MissingCollaborator(service))?;

        let descriptor = explorer.select_project(existing).await?;

        let mut record = descriptor.fields;
        record.insert("itemType".into(), json!(i32::from(project_kind)));
        record.insert("label".into(), json!(descriptor.label));
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chainview_core::interaction::InputValidator;
    use chainview_services::explorers::{ProjectDescriptor, ResourceExplorer};
    use parking_lot::Mutex;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Arc;

    // -----------------------------------------------------------------------
    // Fakes
    // -----------------------------------------------------------------------

    /// Deterministic prompt responses: each entry is the label to pick / the
    /// text to enter, `None` for a cancelled prompt.
    struct ScriptedInteraction {
        picks: Mutex<VecDeque<Option<String>>>,
        inputs: Mutex<VecDeque<Option<String>>>,
    }

    impl ScriptedInteraction {
        fn new(picks: &[Option<&str>], inputs: &[Option<&str>]) -> Self {
            Self {
                picks: Mutex::new(picks.iter().map(|p| p.map(str::to_string)).collect()),
                inputs: Mutex::new(inputs.iter().map(|i| i.map(str::to_string)).collect()),
            }
        }
    }

    #[async_trait]
    impl UserInteraction for ScriptedInteraction {
        async fn choose(
            &self,
            _placeholder: &str,
            options: &[Choice],
        ) -> Result<Choice, PromptError> {
            let wanted = self
                .picks
                .lock()
                .pop_front()
                .flatten()
                .ok_or(PromptError::Cancelled)?;
            options
                .iter()
                .find(|option| option.label == wanted)
                .cloned()
                .ok_or(PromptError::Cancelled)
        }

        async fn input_text(
            &self,
            _prompt: &str,
            validator: InputValidator<'_>,
        ) -> Result<String, PromptError> {
            let value = self
                .inputs
                .lock()
                .pop_front()
                .flatten()
                .ok_or(PromptError::Cancelled)?;
            // A real host re-prompts on invalid input; scripted input is
            // expected to be valid.
            validator(&value).map_err(|_| PromptError::Cancelled)?;
            Ok(value)
        }
    }

    struct FakeNetwork {
        status: PortStatus,
        start_calls: Mutex<Vec<u16>>,
        stop_calls: Mutex<Vec<u16>>,
    }

    impl FakeNetwork {
        fn with_status(status: PortStatus) -> Self {
            Self {
                status,
                start_calls: Mutex::new(Vec::new()),
                stop_calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LocalNetwork for FakeNetwork {
        async fn get_port_status(&self, _port: u16) -> PortStatus {
            self.status
        }

        async fn start(&self, port: u16) -> Result<(), NetworkError> {
            if self.status == PortStatus::NotCompatible {
                return Err(NetworkError::PortConflict(port));
            }
            self.start_calls.lock().push(port);
            Ok(())
        }

        async fn stop(&self, port: u16) -> Result<(), NetworkError> {
            self.stop_calls.lock().push(port);
            Ok(())
        }
    }

    struct FakeExplorer {
        response: Mutex<Option<Result<ProjectDescriptor, ExplorerError>>>,
        calls: Arc<Mutex<usize>>,
    }

    impl FakeExplorer {
        fn returning(
            response: Result<ProjectDescriptor, ExplorerError>,
        ) -> (Box<dyn ResourceExplorer>, Arc<Mutex<usize>>) {
            let calls = Arc::new(Mutex::new(0));
            let explorer = Box::new(Self {
                response: Mutex::new(Some(response)),
                calls: calls.clone(),
            });
            (explorer, calls)
        }
    }

    #[async_trait]
    impl ResourceExplorer for FakeExplorer {
        fn provider_name(&self) -> &'static str {
            "Fake"
        }

        async fn select_project(
            &self,
            _existing_labels: &[String],
        ) -> Result<ProjectDescriptor, ExplorerError> {
            *self.calls.lock() += 1;
            self.response
                .lock()
                .take()
                .expect("select_project called more than once")
        }
    }

    fn open_tree(dir: &std::path::Path) -> TreeManager {
        TreeManager::open(dir.join("tree.json")).unwrap()
    }

    fn descriptor(label: &str, fields: &[(&str, serde_json::Value)]) -> ProjectDescriptor {
        let mut record = Record::new();
        for (name, value) in fields {
            record.insert((*name).into(), value.clone());
        }
        ProjectDescriptor {
            label: label.into(),
            fields: record,
        }
    }

    // -----------------------------------------------------------------------
    // Connect: local service
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn connects_local_project_when_port_is_free() {
        let tmp = tempfile::tempdir().unwrap();
        let mut tree = open_tree(tmp.path());
        let interaction =
            ScriptedInteraction::new(&[Some("Local Service")], &[Some("localProjectName"), Some("8545")]);
        let network = FakeNetwork::with_status(PortStatus::Free);
        let explorers = ExplorerRegistry::new();

        let result = ServiceCommands::new(&mut tree, &interaction, &network, &explorers)
            .connect_project(None)
            .await
            .unwrap();

        assert_eq!(result.item_type(), ItemType::LocalProject);
        assert_eq!(result.label(), "localProjectName");
        assert_eq!(result.context_value(), "local_project");
        assert_eq!(*network.start_calls.lock(), vec![8545]);

        // The attach was persisted.
        let reloaded = open_tree(tmp.path());
        let group = reloaded.get_item(ItemType::LocalService).unwrap();
        assert_eq!(group.children().len(), 1);
        assert_eq!(group.children()[0].label(), "localProjectName");
    }

    #[tokio::test]
    async fn focused_group_skips_the_group_prompt() {
        let tmp = tempfile::tempdir().unwrap();
        let mut tree = open_tree(tmp.path());
        // No picks scripted: any quick-pick would cancel the flow.
        let interaction = ScriptedInteraction::new(&[], &[Some("dev"), Some("7545")]);
        let network = FakeNetwork::with_status(PortStatus::Free);
        let explorers = ExplorerRegistry::new();

        let result = ServiceCommands::new(&mut tree, &interaction, &network, &explorers)
            .connect_project(Some(ItemType::LocalService))
            .await
            .unwrap();

        assert_eq!(result.label(), "dev");
        assert_eq!(*network.start_calls.lock(), vec![7545]);
    }

    #[tokio::test]
    async fn cancelled_group_prompt_rejects_before_any_sub_flow() {
        let tmp = tempfile::tempdir().unwrap();
        let mut tree = open_tree(tmp.path());
        let interaction = ScriptedInteraction::new(&[None], &[]);
        let network = FakeNetwork::with_status(PortStatus::Free);
        let (explorer, calls) = FakeExplorer::returning(Ok(descriptor("x", &[])));
        let mut explorers = ExplorerRegistry::new();
        explorers.register(ItemType::InfuraService, explorer);

        let result = ServiceCommands::new(&mut tree, &interaction, &network, &explorers)
            .connect_project(None)
            .await;

        assert!(matches!(result, Err(ConnectError::Cancelled)));
        assert!(network.start_calls.lock().is_empty());
        assert_eq!(*calls.lock(), 0);
    }

    #[tokio::test]
    async fn cancelled_name_prompt_rejects_without_touching_the_port() {
        let tmp = tempfile::tempdir().unwrap();
        let mut tree = open_tree(tmp.path());
        // Incompatible occupant and a cancelled name prompt: the flow must
        // die at the prompt, before any port check or start.
        let interaction = ScriptedInteraction::new(&[Some("Local Service")], &[None]);
        let network = FakeNetwork::with_status(PortStatus::NotCompatible);
        let explorers = ExplorerRegistry::new();

        let result = ServiceCommands::new(&mut tree, &interaction, &network, &explorers)
            .connect_project(None)
            .await;

        assert!(matches!(result, Err(ConnectError::Cancelled)));
        assert!(network.start_calls.lock().is_empty());
    }

    #[tokio::test]
    async fn incompatible_port_rejects_without_start() {
        let tmp = tempfile::tempdir().unwrap();
        let mut tree = open_tree(tmp.path());
        let interaction =
            ScriptedInteraction::new(&[Some("Local Service")], &[Some("dev"), Some("8545")]);
        let network = FakeNetwork::with_status(PortStatus::NotCompatible);
        let explorers = ExplorerRegistry::new();

        let result = ServiceCommands::new(&mut tree, &interaction, &network, &explorers)
            .connect_project(None)
            .await;

        assert!(matches!(result, Err(ConnectError::PortConflict(8545))));
        assert!(network.start_calls.lock().is_empty());

        // Nothing was persisted either.
        let reloaded = open_tree(tmp.path());
        assert!(reloaded
            .get_item(ItemType::LocalService)
            .unwrap()
            .children()
            .is_empty());
    }

    #[tokio::test]
    async fn already_running_node_is_reused() {
        let tmp = tempfile::tempdir().unwrap();
        let mut tree = open_tree(tmp.path());
        let interaction =
            ScriptedInteraction::new(&[Some("Local Service")], &[Some("dev"), Some("8545")]);
        let network = FakeNetwork::with_status(PortStatus::Running);
        let explorers = ExplorerRegistry::new();

        let result = ServiceCommands::new(&mut tree, &interaction, &network, &explorers)
            .connect_project(None)
            .await
            .unwrap();

        assert_eq!(result.item_type(), ItemType::LocalProject);
    }

    // -----------------------------------------------------------------------
    // Connect: hosted providers
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn connects_infura_project_through_its_explorer() {
        let tmp = tempfile::tempdir().unwrap();
        let mut tree = open_tree(tmp.path());
        let interaction = ScriptedInteraction::new(&[Some("Infura Service")], &[]);
        let network = FakeNetwork::with_status(PortStatus::Free);
        let (explorer, calls) =
            FakeExplorer::returning(Ok(descriptor("mainnet", &[("projectId", json!("abc123"))])));
        let mut explorers = ExplorerRegistry::new();
        explorers.register(ItemType::InfuraService, explorer);

        let result = ServiceCommands::new(&mut tree, &interaction, &network, &explorers)
            .connect_project(None)
            .await
            .unwrap();

        assert_eq!(*calls.lock(), 1);
        assert_eq!(result.item_type(), ItemType::InfuraProject);
        assert_eq!(result.label(), "mainnet");
        match &result {
            TreeItem::InfuraProject(project) => assert_eq!(project.project_id, "abc123"),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[tokio::test]
    async fn connects_provider_project_with_identifiers() {
        let tmp = tempfile::tempdir().unwrap();
        let mut tree = open_tree(tmp.path());
        let interaction = ScriptedInteraction::new(&[Some("Provider Service")], &[]);
        let network = FakeNetwork::with_status(PortStatus::Free);
        let (explorer, _calls) = FakeExplorer::returning(Ok(descriptor(
            "consortium",
            &[
                ("subscriptionId", json!("sub-1")),
                ("resourceGroup", json!("rg-1")),
                ("memberNames", json!(["alice", "bob"])),
            ],
        )));
        let mut explorers = ExplorerRegistry::new();
        explorers.register(ItemType::ProviderService, explorer);

        let result = ServiceCommands::new(&mut tree, &interaction, &network, &explorers)
            .connect_project(None)
            .await
            .unwrap();

        assert_eq!(result.item_type(), ItemType::ProviderProject);
        assert_eq!(result.label(), "consortium");
        match &result {
            TreeItem::ProviderProject(project) => {
                assert_eq!(project.member_names, vec!["alice", "bob"]);
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[tokio::test]
    async fn connects_data_manager_project_through_its_explorer() {
        let tmp = tempfile::tempdir().unwrap();
        let mut tree = open_tree(tmp.path());
        let interaction = ScriptedInteraction::new(&[Some("Data Manager Service")], &[]);
        let network = FakeNetwork::with_status(PortStatus::Free);
        let (explorer, _calls) = FakeExplorer::returning(Ok(descriptor(
            "dm-1",
            &[
                ("subscriptionId", json!("sub-9")),
                ("resourceGroup", json!("rg-9")),
            ],
        )));
        let mut explorers = ExplorerRegistry::new();
        explorers.register(ItemType::DataManagerService, explorer);

        let result = ServiceCommands::new(&mut tree, &interaction, &network, &explorers)
            .connect_project(None)
            .await
            .unwrap();

        assert_eq!(result.item_type(), ItemType::DataManagerProject);
        assert_eq!(result.label(), "dm-1");
    }

    #[tokio::test]
    async fn missing_explorer_is_a_rejection() {
        let tmp = tempfile::tempdir().unwrap();
        let mut tree = open_tree(tmp.path());
        let interaction = ScriptedInteraction::new(&[], &[]);
        let network = FakeNetwork::with_status(PortStatus::Free);
        let explorers = ExplorerRegistry::new();

        let result = ServiceCommands::new(&mut tree, &interaction, &network, &explorers)
            .connect_project(Some(ItemType::DataManagerService))
            .await;

        assert!(matches!(
            result,
            Err(ConnectError::MissingCollaborator(ItemType::DataManagerService))
        ));
    }

    #[tokio::test]
    async fn explorer_cancellation_persists_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let mut tree = open_tree(tmp.path());
        let interaction = ScriptedInteraction::new(&[], &[]);
        let network = FakeNetwork::with_status(PortStatus::Free);
        let (explorer, _calls) = FakeExplorer::returning(Err(ExplorerError::Cancelled));
        let mut explorers = ExplorerRegistry::new();
        explorers.register(ItemType::InfuraService, explorer);

        let result = ServiceCommands::new(&mut tree, &interaction, &network, &explorers)
            .connect_project(Some(ItemType::InfuraService))
            .await;

        assert!(matches!(result, Err(ConnectError::Cancelled)));
        assert!(tree
            .get_item(ItemType::InfuraService)
            .unwrap()
            .children()
            .is_empty());
    }

    #[tokio::test]
    async fn malformed_descriptor_fails_validation_before_attach() {
        let tmp = tempfile::tempdir().unwrap();
        let mut tree = open_tree(tmp.path());
        let interaction = ScriptedInteraction::new(&[], &[]);
        let network = FakeNetwork::with_status(PortStatus::Free);
        // Descriptor lacks the projectId the Infura project kind requires.
        let (explorer, _calls) = FakeExplorer::returning(Ok(descriptor("mainnet", &[])));
        let mut explorers = ExplorerRegistry::new();
        explorers.register(ItemType::InfuraService, explorer);

        let result = ServiceCommands::new(&mut tree, &interaction, &network, &explorers)
            .connect_project(Some(ItemType::InfuraService))
            .await;

        assert!(matches!(
            result,
            Err(ConnectError::Validation(ValidationError::MissingField(field))) if field == "projectId"
        ));
        assert!(tree
            .get_item(ItemType::InfuraService)
            .unwrap()
            .children()
            .is_empty());
    }

    // -----------------------------------------------------------------------
    // Persist failure & disconnect
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn persist_failure_rolls_back_the_attach() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("store");
        std::fs::create_dir(&dir).unwrap();
        let mut tree = open_tree(&dir);

        // Make the store unwritable after opening.
        std::fs::remove_dir_all(&dir).unwrap();
        std::fs::write(&dir, "blocked").unwrap();

        let interaction =
            ScriptedInteraction::new(&[Some("Local Service")], &[Some("dev"), Some("8545")]);
        let network = FakeNetwork::with_status(PortStatus::Free);
        let explorers = ExplorerRegistry::new();

        let result = ServiceCommands::new(&mut tree, &interaction, &network, &explorers)
            .connect_project(None)
            .await;

        assert!(matches!(result, Err(ConnectError::Store(StoreError::Persist(_)))));
        // The in-memory attach was rolled back.
        assert!(tree
            .get_item(ItemType::LocalService)
            .unwrap()
            .children()
            .is_empty());
    }

    #[tokio::test]
    async fn disconnect_removes_persists_and_stops_the_node() {
        let tmp = tempfile::tempdir().unwrap();
        let mut tree = open_tree(tmp.path());
        let interaction =
            ScriptedInteraction::new(&[Some("Local Service")], &[Some("dev"), Some("8545")]);
        let network = FakeNetwork::with_status(PortStatus::Free);
        let explorers = ExplorerRegistry::new();

        {
            let mut commands = ServiceCommands::new(&mut tree, &interaction, &network, &explorers);
            commands.connect_project(None).await.unwrap();
            commands
                .disconnect_project(ItemType::LocalService, "dev")
                .await
                .unwrap();
        }

        assert_eq!(*network.stop_calls.lock(), vec![8545]);
        assert!(tree
            .get_item(ItemType::LocalService)
            .unwrap()
            .children()
            .is_empty());

        let reloaded = open_tree(tmp.path());
        assert!(reloaded
            .get_item(ItemType::LocalService)
            .unwrap()
            .children()
            .is_empty());
    }

    #[tokio::test]
    async fn disconnect_of_unknown_project_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mut tree = open_tree(tmp.path());
        let interaction = ScriptedInteraction::new(&[], &[]);
        let network = FakeNetwork::with_status(PortStatus::Free);
        let explorers = ExplorerRegistry::new();

        let result = ServiceCommands::new(&mut tree, &interaction, &network, &explorers)
            .disconnect_project(ItemType::LocalService, "ghost")
            .await;

        assert!(matches!(
            result,
            Err(ConnectError::Store(StoreError::ProjectNotFound(_, _)))
        ));
    }

    #[tokio::test]
    async fn duplicate_remote_project_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let mut tree = open_tree(tmp.path());
        let interaction = ScriptedInteraction::new(&[], &[]);
        let network = FakeNetwork::with_status(PortStatus::Free);
        let (explorer, _calls) =
            FakeExplorer::returning(Err(ExplorerError::Duplicate("mainnet".into())));
        let mut explorers = ExplorerRegistry::new();
        explorers.register(ItemType::InfuraService, explorer);

        let result = ServiceCommands::new(&mut tree, &interaction, &network, &explorers)
            .connect_project(Some(ItemType::InfuraService))
            .await;

        assert!(matches!(result, Err(ConnectError::Duplicate(label)) if label == "mainnet"));
    }

    #[test]
    fn rejections_flatten_into_the_host_taxonomy() {
        use chainview_core::error::ErrorCategory;

        let flat = ChainviewError::from(ConnectError::PortConflict(8545));
        assert!(matches!(flat, ChainviewError::PortConflict(8545)));
        assert_eq!(flat.category(), ErrorCategory::NetworkError);

        let flat = ChainviewError::from(ConnectError::Cancelled);
        assert_eq!(flat.category(), ErrorCategory::UserError);

        let flat = ChainviewError::from(ConnectError::AuthUnavailable("Infura".into()));
        assert_eq!(flat.category(), ErrorCategory::ProviderError);

        let flat = ChainviewError::from(ConnectError::Validation(
            ValidationError::MissingField("port".into()),
        ));
        assert!(matches!(flat, ChainviewError::Validation(msg) if msg.contains("port")));

        let flat = ChainviewError::from(ConnectError::Store(StoreError::Persist(
            "disk full".into(),
        )));
        assert_eq!(flat.category(), ErrorCategory::SystemError);
    }
}
