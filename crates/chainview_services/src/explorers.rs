//! Hosted-provider resource explorers.
//!
//! One explorer per hosted service kind. Each lists the account's remote
//! projects, lets the user pick one through the host's prompts, and returns
//! a [`ProjectDescriptor`] — the label plus the kind-specific identifier
//! fields in persisted-record form. The connect flow turns the descriptor
//! into a typed item through the creator registry; explorers never construct
//! tree items themselves.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

use chainview_core::interaction::{Choice, PromptError, UserInteraction};
use chainview_models::{ItemType, Record};
use std::sync::Arc;

/// Errors from a resource explorer.
#[derive(Debug, Error)]
pub enum ExplorerError {
    #[error("selection cancelled")]
    Cancelled,

    #[error("authentication unavailable for {0}")]
    AuthUnavailable(&'static str),

    #[error("provider API error: {0}")]
    Api(String),

    #[error("project `{0}` is already connected")]
    Duplicate(String),
}

impl From<PromptError> for ExplorerError {
    fn from(_: PromptError) -> Self {
        Self::Cancelled
    }
}

/// What an explorer hands back to the connect flow.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDescriptor {
    pub label: String,
    /// Kind-specific identifier fields, keyed by persisted field name.
    pub fields: Record,
}

/// Remote selection for one hosted service kind.
#[async_trait]
pub trait ResourceExplorer: Send + Sync {
    /// Human-readable provider name, used in prompts and errors.
    fn provider_name(&self) -> &'static str;

    /// Walk the user through picking a remote project. `existing_labels`
    /// are the projects already connected under the group; picking one of
    /// them is a duplicate, not a new connection.
    async fn select_project(
        &self,
        existing_labels: &[String],
    ) -> Result<ProjectDescriptor, ExplorerError>;
}

/// Dispatch table from service-group kind to its explorer.
#[derive(Default)]
pub struct ExplorerRegistry {
    explorers: HashMap<ItemType, Box<dyn ResourceExplorer>>,
}

impl ExplorerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, service: ItemType, explorer: Box<dyn ResourceExplorer>) {
        self.explorers.insert(service, explorer);
    }

    pub fn get(&self, service: ItemType) -> Option<&dyn ResourceExplorer> {
        self.explorers.get(&service).map(Box::as_ref)
    }
}

fn reject_duplicate(label: &str, existing: &[String]) -> Result<(), ExplorerError> {
    if existing.iter().any(|l| l == label) {
        Err(ExplorerError::Duplicate(label.to_string()))
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Infura
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct InfuraRemoteProject {
    name: String,
    id: String,
}

/// Lists the Infura account's projects and lets the user pick one.
pub struct InfuraResourceExplorer {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    interaction: Arc<dyn UserInteraction>,
}

impl InfuraResourceExplorer {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        interaction: Arc<dyn UserInteraction>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            token,
            interaction,
        }
    }

    async fn list_projects(&self, token: &str) -> Result<Vec<InfuraRemoteProject>, ExplorerError> {
        let url = format!("{}/projects", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ExplorerError::Api(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ExplorerError::Api(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| ExplorerError::Api(e.to_string()))
    }
}

#[async_trait]
impl ResourceExplorer for InfuraResourceExplorer {
    fn provider_name(&self) -> &'static str {
        "Infura"
    }

    async fn select_project(
        &self,
        existing_labels: &[String],
    ) -> Result<ProjectDescriptor, ExplorerError> {
        let token = self
            .token
            .as_deref()
            .ok_or(ExplorerError::AuthUnavailable("Infura"))?;

        let projects = self.list_projects(token).await?;
        debug!(count = projects.len(), "Listed Infura projects");

        let options: Vec<Choice> = projects
            .iter()
            .map(|p| Choice::with_detail(&p.name, &p.id))
            .collect();
        let picked = self
            .interaction
            .choose("Select an Infura project", &options)
            .await?;
        reject_duplicate(&picked.label, existing_labels)?;

        let project = projects
            .into_iter()
            .find(|p| p.name == picked.label)
            .ok_or_else(|| ExplorerError::Api("picked project disappeared".into()))?;

        let mut fields = Record::new();
        fields.insert("projectId".into(), json!(project.id));
        Ok(ProjectDescriptor {
            label: project.name,
            fields,
        })
    }
}

// ---------------------------------------------------------------------------
// Third-party provider (consortium)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RemoteConsortium {
    name: String,
    #[serde(rename = "subscriptionId")]
    subscription_id: String,
    #[serde(rename = "resourceGroup")]
    resource_group: String,
    members: Vec<String>,
}

/// Lists the provider account's consortia and lets the user pick one.
pub struct ProviderResourceExplorer {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    interaction: Arc<dyn UserInteraction>,
}

impl ProviderResourceExplorer {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        interaction: Arc<dyn UserInteraction>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            token,
            interaction,
        }
    }

    async fn list_consortia(&self, token: &str) -> Result<Vec<RemoteConsortium>, ExplorerError> {
        let url = format!("{}/consortia", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ExplorerError::Api(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ExplorerError::Api(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| ExplorerError::Api(e.to_string()))
    }
}

#[async_trait]
impl ResourceExplorer for ProviderResourceExplorer {
    fn provider_name(&self) -> &'static str {
        "Provider"
    }

    async fn select_project(
        &self,
        existing_labels: &[String],
    ) -> Result<ProjectDescriptor, ExplorerError> {
        let token = self
            .token
            .as_deref()
            .ok_or(ExplorerError::AuthUnavailable("Provider"))?;

        let consortia = self.list_consortia(token).await?;
        let options: Vec<Choice> = consortia
            .iter()
            .map(|c| Choice::with_detail(&c.name, &c.resource_group))
            .collect();
        let picked = self
            .interaction
            .choose("Select a consortium", &options)
            .await?;
        reject_duplicate(&picked.label, existing_labels)?;

        let consortium = consortia
            .into_iter()
            .find(|c| c.name == picked.label)
            .ok_or_else(|| ExplorerError::Api("picked consortium disappeared".into()))?;

        let mut fields = Record::new();
        fields.insert("subscriptionId".into(), json!(consortium.subscription_id));
        fields.insert("resourceGroup".into(), json!(consortium.resource_group));
        fields.insert("memberNames".into(), json!(consortium.members));
        Ok(ProjectDescriptor {
            label: consortium.name,
            fields,
        })
    }
}

// ---------------------------------------------------------------------------
// Data manager
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RemoteDataManager {
    name: String,
    #[serde(rename = "subscriptionId")]
    subscription_id: String,
    #[serde(rename = "resourceGroup")]
    resource_group: String,
}

/// Lists the account's data-manager instances and lets the user pick one.
pub struct DataManagerResourceExplorer {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    interaction: Arc<dyn UserInteraction>,
}

impl DataManagerResourceExplorer {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        interaction: Arc<dyn UserInteraction>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            token,
            interaction,
        }
    }

    async fn list_instances(&self, token: &str) -> Result<Vec<RemoteDataManager>, ExplorerError> {
        let url = format!("{}/instances", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ExplorerError::Api(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ExplorerError::Api(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| ExplorerError::Api(e.to_string()))
    }
}

#[async_trait]
impl ResourceExplorer for DataManagerResourceExplorer {
    fn provider_name(&self) -> &'static str {
        "Data Manager"
    }

    async fn select_project(
        &self,
        existing_labels: &[String],
    ) -> Result<ProjectDescriptor, ExplorerError> {
        let token = self
            .token
            .as_deref()
            .ok_or(ExplorerError::AuthUnavailable("Data Manager"))?;

        let instances = self.list_instances(token).await?;
        let options: Vec<Choice> = instances
            .iter()
            .map(|i| Choice::with_detail(&i.name, &i.resource_group))
            .collect();
        let picked = self
            .interaction
            .choose("Select a data manager", &options)
            .await?;
        reject_duplicate(&picked.label, existing_labels)?;

        let instance = instances
            .into_iter()
            .find(|i| i.name == picked.label)
            .ok_or_else(|| ExplorerError::Api("picked instance disappeared".into()))?;

        let mut fields = Record::new();
        fields.insert("subscriptionId".into(), json!(instance.subscription_id));
        fields.insert("resourceGroup".into(), json!(instance.resource_group));
        Ok(ProjectDescriptor {
            label: instance.name,
            fields,
        })
    }
}
