//! Persistence store for the service/project tree.
//!
//! The tree is one JSON document: an array of root records in the raw-record
//! form the creator layer validates. Loading always goes through the
//! creators, so a corrupt or hand-edited file fails loudly instead of
//! producing half-typed nodes.

use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use chainview_models::{creators, ItemType, ServiceGroup, TreeItem, ValidationError};

/// Errors from loading or saving the tree.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read tree file: {0}")]
    Read(String),

    #[error("tree file is not a JSON array: {0}")]
    Parse(String),

    #[error("corrupt tree record: {0}")]
    Corrupt(#[from] ValidationError),

    #[error("failed to persist tree: {0}")]
    Persist(String),

    #[error("no {0:?} group in the tree")]
    UnknownGroup(ItemType),

    #[error("no project `{0}` under {1:?}")]
    ProjectNotFound(String, ItemType),
}

/// The tree store. One instance owns one tree file; hosts and tests inject
/// their own instances rather than sharing a global.
#[derive(Debug)]
pub struct TreeManager {
    path: PathBuf,
    roots: Vec<TreeItem>,
}

impl TreeManager {
    /// Open the store at `path`, loading the persisted tree. A missing file
    /// yields the default top-level service groups.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let roots = Self::load_state(&path)?;
        info!(path = %path.display(), roots = roots.len(), "Tree loaded");
        Ok(Self { path, roots })
    }

    /// Read and validate the persisted root items.
    fn load_state(path: &Path) -> Result<Vec<TreeItem>, StoreError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No tree file, starting with defaults");
                return Ok(Self::default_roots());
            }
            Err(e) => return Err(StoreError::Read(e.to_string())),
        };

        let value: Value =
            serde_json::from_str(&content).map_err(|e| StoreError::Parse(e.to_string()))?;
        let records = value
            .as_array()
            .ok_or_else(|| StoreError::Parse("expected a top-level array".into()))?;

        records
            .iter()
            .map(|record| creators::create(record).map_err(StoreError::from))
            .collect()
    }

    /// The four empty service groups a fresh tree starts with.
    fn default_roots() -> Vec<TreeItem> {
        vec![
            TreeItem::LocalService(ServiceGroup::default()),
            TreeItem::InfuraService(ServiceGroup::default()),
            TreeItem::ProviderService(ServiceGroup::default()),
            TreeItem::DataManagerService(ServiceGroup::default()),
        ]
    }

    /// All root items.
    pub fn items(&self) -> &[TreeItem] {
        &self.roots
    }

    /// The root item of the given kind, if present.
    pub fn get_item(&self, item_type: ItemType) -> Option<&TreeItem> {
        self.roots.iter().find(|item| item.item_type() == item_type)
    }

    /// Attach `child` under the root group of kind `group_type`.
    pub fn attach_child(
        &mut self,
        group_type: ItemType,
        child: TreeItem,
    ) -> Result<(), StoreError> {
        let group = self
            .roots
            .iter_mut()
            .find(|item| item.item_type() == group_type)
            .ok_or(StoreError::UnknownGroup(group_type))?;
        group.add_child(child);
        Ok(())
    }

    /// Detach and return the child labeled `label` from the root group of
    /// kind `group_type`.
    pub fn detach_child(
        &mut self,
        group_type: ItemType,
        label: &str,
    ) -> Result<TreeItem, StoreError> {
        let group = self
            .roots
            .iter_mut()
            .find(|item| item.item_type() == group_type)
            .ok_or(StoreError::UnknownGroup(group_type))?;
        group
            .remove_child(label)
            .ok_or_else(|| StoreError::ProjectNotFound(label.into(), group_type))
    }

    /// Persist the tree. Writes to a temp file and renames it over the old
    /// one so a failed write never truncates the existing tree.
    pub fn save_state(&self) -> Result<(), StoreError> {
        let records: Vec<Value> = self
            .roots
            .iter()
            .map(|item| Value::Object(item.to_record()))
            .collect();
        let content = serde_json::to_string_pretty(&Value::Array(records))
            .map_err(|e| StoreError::Persist(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content).map_err(|e| StoreError::Persist(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StoreError::Persist(e.to_string()))?;

        debug!(path = %self.path.display(), "Tree saved");
        Ok(())
    }
}
