use serde::{Deserialize, Serialize};

/// Kind tag for every node in the persisted service/project tree.
///
/// The numeric values are stable persisted identifiers: they are written to
/// the tree file as-is and must never be renumbered. Gaps in the numbering
/// are reservations for retired kinds — old trees may still carry those tags,
/// and reusing a number would silently reinterpret them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
#[repr(i32)]
pub enum ItemType {
    /// Placeholder node with no behavior.
    Nullable = 0,
    // 1: INFO — retired
    /// Node that triggers a host command when activated.
    Command = 2,
    // 3: legacy consortium service — retired
    // 4..=10: legacy network groups and networks — retired
    /// A member of a third-party provider consortium.
    Member = 11,

    LocalService = 30,
    LocalProject = 31,
    LocalNetworkNode = 32,

    InfuraService = 40,
    InfuraProject = 41,
    InfuraNetworkNode = 42,
    InfuraLayer = 43,

    ProviderService = 50,
    ProviderProject = 51,

    DataManagerService = 60,
    DataManagerProject = 61,
    DataManagerApplication = 62,
    DataManagerInputGroup = 63,
    DataManagerOutputGroup = 64,
}

impl ItemType {
    /// The four top-level service groups, in display order.
    pub fn services() -> [Self; 4] {
        [
            Self::LocalService,
            Self::InfuraService,
            Self::ProviderService,
            Self::DataManagerService,
        ]
    }

    /// Whether this kind is a top-level service group.
    pub fn is_service(&self) -> bool {
        matches!(
            self,
            Self::LocalService
                | Self::InfuraService
                | Self::ProviderService
                | Self::DataManagerService
        )
    }

    /// Whether this kind is a project leaf under a service group.
    pub fn is_project(&self) -> bool {
        matches!(
            self,
            Self::LocalProject
                | Self::InfuraProject
                | Self::ProviderProject
                | Self::DataManagerProject
        )
    }

    /// The project kind owned by a service group, if this is a service.
    pub fn project_kind(&self) -> Option<Self> {
        match self {
            Self::LocalService => Some(Self::LocalProject),
            Self::InfuraService => Some(Self::InfuraProject),
            Self::ProviderService => Some(Self::ProviderProject),
            Self::DataManagerService => Some(Self::DataManagerProject),
            _ => None,
        }
    }

    /// Display label used in quick-pick menus and group headers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Nullable => "",
            Self::Command => "Command",
            Self::Member => "Member",
            Self::LocalService => "Local Service",
            Self::LocalProject => "Local Project",
            Self::LocalNetworkNode => "Local Network",
            Self::InfuraService => "Infura Service",
            Self::InfuraProject => "Infura Project",
            Self::InfuraNetworkNode => "Infura Network",
            Self::InfuraLayer => "Infura Layer",
            Self::ProviderService => "Provider Service",
            Self::ProviderProject => "Provider Project",
            Self::DataManagerService => "Data Manager Service",
            Self::DataManagerProject => "Data Manager Project",
            Self::DataManagerApplication => "Application",
            Self::DataManagerInputGroup => "Inputs",
            Self::DataManagerOutputGroup => "Outputs",
        }
    }
}

impl From<ItemType> for i32 {
    fn from(value: ItemType) -> Self {
        value as i32
    }
}

impl TryFrom<i32> for ItemType {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        let item_type = match value {
            0 => Self::Nullable,
            2 => Self::Command,
            11 => Self::Member,
            30 => Self::LocalService,
            31 => Self::LocalProject,
            32 => Self::LocalNetworkNode,
            40 => Self::InfuraService,
            41 => Self::InfuraProject,
            42 => Self::InfuraNetworkNode,
            43 => Self::InfuraLayer,
            50 => Self::ProviderService,
            51 => Self::ProviderProject,
            60 => Self::DataManagerService,
            61 => Self::DataManagerProject,
            62 => Self::DataManagerApplication,
            63 => Self::DataManagerInputGroup,
            64 => Self::DataManagerOutputGroup,
            other => return Err(format!("unknown item type tag {other}")),
        };
        Ok(item_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_stable() {
        assert_eq!(i32::from(ItemType::Nullable), 0);
        assert_eq!(i32::from(ItemType::Command), 2);
        assert_eq!(i32::from(ItemType::Member), 11);
        assert_eq!(i32::from(ItemType::LocalService), 30);
        assert_eq!(i32::from(ItemType::LocalProject), 31);
        assert_eq!(i32::from(ItemType::LocalNetworkNode), 32);
        assert_eq!(i32::from(ItemType::InfuraService), 40);
        assert_eq!(i32::from(ItemType::InfuraProject), 41);
        assert_eq!(i32::from(ItemType::InfuraNetworkNode), 42);
        assert_eq!(i32::from(ItemType::InfuraLayer), 43);
        assert_eq!(i32::from(ItemType::ProviderService), 50);
        assert_eq!(i32::from(ItemType::ProviderProject), 51);
        assert_eq!(i32::from(ItemType::DataManagerService), 60);
        assert_eq!(i32::from(ItemType::DataManagerProject), 61);
    }

    #[test]
    fn retired_tags_are_rejected() {
        // Reserved gaps must not round-trip into live kinds.
        for retired in [1, 3, 4, 5, 6, 7, 8, 9, 10] {
            assert!(ItemType::try_from(retired).is_err(), "tag {retired}");
        }
        assert!(ItemType::try_from(99).is_err());
        assert!(ItemType::try_from(-1).is_err());
    }

    #[test]
    fn live_tags_round_trip() {
        let all = [
            ItemType::Nullable,
            ItemType::Command,
            ItemType::Member,
            ItemType::LocalService,
            ItemType::LocalProject,
            ItemType::LocalNetworkNode,
            ItemType::InfuraService,
            ItemType::InfuraProject,
            ItemType::InfuraNetworkNode,
            ItemType::InfuraLayer,
            ItemType::ProviderService,
            ItemType::ProviderProject,
            ItemType::DataManagerService,
            ItemType::DataManagerProject,
            ItemType::DataManagerApplication,
            ItemType::DataManagerInputGroup,
            ItemType::DataManagerOutputGroup,
        ];
        for item_type in all {
            assert_eq!(ItemType::try_from(i32::from(item_type)), Ok(item_type));
        }
    }

    #[test]
    fn serde_uses_integer_form() {
        let json = serde_json::to_string(&ItemType::LocalProject).unwrap();
        assert_eq!(json, "31");

        let back: ItemType = serde_json::from_str("41").unwrap();
        assert_eq!(back, ItemType::InfuraProject);

        assert!(serde_json::from_str::<ItemType>("7").is_err());
    }

    #[test]
    fn service_project_pairing() {
        for service in ItemType::services() {
            assert!(service.is_service());
            let project = service.project_kind().unwrap();
            assert!(project.is_project());
        }
        assert_eq!(ItemType::LocalProject.project_kind(), None);
    }
}
