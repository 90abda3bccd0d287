//! Admin capability declarations and the default grant-based check.

use crate::context::RequesterCredentials;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Capability string required for reset and statistics operations.
pub const ADMIN_CAPABILITY_MANAGE_OPTIONS: &str = "manage_options";

/// Privileged capabilities known to the vote core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AdminCapability {
    /// Site administration: reset votes, read per-article statistics.
    ManageOptions,
}

impl AdminCapability {
    /// Stable string id used by credential grants.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ManageOptions => ADMIN_CAPABILITY_MANAGE_OPTIONS,
        }
    }
}

/// Parses one capability grant string.
pub fn parse_admin_capability(value: &str) -> Result<AdminCapability, AdminCapabilityError> {
    let normalized = value.trim();
    if normalized.is_empty() {
        return Err(AdminCapabilityError::EmptyCapability);
    }

    match normalized {
        ADMIN_CAPABILITY_MANAGE_OPTIONS => Ok(AdminCapability::ManageOptions),
        other => Err(AdminCapabilityError::UnsupportedCapability(
            other.to_string(),
        )),
    }
}

/// Capability parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCapabilityError {
    EmptyCapability,
    UnsupportedCapability(String),
}

impl Display for AdminCapabilityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCapability => write!(f, "admin capability value must not be empty"),
            Self::UnsupportedCapability(value) => {
                write!(f, "admin capability is unsupported: {value}")
            }
        }
    }
}

impl Error for AdminCapabilityError {}

/// Decides whether a requester may use a privileged capability.
pub trait AccessControl {
    fn authorize(&self, credentials: &RequesterCredentials, capability: AdminCapability) -> bool;
}

/// Trusts the grants the transport attached to the credentials.
///
/// Unknown grant strings are ignored rather than failing the request; they
/// may belong to other subsystems.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrantedCapabilityAccess;

impl AccessControl for GrantedCapabilityAccess {
    fn authorize(&self, credentials: &RequesterCredentials, capability: AdminCapability) -> bool {
        credentials
            .granted_capabilities()
            .iter()
            .filter_map(|grant| parse_admin_capability(grant).ok())
            .any(|granted| granted == capability)
    }
}

impl<T: AccessControl + ?Sized> AccessControl for &T {
    fn authorize(&self, credentials: &RequesterCredentials, capability: AdminCapability) -> bool {
        (**self).authorize(credentials, capability)
    }
}
