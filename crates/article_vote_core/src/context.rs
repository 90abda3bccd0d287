//! Per-request caller context.
//!
//! Replaces ambient request state (remote address, form globals, logged-in
//! user). Every service operation receives the context explicitly.

use crate::model::vote::{VoterIdentity, VoterIdentityError};

/// Who is calling, as established by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub identity: VoterIdentity,
    pub credentials: RequesterCredentials,
}

impl RequestContext {
    pub fn new(identity: VoterIdentity, credentials: RequesterCredentials) -> Self {
        Self {
            identity,
            credentials,
        }
    }

    /// Context for an unauthenticated reader at `remote_addr`.
    pub fn anonymous(remote_addr: &str) -> Result<Self, VoterIdentityError> {
        Ok(Self::new(
            VoterIdentity::from_remote_addr(remote_addr)?,
            RequesterCredentials::anonymous(),
        ))
    }
}

/// Authenticated principal and the capabilities the transport verified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequesterCredentials {
    principal: Option<String>,
    granted_capabilities: Vec<String>,
}

impl RequesterCredentials {
    pub fn new(principal: impl Into<String>, granted_capabilities: Vec<String>) -> Self {
        Self {
            principal: Some(principal.into()),
            granted_capabilities,
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    pub fn granted_capabilities(&self) -> &[String] {
        &self.granted_capabilities
    }
}
