//! Authorization seam for privileged vote operations.
//!
//! Authentication lives outside the core. The transport attaches whatever
//! capabilities it verified to `RequesterCredentials`; the core only asks an
//! `AccessControl` implementation whether those cover the operation.

mod capability;

pub use capability::{
    parse_admin_capability, AccessControl, AdminCapability, AdminCapabilityError,
    GrantedCapabilityAccess, ADMIN_CAPABILITY_MANAGE_OPTIONS,
};
