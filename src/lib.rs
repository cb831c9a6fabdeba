//! Typed client for the Roblox groups and account web APIs.
//!
//! Covers authenticated account settings, group audit logs, and group
//! membership operations (rank changes, role lookups, exile). Every
//! operation is a thin typed wrapper over one or a few HTTP calls; nothing
//! is cached, retried, or coordinated beyond the single request.
//!
//! ```no_run
//! use rbx_groups::{Client, RobloxSession};
//!
//! # async fn run() -> rbx_groups::Result<()> {
//! let client = Client::new(RobloxSession::from_env()?);
//! let group = client.group(5);
//!
//! let member = group.member_by_id(77).await?;
//! let (old_role, member) = member.promote(1).await?;
//! println!("{} -> {}", old_role.name, member.role.name);
//! # Ok(())
//! # }
//! ```

pub mod account;
pub mod error;
pub mod groups;
pub mod http;
pub mod partials;

#[cfg(test)]
pub(crate) mod test_util;

use std::sync::Arc;

pub use account::{AccountInformation, Gender};
pub use error::{ApiError, Result};
pub use groups::audit::{
    ActionKind, Actor, AuditAction, AuditLogEntry, AuditLogPage, AuditLogQuery, SortOrder,
};
pub use groups::member::Member;
pub use groups::{Group, Role};
pub use http::{RobloxSession, Transport};
pub use partials::{GroupRef, PartialGroup, PartialUser};

/// An authenticated client over the Roblox web APIs.
pub struct Client {
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Wraps an authenticated session.
    pub fn new(session: RobloxSession) -> Self {
        Self {
            transport: Arc::new(session),
        }
    }

    /// Wraps any transport implementation; how tests substitute a mock.
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Handle on a group by id.
    pub fn group(&self, id: u64) -> Group {
        Group::new(self.transport.clone(), id)
    }

    /// The authenticated user's account information.
    pub fn account(&self) -> AccountInformation {
        AccountInformation::new(self.transport.clone())
    }
}
