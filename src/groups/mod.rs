//! Group handles: role lists, member lookup, audit-log pages.

pub mod audit;
pub mod member;

use std::sync::Arc;

use serde::Deserialize;

use crate::error::Result;
use crate::http::{Transport, GROUPS_BASE};
use crate::partials::{GroupRef, PartialUser};
use self::audit::{AuditLogPage, AuditLogQuery};
use self::member::Member;

/// A role in a group's hierarchy. Rank 0 is the reserved guest rank.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: u64,
    pub name: String,
    pub rank: u8,
    #[serde(default)]
    pub member_count: Option<u64>,
}

/// Handle on a single group.
pub struct Group {
    transport: Arc<dyn Transport>,
    id: u64,
}

impl Group {
    pub(crate) fn new(transport: Arc<dyn Transport>, id: u64) -> Self {
        Self { transport, id }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Lightweight reference for entities that point back at this group.
    pub fn as_ref(&self) -> GroupRef {
        GroupRef {
            id: self.id,
            name: None,
        }
    }

    /// Fetches the group's full ordered role list.
    ///
    /// Never cached: every call re-reads the remote list, in the order the
    /// API returns it.
    pub async fn roles(&self) -> Result<Vec<Role>> {
        fetch_roles(self.transport.as_ref(), self.id).await
    }

    /// Builds a membership snapshot for `user`, reading their current role.
    /// Fails with [`crate::ApiError::NotInGroup`] when they hold none.
    pub async fn member(&self, user: PartialUser) -> Result<Member> {
        Member::load(self.transport.clone(), user, self.as_ref()).await
    }

    /// Convenience for [`Group::member`] when only the user id is known.
    pub async fn member_by_id(&self, user_id: u64) -> Result<Member> {
        self.member(PartialUser::from_id(user_id)).await
    }

    /// Fetches one page of the group's audit log, each entry decoded to its
    /// typed form. A single undecodable entry fails the whole page.
    pub async fn audit_logs(&self, query: &AuditLogQuery) -> Result<AuditLogPage> {
        audit::fetch_page(self.transport.as_ref(), &self.as_ref(), query).await
    }
}

#[derive(Deserialize)]
struct RoleListResponse {
    roles: Vec<Role>,
}

pub(crate) async fn fetch_roles(transport: &dyn Transport, group_id: u64) -> Result<Vec<Role>> {
    let raw = transport
        .get(&format!("{GROUPS_BASE}/v1/groups/{group_id}/roles"), &[])
        .await?;
    let response: RoleListResponse = serde_json::from_value(raw)?;
    Ok(response.roles)
}
