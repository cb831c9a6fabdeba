//! Group membership and the rank controller.

use std::sync::Arc;

use log::debug;
use serde::Deserialize;
use serde_json::json;

use super::{fetch_roles, Role};
use crate::error::{ApiError, Result};
use crate::http::{Transport, GROUPS_BASE};
use crate::partials::{GroupRef, PartialUser};

/// A user's membership in a group, pinned to the role known when the
/// snapshot was taken.
///
/// Snapshots are immutable: every successful mutation returns a new
/// `Member` instead of rewriting shared state, so concurrent holders of
/// the same membership never observe a half-applied change locally. The
/// remote side is still last-write-wins; callers serialize concurrent
/// mutations themselves if they need exactly-once behavior.
#[derive(Clone)]
pub struct Member {
    transport: Arc<dyn Transport>,
    pub user: PartialUser,
    pub group: GroupRef,
    pub role: Role,
}

impl Member {
    pub(crate) async fn load(
        transport: Arc<dyn Transport>,
        user: PartialUser,
        group: GroupRef,
    ) -> Result<Member> {
        let role = fetch_current_role(transport.as_ref(), &group, &user).await?;
        Ok(Member {
            transport,
            user,
            group,
            role,
        })
    }

    /// Returns a snapshot pinned to `role` without touching the network.
    pub fn with_role(&self, role: Role) -> Member {
        Member {
            role,
            ..self.clone()
        }
    }

    /// Re-reads the member's current role from the membership listing.
    pub async fn refresh_role(&self) -> Result<Member> {
        let role = fetch_current_role(self.transport.as_ref(), &self.group, &self.user).await?;
        Ok(self.with_role(role))
    }

    /// Moves the member `delta` steps through the group's ordered role
    /// list: refresh the current role, locate it by rank equality, and
    /// patch the role at `position + delta`.
    ///
    /// Index 0 is the reserved guest rank, so the target must land in
    /// `1..roles.len()`; anything else fails with
    /// [`ApiError::RankOutOfBounds`] before any write is issued.
    ///
    /// Returns the role held before the change together with the updated
    /// snapshot.
    pub async fn change_rank(&self, delta: i64) -> Result<(Role, Member)> {
        let current = self.refresh_role().await?;
        let roles = fetch_roles(self.transport.as_ref(), self.group.id).await?;

        let position = roles
            .iter()
            .position(|r| r.rank == current.role.rank)
            .unwrap_or(roles.len());
        let requested = position as i64 + delta;
        let valid = 1..roles.len() as i64;
        if !valid.contains(&requested) {
            return Err(ApiError::RankOutOfBounds { requested, valid });
        }

        let new_role = roles[requested as usize].clone();
        set_role_id(self.transport.as_ref(), &self.group, &self.user, new_role.id).await?;
        debug!(
            "user {} in group {}: rank {} -> {}",
            self.user.id, self.group.id, current.role.rank, new_role.rank
        );
        Ok((current.role, self.with_role(new_role)))
    }

    /// Moves the member up `steps` roles. `promote(1)` is the usual
    /// single-step promotion.
    pub async fn promote(&self, steps: u32) -> Result<(Role, Member)> {
        self.change_rank(i64::from(steps)).await
    }

    /// Moves the member down `steps` roles.
    pub async fn demote(&self, steps: u32) -> Result<(Role, Member)> {
        self.change_rank(-i64::from(steps)).await
    }

    /// Assigns the role with the given role id directly, then refreshes.
    pub async fn set_rank(&self, role_id: u64) -> Result<Member> {
        set_role_id(self.transport.as_ref(), &self.group, &self.user, role_id).await?;
        self.refresh_role().await
    }

    /// Assigns the role whose rank number equals `n` (1-255), found by a
    /// linear scan of the role list. No write is issued when no role
    /// carries that number.
    pub async fn set_role_by_number(&self, n: u8) -> Result<Member> {
        let roles = fetch_roles(self.transport.as_ref(), self.group.id).await?;
        let role = roles
            .into_iter()
            .find(|r| r.rank == n)
            .ok_or(ApiError::RoleNotFound(n))?;
        set_role_id(self.transport.as_ref(), &self.group, &self.user, role.id).await?;
        Ok(self.with_role(role))
    }

    /// Removes the member from the group.
    ///
    /// Not assumed idempotent: repeating the call after success surfaces
    /// whatever the server answers, typically a 404.
    pub async fn exile(&self) -> Result<()> {
        self.transport
            .delete(&membership_url(&self.group, &self.user))
            .await
    }
}

impl std::fmt::Debug for Member {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Member")
            .field("user", &self.user)
            .field("group", &self.group)
            .field("role", &self.role)
            .finish()
    }
}

fn membership_url(group: &GroupRef, user: &PartialUser) -> String {
    format!("{GROUPS_BASE}/v1/groups/{}/users/{}", group.id, user.id)
}

async fn set_role_id(
    transport: &dyn Transport,
    group: &GroupRef,
    user: &PartialUser,
    role_id: u64,
) -> Result<()> {
    transport
        .patch(&membership_url(group, user), json!({ "roleId": role_id }))
        .await?;
    Ok(())
}

#[derive(Deserialize)]
struct MembershipList {
    data: Vec<MembershipEntry>,
}

#[derive(Deserialize)]
struct MembershipEntry {
    group: MembershipGroup,
    role: Role,
}

#[derive(Deserialize)]
struct MembershipGroup {
    id: u64,
}

async fn fetch_current_role(
    transport: &dyn Transport,
    group: &GroupRef,
    user: &PartialUser,
) -> Result<Role> {
    let url = format!("{GROUPS_BASE}/v2/users/{}/groups/roles", group.id);
    let raw = transport.get(&url, &[]).await?;
    let list: MembershipList = serde_json::from_value(raw)?;
    list.data
        .into_iter()
        .find(|entry| entry.group.id == group.id)
        .map(|entry| entry.role)
        .ok_or(ApiError::NotInGroup {
            user_id: user.id,
            group_id: group.id,
        })
}
