//! Light immutable value records built from partial JSON fragments.
//!
//! Audit-log descriptions and membership listings only carry a few fields
//! of the entities they mention. These records hold exactly what was in
//! the response; resolving to the full entity is always an explicit call,
//! never an attribute access.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::Result;
use crate::http::{Transport, GROUPS_BASE, USERS_BASE};

/// Non-owning reference to a group, carried by members and audit entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupRef {
    pub id: u64,
    pub name: Option<String>,
}

/// A user mentioned by id, with whatever name fields were present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartialUser {
    pub id: u64,
    pub name: Option<String>,
    pub display_name: Option<String>,
}

impl PartialUser {
    pub fn from_id(id: u64) -> Self {
        Self {
            id,
            name: None,
            display_name: None,
        }
    }

    /// Fetches the full user profile behind this reference.
    pub async fn resolve(&self, transport: &dyn Transport) -> Result<User> {
        let raw = transport
            .get(&format!("{USERS_BASE}/v1/users/{}", self.id), &[])
            .await?;
        Ok(serde_json::from_value(raw)?)
    }
}

/// Full user profile from the users API.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_banned: bool,
}

/// A group mentioned by id in an audit description (ally/enemy targets).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartialGroup {
    pub id: u64,
    pub name: Option<String>,
}

impl PartialGroup {
    /// Fetches the full group record behind this reference.
    pub async fn resolve(&self, transport: &dyn Transport) -> Result<GroupDetails> {
        let raw = transport
            .get(&format!("{GROUPS_BASE}/v1/groups/{}", self.id), &[])
            .await?;
        Ok(serde_json::from_value(raw)?)
    }
}

/// Full group record from the groups API.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupDetails {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub owner: Option<GroupOwner>,
    #[serde(default)]
    pub member_count: Option<u64>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupOwner {
    pub user_id: u64,
    pub username: String,
}

/// A role mentioned by id and name only (rank changes, roleset edits).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartialRole {
    pub id: u64,
    pub name: Option<String>,
}

/// An asset mentioned in an audit description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartialAsset {
    pub id: u64,
    pub name: Option<String>,
}

/// An asset plus the version number the action produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionedPartialAsset {
    pub id: u64,
    pub name: Option<String>,
    pub version_number: u64,
}

/// An asset plus the configure actions applied to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfiguredPartialAsset {
    pub id: u64,
    pub name: Option<String>,
    pub actions: Option<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartialBadge {
    pub id: u64,
    pub name: Option<String>,
}

/// A badge plus the type string a configure action carries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypedPartialBadge {
    pub id: u64,
    pub name: Option<String>,
    pub badge_type: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartialGamePass {
    pub id: u64,
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartialPlace {
    pub id: u64,
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::MockTransport;
    use serde_json::json;

    #[tokio::test]
    async fn partial_user_resolves_to_the_full_profile() {
        let transport = MockTransport::new();
        transport.push(json!({
            "description": "Welcome to my profile",
            "created": "2006-02-27T21:06:40.300Z",
            "isBanned": false,
            "id": 1,
            "name": "Roblox",
            "displayName": "Roblox",
        }));

        let user = PartialUser::from_id(1).resolve(&transport).await.unwrap();

        assert_eq!(user.id, 1);
        assert_eq!(user.name, "Roblox");
        assert!(!user.is_banned);
        assert!(transport.recorded()[0].url.ends_with("/v1/users/1"));
    }

    #[tokio::test]
    async fn partial_group_resolves_to_the_full_record() {
        let transport = MockTransport::new();
        transport.push(json!({
            "id": 9,
            "name": "Rivals",
            "description": "A rival group",
            "owner": {"userId": 2, "username": "noob", "displayName": "noob"},
            "memberCount": 120,
        }));

        let group = PartialGroup {
            id: 9,
            name: Some("Rivals".to_string()),
        };
        let details = group.resolve(&transport).await.unwrap();

        assert_eq!(details.name, "Rivals");
        assert_eq!(details.member_count, Some(120));
        assert_eq!(details.owner.unwrap().user_id, 2);
        assert!(transport.recorded()[0].url.ends_with("/v1/groups/9"));
    }
}
