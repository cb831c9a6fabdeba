//! Authenticated account information (accountinformation.roblox.com).
//!
//! Everything here requires the session cookie; none of these endpoints
//! answer for unauthenticated clients.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiError, Result};
use crate::http::{Transport, ACCOUNT_INFORMATION_BASE};

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccountInformationMetadata {
    pub is_allowed_notifications_endpoint_disabled: bool,
    pub is_account_settings_policy_enabled: bool,
    pub is_phone_number_enabled: bool,
    // The one field the API spells with a leading capital.
    #[serde(rename = "MaxUserDescriptionLength")]
    pub max_user_description_length: u32,
    pub is_user_description_enabled: bool,
    pub is_user_block_endpoints_updated: bool,
}

/// Social links shown on the authenticated user's profile.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PromotionChannels {
    pub promotion_channels_visibility_privacy: String,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub youtube: Option<String>,
    pub twitch: Option<String>,
}

/// The gender code as the API stores it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gender {
    Other,
    Male,
    Female,
}

impl Gender {
    fn from_code(code: u64) -> Option<Gender> {
        match code {
            1 => Some(Gender::Other),
            2 => Some(Gender::Male),
            3 => Some(Gender::Female),
            _ => None,
        }
    }

    fn code(self) -> u8 {
        match self {
            Gender::Other => 1,
            Gender::Male => 2,
            Gender::Female => 3,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BirthdateResponse {
    birth_year: i32,
    birth_month: u32,
    birth_day: u32,
}

/// Typed wrapper over the authenticated account-information endpoints.
pub struct AccountInformation {
    transport: Arc<dyn Transport>,
}

impl AccountInformation {
    pub(crate) fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    async fn get(&self, path: &str) -> Result<Value> {
        self.transport
            .get(&format!("{ACCOUNT_INFORMATION_BASE}{path}"), &[])
            .await
    }

    pub async fn metadata(&self) -> Result<AccountInformationMetadata> {
        let raw = self.get("/v1/metadata").await?;
        Ok(serde_json::from_value(raw)?)
    }

    pub async fn promotion_channels(&self) -> Result<PromotionChannels> {
        let raw = self.get("/v1/promotion-channels").await?;
        Ok(serde_json::from_value(raw)?)
    }

    pub async fn gender(&self) -> Result<Gender> {
        let raw = self.get("/v1/gender").await?;
        let code = raw
            .get("gender")
            .and_then(Value::as_u64)
            .ok_or_else(|| ApiError::Unexpected("gender response missing code".to_string()))?;
        Gender::from_code(code)
            .ok_or_else(|| ApiError::Unexpected(format!("unknown gender code {code}")))
    }

    /// The API expects the numeric code as a string.
    pub async fn set_gender(&self, gender: Gender) -> Result<()> {
        self.transport
            .post(
                &format!("{ACCOUNT_INFORMATION_BASE}/v1/gender"),
                json!({ "gender": gender.code().to_string() }),
            )
            .await?;
        Ok(())
    }

    pub async fn birthdate(&self) -> Result<NaiveDate> {
        let raw = self.get("/v1/birthdate").await?;
        let wire: BirthdateResponse = serde_json::from_value(raw)?;
        NaiveDate::from_ymd_opt(wire.birth_year, wire.birth_month, wire.birth_day).ok_or_else(
            || {
                ApiError::Unexpected(format!(
                    "invalid birthdate {}-{}-{}",
                    wire.birth_year, wire.birth_month, wire.birth_day
                ))
            },
        )
    }

    pub async fn set_birthdate(&self, date: NaiveDate) -> Result<()> {
        self.transport
            .post(
                &format!("{ACCOUNT_INFORMATION_BASE}/v1/birthdate"),
                json!({
                    "birthMonth": date.month(),
                    "birthDay": date.day(),
                    "birthYear": date.year(),
                }),
            )
            .await?;
        Ok(())
    }
}
