//! Data structures for the usage endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::PollError;

/// Usage in a single rolling window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowUsage {
    /// Utilization percentage as reported by the server (nominally 0-100)
    pub percent: f64,
    /// When the window resets, if the server reported it
    pub resets_at: Option<DateTime<Utc>>,
}

/// One poll cycle's worth of usage. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageSnapshot {
    /// 5-hour rolling window (drives the icon and badge)
    pub five_hour: WindowUsage,
    /// 7-day rolling window (tooltip only)
    pub seven_day: Option<WindowUsage>,
}

impl UsageSnapshot {
    /// Build a snapshot from the raw usage document.
    ///
    /// The 5-hour utilization is required. Without it this is an error,
    /// never a default percentage.
    pub fn from_response(response: UsageResponse) -> Result<Self, PollError> {
        let five_hour = response
            .five_hour
            .and_then(|w| w.into_window())
            .ok_or(PollError::MissingField("five_hour.utilization"))?;

        Ok(Self {
            five_hour,
            seven_day: response.seven_day.and_then(|w| w.into_window()),
        })
    }
}

// ============================================================================
// API Response Types
// ============================================================================

/// Response from /api/organizations/{id}/usage
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsageResponse {
    #[serde(default)]
    pub five_hour: Option<UsageWindowApi>,
    #[serde(default)]
    pub seven_day: Option<UsageWindowApi>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsageWindowApi {
    #[serde(default)]
    pub utilization: Option<f64>,
    /// ISO timestamp; kept as a string so an odd format doesn't fail the whole document
    #[serde(default)]
    pub resets_at: Option<String>,
}

impl UsageWindowApi {
    fn into_window(self) -> Option<WindowUsage> {
        let percent = self.utilization?;
        let resets_at = self.resets_at.as_deref().and_then(parse_reset_time);
        Some(WindowUsage { percent, resets_at })
    }
}

fn parse_reset_time(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            log::debug!("Usage: ignoring unparseable resets_at {:?}: {}", raw, e);
            None
        }
    }
}
