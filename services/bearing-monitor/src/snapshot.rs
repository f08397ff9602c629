//! Temperature snapshot types and status endpoint decoding

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Alarm level reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureStatus {
    #[default]
    Normal,
    Warning,
    Danger,
}

impl TemperatureStatus {
    pub const ALL: [TemperatureStatus; 3] = [
        TemperatureStatus::Normal,
        TemperatureStatus::Warning,
        TemperatureStatus::Danger,
    ];

    /// Wire name as used by the status endpoint
    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureStatus::Normal => "normal",
            TemperatureStatus::Warning => "warning",
            TemperatureStatus::Danger => "danger",
        }
    }
}

impl fmt::Display for TemperatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemperatureStatus::Normal => write!(f, "Normal"),
            TemperatureStatus::Warning => write!(f, "Warning"),
            TemperatureStatus::Danger => write!(f, "Danger"),
        }
    }
}

impl FromStr for TemperatureStatus {
    type Err = crate::MonitorError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "normal" => Ok(TemperatureStatus::Normal),
            "warning" => Ok(TemperatureStatus::Warning),
            "danger" => Ok(TemperatureStatus::Danger),
            other => Err(crate::MonitorError::Protocol(format!(
                "unrecognized temperature status '{}'",
                other
            ))),
        }
    }
}

/// Aggregate temperature statistics in degrees Celsius
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TemperatureStats {
    pub max_temperature: f64,
    pub min_temperature: f64,
    pub avg_temperature: f64,
    /// Further counters sent by the backend (`total_readings`, `danger_count`, ...)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The latest known bearing temperature state.
///
/// A snapshot always replaces its predecessor wholesale. `last_readings` is
/// kept exactly as received; its entries are not interpreted beyond
/// [`TemperatureSnapshot::temperature_series`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TemperatureSnapshot {
    pub status: TemperatureStatus,
    pub stats: TemperatureStats,
    #[serde(default)]
    pub last_readings: Vec<serde_json::Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TemperatureSnapshot {
    /// Numeric `temperature` fields of the recent readings, oldest first.
    /// Entries without one are skipped.
    pub fn temperature_series(&self) -> Vec<f64> {
        self.last_readings
            .iter()
            .filter_map(|reading| reading.get("temperature").and_then(|t| t.as_f64()))
            .collect()
    }
}

/// Envelope returned by `GET /api/bearing-temperature/status`
#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<TemperatureSnapshot>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Decode a status endpoint body into a snapshot.
///
/// Fails on malformed JSON, unknown status values, `success: false`, and a
/// successful envelope without `data`.
pub fn decode_status_response(body: &str) -> crate::Result<TemperatureSnapshot> {
    let response: StatusResponse = serde_json::from_str(body)?;

    if !response.success {
        return Err(crate::MonitorError::Protocol(format!(
            "backend reported failure: {}",
            response.message.as_deref().unwrap_or("no message")
        )));
    }

    response
        .data
        .ok_or_else(|| crate::MonitorError::Protocol("response is missing data".to_string()))
}
