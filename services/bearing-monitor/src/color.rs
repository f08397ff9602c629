//! Status to indicator color mapping

use serde::{Deserialize, Serialize};

use crate::snapshot::TemperatureStatus;

pub const NORMAL_COLOR: &str = "#4caf50";
pub const WARNING_COLOR: &str = "#ff9800";
pub const DANGER_COLOR: &str = "#f44336";

/// Default indicator color for a status
pub fn status_color(status: TemperatureStatus) -> &'static str {
    match status {
        TemperatureStatus::Normal => NORMAL_COLOR,
        TemperatureStatus::Warning => WARNING_COLOR,
        TemperatureStatus::Danger => DANGER_COLOR,
    }
}

/// Indicator color for a raw wire status; unknown values are an error
pub fn color_for(raw_status: &str) -> crate::Result<&'static str> {
    raw_status.parse::<TemperatureStatus>().map(status_color)
}

/// Indicator colors used by the display layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPalette {
    #[serde(default = "default_normal")]
    pub normal: String,
    #[serde(default = "default_warning")]
    pub warning: String,
    #[serde(default = "default_danger")]
    pub danger: String,
}

impl Default for StatusPalette {
    fn default() -> Self {
        Self {
            normal: default_normal(),
            warning: default_warning(),
            danger: default_danger(),
        }
    }
}

impl StatusPalette {
    pub fn color(&self, status: TemperatureStatus) -> &str {
        match status {
            TemperatureStatus::Normal => &self.normal,
            TemperatureStatus::Warning => &self.warning,
            TemperatureStatus::Danger => &self.danger,
        }
    }

    /// Every color must be non-empty and no two statuses may share one
    pub fn validate(&self) -> crate::Result<()> {
        for status in TemperatureStatus::ALL {
            if self.color(status).trim().is_empty() {
                return Err(crate::MonitorError::Config(format!(
                    "palette color for '{}' is empty",
                    status.as_str()
                )));
            }
        }
        if self.normal.eq_ignore_ascii_case(&self.warning)
            || self.normal.eq_ignore_ascii_case(&self.danger)
            || self.warning.eq_ignore_ascii_case(&self.danger)
        {
            return Err(crate::MonitorError::Config(
                "palette colors must be distinct".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_normal() -> String {
    NORMAL_COLOR.to_string()
}

fn default_warning() -> String {
    WARNING_COLOR.to_string()
}

fn default_danger() -> String {
    DANGER_COLOR.to_string()
}
