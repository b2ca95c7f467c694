//! # Device Status
//!
//! Decodes the four real-time status bytes into a [`DeviceStatus`].
//!
//! | Byte | Bit | Meaning |
//! |------|-----|---------|
//! | printer | 2 | drawer kick connector pin 3 is high |
//! | printer | 3 | offline |
//! | offline cause | 2 | cover open |
//! | offline cause | 3 | paper being fed by the feed button |
//! | offline cause | 5 | printing stopped at paper end |
//! | offline cause | 6 | error occurred |
//! | error cause | 3 | cutter error |
//! | error cause | 5 | unrecoverable error |
//! | error cause | 6 | auto-recoverable error |
//! | paper sensor | 2,3 | roll near end |
//! | paper sensor | 5,6 | roll end |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::RawStatus;

/// Which level of the drawer sensor means "drawer open".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorActive {
    #[default]
    High,
    Low,
}

impl FromStr for SensorActive {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "low" => Ok(Self::Low),
            other => Err(format!("unknown sensor polarity '{other}' (expected high or low)")),
        }
    }
}

/// Snapshot of the device condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DeviceStatus {
    pub cover_open: bool,
    pub paper_empty: bool,
    pub paper_near_end: bool,
    pub offline: bool,
    pub feed_button: bool,
    pub cutter_error: bool,
    pub unrecoverable_error: bool,
    pub auto_recoverable_error: bool,
    /// Drawer state as interpreted with the configured [`SensorActive`]
    pub drawer_open: bool,
    /// Raw level of the drawer sensor pin
    pub drawer_sensor_high: bool,
}

const fn bit(byte: u8, n: u8) -> bool {
    byte & (1 << n) != 0
}

impl DeviceStatus {
    pub fn decode(raw: &RawStatus, sensor: SensorActive) -> Self {
        let drawer_sensor_high = bit(raw.printer, 2);
        Self {
            cover_open: bit(raw.offline_cause, 2),
            paper_empty: bit(raw.offline_cause, 5) || (bit(raw.paper, 5) && bit(raw.paper, 6)),
            paper_near_end: bit(raw.paper, 2) && bit(raw.paper, 3),
            offline: bit(raw.printer, 3),
            feed_button: bit(raw.offline_cause, 3),
            cutter_error: bit(raw.error_cause, 3),
            unrecoverable_error: bit(raw.error_cause, 5),
            auto_recoverable_error: bit(raw.error_cause, 6),
            drawer_open: match sensor {
                SensorActive::High => drawer_sensor_high,
                SensorActive::Low => !drawer_sensor_high,
            },
            drawer_sensor_high,
        }
    }

    /// Paper present and cover closed.
    pub fn can_print(&self) -> bool {
        !self.paper_empty && !self.cover_open
    }

    /// Any error bit set.
    pub fn has_error(&self) -> bool {
        self.cutter_error || self.unrecoverable_error || self.auto_recoverable_error
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = [
            (self.offline, "offline"),
            (self.cover_open, "cover open"),
            (self.paper_empty, "paper empty"),
            (self.paper_near_end, "paper near end"),
            (self.feed_button, "feeding"),
            (self.cutter_error, "cutter error"),
            (self.unrecoverable_error, "unrecoverable error"),
            (self.auto_recoverable_error, "recoverable error"),
            (self.drawer_open, "drawer open"),
        ];
        let set: Vec<&str> = flags.iter().filter(|(on, _)| *on).map(|(_, n)| *n).collect();
        if set.is_empty() {
            write!(f, "ready")
        } else {
            write!(f, "{}", set.join(", "))
        }
    }
}
