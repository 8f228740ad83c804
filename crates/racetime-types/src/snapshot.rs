//! Live snapshot payload written by the poller and served by the API.
//!
//! The JSON field names are a fixed contract with consumers:
//!
//! ```text
//! {
//!   "timestamp": "2024-01-01T12:00:00Z",
//!   "positions":   [{"driver_number", "driver_code", "x_norm", "y_norm"}],
//!   "leaderboard": [{"position", "driver_number", "driver_code"}],
//!   "session":     {"session_key", "name", "circuit"} | null
//! }
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Car number used as the stable entity id.
pub type DriverNumber = u32;

/// One driver's normalized planar position.
///
/// Both coordinates lie in `[0, 1)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DriverPosition {
    /// Car number.
    pub driver_number: DriverNumber,
    /// Three-letter driver code (e.g. `VER`).
    pub driver_code: String,
    /// Normalized x coordinate.
    pub x_norm: f64,
    /// Normalized y coordinate.
    pub y_norm: f64,
}

/// One row of the derived leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LeaderboardEntry {
    /// 1-based rank.
    pub position: u32,
    /// Car number.
    pub driver_number: DriverNumber,
    /// Three-letter driver code.
    pub driver_code: String,
}

/// Static session metadata attached to a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SessionInfo {
    /// Upstream session key, unknown for simulated sessions.
    #[serde(default)]
    pub session_key: Option<i64>,
    /// Session name (e.g. `Race`, `Qualifying`).
    #[serde(default = "default_session_name")]
    pub name: String,
    /// Circuit name.
    #[serde(default = "default_circuit")]
    pub circuit: String,
}

impl Default for SessionInfo {
    fn default() -> Self {
        Self {
            session_key: None,
            name: default_session_name(),
            circuit: default_circuit(),
        }
    }
}

fn default_session_name() -> String {
    String::from("Race")
}

fn default_circuit() -> String {
    String::from("Unknown")
}

/// The single current-state record relayed from producer to consumers.
///
/// Always replaced wholesale; there are no partial updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Snapshot {
    /// Generation instant, ISO-8601 UTC with a `Z` suffix.
    pub timestamp: String,
    /// One entry per tracked driver, in canonical grid order.
    pub positions: Vec<DriverPosition>,
    /// Ranking of exactly the drivers in `positions`, rank order.
    pub leaderboard: Vec<LeaderboardEntry>,
    /// Session metadata, if known.
    #[serde(default)]
    pub session: Option<SessionInfo>,
}

impl Snapshot {
    /// Look up a driver's position by car number.
    pub fn position_of(&self, driver_number: DriverNumber) -> Option<&DriverPosition> {
        self.positions
            .iter()
            .find(|p| p.driver_number == driver_number)
    }

    /// The driver currently ranked first, if any.
    pub fn leader(&self) -> Option<&LeaderboardEntry> {
        self.leaderboard.first()
    }
}
