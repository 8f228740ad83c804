//! Deterministic snapshot generator.
//!
//! Produces a smoothly evolving [`Snapshot`] from a tick counter and the
//! per-driver [`PositionState`]. Pure: no I/O, no failure modes. The only
//! side effect is advancing the position state passed in by the caller.
//!
//! # Motion
//!
//! Every driver starts on a fixed layout (grid index `i` of `N`):
//!
//! ```text
//! x0 = (i / N) mod 1
//! y0 = (7i / N) mod 1
//! ```
//!
//! and every tick `t` moves by
//!
//! ```text
//! dx = 0.0020 + (number mod 10) / 10000
//! dy = 0.0015 + (t mod 5) / 10000
//! ```
//!
//! wrapping modulo 1 on both axes. Emitted coordinates are rounded to four
//! decimals; the unrounded values stay in the state so rounding error never
//! accumulates. Rounding is `f64::round` on the value scaled by 10 000, so
//! halves round away from zero (not to even), and the last digit of an
//! exact-half input can differ from a banker's-rounding implementation.
//!
//! # Leaderboard
//!
//! Drivers are ranked by emitted `x_norm`, highest first. Equal `x_norm`
//! values keep grid order (the earlier grid entry ranks higher).

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use racetime_types::{DriverNumber, DriverPosition, LeaderboardEntry, SessionInfo, Snapshot};

/// Decimal places kept in emitted coordinates.
const COORD_SCALE: f64 = 10_000.0;

/// Base per-tick x advance.
const BASE_DX: f64 = 0.0020;

/// Base per-tick y advance.
const BASE_DY: f64 = 0.0015;

/// The simulated 20-car grid, in canonical order.
pub const DEFAULT_GRID: [(DriverNumber, &str); 20] = [
    (1, "VER"),
    (11, "PER"),
    (44, "HAM"),
    (63, "RUS"),
    (16, "LEC"),
    (55, "SAI"),
    (4, "NOR"),
    (81, "PIA"),
    (14, "ALO"),
    (18, "STR"),
    (10, "GAS"),
    (31, "OCO"),
    (23, "ALB"),
    (2, "SAR"),
    (77, "BOT"),
    (24, "ZHO"),
    (20, "MAG"),
    (27, "HUL"),
    (22, "TSU"),
    (3, "RIC"),
];

/// A tracked driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Driver {
    /// Car number (entity id).
    pub number: DriverNumber,
    /// Three-letter code.
    pub code: String,
}

/// Unrounded normalized position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// x in `[0, 1)`.
    pub x: f64,
    /// y in `[0, 1)`.
    pub y: f64,
}

/// Per-driver position accumulator.
///
/// Seeded on the first generated tick and advanced on every tick after.
/// Owned by whoever drives the generator; never shared.
#[derive(Debug, Clone, Default)]
pub struct PositionState {
    points: BTreeMap<DriverNumber, Point>,
}

impl PositionState {
    /// Create an empty (unseeded) state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any position has been recorded yet.
    pub fn is_seeded(&self) -> bool {
        !self.points.is_empty()
    }

    /// Current unrounded position of a driver.
    pub fn get(&self, number: DriverNumber) -> Option<Point> {
        self.points.get(&number).copied()
    }

    /// Overwrite a driver's position.
    pub fn insert(&mut self, number: DriverNumber, point: Point) {
        self.points.insert(number, point);
    }

    /// Number of tracked drivers.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether no drivers are tracked.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Builds snapshots for a fixed grid and session.
#[derive(Debug, Clone)]
pub struct SnapshotGenerator {
    grid: Vec<Driver>,
    session: SessionInfo,
}

impl SnapshotGenerator {
    /// Create a generator for the given grid and session metadata.
    pub const fn new(grid: Vec<Driver>, session: SessionInfo) -> Self {
        Self { grid, session }
    }

    /// The 20-car simulated race at Monaco.
    pub fn simulated() -> Self {
        let grid = DEFAULT_GRID
            .iter()
            .map(|&(number, code)| Driver {
                number,
                code: code.to_owned(),
            })
            .collect();
        let session = SessionInfo {
            session_key: None,
            name: String::from("Race"),
            circuit: String::from("Monaco"),
        };
        Self::new(grid, session)
    }

    /// The tracked drivers in canonical order.
    pub fn grid(&self) -> &[Driver] {
        &self.grid
    }

    /// Place every driver on the initial layout, replacing any prior state.
    pub fn seed(&self, state: &mut PositionState) {
        let count = self.grid.len();
        for (index, driver) in self.grid.iter().enumerate() {
            state.insert(driver.number, layout_point(index, count));
        }
    }

    /// Advance every driver by one tick and emit the resulting snapshot.
    ///
    /// Seeds `state` first if it is empty. A driver missing from a seeded
    /// state starts from its layout point.
    pub fn generate(
        &self,
        tick: u64,
        state: &mut PositionState,
        now: DateTime<Utc>,
    ) -> Snapshot {
        if !state.is_seeded() {
            self.seed(state);
        }

        let count = self.grid.len();
        let mut positions = Vec::with_capacity(count);
        for (index, driver) in self.grid.iter().enumerate() {
            let current = state
                .get(driver.number)
                .unwrap_or_else(|| layout_point(index, count));
            let next = step(current, delta(driver.number, tick));
            state.insert(driver.number, next);

            positions.push(DriverPosition {
                driver_number: driver.number,
                driver_code: driver.code.clone(),
                x_norm: round_coord(next.x),
                y_norm: round_coord(next.y),
            });
        }

        let leaderboard = rank(&positions);

        Snapshot {
            timestamp: format_timestamp(now),
            positions,
            leaderboard,
            session: Some(self.session.clone()),
        }
    }
}

/// Initial position for grid index `index` of `count`.
#[allow(clippy::cast_precision_loss)]
pub fn layout_point(index: usize, count: usize) -> Point {
    let n = count.max(1) as f64;
    let i = index as f64;
    Point {
        x: wrap_unit(i / n),
        y: wrap_unit(i * 7.0 / n),
    }
}

/// Per-tick advance for a driver.
pub fn delta(number: DriverNumber, tick: u64) -> Point {
    let phase = u32::try_from(tick % 5).unwrap_or(0);
    Point {
        x: BASE_DX + f64::from(number % 10) / COORD_SCALE,
        y: BASE_DY + f64::from(phase) / COORD_SCALE,
    }
}

/// Move `from` by `by`, wrapping into `[0, 1)` on both axes.
pub fn step(from: Point, by: Point) -> Point {
    Point {
        x: wrap_unit(from.x + by.x),
        y: wrap_unit(from.y + by.y),
    }
}

/// Reduce a coordinate modulo 1 into `[0, 1)`.
pub fn wrap_unit(value: f64) -> f64 {
    let wrapped = value.rem_euclid(1.0);
    // rem_euclid can return exactly 1.0 for tiny negative inputs
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

/// Round to four decimals, keeping the result in `[0, 1)`.
///
/// Halves round away from zero on the scaled value.
/// A value that rounds up to `1.0` wraps to `0.0`.
pub fn round_coord(value: f64) -> f64 {
    let rounded = (value * COORD_SCALE).round() / COORD_SCALE;
    if rounded >= 1.0 { 0.0 } else { rounded }
}

/// Rank positions by `x_norm` descending, ties in input order.
pub fn rank(positions: &[DriverPosition]) -> Vec<LeaderboardEntry> {
    let mut order: Vec<(usize, &DriverPosition)> = positions.iter().enumerate().collect();
    order.sort_by(|(ia, a), (ib, b)| b.x_norm.total_cmp(&a.x_norm).then(ia.cmp(ib)));

    order
        .into_iter()
        .zip(1_u32..)
        .map(|((_, p), position)| LeaderboardEntry {
            position,
            driver_number: p.driver_number,
            driver_code: p.driver_code.clone(),
        })
        .collect()
}

/// ISO-8601 UTC with microseconds and a `Z` suffix.
pub fn format_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Micros, true)
}
