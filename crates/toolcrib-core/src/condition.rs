//! Unit condition and selection preference.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Ordinal quality rating of a tool unit.
///
/// Conditions are ordered by quality: `Excellent > Good > Fair > Poor`.
/// The ordering is by rank, not by declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Condition {
    /// As new.
    Excellent,
    /// Normal wear.
    #[default]
    Good,
    /// Usable, visibly worn.
    Fair,
    /// Needs attention before the next loan.
    Poor,
}

impl Condition {
    /// All conditions, best first.
    pub const ALL: [Self; 4] = [Self::Excellent, Self::Good, Self::Fair, Self::Poor];

    /// Numeric rank, higher is better.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Excellent => 3,
            Self::Good => 2,
            Self::Fair => 1,
            Self::Poor => 0,
        }
    }

    /// The worst condition in a set, or `None` when empty.
    ///
    /// Used as the representative condition of a line item that covers
    /// several units.
    pub fn worst<I: IntoIterator<Item = Self>>(conditions: I) -> Option<Self> {
        conditions.into_iter().min()
    }
}

impl PartialOrd for Condition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Condition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "EXCELLENT" => Ok(Self::Excellent),
            "GOOD" => Ok(Self::Good),
            "FAIR" => Ok(Self::Fair),
            "POOR" => Ok(Self::Poor),
            _ => Err(format!("unknown condition: {s}")),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Excellent => write!(f, "EXCELLENT"),
            Self::Good => write!(f, "GOOD"),
            Self::Fair => write!(f, "FAIR"),
            Self::Poor => write!(f, "POOR"),
        }
    }
}

/// Which available units a quantity borrow takes first.
///
/// Ties are always broken by ascending unit number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionPreference {
    /// Best condition first (`EXCELLENT` before `POOR`).
    #[default]
    BestFirst,
    /// Worst condition first, keeping the best units on the shelf.
    WorstFirst,
    /// Lowest unit number first, ignoring condition.
    LowestNumber,
}

impl FromStr for SelectionPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "best-first" | "best" => Ok(Self::BestFirst),
            "worst-first" | "worst" => Ok(Self::WorstFirst),
            "lowest-number" | "number" => Ok(Self::LowestNumber),
            _ => Err(format!("unknown selection preference: {s}")),
        }
    }
}

impl fmt::Display for SelectionPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BestFirst => write!(f, "best-first"),
            Self::WorstFirst => write!(f, "worst-first"),
            Self::LowestNumber => write!(f, "lowest-number"),
        }
    }
}
