//! Shared newtypes and utilities used across all domain modules.
//!
//! These types are serialization-transparent: they serialize/deserialize identically
//! to the raw format the backend sends, so they can be used directly in wire types
//! without conversion overhead.

pub mod fmt;
pub mod serde_util;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ─── Timescale ───────────────────────────────────────────────────────────────

/// Server-side bucketing granularity for the history endpoint.
///
/// Passed through verbatim as the `timescale` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Timescale {
    #[default]
    #[serde(rename = "realtime")]
    Realtime,
    #[serde(rename = "30m")]
    Minute30,
    #[serde(rename = "1h")]
    Hour1,
}

impl Timescale {
    pub const ALL: [Timescale; 3] = [Self::Realtime, Self::Minute30, Self::Hour1];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Realtime => "realtime",
            Self::Minute30 => "30m",
            Self::Hour1 => "1h",
        }
    }
}

impl std::fmt::Display for Timescale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Timescale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown timescale: {}", s))
    }
}
