//! Error-correction tiers and their per-code byte capacity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// QR error-correction tier.
///
/// Capacities are conservative per-symbol byte budgets, not the theoretical
/// QR maxima, so codes stay small enough to scan from a phone screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tier {
    /// Low (~7% recovery).
    L,
    /// Medium (~15% recovery).
    #[default]
    M,
    /// Quartile (~25% recovery).
    Q,
    /// High (~30% recovery).
    H,
}

impl Tier {
    /// All tiers, lowest correction first.
    pub const ALL: [Tier; 4] = [Tier::L, Tier::M, Tier::Q, Tier::H];

    /// Maximum bytes one QR symbol may carry at this tier.
    pub fn max_byte_content(self) -> usize {
        match self {
            Tier::L => 251,
            Tier::M => 213,
            Tier::Q => 88,
            Tier::H => 68,
        }
    }

    /// Single-letter name of the tier.
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::L => "L",
            Tier::M => "M",
            Tier::Q => "Q",
            Tier::H => "H",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" | "LOW" => Ok(Tier::L),
            "M" | "MEDIUM" => Ok(Tier::M),
            "Q" | "QUARTILE" => Ok(Tier::Q),
            "H" | "HIGH" => Ok(Tier::H),
            _ => Err(format!("Unknown tier: {}. Use: L, M, Q or H", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_table() {
        assert_eq!(Tier::L.max_byte_content(), 251);
        assert_eq!(Tier::M.max_byte_content(), 213);
        assert_eq!(Tier::Q.max_byte_content(), 88);
        assert_eq!(Tier::H.max_byte_content(), 68);
    }

    #[test]
    fn test_parse_tier() {
        assert_eq!("h".parse::<Tier>().unwrap(), Tier::H);
        assert_eq!("Quartile".parse::<Tier>().unwrap(), Tier::Q);
        assert!("X".parse::<Tier>().is_err());
    }

    #[test]
    fn test_default_is_medium() {
        assert_eq!(Tier::default(), Tier::M);
    }
}
