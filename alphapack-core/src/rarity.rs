//! Reward tiers extracted from pack-opening screenshots.

use serde::{Deserialize, Serialize};

/// Reward tier of a single pack opening.
///
/// `Unknown` is the fallback when no calibrated color signature matches a
/// screenshot; it is counted and reported like any other tier so that totals
/// stay in step with the number of screenshots seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Unknown,
}

impl Rarity {
    /// All tiers in classification priority order. Matching and vote
    /// tie-breaking walk this order, so `Common` wins ties.
    pub const ALL: [Rarity; 6] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
        Rarity::Unknown,
    ];

    /// Tiers that carry color signatures, i.e. everything but `Unknown`.
    pub const CLASSIFIABLE: [Rarity; 5] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
    ];
}

impl std::fmt::Display for Rarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rarity::Common => write!(f, "Common"),
            Rarity::Uncommon => write!(f, "Uncommon"),
            Rarity::Rare => write!(f, "Rare"),
            Rarity::Epic => write!(f, "Epic"),
            Rarity::Legendary => write!(f, "Legendary"),
            Rarity::Unknown => write!(f, "Unknown"),
        }
    }
}

impl std::str::FromStr for Rarity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "common" => Ok(Rarity::Common),
            "uncommon" => Ok(Rarity::Uncommon),
            "rare" => Ok(Rarity::Rare),
            "epic" => Ok(Rarity::Epic),
            "legendary" => Ok(Rarity::Legendary),
            "unknown" => Ok(Rarity::Unknown),
            other => Err(format!("Unknown rarity: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("EPIC".parse::<Rarity>(), Ok(Rarity::Epic));
        assert_eq!("legendary".parse::<Rarity>(), Ok(Rarity::Legendary));
        assert_eq!(" Rare ".parse::<Rarity>(), Ok(Rarity::Rare));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("mythic".parse::<Rarity>().is_err());
        assert!("".parse::<Rarity>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for rarity in Rarity::ALL {
            assert_eq!(rarity.to_string().parse::<Rarity>(), Ok(rarity));
        }
    }
}
