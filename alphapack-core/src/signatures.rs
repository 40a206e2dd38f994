//! Color signature tables used to classify reward banners.
//!
//! Calibration data is versioned and data-driven: the crate embeds a default
//! table (`calibration/signatures.toml`), and deployments can point the
//! settings file at an override to pick up new game-UI layouts without a code
//! change.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::rarity::Rarity;

/// Default calibration table shipped with the crate.
const BUILTIN_CALIBRATION: &str = include_str!("../calibration/signatures.toml");

/// Maximum pairwise channel distance for a pixel to count as gray.
///
/// Common banners are gray-toned and their ranges overlap other tiers'
/// darker captures, so a Common match additionally requires R, G and B to be
/// mutually within this tolerance.
pub const COMMON_CHANNEL_TOLERANCE: u8 = 2;

/// One calibrated RGB signature: three inclusive channel ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ColorSignature {
    pub red: [u8; 2],
    pub green: [u8; 2],
    pub blue: [u8; 2],
}

impl ColorSignature {
    /// Whether all three channels fall inside this signature.
    pub fn contains(&self, r: u8, g: u8, b: u8) -> bool {
        self.red[0] <= r
            && r <= self.red[1]
            && self.green[0] <= g
            && g <= self.green[1]
            && self.blue[0] <= b
            && b <= self.blue[1]
    }
}

#[derive(Debug, Deserialize)]
struct SignatureEntry {
    rarity: Rarity,
    red: [u8; 2],
    green: [u8; 2],
    blue: [u8; 2],
}

#[derive(Debug, Deserialize)]
struct CalibrationFile {
    version: u32,
    signatures: Vec<SignatureEntry>,
}

/// Errors raised while loading a calibration table.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("Failed to read calibration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse calibration table: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Calibration table has no signatures for {0}")]
    MissingRarity(Rarity),

    #[error("Calibration table may not assign signatures to Unknown")]
    UnknownSignature,
}

/// Calibrated signature table for every classifiable tier.
#[derive(Debug, Clone)]
pub struct SignatureTable {
    version: u32,
    by_rarity: BTreeMap<Rarity, Vec<ColorSignature>>,
}

impl SignatureTable {
    /// The calibration table embedded in the crate.
    pub fn builtin() -> Self {
        Self::from_toml_str(BUILTIN_CALIBRATION)
            .expect("embedded calibration table is valid; checked by tests")
    }

    /// Parse a calibration table from TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self, SignatureError> {
        let file: CalibrationFile = toml::from_str(raw)?;

        let mut by_rarity: BTreeMap<Rarity, Vec<ColorSignature>> = BTreeMap::new();
        for entry in file.signatures {
            if entry.rarity == Rarity::Unknown {
                return Err(SignatureError::UnknownSignature);
            }
            by_rarity.entry(entry.rarity).or_default().push(ColorSignature {
                red: entry.red,
                green: entry.green,
                blue: entry.blue,
            });
        }

        for rarity in Rarity::CLASSIFIABLE {
            if !by_rarity.contains_key(&rarity) {
                return Err(SignatureError::MissingRarity(rarity));
            }
        }

        Ok(Self {
            version: file.version,
            by_rarity,
        })
    }

    /// Load a calibration table from a TOML file on disk.
    pub fn load_from_file(path: &Path) -> Result<Self, SignatureError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Calibration table version, for log lines and reports.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Signatures registered for a tier.
    pub fn signatures(&self, rarity: Rarity) -> &[ColorSignature] {
        self.by_rarity.get(&rarity).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Match a single pixel against the table.
    ///
    /// Tiers are tried in [`Rarity::CLASSIFIABLE`] priority order and the
    /// first hit wins, which is how overlapping historical ranges are
    /// disambiguated. Common additionally requires the gray tolerance.
    pub fn match_pixel(&self, r: u8, g: u8, b: u8) -> Option<Rarity> {
        for rarity in Rarity::CLASSIFIABLE {
            let in_range = self
                .signatures(rarity)
                .iter()
                .any(|sig| sig.contains(r, g, b));
            if !in_range {
                continue;
            }
            if rarity == Rarity::Common && !is_gray(r, g, b) {
                continue;
            }
            return Some(rarity);
        }
        None
    }
}

fn is_gray(r: u8, g: u8, b: u8) -> bool {
    r.abs_diff(g) <= COMMON_CHANNEL_TOLERANCE
        && r.abs_diff(b) <= COMMON_CHANNEL_TOLERANCE
        && g.abs_diff(b) <= COMMON_CHANNEL_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_parses() {
        let table = SignatureTable::builtin();
        assert_eq!(table.version(), 3);
        for rarity in Rarity::CLASSIFIABLE {
            assert!(!table.signatures(rarity).is_empty());
        }
        assert!(table.signatures(Rarity::Unknown).is_empty());
    }

    #[test]
    fn gray_pixel_in_common_range_matches_common() {
        let table = SignatureTable::builtin();
        assert_eq!(table.match_pixel(90, 90, 90), Some(Rarity::Common));
        assert_eq!(table.match_pixel(90, 92, 91), Some(Rarity::Common));
    }

    #[test]
    fn tinted_pixel_in_common_range_falls_through() {
        let table = SignatureTable::builtin();
        // Inside Common's 80..=100 cube but too far from gray; also inside
        // no other tier's ranges.
        assert_eq!(table.match_pixel(80, 100, 95), None);
    }

    #[test]
    fn signature_bounds_are_inclusive() {
        let sig = ColorSignature {
            red: [10, 20],
            green: [30, 40],
            blue: [50, 60],
        };
        assert!(sig.contains(10, 30, 50));
        assert!(sig.contains(20, 40, 60));
        assert!(!sig.contains(9, 30, 50));
        assert!(!sig.contains(10, 41, 50));
    }

    #[test]
    fn each_tier_has_a_matching_pixel() {
        let table = SignatureTable::builtin();
        assert_eq!(table.match_pixel(220, 200, 180), Some(Rarity::Uncommon));
        assert_eq!(table.match_pixel(80, 160, 220), Some(Rarity::Rare));
        assert_eq!(table.match_pixel(150, 70, 170), Some(Rarity::Epic));
        assert_eq!(table.match_pixel(240, 155, 20), Some(Rarity::Legendary));
    }

    #[test]
    fn rejects_unknown_signatures() {
        let raw = r#"
            version = 1

            [[signatures]]
            rarity = "unknown"
            red = [0, 255]
            green = [0, 255]
            blue = [0, 255]
        "#;
        assert!(matches!(
            SignatureTable::from_toml_str(raw),
            Err(SignatureError::UnknownSignature)
        ));
    }

    #[test]
    fn rejects_incomplete_tables() {
        let raw = r#"
            version = 1

            [[signatures]]
            rarity = "common"
            red = [80, 100]
            green = [80, 100]
            blue = [80, 100]
        "#;
        assert!(matches!(
            SignatureTable::from_toml_str(raw),
            Err(SignatureError::MissingRarity(_))
        ));
    }
}
