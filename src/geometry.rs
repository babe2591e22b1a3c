//! Geometry Resolver - Pouch Type to Open Web Dimensions
//!
//! Every pouch type owns one allowance policy. Types without a policy of
//! their own take the flat fallback (no seal allowance).

use serde::{Deserialize, Serialize};

/// Overlap consumed by the longitudinal center seal (mm)
pub const CENTER_SEAL_OVERLAP_MM: f64 = 20.0;
/// Seal width applied to each of the top and bottom edges (mm)
pub const SEAL_WIDTH_MM: f64 = 10.0;
/// Extra web consumed by the stand-up bottom fold (mm)
pub const STAND_UP_BOTTOM_FOLD_MM: f64 = 60.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PouchType {
    CenterSeal,
    ThreeSideSeal,
    StandUpPouch,
    StandUpZipper,
    SideGusset,
    /// Any identifier this build does not know about
    #[serde(other)]
    Other,
}

impl PouchType {
    /// Whether this variant has a dedicated allowance policy
    pub fn has_allowance_policy(&self) -> bool {
        matches!(
            self,
            PouchType::CenterSeal | PouchType::ThreeSideSeal | PouchType::StandUpPouch
        )
    }
}

/// Allowance policy. Substitute a different value to change the geometry
/// rules without touching the callers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SealAllowances {
    #[serde(default = "default_center_seal_overlap")]
    pub center_seal_overlap_mm: f64,
    #[serde(default = "default_seal_width")]
    pub seal_width_mm: f64,
    #[serde(default = "default_bottom_fold")]
    pub stand_up_bottom_fold_mm: f64,
}

fn default_center_seal_overlap() -> f64 { CENTER_SEAL_OVERLAP_MM }
fn default_seal_width() -> f64 { SEAL_WIDTH_MM }
fn default_bottom_fold() -> f64 { STAND_UP_BOTTOM_FOLD_MM }

impl Default for SealAllowances {
    fn default() -> Self {
        Self {
            center_seal_overlap_mm: CENTER_SEAL_OVERLAP_MM,
            seal_width_mm: SEAL_WIDTH_MM,
            stand_up_bottom_fold_mm: STAND_UP_BOTTOM_FOLD_MM,
        }
    }
}

/// Flat web consumed per pouch
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PouchGeometry {
    pub open_width_mm: f64,
    pub cut_length_mm: f64,
}

impl PouchGeometry {
    pub fn area_m2(&self) -> f64 {
        self.open_width_mm * self.cut_length_mm / 1_000_000.0
    }
}

impl SealAllowances {
    pub fn resolve(
        &self,
        pouch_type: PouchType,
        width_mm: f64,
        height_mm: f64,
        gusset_mm: f64,
    ) -> PouchGeometry {
        // Top and bottom seals
        let sealed_length = height_mm + 2.0 * self.seal_width_mm;

        let (open_width_mm, cut_length_mm) = match pouch_type {
            PouchType::CenterSeal => (
                2.0 * width_mm + 2.0 * gusset_mm + self.center_seal_overlap_mm,
                sealed_length,
            ),
            PouchType::ThreeSideSeal => (2.0 * width_mm, sealed_length),
            PouchType::StandUpPouch => (
                2.0 * width_mm + 2.0 * gusset_mm + self.stand_up_bottom_fold_mm,
                sealed_length,
            ),
            PouchType::StandUpZipper | PouchType::SideGusset | PouchType::Other => {
                (2.0 * width_mm, height_mm)
            }
        };

        PouchGeometry { open_width_mm, cut_length_mm }
    }
}

/// Resolve with the default allowance policy
pub fn resolve(pouch_type: PouchType, width_mm: f64, height_mm: f64, gusset_mm: f64) -> PouchGeometry {
    SealAllowances::default().resolve(pouch_type, width_mm, height_mm, gusset_mm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_seal_with_gusset() {
        let g = resolve(PouchType::CenterSeal, 160.0, 240.0, 50.0);
        assert_eq!(g.open_width_mm, 440.0);
        assert_eq!(g.cut_length_mm, 260.0);
        assert!((g.area_m2() - 0.1144).abs() < 1e-12);
    }

    #[test]
    fn test_three_side_seal_ignores_gusset() {
        let g = resolve(PouchType::ThreeSideSeal, 80.0, 120.0, 30.0);
        assert_eq!(g.open_width_mm, 160.0);
        assert_eq!(g.cut_length_mm, 140.0);
    }

    #[test]
    fn test_stand_up_bottom_fold() {
        let g = resolve(PouchType::StandUpPouch, 140.0, 220.0, 60.0);
        assert_eq!(g.open_width_mm, 460.0);
        assert_eq!(g.cut_length_mm, 240.0);
    }

    #[test]
    fn test_fallback_has_no_allowance() {
        for t in [PouchType::StandUpZipper, PouchType::SideGusset, PouchType::Other] {
            let g = resolve(t, 100.0, 150.0, 40.0);
            assert_eq!(g.open_width_mm, 200.0);
            assert_eq!(g.cut_length_mm, 150.0);
        }
    }

    #[test]
    fn test_unknown_identifier_deserializes_to_other() {
        let t: PouchType = serde_json::from_str(r#""FLAT_BOTTOM_BOX""#).unwrap();
        assert_eq!(t, PouchType::Other);
        let t: PouchType = serde_json::from_str(r#""CENTER_SEAL""#).unwrap();
        assert_eq!(t, PouchType::CenterSeal);
    }

    #[test]
    fn test_custom_allowances() {
        let narrow = SealAllowances {
            center_seal_overlap_mm: 15.0,
            seal_width_mm: 8.0,
            stand_up_bottom_fold_mm: 40.0,
        };
        let g = narrow.resolve(PouchType::CenterSeal, 100.0, 200.0, 0.0);
        assert_eq!(g.open_width_mm, 215.0);
        assert_eq!(g.cut_length_mm, 216.0);
    }
}
