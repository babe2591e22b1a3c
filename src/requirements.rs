//! Job Requirements - the input contract of a costing call

use serde::{Deserialize, Serialize};

use crate::geometry::PouchType;
use crate::materials::FilmStructure;

pub const MAX_COLORS: u32 = 10;
pub const DEFAULT_CYLINDER_COST_PER_UNIT: f64 = 3500.0;
pub const DEFAULT_MARGIN_PERCENT: f64 = 20.0;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrintingMethod {
    #[default]
    Rotogravure,
    Flexo,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductRequirements {
    pub pouch_type: PouchType,
    pub width_mm: f64,
    pub height_mm: f64,
    #[serde(default)]
    pub gusset_mm: f64,
    #[serde(default)]
    pub quantity_kg: Option<f64>,
    /// Non-positive quantities are accepted and amortize nothing
    #[serde(default)]
    pub quantity_pieces: Option<i64>,
    pub film_structure: FilmStructure,
    #[serde(default)]
    pub number_of_colors: u32,
    /// Informational only; no rate depends on it yet
    #[serde(default)]
    pub printing_method: PrintingMethod,
    #[serde(default = "default_cylinder_cost")]
    pub cylinder_cost_per_unit: f64,
    #[serde(default = "default_margin")]
    pub margin_percent: f64,
    /// Present-but-zero still wins over the formula
    #[serde(default)]
    pub printing_cost_per_kg_override: Option<f64>,
    #[serde(default)]
    pub lamination_cost_per_kg_override: Option<f64>,
}

fn default_cylinder_cost() -> f64 { DEFAULT_CYLINDER_COST_PER_UNIT }
fn default_margin() -> f64 { DEFAULT_MARGIN_PERCENT }

impl ProductRequirements {
    /// Minimal job: unprinted, no quantity, default margin and tooling rate
    pub fn new(
        pouch_type: PouchType,
        width_mm: f64,
        height_mm: f64,
        gusset_mm: f64,
        film_structure: FilmStructure,
    ) -> Self {
        Self {
            pouch_type,
            width_mm,
            height_mm,
            gusset_mm,
            quantity_kg: None,
            quantity_pieces: None,
            film_structure,
            number_of_colors: 0,
            printing_method: PrintingMethod::default(),
            cylinder_cost_per_unit: DEFAULT_CYLINDER_COST_PER_UNIT,
            margin_percent: DEFAULT_MARGIN_PERCENT,
            printing_cost_per_kg_override: None,
            lamination_cost_per_kg_override: None,
        }
    }

    pub fn with_colors(mut self, colors: u32) -> Self {
        self.number_of_colors = colors;
        self
    }

    pub fn with_quantity_kg(mut self, kg: f64) -> Self {
        self.quantity_kg = Some(kg);
        self
    }

    pub fn with_quantity_pieces(mut self, pieces: i64) -> Self {
        self.quantity_pieces = Some(pieces);
        self
    }

    pub fn with_margin(mut self, margin_percent: f64) -> Self {
        self.margin_percent = margin_percent;
        self
    }

    /// True when either quantity is positive and can carry the tooling cost
    pub fn has_quantity(&self) -> bool {
        self.quantity_kg.is_some_and(|kg| kg > 0.0) || self.quantity_pieces.is_some_and(|p| p > 0)
    }
}
