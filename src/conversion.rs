//! Conversion Rate Authority
//!
//! Records where each conversion rate came from so callers never have to
//! re-derive whether a job override or the system formula was applied.

use serde::{Deserialize, Serialize};

use crate::requirements::ProductRequirements;

/// Source of a conversion rate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateAuthority {
    /// Base + increment formula
    #[default]
    System,
    /// Per-job override
    Job,
}

/// Conversion rates per kilogram of finished film
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversionRates {
    pub printing_base: f64,
    pub printing_per_color: f64,
    pub lamination_base: f64,
    pub lamination_per_pass: f64,
    pub pouching: f64,
    pub slitting: f64,
    pub overhead: f64,
}

impl Default for ConversionRates {
    fn default() -> Self {
        Self {
            printing_base: 15.0,
            printing_per_color: 2.0,
            lamination_base: 12.0,
            lamination_per_pass: 5.0,
            pouching: 20.0,
            slitting: 5.0,
            overhead: 12.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ConversionCosts {
    pub printing: f64,
    pub printing_authority: RateAuthority,
    pub lamination: f64,
    pub lamination_authority: RateAuthority,
    pub pouching: f64,
    pub slitting: f64,
    pub overhead: f64,
}

impl ConversionCosts {
    pub fn total(&self) -> f64 {
        self.printing + self.lamination + self.pouching + self.slitting + self.overhead
    }

    /// Slitting and overhead are reported as one bucket
    pub fn overhead_bucket(&self) -> f64 {
        self.overhead + self.slitting
    }
}

impl ConversionRates {
    pub fn costs_for(&self, req: &ProductRequirements) -> ConversionCosts {
        let (printing, printing_authority) = match req.printing_cost_per_kg_override {
            Some(rate) => (rate, RateAuthority::Job),
            None => (
                self.printing_base + req.number_of_colors as f64 * self.printing_per_color,
                RateAuthority::System,
            ),
        };

        let passes = req.film_structure.interface_count() as f64;
        let (lamination, lamination_authority) = match req.lamination_cost_per_kg_override {
            Some(rate) => (rate, RateAuthority::Job),
            None => (
                self.lamination_base + passes * self.lamination_per_pass,
                RateAuthority::System,
            ),
        };

        ConversionCosts {
            printing,
            printing_authority,
            lamination,
            lamination_authority,
            pouching: self.pouching,
            slitting: self.slitting,
            overhead: self.overhead,
        }
    }
}
