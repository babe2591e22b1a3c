//! Cost Derivation Engine - Single Entry Point
//!
//! Every pricing path validates the requirements first. No bypass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::conversion::{ConversionCosts, ConversionRates};
use crate::geometry::{PouchGeometry, SealAllowances};
use crate::hashing::{compute_job_hash, compute_quotation_hash, rates_digest};
use crate::materials::{FilmStructure, MaterialRateTable, RateSource, RateSourceError};
use crate::requirements::ProductRequirements;
use crate::validation::{ValidationResult, Validator};
use crate::ENGINE_VERSION;

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static VALIDATION_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_validation_call_count() -> u32 {
    VALIDATION_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_validation_call_count() {
    VALIDATION_CALL_COUNT.store(0, Ordering::SeqCst);
}

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("Invalid requirements: {0}")]
    InvalidRequirements(String),

    #[error("Rate table unavailable: {0}")]
    RateSource(#[from] RateSourceError),

    #[error("Internal costing error: {0}")]
    Internal(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PricingError {
    /// True when the caller sent bad input, false for defects on our side
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, PricingError::InvalidRequirements(_))
    }
}

/// Material-side costing constants
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CostingConstants {
    /// Dry-bond adhesive per layer interface (g/m2)
    pub adhesive_gsm: f64,
    pub adhesive_rate_per_kg: f64,
    pub ink_gsm_per_color: f64,
    /// White base pass laid down whenever at least one colour prints.
    /// Kept at 1.0 for compatibility with existing quotations.
    pub white_base_ink_gsm: f64,
    pub ink_rate_per_kg: f64,
    pub conversion: ConversionRates,
}

impl Default for CostingConstants {
    fn default() -> Self {
        Self {
            adhesive_gsm: 2.5,
            adhesive_rate_per_kg: 250.0,
            ink_gsm_per_color: 0.5,
            white_base_ink_gsm: 1.0,
            ink_rate_per_kg: 300.0,
            conversion: ConversionRates::default(),
        }
    }
}

/// Areal weight and cost of the printed laminate, before any per-kg split
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FilmMetrics {
    pub film_gsm: f64,
    pub adhesive_gsm: f64,
    pub ink_gsm: f64,
    pub film_cost_per_m2: f64,
    pub adhesive_cost_per_m2: f64,
    pub ink_cost_per_m2: f64,
}

impl FilmMetrics {
    pub fn total_gsm(&self) -> f64 {
        self.film_gsm + self.adhesive_gsm + self.ink_gsm
    }

    /// Film, adhesive and ink cost per square metre
    pub fn material_cost_per_m2(&self) -> f64 {
        self.film_cost_per_m2 + self.adhesive_cost_per_m2 + self.ink_cost_per_m2
    }

    /// Convert a per-m2 cost to per-kg of laminate; 0 for a weightless structure
    pub fn per_kg(&self, cost_per_m2: f64) -> f64 {
        let total_gsm = self.total_gsm();
        if total_gsm > 0.0 {
            cost_per_m2 / (total_gsm / 1000.0)
        } else {
            0.0
        }
    }
}

impl CostingConstants {
    pub fn film_metrics(
        &self,
        film: &FilmStructure,
        rates: &MaterialRateTable,
        number_of_colors: u32,
    ) -> FilmMetrics {
        let mut m = FilmMetrics::default();

        for layer in &film.layers {
            let layer_gsm = layer.gsm();
            let rate = match rates.lookup(&layer.material) {
                Some(rate) => rate,
                None => {
                    warn!(material = %layer.material, "no rate configured, using default");
                    rates.rate(&layer.material)
                }
            };
            m.film_gsm += layer_gsm;
            m.film_cost_per_m2 += layer_gsm / 1000.0 * rate;
        }

        let interfaces = film.interface_count() as f64;
        m.adhesive_gsm = interfaces * self.adhesive_gsm;
        m.adhesive_cost_per_m2 = interfaces * self.adhesive_gsm / 1000.0 * self.adhesive_rate_per_kg;

        if number_of_colors > 0 {
            m.ink_gsm = number_of_colors as f64 * self.ink_gsm_per_color + self.white_base_ink_gsm;
            m.ink_cost_per_m2 = m.ink_gsm / 1000.0 * self.ink_rate_per_kg;
        }

        m
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostBreakdown {
    pub total_gsm: f64,
    pub total_thickness: f64,
    pub weight_per_1000_pouches_kg: f64,

    /// Film and adhesive only; ink is reported separately
    pub material_cost_per_kg: f64,
    pub ink_cost_per_kg: f64,
    pub printing_cost_per_kg: f64,
    pub lamination_cost_per_kg: f64,
    pub pouching_cost_per_kg: f64,
    /// Slitting plus overheads
    pub overhead_cost_per_kg: f64,
    pub cylinder_cost_total: f64,
    pub cylinder_cost_amortized_per_kg: f64,

    pub conversion_cost_per_kg: f64,
    pub total_cost_per_kg: f64,

    pub cost_per_1000_pouches: f64,
    pub selling_price_per_1000: f64,
    pub cost_per_pouch: f64,
    pub selling_price_per_pouch: f64,
    pub margin_percent: f64,
}

impl CostBreakdown {
    fn fields(&self) -> [(&'static str, f64); 18] {
        [
            ("total_gsm", self.total_gsm),
            ("total_thickness", self.total_thickness),
            ("weight_per_1000_pouches_kg", self.weight_per_1000_pouches_kg),
            ("material_cost_per_kg", self.material_cost_per_kg),
            ("ink_cost_per_kg", self.ink_cost_per_kg),
            ("printing_cost_per_kg", self.printing_cost_per_kg),
            ("lamination_cost_per_kg", self.lamination_cost_per_kg),
            ("pouching_cost_per_kg", self.pouching_cost_per_kg),
            ("overhead_cost_per_kg", self.overhead_cost_per_kg),
            ("cylinder_cost_total", self.cylinder_cost_total),
            ("cylinder_cost_amortized_per_kg", self.cylinder_cost_amortized_per_kg),
            ("conversion_cost_per_kg", self.conversion_cost_per_kg),
            ("total_cost_per_kg", self.total_cost_per_kg),
            ("cost_per_1000_pouches", self.cost_per_1000_pouches),
            ("selling_price_per_1000", self.selling_price_per_1000),
            ("cost_per_pouch", self.cost_per_pouch),
            ("selling_price_per_pouch", self.selling_price_per_pouch),
            ("margin_percent", self.margin_percent),
        ]
    }

    fn ensure_finite(&self) -> Result<(), PricingError> {
        match self.fields().iter().find(|(_, v)| !v.is_finite()) {
            Some((name, v)) => Err(PricingError::Internal(format!("{} evaluated to {}", name, v))),
            None => Ok(()),
        }
    }
}

// Ties go to the even digit
fn round2(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round_ties_even() / 10_000.0
}

fn per_pouch(per_1000: f64) -> f64 {
    if per_1000 != 0.0 {
        per_1000 / 1000.0
    } else {
        0.0
    }
}

/// Spread the tooling cost over the job weight.
/// Kilograms win over pieces; with neither the share is 0.
fn amortize_cylinders(cylinder_cost_total: f64, req: &ProductRequirements, weight_per_pouch_g: f64) -> f64 {
    if let Some(kg) = req.quantity_kg.filter(|kg| *kg > 0.0) {
        return cylinder_cost_total / kg;
    }
    if let Some(pieces) = req.quantity_pieces.filter(|p| *p > 0) {
        let job_weight_kg = pieces as f64 * weight_per_pouch_g / 1000.0;
        if job_weight_kg > 0.0 {
            return cylinder_cost_total / job_weight_kg;
        }
    }
    0.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    #[serde(default = "default_client_name")]
    pub client_name: String,
    pub requirements: ProductRequirements,
}

fn default_client_name() -> String {
    "Unknown".to_string()
}

impl QuoteRequest {
    pub fn new(requirements: ProductRequirements) -> Self {
        Self { client_name: default_client_name(), requirements }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quotation {
    pub id: String,
    pub client_name: String,
    pub created_at: DateTime<Utc>,
    pub engine_version: String,
    pub requirements: ProductRequirements,
    pub breakdown: CostBreakdown,
    pub validation: ValidationResult,
    pub rates_digest: String,
    pub job_hash: String,
    pub quotation_hash: String,
}

/// The costing engine. Holds only immutable policy, so one instance can
/// serve any number of threads.
pub struct CostEngine {
    validator: Validator,
    allowances: SealAllowances,
    constants: CostingConstants,
}

impl CostEngine {
    pub fn new() -> Self {
        Self::with_policy(SealAllowances::default(), CostingConstants::default())
    }

    pub fn with_policy(allowances: SealAllowances, constants: CostingConstants) -> Self {
        Self { validator: Validator::new(), allowances, constants }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_policy(config.seal_allowances, config.costing)
    }

    pub fn allowances(&self) -> &SealAllowances {
        &self.allowances
    }

    pub fn constants(&self) -> &CostingConstants {
        &self.constants
    }

    /// Validate requirements
    ///
    /// This is the ONLY validation entry point.
    pub fn validate(&self, req: &ProductRequirements) -> ValidationResult {
        #[cfg(feature = "test-hooks")]
        VALIDATION_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        self.validator.validate(req)
    }

    pub fn geometry(&self, req: &ProductRequirements) -> PouchGeometry {
        self.allowances.resolve(req.pouch_type, req.width_mm, req.height_mm, req.gusset_mm)
    }

    pub fn conversion_costs(&self, req: &ProductRequirements) -> ConversionCosts {
        self.constants.conversion.costs_for(req)
    }

    /// Price a job against a rate snapshot with an explicit margin
    pub fn price(
        &self,
        req: &ProductRequirements,
        rates: &MaterialRateTable,
        margin_percent: f64,
    ) -> Result<CostBreakdown, PricingError> {
        self.price_validated(req, rates, margin_percent)
            .map(|(breakdown, _)| breakdown)
    }

    /// Validate once, then derive. The validation result rides along for quotations.
    fn price_validated(
        &self,
        req: &ProductRequirements,
        rates: &MaterialRateTable,
        margin_percent: f64,
    ) -> Result<(CostBreakdown, ValidationResult), PricingError> {
        let validation = self.validate(req);
        if !validation.valid {
            return Err(PricingError::InvalidRequirements(validation.error_summary()));
        }
        if !margin_percent.is_finite() || !(0.0..=100.0).contains(&margin_percent) {
            return Err(PricingError::InvalidRequirements(format!(
                "margin: {} outside 0-100 %",
                margin_percent
            )));
        }

        let breakdown = self.derive(req, rates, margin_percent);
        breakdown.ensure_finite()?;

        info!(
            pouch_type = ?req.pouch_type,
            total_cost_per_kg = breakdown.total_cost_per_kg,
            selling_price_per_1000 = breakdown.selling_price_per_1000,
            "job priced"
        );
        Ok((breakdown, validation))
    }

    /// Price a job at its own margin, taking one snapshot from `source`
    pub fn price_requirements(
        &self,
        req: &ProductRequirements,
        source: &dyn RateSource,
    ) -> Result<CostBreakdown, PricingError> {
        let rates = source.snapshot()?;
        self.price(req, &rates, req.margin_percent)
    }

    /// Price a job and wrap the result in an auditable quotation
    pub fn quote(
        &self,
        request: &QuoteRequest,
        source: &dyn RateSource,
    ) -> Result<Quotation, PricingError> {
        let req = &request.requirements;
        let rates = source.snapshot()?;

        let (breakdown, validation) = self.price_validated(req, &rates, req.margin_percent)?;

        let mut quotation = Quotation {
            id: Uuid::new_v4().to_string(),
            client_name: request.client_name.clone(),
            created_at: Utc::now(),
            engine_version: ENGINE_VERSION.to_string(),
            requirements: req.clone(),
            breakdown,
            validation,
            rates_digest: rates_digest(&rates)?,
            job_hash: compute_job_hash(req, &rates, ENGINE_VERSION)?,
            quotation_hash: String::new(), // Computed after
        };

        quotation.quotation_hash = compute_quotation_hash(&quotation)?;

        Ok(quotation)
    }

    fn derive(&self, req: &ProductRequirements, rates: &MaterialRateTable, margin_percent: f64) -> CostBreakdown {
        let geometry = self.geometry(req);
        let area_m2 = geometry.area_m2();
        debug!(
            open_width_mm = geometry.open_width_mm,
            cut_length_mm = geometry.cut_length_mm,
            area_m2,
            "geometry resolved"
        );

        let film = self.constants.film_metrics(&req.film_structure, rates, req.number_of_colors);
        let total_gsm = film.total_gsm();

        let weight_per_pouch_g = area_m2 * total_gsm;
        // Grams per pouch equals kilograms per thousand pouches
        let weight_per_1000_pouches_kg = weight_per_pouch_g * 1000.0 / 1000.0;

        let raw_material_cost_per_kg = film.per_kg(film.material_cost_per_m2());
        let ink_cost_per_kg = film.per_kg(film.ink_cost_per_m2);
        debug!(total_gsm, weight_per_pouch_g, raw_material_cost_per_kg, ink_cost_per_kg, "film costed");

        let conversion = self.conversion_costs(req);
        let conversion_cost_per_kg = conversion.total();

        let cylinder_cost_total = req.number_of_colors as f64 * req.cylinder_cost_per_unit;
        let cylinder_cost_amortized_per_kg = amortize_cylinders(cylinder_cost_total, req, weight_per_pouch_g);

        let total_cost_per_kg = raw_material_cost_per_kg + conversion_cost_per_kg + cylinder_cost_amortized_per_kg;
        let cost_per_1000_pouches = total_cost_per_kg * weight_per_1000_pouches_kg;
        let selling_price_per_1000 = cost_per_1000_pouches * (1.0 + margin_percent / 100.0);

        CostBreakdown {
            total_gsm: round2(total_gsm),
            total_thickness: req.film_structure.total_thickness_micron(),
            weight_per_1000_pouches_kg: round2(weight_per_1000_pouches_kg),
            material_cost_per_kg: round2(raw_material_cost_per_kg - ink_cost_per_kg),
            ink_cost_per_kg: round2(ink_cost_per_kg),
            printing_cost_per_kg: round2(conversion.printing),
            lamination_cost_per_kg: round2(conversion.lamination),
            pouching_cost_per_kg: round2(conversion.pouching),
            overhead_cost_per_kg: round2(conversion.overhead_bucket()),
            cylinder_cost_total: round2(cylinder_cost_total),
            cylinder_cost_amortized_per_kg: round2(cylinder_cost_amortized_per_kg),
            conversion_cost_per_kg: round2(conversion_cost_per_kg),
            total_cost_per_kg: round2(total_cost_per_kg),
            cost_per_1000_pouches: round2(cost_per_1000_pouches),
            selling_price_per_1000: round2(selling_price_per_1000),
            cost_per_pouch: round4(per_pouch(cost_per_1000_pouches)),
            selling_price_per_pouch: round4(per_pouch(selling_price_per_1000)),
            margin_percent,
        }
    }
}

impl Default for CostEngine {
    fn default() -> Self {
        Self::new()
    }
}
