//! PouchCost Core - Flexible Packaging Cost Estimator
//!
//! requirements -> geometry -> film metrics -> conversion -> cost breakdown
//!
//! The engine is a pure function of its inputs plus one material rate
//! snapshot. Validation always runs before any figure is derived.

pub mod geometry;
pub mod materials;
pub mod requirements;
pub mod conversion;
pub mod validation;
pub mod hashing;
pub mod costing;
pub mod config;
pub mod logging;

pub use geometry::{PouchType, PouchGeometry, SealAllowances};
pub use materials::{Layer, FilmStructure, MaterialRateTable, RateSource, RateFile, RateSourceError};
pub use requirements::{ProductRequirements, PrintingMethod};
pub use conversion::{ConversionRates, ConversionCosts, RateAuthority};
pub use validation::{ValidationResult, ValidationRule, ValidationViolation, ViolationSeverity, Validator};
pub use hashing::{canonical_json, compute_job_hash, compute_quotation_hash};
pub use costing::{CostEngine, CostBreakdown, CostingConstants, FilmMetrics, PricingError, Quotation, QuoteRequest};
pub use config::{EngineConfig, ConfigError};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
