//! Validation System - Rule/Policy Separation
//!
//! Rules produce structured violations.
//! Only errors make a job unpriceable; warnings and info travel with the result.

use serde::{Deserialize, Serialize};

use crate::materials::known_density;
use crate::requirements::{ProductRequirements, MAX_COLORS};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationViolation {
    pub rule: String,
    pub severity: ViolationSeverity,
    pub message: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub remediation: Vec<String>,
}

impl ValidationViolation {
    fn error(rule: &str, message: impl Into<String>, expected: &str, actual: String) -> Self {
        Self {
            rule: rule.to_string(),
            severity: ViolationSeverity::Error,
            message: message.into(),
            expected: Some(expected.to_string()),
            actual: Some(actual),
            remediation: vec![],
        }
    }

    fn remedy(mut self, hint: &str) -> Self {
        self.remediation.push(hint.to_string());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub violations: Vec<ValidationViolation>,
}

impl ValidationResult {
    pub fn from_violations(violations: Vec<ValidationViolation>) -> Self {
        let valid = !violations.iter().any(|v| v.severity == ViolationSeverity::Error);
        Self { valid, violations }
    }

    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(|v| v.severity == ViolationSeverity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationViolation> {
        self.violations.iter().filter(|v| v.severity == ViolationSeverity::Error)
    }

    /// "rule: message" for every error, joined with "; "
    pub fn error_summary(&self) -> String {
        self.errors()
            .map(|v| format!("{}: {}", v.rule, v.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Validation rule trait - produces violations
pub trait ValidationRule {
    fn name(&self) -> &'static str;
    fn validate(&self, req: &ProductRequirements) -> Vec<ValidationViolation>;
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

// --- Concrete Rules ---

pub struct DimensionsRule;

impl ValidationRule for DimensionsRule {
    fn name(&self) -> &'static str { "dimensions" }

    fn validate(&self, req: &ProductRequirements) -> Vec<ValidationViolation> {
        let mut violations = vec![];

        for (field, value) in [("width_mm", req.width_mm), ("height_mm", req.height_mm)] {
            if !positive(value) {
                violations.push(
                    ValidationViolation::error(
                        self.name(),
                        format!("{} must be positive", field),
                        "> 0",
                        value.to_string(),
                    )
                    .remedy("Enter the finished pouch dimension in millimetres"),
                );
            }
        }

        if !non_negative(req.gusset_mm) {
            violations.push(ValidationViolation::error(
                self.name(),
                "gusset_mm must not be negative",
                ">= 0",
                req.gusset_mm.to_string(),
            ));
        }

        violations
    }
}

pub struct FilmStructureRule;

impl ValidationRule for FilmStructureRule {
    fn name(&self) -> &'static str { "film_structure" }

    fn validate(&self, req: &ProductRequirements) -> Vec<ValidationViolation> {
        let layers = &req.film_structure.layers;
        if layers.is_empty() {
            return vec![ValidationViolation::error(
                self.name(),
                "Film structure has no layers",
                "at least 1 layer",
                "0 layers".to_string(),
            )
            .remedy("Add the outer print layer and the sealant layer")];
        }

        let mut violations = vec![];
        for (i, layer) in layers.iter().enumerate() {
            if !positive(layer.thickness_micron) {
                violations.push(ValidationViolation::error(
                    self.name(),
                    format!("Layer {} ({}) thickness must be positive", i + 1, layer.material),
                    "> 0 micron",
                    layer.thickness_micron.to_string(),
                ));
            }
            if known_density(&layer.material).is_none() {
                violations.push(ValidationViolation {
                    rule: self.name().to_string(),
                    severity: ViolationSeverity::Warning,
                    message: format!("Unknown material {}, default density applies", layer.material),
                    expected: None,
                    actual: Some(layer.material.clone()),
                    remediation: vec!["Check the material code against the rate table".to_string()],
                });
            }
        }
        violations
    }
}

pub struct ColorCountRule;

impl ValidationRule for ColorCountRule {
    fn name(&self) -> &'static str { "color_count" }

    fn validate(&self, req: &ProductRequirements) -> Vec<ValidationViolation> {
        if req.number_of_colors > MAX_COLORS {
            return vec![ValidationViolation::error(
                self.name(),
                "Too many printing colours",
                &format!("{} colours max", MAX_COLORS),
                format!("{} colours", req.number_of_colors),
            )
            .remedy("Reduce the colour count or merge spot colours")];
        }
        vec![]
    }
}

pub struct MarginRule;

impl ValidationRule for MarginRule {
    fn name(&self) -> &'static str { "margin" }

    fn validate(&self, req: &ProductRequirements) -> Vec<ValidationViolation> {
        let m = req.margin_percent;
        if !m.is_finite() || !(0.0..=100.0).contains(&m) {
            return vec![ValidationViolation::error(
                self.name(),
                "Margin out of range",
                "0-100 %",
                m.to_string(),
            )];
        }
        vec![]
    }
}

pub struct ToolingRule;

impl ValidationRule for ToolingRule {
    fn name(&self) -> &'static str { "tooling" }

    fn validate(&self, req: &ProductRequirements) -> Vec<ValidationViolation> {
        let mut violations = vec![];

        let amounts = [
            ("cylinder_cost_per_unit", Some(req.cylinder_cost_per_unit)),
            ("printing_cost_per_kg_override", req.printing_cost_per_kg_override),
            ("lamination_cost_per_kg_override", req.lamination_cost_per_kg_override),
        ];

        for (field, value) in amounts {
            if let Some(v) = value {
                if !non_negative(v) {
                    violations.push(ValidationViolation::error(
                        self.name(),
                        format!("{} must not be negative", field),
                        ">= 0",
                        v.to_string(),
                    ));
                }
            }
        }

        if req.number_of_colors > 0 && !req.has_quantity() {
            violations.push(ValidationViolation {
                rule: self.name().to_string(),
                severity: ViolationSeverity::Info,
                message: "No positive target quantity, cylinder cost is not amortized".to_string(),
                expected: None,
                actual: None,
                remediation: vec!["Give a positive quantity_kg or quantity_pieces".to_string()],
            });
        }

        violations
    }
}

pub struct PouchTypeRule;

impl ValidationRule for PouchTypeRule {
    fn name(&self) -> &'static str { "pouch_type" }

    fn validate(&self, req: &ProductRequirements) -> Vec<ValidationViolation> {
        if req.pouch_type.has_allowance_policy() {
            return vec![];
        }
        vec![ValidationViolation {
            rule: self.name().to_string(),
            severity: ViolationSeverity::Warning,
            message: "No seal allowance policy for this pouch type, flat web size used".to_string(),
            expected: Some("CENTER_SEAL, THREE_SIDE_SEAL or STAND_UP_POUCH".to_string()),
            actual: Some(format!("{:?}", req.pouch_type)),
            remediation: vec![],
        }]
    }
}

/// Validator runs every rule; policy is fixed: errors block, the rest report
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule + Send + Sync>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(DimensionsRule),
                Box::new(FilmStructureRule),
                Box::new(ColorCountRule),
                Box::new(MarginRule),
                Box::new(ToolingRule),
                Box::new(PouchTypeRule),
            ],
        }
    }

    pub fn validate(&self, req: &ProductRequirements) -> ValidationResult {
        let mut all_violations = vec![];

        for rule in &self.rules {
            all_violations.extend(rule.validate(req));
        }

        ValidationResult::from_violations(all_violations)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
