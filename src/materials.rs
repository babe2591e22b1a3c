//! Film Materials - Layers, Densities and Rate Snapshots

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Density used for materials missing from the density table (g/cm3)
pub const DEFAULT_DENSITY: f64 = 1.0;
/// Rate used for materials missing from the rate table (per kg)
pub const DEFAULT_MATERIAL_RATE: f64 = 100.0;

/// Standard film densities (g/cm3)
const DENSITIES: &[(&str, f64)] = &[
    ("PET", 1.4),
    ("BOPP", 0.905),
    ("MET_PET", 1.4),
    ("MET_BOPP", 0.905),
    ("LDPE", 0.92),
    ("CPP", 0.90),
    ("AL_FOIL", 2.7),
    ("NYLON", 1.15),
    ("PAPER", 0.8),
];

/// Factory rates, used until the configuration store says otherwise
const FACTORY_RATES: &[(&str, f64)] = &[
    ("PET", 110.0),
    ("BOPP", 130.0),
    ("MET_PET", 120.0),
    ("MET_BOPP", 140.0),
    ("LDPE", 105.0),
    ("CPP", 115.0),
    ("AL_FOIL", 400.0),
    ("NYLON", 250.0),
    ("PAPER", 80.0),
];

pub fn known_density(material: &str) -> Option<f64> {
    DENSITIES
        .iter()
        .find(|(name, _)| *name == material)
        .map(|(_, density)| *density)
}

/// One ply of the film stack
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Layer {
    pub material: String,
    pub thickness_micron: f64,
}

impl Layer {
    pub fn new(material: impl Into<String>, thickness_micron: f64) -> Self {
        Self { material: material.into(), thickness_micron }
    }

    pub fn density(&self) -> f64 {
        known_density(&self.material).unwrap_or(DEFAULT_DENSITY)
    }

    /// Areal weight of this ply; 1 micron at 1 g/cm3 weighs 1 g/m2
    pub fn gsm(&self) -> f64 {
        self.thickness_micron * self.density()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FilmStructure {
    pub layers: Vec<Layer>,
}

impl FilmStructure {
    pub fn new(layers: Vec<Layer>) -> Self {
        Self { layers }
    }

    pub fn total_thickness_micron(&self) -> f64 {
        self.layers.iter().map(|l| l.thickness_micron).sum()
    }

    /// Number of bonded interfaces between consecutive layers
    pub fn interface_count(&self) -> usize {
        self.layers.len().saturating_sub(1)
    }
}

/// Material identifier -> rate per kilogram
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct MaterialRateTable {
    rates: BTreeMap<String, f64>,
}

impl MaterialRateTable {
    pub fn empty() -> Self {
        Self { rates: BTreeMap::new() }
    }

    pub fn from_rates<I, K>(rates: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            rates: rates.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Rate for `material`, falling back to `DEFAULT_MATERIAL_RATE`
    pub fn rate(&self, material: &str) -> f64 {
        self.lookup(material).unwrap_or(DEFAULT_MATERIAL_RATE)
    }

    pub fn lookup(&self, material: &str) -> Option<f64> {
        self.rates.get(material).copied()
    }

    pub fn set(&mut self, material: impl Into<String>, rate: f64) {
        self.rates.insert(material.into(), rate);
    }

    /// Apply a partial update. Materials not named in `updates` keep their rate.
    pub fn merge(&mut self, updates: &MaterialRateTable) {
        for (material, rate) in &updates.rates {
            self.rates.insert(material.clone(), *rate);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.rates.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn load_from_file(path: &Path) -> Result<Self, RateSourceError> {
        let content = fs::read_to_string(path).map_err(|source| RateSourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table: MaterialRateTable =
            serde_json::from_str(&content).map_err(|source| RateSourceError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if let Some((material, rate)) = table.iter().find(|(_, r)| !r.is_finite() || *r < 0.0) {
            return Err(RateSourceError::InvalidRate {
                material: material.to_string(),
                rate,
            });
        }

        Ok(table)
    }
}

impl Default for MaterialRateTable {
    fn default() -> Self {
        Self::from_rates(FACTORY_RATES.iter().copied())
    }
}

#[derive(Debug, Error)]
pub enum RateSourceError {
    #[error("Failed to read rate table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse rate table {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid rate {rate} for material {material}")]
    InvalidRate { material: String, rate: f64 },
}

/// Supplies the material rate snapshot for one costing call.
///
/// The engine calls `snapshot` exactly once per job and only reads the result.
pub trait RateSource {
    fn snapshot(&self) -> Result<MaterialRateTable, RateSourceError>;
}

impl RateSource for MaterialRateTable {
    fn snapshot(&self) -> Result<MaterialRateTable, RateSourceError> {
        Ok(self.clone())
    }
}

/// Rate table kept in a JSON file, re-read on every snapshot so edits made by
/// the configuration store are picked up by the next job.
#[derive(Debug, Clone)]
pub struct RateFile {
    path: PathBuf,
    /// Rates layered under the file; the file wins on conflicts
    base: MaterialRateTable,
}

impl RateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), base: MaterialRateTable::default() }
    }

    pub fn with_base(mut self, base: MaterialRateTable) -> Self {
        self.base = base;
        self
    }
}

impl RateSource for RateFile {
    fn snapshot(&self) -> Result<MaterialRateTable, RateSourceError> {
        let from_file = MaterialRateTable::load_from_file(&self.path)?;
        let mut table = self.base.clone();
        table.merge(&from_file);
        Ok(table)
    }
}
