//! PouchCost CLI - Bridge interface for the quotation service
//!
//! Commands: rates, geometry, validate, price, quote
//! Outputs JSON to stdout, logs to stderr
//! Returns 2 on invalid requirements, 1 on any other failure

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

use pouchcost_core::{
    logging, CostEngine, EngineConfig, PouchType, PricingError, ProductRequirements, QuoteRequest,
    RateSource,
};

#[derive(Parser)]
#[command(name = "pouchcost-cli")]
#[command(about = "PouchCost CLI - Flexible Packaging Cost Estimator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to engine config (JSON)
    #[arg(short, long, default_value = "pouchcost.json")]
    config: PathBuf,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the material rate table in effect
    Rates {
        /// Rate table (JSON), overrides the config
        #[arg(short, long)]
        rates: Option<PathBuf>,
    },

    /// Resolve open width and cut length
    Geometry {
        /// Pouch type, e.g. CENTER_SEAL
        #[arg(short, long)]
        pouch_type: String,

        #[arg(long)]
        width: f64,

        #[arg(long)]
        height: f64,

        #[arg(long, default_value_t = 0.0)]
        gusset: f64,
    },

    /// Validate requirements
    Validate {
        /// JSON payload (ProductRequirements)
        #[arg(short, long)]
        payload: String,
    },

    /// Price requirements
    Price {
        /// JSON payload (ProductRequirements)
        #[arg(short, long)]
        payload: String,

        /// Margin percent, overrides the payload
        #[arg(short, long)]
        margin: Option<f64>,

        #[arg(short, long)]
        rates: Option<PathBuf>,
    },

    /// Price requirements and emit a quotation
    Quote {
        /// JSON payload (ProductRequirements)
        #[arg(short, long)]
        payload: String,

        #[arg(long, default_value = "Unknown")]
        client: String,

        #[arg(short, long)]
        rates: Option<PathBuf>,
    },
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{}", s);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("failed to serialize output: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn failure(err: &dyn std::fmt::Display, code: ExitCode) -> ExitCode {
    let output = serde_json::json!({
        "success": false,
        "error": err.to_string(),
    });
    println!("{}", output);
    code
}

fn pricing_failure(err: PricingError) -> ExitCode {
    let code = if err.is_invalid_input() { ExitCode::from(2) } else { ExitCode::FAILURE };
    failure(&err, code)
}

fn parse_requirements(payload: &str) -> Result<ProductRequirements, ExitCode> {
    serde_json::from_str(payload)
        .map_err(|e| failure(&format!("Invalid payload: {}", e), ExitCode::FAILURE))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = match EngineConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => return failure(&e, ExitCode::FAILURE),
    };

    let engine = CostEngine::from_config(&config);

    match cli.command {
        Commands::Rates { rates } => {
            match config.rate_source(rates.as_deref()).snapshot() {
                Ok(table) => print_json(&table),
                Err(e) => failure(&e, ExitCode::FAILURE),
            }
        }

        Commands::Geometry { pouch_type, width, height, gusset } => {
            // Unknown identifiers resolve to the fallback variant
            let pouch_type: PouchType = serde_json::from_value(serde_json::Value::String(pouch_type))
                .unwrap_or(PouchType::Other);
            let geometry = engine.allowances().resolve(pouch_type, width, height, gusset);
            print_json(&serde_json::json!({
                "pouch_type": pouch_type,
                "open_width_mm": geometry.open_width_mm,
                "cut_length_mm": geometry.cut_length_mm,
                "area_per_pouch_m2": geometry.area_m2(),
            }))
        }

        Commands::Validate { payload } => {
            let req = match parse_requirements(&payload) {
                Ok(r) => r,
                Err(code) => return code,
            };

            let result = engine.validate(&req);
            let code = print_json(&result);
            if result.valid {
                code
            } else {
                ExitCode::from(2) // Validation failure
            }
        }

        Commands::Price { payload, margin, rates } => {
            let req = match parse_requirements(&payload) {
                Ok(r) => r,
                Err(code) => return code,
            };

            let table = match config.rate_source(rates.as_deref()).snapshot() {
                Ok(t) => t,
                Err(e) => return pricing_failure(e.into()),
            };

            let margin = margin.unwrap_or(req.margin_percent);
            match engine.price(&req, &table, margin) {
                Ok(breakdown) => print_json(&serde_json::json!({
                    "success": true,
                    "breakdown": breakdown,
                })),
                Err(e) => pricing_failure(e),
            }
        }

        Commands::Quote { payload, client, rates } => {
            let req = match parse_requirements(&payload) {
                Ok(r) => r,
                Err(code) => return code,
            };

            let request = QuoteRequest { client_name: client, requirements: req };
            match engine.quote(&request, &config.rate_source(rates.as_deref())) {
                Ok(quotation) => print_json(&serde_json::json!({
                    "success": true,
                    "quotation": quotation,
                })),
                Err(e) => pricing_failure(e),
            }
        }
    }
}
