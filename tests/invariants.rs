//! Contract Invariant Tests
//!
//! These tests verify the guarantees callers price quotations on.

use pouchcost_core::{
    CostEngine, CostingConstants, EngineConfig, FilmStructure, Layer, MaterialRateTable,
    PouchType, PricingError, ProductRequirements, QuoteRequest, RateFile,
    geometry::resolve,
};

fn single_layer_job() -> ProductRequirements {
    ProductRequirements::new(
        PouchType::CenterSeal,
        160.0,
        240.0,
        50.0,
        FilmStructure::new(vec![Layer::new("LDPE", 50.0)]),
    )
}

fn pharma_sachet() -> ProductRequirements {
    let mut req = ProductRequirements::new(
        PouchType::ThreeSideSeal,
        80.0,
        120.0,
        0.0,
        FilmStructure::new(vec![
            Layer::new("PET", 12.0),
            Layer::new("AL_FOIL", 9.0),
            Layer::new("LDPE", 37.5),
        ]),
    )
    .with_colors(4)
    .with_quantity_pieces(500_000)
    .with_margin(30.0);
    req.cylinder_cost_per_unit = 4500.0;
    req
}

fn price(req: &ProductRequirements) -> pouchcost_core::CostBreakdown {
    CostEngine::new()
        .price(req, &MaterialRateTable::default(), req.margin_percent)
        .unwrap()
}

#[test]
fn invariant_single_layer_has_no_adhesive() {
    let req = single_layer_job();
    let metrics = CostingConstants::default().film_metrics(
        &req.film_structure,
        &MaterialRateTable::default(),
        0,
    );

    assert_eq!(metrics.adhesive_gsm, 0.0);
    assert_eq!(metrics.adhesive_cost_per_m2, 0.0);
    assert_eq!(metrics.total_gsm(), Layer::new("LDPE", 50.0).gsm());
}

#[test]
fn invariant_weight_per_1000_equals_area_times_gsm() {
    let req = single_layer_job();
    let geometry = resolve(req.pouch_type, req.width_mm, req.height_mm, req.gusset_mm);
    // 2 x 160 + 2 x 50 + 20 overlap, 240 + 2 x 10 seals
    assert_eq!(geometry.open_width_mm, 440.0);
    assert_eq!(geometry.cut_length_mm, 260.0);

    let b = price(&req);
    assert_eq!(b.total_gsm, 46.0);
    assert_eq!(b.weight_per_1000_pouches_kg, 5.26);
    assert!((geometry.area_m2() * 46.0 - 5.2624).abs() < 1e-9);
}

#[test]
fn invariant_single_layer_breakdown() {
    let b = price(&single_layer_job());

    // 105/kg LDPE, no ink, 15 + 12 + 20 + 5 + 12 conversion
    assert_eq!(b.material_cost_per_kg, 105.0);
    assert_eq!(b.ink_cost_per_kg, 0.0);
    assert_eq!(b.conversion_cost_per_kg, 64.0);
    assert_eq!(b.total_cost_per_kg, 169.0);
    assert_eq!(b.cost_per_1000_pouches, 889.35);
    assert_eq!(b.selling_price_per_1000, 1067.21);
    assert_eq!(b.cost_per_pouch, 0.8893);
    assert_eq!(b.selling_price_per_pouch, 1.0672);
    assert_eq!(b.total_thickness, 50.0);
}

#[test]
fn invariant_no_colors_no_ink() {
    let req = single_layer_job();
    let metrics = CostingConstants::default().film_metrics(
        &req.film_structure,
        &MaterialRateTable::default(),
        0,
    );
    assert_eq!(metrics.ink_gsm, 0.0);
    assert_eq!(metrics.ink_cost_per_m2, 0.0);
    assert_eq!(price(&req).ink_cost_per_kg, 0.0);
}

#[test]
fn invariant_no_quantity_no_amortization() {
    let mut req = single_layer_job().with_colors(6);
    req.cylinder_cost_per_unit = 4000.0;

    let b = price(&req);
    assert_eq!(b.cylinder_cost_amortized_per_kg, 0.0);
    assert_eq!(b.cylinder_cost_total, 24_000.0);
}

#[test]
fn invariant_quantity_kg_amortization() {
    let req = single_layer_job().with_colors(4).with_quantity_kg(500.0);
    let b = price(&req);
    assert_eq!(b.cylinder_cost_total, 14_000.0);
    assert_eq!(b.cylinder_cost_amortized_per_kg, 28.0);
}

#[test]
fn invariant_non_positive_quantity_amortizes_nothing() {
    let negative_kg = single_layer_job().with_colors(4).with_quantity_kg(-10.0);
    let b = price(&negative_kg);
    assert_eq!(b.cylinder_cost_total, 14_000.0);
    assert_eq!(b.cylinder_cost_amortized_per_kg, 0.0);

    let negative_pieces: ProductRequirements = serde_json::from_str(
        r#"{
            "pouch_type": "CENTER_SEAL",
            "width_mm": 160,
            "height_mm": 240,
            "gusset_mm": 50,
            "number_of_colors": 4,
            "quantity_pieces": -5,
            "film_structure": {"layers": [{"material": "LDPE", "thickness_micron": 50}]}
        }"#,
    )
    .unwrap();
    let b = price(&negative_pieces);
    assert_eq!(b.cylinder_cost_amortized_per_kg, 0.0);
    assert_eq!(b.cylinder_cost_total, 14_000.0);
}

#[test]
fn invariant_printing_override_wins_for_any_color_count() {
    for colors in 0..=10 {
        let mut req = single_layer_job().with_colors(colors);
        req.printing_cost_per_kg_override = Some(7.25);
        assert_eq!(price(&req).printing_cost_per_kg, 7.25);

        req.printing_cost_per_kg_override = Some(0.0);
        assert_eq!(price(&req).printing_cost_per_kg, 0.0);
    }
}

#[test]
fn invariant_selling_price_applies_margin() {
    for margin in [0.0, 20.0, 100.0] {
        let b = CostEngine::new()
            .price(&pharma_sachet(), &MaterialRateTable::default(), margin)
            .unwrap();
        let factor = 1.0 + margin / 100.0;
        // Both sides are rounded to cents independently
        let tolerance = 0.005 * factor + 0.005 + 1e-9;
        assert!((b.selling_price_per_1000 - b.cost_per_1000_pouches * factor).abs() <= tolerance);
        assert_eq!(b.margin_percent, margin);
    }
}

#[test]
fn invariant_unknown_pouch_type_falls_back() {
    let req: ProductRequirements = serde_json::from_str(
        r#"{
            "pouch_type": "FLAT_BOTTOM_BOX",
            "width_mm": 100,
            "height_mm": 150,
            "gusset_mm": 40,
            "film_structure": {"layers": [{"material": "PET", "thickness_micron": 12}]}
        }"#,
    )
    .unwrap();
    assert_eq!(req.pouch_type, PouchType::Other);

    let engine = CostEngine::new();
    let geometry = engine.geometry(&req);
    assert_eq!(geometry.open_width_mm, 200.0);
    assert_eq!(geometry.cut_length_mm, 150.0);

    let result = engine.price(&req, &MaterialRateTable::default(), 20.0);
    assert!(result.is_ok());
}

#[test]
fn invariant_unknown_material_uses_defaults() {
    let req = ProductRequirements::new(
        PouchType::ThreeSideSeal,
        100.0,
        150.0,
        0.0,
        FilmStructure::new(vec![Layer::new("MYSTERY_FILM", 40.0)]),
    );

    let b = CostEngine::new()
        .price(&req, &MaterialRateTable::empty(), 20.0)
        .unwrap();

    // density 1.0 -> 40 gsm; 200 x 170 mm -> 0.034 m2
    assert_eq!(b.total_gsm, 40.0);
    assert_eq!(b.weight_per_1000_pouches_kg, 1.36);
    assert_eq!(b.material_cost_per_kg, 100.0);
}

#[test]
fn invariant_three_ply_sachet() {
    let b = price(&pharma_sachet());

    // 16.8 + 24.3 + 34.5 film, 5.0 adhesive, 3.0 ink
    assert_eq!(b.total_gsm, 83.6);
    assert_eq!(b.weight_per_1000_pouches_kg, 1.87);
    assert_eq!(b.printing_cost_per_kg, 23.0);
    assert_eq!(b.lamination_cost_per_kg, 22.0);
    assert_eq!(b.cylinder_cost_total, 18_000.0);
    assert!(b.cylinder_cost_amortized_per_kg > 0.0);
    assert!(b.ink_cost_per_kg > 0.0);
    assert!(b.selling_price_per_pouch > b.cost_per_pouch);
}

#[test]
fn invariant_invalid_requirements_rejected() {
    let mut req = single_layer_job();
    req.film_structure.layers.clear();

    let err = CostEngine::new()
        .price(&req, &MaterialRateTable::default(), 20.0)
        .unwrap_err();

    assert!(err.is_invalid_input());
    assert!(err.to_string().contains("Invalid requirements"));
}

#[test]
fn invariant_rate_source_failure_is_not_invalid_input() {
    let dir = tempfile::tempdir().unwrap();
    let missing = RateFile::new(dir.path().join("rates.json"));

    let err = CostEngine::new()
        .price_requirements(&single_layer_job(), &missing)
        .unwrap_err();

    assert!(matches!(err, PricingError::RateSource(_)));
    assert!(!err.is_invalid_input());
}

#[test]
fn invariant_rate_snapshot_drives_cost() {
    let mut rates = MaterialRateTable::default();
    rates.set("LDPE", 210.0);

    let b = CostEngine::new()
        .price_requirements(&single_layer_job(), &rates)
        .unwrap();
    assert_eq!(b.material_cost_per_kg, 210.0);
}

#[test]
fn invariant_quotation_hashes() {
    let engine = CostEngine::new();
    let rates = MaterialRateTable::default();
    let request = QuoteRequest {
        client_name: "Acme Snacks".to_string(),
        requirements: pharma_sachet(),
    };

    let q1 = engine.quote(&request, &rates).unwrap();
    let q2 = engine.quote(&request, &rates).unwrap();

    assert_eq!(q1.job_hash, q2.job_hash);
    assert_eq!(q1.rates_digest, q2.rates_digest);
    assert_ne!(q1.id, q2.id);
    assert_eq!(q1.quotation_hash.len(), 64);
    assert_eq!(q1.client_name, "Acme Snacks");
    assert_eq!(q1.breakdown, q2.breakdown);
}

#[test]
fn invariant_config_policy_reaches_engine() {
    let mut config = EngineConfig::default();
    config.seal_allowances.stand_up_bottom_fold_mm = 40.0;
    config.costing.white_base_ink_gsm = 0.0;

    let engine = CostEngine::from_config(&config);
    let req = ProductRequirements::new(
        PouchType::StandUpPouch,
        140.0,
        220.0,
        60.0,
        FilmStructure::new(vec![Layer::new("PET", 12.0)]),
    )
    .with_colors(2);

    assert_eq!(engine.geometry(&req).open_width_mm, 440.0);
    let metrics = engine
        .constants()
        .film_metrics(&req.film_structure, &MaterialRateTable::default(), 2);
    assert_eq!(metrics.ink_gsm, 1.0);
}

#[test]
fn invariant_engine_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<CostEngine>();
}

#[cfg(feature = "test-hooks")]
#[test]
fn invariant_price_calls_validate() {
    use pouchcost_core::costing::{get_validation_call_count, reset_validation_call_count};

    reset_validation_call_count();
    let _ = CostEngine::new().price(&single_layer_job(), &MaterialRateTable::default(), 20.0);
    assert!(get_validation_call_count() >= 1);
}
