use sandbox_synth::scenario_catalog::{ScenarioCatalog, ScenarioParameters};

#[test]
/// Verifies the builtin regime table: volatility x / volume x / trend / spread %.
fn builtin_scenarios_match_reference_table() {
    let catalog = ScenarioCatalog::builtin();
    let expected = [
        ("normal", 1.0, 1.0, 0.0, 0.1),
        ("volatile", 3.0, 2.0, 0.0, 0.2),
        ("crash", 5.0, 4.0, -0.8, 0.5),
        ("rally", 2.0, 2.5, 0.8, 0.15),
        ("opening_bell", 4.0, 5.0, 0.0, 0.3),
    ];
    for (name, vol, volume, trend, spread) in expected {
        let s = catalog.get(name).unwrap();
        assert_eq!(s.volatility_multiplier, vol, "{}", name);
        assert_eq!(s.volume_multiplier, volume, "{}", name);
        assert_eq!(s.trend_bias, trend, "{}", name);
        assert_eq!(s.spread_pct, spread, "{}", name);
    }
    assert_eq!(catalog.names().len(), expected.len());
}

#[test]
fn unknown_scenario_is_never_defaulted() {
    let catalog = ScenarioCatalog::builtin();
    for name in ["", "Normal-ish", "bear", "CRASH!"] {
        assert!(catalog.get(name).unwrap_err().is_config(), "{}", name);
    }
}

#[test]
fn custom_scenarios_are_validated() {
    let ok = ScenarioCatalog::from_scenarios(vec![ScenarioParameters::new(
        "halt", 0.1, 0.1, 0.0, 0.05,
    )])
    .unwrap();
    assert_eq!(ok.names(), vec!["halt"]);

    for bad in [
        ScenarioParameters::new("zero_vol", 0.0, 1.0, 0.0, 0.1),
        ScenarioParameters::new("zero_volume", 1.0, 0.0, 0.0, 0.1),
        ScenarioParameters::new("zero_spread", 1.0, 1.0, 0.0, 0.0),
        ScenarioParameters::new("wide_spread", 1.0, 1.0, 0.0, 12.0),
        ScenarioParameters::new("overbias", 1.0, 1.0, -1.2, 0.1),
    ] {
        assert!(ScenarioCatalog::from_scenarios(vec![bad]).is_err());
    }

    let dupes = vec![
        ScenarioParameters::new("calm", 1.0, 1.0, 0.0, 0.1),
        ScenarioParameters::new("Calm", 1.0, 1.0, 0.0, 0.1),
    ];
    assert!(ScenarioCatalog::from_scenarios(dupes).is_err());
}
