use rstest::rstest;
use vfo_config::{Config, ConfigError, load_toml};

#[test]
fn defaults_are_valid() {
    let cfg = Config::default();
    cfg.validate().expect("default config must validate");
}

#[test]
fn empty_toml_uses_defaults() {
    let cfg = load_toml("").expect("empty document");
    assert_eq!(cfg.band.label, "40 Meter");
    assert_eq!(cfg.encoder.detent_divisor, 1);
}

#[test]
fn partial_toml_overrides_only_named_fields() {
    let cfg = load_toml(
        r#"
        [band]
        f_min_hz = 14000000.0
        f_max_hz = 14350000.0
        start_hz = 14074000.0
        label = "20 Meter"

        [encoder]
        detent_divisor = 4
        "#,
    )
    .expect("valid 20m config");
    assert_eq!(cfg.band.f_max_hz, 14_350_000.0);
    assert_eq!(cfg.encoder.detent_divisor, 4);
    // Untouched sections keep their defaults.
    assert_eq!(cfg.tuner.turbo_window_ms, 250);
    assert_eq!(cfg.ladder.steps_hz.len(), 10);
}

#[rstest]
#[case(
    r#"
    [band]
    f_min_hz = 7200000.0
    f_max_hz = 7000000.0
    start_hz = 7100000.0
    "#
)]
#[case(
    r#"
    [band]
    start_hz = 7500000.0
    "#
)]
fn inverted_or_out_of_band_start_is_rejected(#[case] toml: &str) {
    match load_toml(toml) {
        Err(ConfigError::Band(_)) => {}
        other => panic!("expected band error, got {other:?}"),
    }
}

#[test]
fn ladder_must_have_ten_rungs() {
    let toml = r#"
    [ladder]
    steps_hz = [1.0, 10.0, 50.0]
    up_ms = [1000, 100, 50]
    down_ms = [2000, 200, 100]
    "#;
    match load_toml(toml) {
        Err(ConfigError::Ladder(msg)) => assert!(msg.contains("10 entries")),
        other => panic!("expected ladder error, got {other:?}"),
    }
}

#[test]
fn ladder_steps_must_strictly_increase() {
    let mut cfg = Config::default();
    cfg.ladder.steps_hz[4] = cfg.ladder.steps_hz[3];
    match cfg.validate() {
        Err(ConfigError::Ladder(msg)) => assert!(msg.contains("strictly increasing")),
        other => panic!("expected ladder error, got {other:?}"),
    }
}

#[test]
fn thresholds_must_not_increase_with_rung() {
    let mut cfg = Config::default();
    cfg.ladder.up_ms[5] = cfg.ladder.up_ms[4] + 1;
    assert!(matches!(cfg.validate(), Err(ConfigError::Ladder(_))));
}

#[test]
fn hysteresis_requires_down_at_least_up() {
    let mut cfg = Config::default();
    // Tighten down_ms below up_ms at one rung: the promote/demote bands
    // would overlap and the rung could chatter.
    cfg.ladder.down_ms[3] = cfg.ladder.up_ms[3] - 1;
    // Keep down_ms non-increasing so only the hysteresis rule can fail.
    for i in 4..cfg.ladder.down_ms.len() {
        cfg.ladder.down_ms[i] = cfg.ladder.down_ms[i].min(cfg.ladder.down_ms[3]);
    }
    match cfg.validate() {
        Err(ConfigError::Ladder(msg)) => assert!(msg.contains(">= up_ms")),
        other => panic!("expected hysteresis error, got {other:?}"),
    }
}

#[rstest]
#[case("[encoder]\ndetent_divisor = 0")]
#[case("[encoder]\ndebounce_ms = 0")]
fn encoder_zeroes_are_rejected(#[case] toml: &str) {
    assert!(matches!(load_toml(toml), Err(ConfigError::Encoder(_))));
}

#[test]
fn estimator_alpha_must_be_positive() {
    let toml = "[estimator]\nalpha_per_second = 0.0";
    assert!(matches!(load_toml(toml), Err(ConfigError::Estimator(_))));
}

#[test]
fn garbage_toml_is_a_parse_error() {
    assert!(matches!(load_toml("band = ["), Err(ConfigError::Parse(_))));
}
