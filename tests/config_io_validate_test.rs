use pumpwatch::config::{Config, TimeTagConfig};
use pumpwatch::model::Coordinate;
use std::fs;
use std::time::Duration;

#[test]
fn save_and_load_yaml_roundtrip() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("config.yaml");

    let mut cfg = Config::default();
    cfg.coordinates = vec![Coordinate::new(43.65, -79.38)];
    cfg.pacing.coordinate_cooldown_secs = 120.0;
    cfg.output.dataset_path = tmp_dir.path().join("prices.csv");
    cfg.logging.file = path.with_extension("log").to_string_lossy().to_string();

    cfg.save_to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();

    assert_eq!(loaded.coordinates, cfg.coordinates);
    assert_eq!(loaded.pacing.coordinate_cooldown(), Duration::from_secs(120));
    assert_eq!(loaded.output.dataset_path, cfg.output.dataset_path);
    assert_eq!(loaded.logging.file, cfg.logging.file);
    assert_eq!(loaded.time_tags, cfg.time_tags);
}

#[test]
fn config_validation_errors() {
    let mut cfg = Config::default();
    assert!(cfg.validate().is_ok());

    cfg.coordinates[1].longitude = -181.0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.fetch.backoff_base_secs = f64::NAN;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.output.dataset_path = Default::default();
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.logging.level = "LOUD".to_string();
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.time_tags.push(TimeTagConfig {
        tag: "late".to_string(),
        start_hour: 22,
        end_hour: 25,
    });
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.time_tags[0].end_hour = cfg.time_tags[0].start_hour;
    assert!(cfg.validate().is_err());
}

#[test]
fn from_file_with_invalid_yaml_fails() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(tmp.path(), b"bad: [unclosed").unwrap();
    let err = Config::from_file(tmp.path()).unwrap_err();
    let msg = format!("{}", err);
    assert!(msg.contains("Serialization error"));
}

#[test]
fn timezone_resolves_when_configured() {
    let mut cfg = Config::default();
    assert!(cfg.timezone().unwrap().is_none());
    cfg.timezone = Some("America/Vancouver".to_string());
    assert_eq!(
        cfg.timezone().unwrap(),
        Some(chrono_tz::America::Vancouver)
    );
}
