use super::validation::{parse_day, parse_time_of_day, validate_config};
use super::*;
use chrono::Weekday;
use serial_test::serial;
use std::fs;
use tempfile::tempdir;

fn parse(toml_text: &str) -> Config {
    toml::from_str(toml_text).unwrap()
}

#[test]
fn test_empty_config_uses_defaults() {
    let config = parse("");
    let settings = config.engine_settings().unwrap();

    assert_eq!(settings, EngineSettings::default());
    assert_eq!(settings.window.start_minute(), 21 * 60);
    assert_eq!(settings.window.end_minute(), 22 * 60);
    assert_eq!(settings.window.days(), WeekdaySet::ALL);
    assert!(settings.window.is_enabled());
    assert_eq!(settings.curve, AccelerationCurve::Linear);
}

#[test]
fn test_full_config_parses() {
    let config = parse(
        r#"
        schedule_enabled = true
        start = "22:15"
        end = "23:45:00"
        days = ["mon", "Tuesday", 3, "fri"]
        curve = "ease-in-out"
        mode = "random"
        "#,
    );
    let settings = config.engine_settings().unwrap();

    assert_eq!(settings.window.start_minute(), 22 * 60 + 15);
    assert_eq!(settings.window.end_minute(), 23 * 60 + 45);
    assert!(settings.window.contains_day(Weekday::Wed));
    assert!(!settings.window.contains_day(Weekday::Sun));
    assert_eq!(settings.window.days().len(), 4);
    assert_eq!(settings.curve, AccelerationCurve::EaseInOut);
    assert_eq!(settings.mode, ModeSelection::Random);
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_fixed_mode_parses() {
    let config = parse(r#"mode = "pixel-blackout""#);
    assert_eq!(
        config.mode,
        Some(ModeSelection::Fixed(crate::core::EffectMode::PixelBlackout))
    );
}

#[test]
fn test_unknown_values_are_rejected() {
    assert!(toml::from_str::<Config>(r#"curve = "bounce""#).is_err());
    assert!(toml::from_str::<Config>(r#"mode = "confetti""#).is_err());
    assert!(toml::from_str::<Config>(r#"brightness = 3"#).is_err());
}

#[test]
fn test_invalid_times_fail_validation() {
    let config = parse(r#"start = "25:00""#);
    assert!(validate_config(&config).is_err());
    assert!(config.schedule_window().is_err());

    assert!(parse_time_of_day("9pm").is_err());
    assert!(parse_time_of_day("07:30").is_ok());
    assert!(parse_time_of_day(" 07:30:15 ").is_ok());
}

#[test]
fn test_day_validation() {
    assert_eq!(parse_day(&DayEntry::Name("SAT".into())).unwrap(), 6);
    assert_eq!(parse_day(&DayEntry::Index(0)).unwrap(), 0);
    assert!(parse_day(&DayEntry::Index(7)).is_err());
    assert!(parse_day(&DayEntry::Name("someday".into())).is_err());

    let duplicated = parse(r#"days = ["sun", 0]"#);
    let err = validate_config(&duplicated).unwrap_err();
    assert!(err.to_string().contains("same day twice"));
}

#[test]
fn test_degenerate_window_is_accepted() {
    let config = parse(
        r#"
        start = "23:00"
        end = "22:00"
        "#,
    );
    assert!(validate_config(&config).is_ok());
    assert_eq!(config.schedule_window().unwrap().duration_minutes(), 0);
}

#[test]
fn test_load_from_path_reports_file() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("slowburn.toml");

    fs::write(&path, "start = \"20:30\"\ncurve = \"exponential\"\n").unwrap();
    let config = load_from_path(&path).unwrap();
    assert_eq!(config.start.as_deref(), Some("20:30"));
    assert_eq!(config.curve, Some(AccelerationCurve::Exponential));

    fs::write(&path, "start = \"nope\"\n").unwrap();
    let err = load_from_path(&path).unwrap_err();
    assert!(format!("{err:#}").contains("slowburn.toml"));
}

#[test]
#[serial]
fn test_config_path_follows_xdg_config_home() {
    let temp_dir = tempdir().unwrap();

    let original = std::env::var("XDG_CONFIG_HOME").ok();
    unsafe {
        std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
    }

    let path = get_config_path();

    unsafe {
        match original {
            Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
    }

    // On Linux dirs honours XDG_CONFIG_HOME; elsewhere only the suffix is stable
    let path = path.unwrap();
    assert!(path.ends_with("slowburn/slowburn.toml"));
    if cfg!(target_os = "linux") {
        assert!(path.starts_with(temp_dir.path()));
    }
}
