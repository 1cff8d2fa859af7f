use crate::LogLevel;

use log::LevelFilter;

#[test]
fn given_known_level_names_when_parse_then_mapped() {
    assert_eq!(LogLevel::parse_lenient("debug").0, LevelFilter::Debug);
    assert_eq!(LogLevel::parse_lenient("WARN").0, LevelFilter::Warn);
    assert_eq!(LogLevel::parse_lenient(" trace ").0, LevelFilter::Trace);
    assert_eq!(LogLevel::parse_lenient("off").0, LevelFilter::Off);
}

#[test]
fn given_unknown_level_when_parse_then_info() {
    assert_eq!(LogLevel::parse_lenient("verbose").0, LevelFilter::Info);
}

#[test]
fn given_level_when_displayed_then_env_filter_directive() {
    assert_eq!(LogLevel(LevelFilter::Error).to_string(), "error");
    assert_eq!(LogLevel(LevelFilter::Info).as_directive(), "info");
}

#[test]
fn given_toml_level_when_deserialized_then_parsed_leniently() {
    #[derive(serde::Deserialize)]
    struct Wrapper {
        level: LogLevel,
    }

    let parsed: Wrapper = toml::from_str("level = \"Debug\"").unwrap();
    assert_eq!(parsed.level.0, LevelFilter::Debug);
}
