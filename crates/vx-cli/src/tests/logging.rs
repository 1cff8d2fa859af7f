use crate::{CliError, setup_logging};

use tempfile::TempDir;
use vx_config::LoggingConfig;

#[test]
fn given_log_dir_is_a_file_when_setup_logging_then_logging_error() {
    // Given
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("logs");
    std::fs::write(&blocker, "not a directory").unwrap();
    let config = LoggingConfig {
        file: true,
        ..LoggingConfig::default()
    };

    // When
    let result = setup_logging(&config, &blocker);

    // Then
    assert!(matches!(result, Err(CliError::Logging { .. })));
}
