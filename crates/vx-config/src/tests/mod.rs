mod log_level;

use std::env;

use tempfile::TempDir;

/// RAII guard for environment variables - automatically restores on drop
pub(crate) struct EnvGuard {
    key: &'static str,
    original: Option<String>,
}

impl EnvGuard {
    pub(crate) fn set(key: &'static str, value: &str) -> Self {
        unsafe {
            let original = env::var(key).ok();
            env::set_var(key, value);
            Self { key, original }
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        unsafe {
            match &self.original {
                Some(val) => env::set_var(self.key, val),
                None => env::remove_var(self.key),
            }
        }
    }
}

/// Temp config directory with VX_CONFIG_DIR pointing at it.
pub(crate) struct ConfigDir {
    pub(crate) temp: TempDir,
    _guard: EnvGuard,
}

impl ConfigDir {
    pub(crate) fn write_config(&self, contents: &str) {
        std::fs::write(self.temp.path().join(crate::CONFIG_FILENAME), contents).unwrap();
    }
}

pub(crate) fn setup_config_dir() -> ConfigDir {
    let temp = TempDir::new().unwrap();
    let guard = EnvGuard::set(crate::CONFIG_DIR_ENV, temp.path().to_str().unwrap());
    ConfigDir {
        temp,
        _guard: guard,
    }
}
