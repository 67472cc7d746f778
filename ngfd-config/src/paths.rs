//! `CONF_PATH`/`PLUGIN_PATH` resolution, ported from `core.c`'s
//! `DEFAULT_CONF_PATH`/`DEFAULT_PLUGIN_PATH` fallbacks and renamed to
//! match this project's environment variables.

use std::env;
use std::path::PathBuf;

const CONF_PATH_VAR: &str = "CONF_PATH";
const PLUGIN_PATH_VAR: &str = "PLUGIN_PATH";

const DEFAULT_CONF_PATH: &str = "/etc/ngfd";
const DEFAULT_PLUGIN_PATH: &str = "/usr/lib/ngfd";

/// Resolved filesystem locations the daemon reads its configuration from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigPaths {
    pub conf_root: PathBuf,
    pub plugin_path: PathBuf,
}

impl ConfigPaths {
    /// Reads `CONF_PATH`/`PLUGIN_PATH` from the environment, falling back
    /// to `/etc/ngfd`/`/usr/lib/ngfd`.
    pub fn from_env() -> Self {
        Self {
            conf_root: env::var_os(CONF_PATH_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONF_PATH)),
            plugin_path: env::var_os(PLUGIN_PATH_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PLUGIN_PATH)),
        }
    }

    pub fn events_dir(&self) -> PathBuf {
        self.conf_root.join("events.d")
    }

    pub fn daemon_config_path(&self) -> PathBuf {
        self.conf_root.join("ngfd.yaml")
    }

    pub fn plugin_params_dir(&self) -> PathBuf {
        self.conf_root.join("plugins.d")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        // SAFETY: test-local scope, no other thread reads these vars.
        unsafe {
            env::remove_var(CONF_PATH_VAR);
            env::remove_var(PLUGIN_PATH_VAR);
        }
        let paths = ConfigPaths::from_env();
        assert_eq!(paths.conf_root, PathBuf::from("/etc/ngfd"));
        assert_eq!(paths.plugin_path, PathBuf::from("/usr/lib/ngfd"));
    }

    #[test]
    fn env_vars_override_defaults() {
        // SAFETY: test-local scope, no other thread reads these vars.
        unsafe {
            env::set_var(CONF_PATH_VAR, "/tmp/ngfd-conf");
            env::set_var(PLUGIN_PATH_VAR, "/tmp/ngfd-plugins");
        }
        let paths = ConfigPaths::from_env();
        assert_eq!(paths.conf_root, PathBuf::from("/tmp/ngfd-conf"));
        assert_eq!(paths.plugin_path, PathBuf::from("/tmp/ngfd-plugins"));
        // SAFETY: test-local scope, restoring for other tests in this file.
        unsafe {
            env::remove_var(CONF_PATH_VAR);
            env::remove_var(PLUGIN_PATH_VAR);
        }
    }
}
