//! Daemon configuration (the required plugin list) and per-plugin
//! parameter files — `core.c`'s `n_core_load_params`, ported to YAML
//! (see `SPEC_FULL.md` §6).

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use ngfd_core::PropList;

use crate::error::ConfigError;

#[derive(Debug, Deserialize)]
struct RawDaemonConfig {
    #[serde(default)]
    plugins: Vec<String>,
}

/// Reads the daemon configuration file and returns the required plugin
/// names in load order. Fatal if the file is missing, malformed, or names
/// zero plugins.
pub fn load_plugin_list(daemon_config_path: &Path) -> Result<Vec<String>, ConfigError> {
    if !daemon_config_path.is_file() {
        return Err(ConfigError::DaemonConfigMissing(daemon_config_path.to_path_buf()));
    }

    let text = fs::read_to_string(daemon_config_path)
        .map_err(|source| ConfigError::Io { path: daemon_config_path.to_path_buf(), source })?;
    let config: RawDaemonConfig =
        serde_yaml::from_str(&text).map_err(ConfigError::DaemonConfigMalformed)?;

    if config.plugins.is_empty() {
        return Err(ConfigError::NoPluginsConfigured);
    }

    Ok(config.plugins)
}

/// Loads `<plugin_params_dir>/<plugin_name>.yaml` into a flat string-keyed
/// `PropList`. A plugin with no parameter file gets an empty `PropList` —
/// not every plugin needs configuration.
pub fn load_plugin_params(
    plugin_params_dir: &Path,
    plugin_name: &str,
) -> Result<PropList, ConfigError> {
    let path = plugin_params_dir.join(format!("{plugin_name}.yaml"));
    if !path.is_file() {
        return Ok(PropList::new());
    }

    let text = fs::read_to_string(&path)
        .map_err(|source| ConfigError::Io { path: path.clone(), source })?;
    let raw: HashMap<String, String> =
        serde_yaml::from_str(&text).map_err(|source| ConfigError::PluginParamsMalformed(path, source))?;

    let mut params = PropList::new();
    for (key, value) in raw {
        params.set(key, value);
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_plugin_list_in_order() {
        let file = write_temp("plugins:\n  - transform\n  - audio\n  - led\n");
        let plugins = load_plugin_list(file.path()).unwrap();
        assert_eq!(plugins, vec!["transform", "audio", "led"]);
    }

    #[test]
    fn empty_plugin_list_is_fatal() {
        let file = write_temp("plugins: []\n");
        let result = load_plugin_list(file.path());
        assert!(matches!(result, Err(ConfigError::NoPluginsConfigured)));
    }

    #[test]
    fn missing_daemon_config_is_fatal() {
        let result = load_plugin_list(Path::new("/nonexistent/ngfd/ngfd.yaml"));
        assert!(matches!(result, Err(ConfigError::DaemonConfigMissing(_))));
    }

    #[test]
    fn missing_plugin_params_file_yields_empty_proplist() {
        let dir = tempfile::tempdir().unwrap();
        let params = load_plugin_params(dir.path(), "no-such-plugin-xyz").unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn plugin_params_are_loaded_as_strings() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = fs::File::create(dir.path().join("audio.yaml")).unwrap();
        file.write_all(b"device: \"speaker\"\nvolume: \"80\"\n").unwrap();
        let params = load_plugin_params(dir.path(), "audio").unwrap();
        assert_eq!(params.get_string("device"), Some("speaker"));
        assert_eq!(params.get_string("volume"), Some("80"));
    }
}
