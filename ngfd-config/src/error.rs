use std::path::PathBuf;

use thiserror::Error;

/// Fatal configuration errors — all of these are boot-time failures,
/// never per-request ones.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("event directory '{0}' does not exist or is not readable")]
    EventDirMissing(PathBuf),

    #[error("event file '{path}' is malformed: {source}")]
    EventFileMalformed {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("event '{name}' has an unsupported property value for key '{key}'")]
    UnsupportedPropertyValue { name: String, key: String },

    #[error("event '{name}' declares parent '{parent}', which has no default (empty-rules) variant")]
    ParentNotFound { name: String, parent: String },

    #[error("cycle detected in event parent chain: {0}")]
    ParentCycle(String),

    #[error("daemon configuration file '{0}' does not exist or is not readable")]
    DaemonConfigMissing(PathBuf),

    #[error("daemon configuration is malformed: {0}")]
    DaemonConfigMalformed(#[source] serde_yaml::Error),

    #[error("no plugins configured")]
    NoPluginsConfigured,

    #[error("plugin parameter file '{0}' is malformed: {1}")]
    PluginParamsMalformed(PathBuf, #[source] serde_yaml::Error),

    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
