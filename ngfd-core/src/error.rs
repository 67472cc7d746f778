use thiserror::Error;

/// Fatal startup errors the core distinguishes.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("plugin '{0}' failed to load")]
    PluginLoadFailed(String),
    #[error("sink '{0}' failed to initialize")]
    SinkInitFailed(String),
    #[error("input '{0}' failed to initialize")]
    InputInitFailed(String),
    #[error("no sink registered")]
    NoSinksRegistered,
    #[error("no input registered")]
    NoInputsRegistered,
}
