//! Daemon entry point: parses configuration, loads plugins, then drives
//! the dispatcher loop until the process is terminated.

use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use anyhow::Context as _;
use tracing::{error, info};

use ngfd_config::{load_events_dir, load_plugin_list, load_plugin_params, ConfigPaths};
use ngfd_core::{Core, Plugin, PluginRegistrar};

/// How long `pump()` may sit between checks when nothing is queued.
const IDLE_SLEEP: Duration = Duration::from_millis(20);

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let paths = ConfigPaths::from_env();
    info!(conf_root = %paths.conf_root.display(), plugin_path = %paths.plugin_path.display(), "starting");

    let plugin_names =
        load_plugin_list(&paths.daemon_config_path()).context("loading daemon configuration")?;
    let catalog = load_events_dir(&paths.events_dir()).context("loading event definitions")?;

    let mut core = Core::new(catalog);
    let mut loaded_plugins: Vec<Box<dyn Plugin>> = Vec::new();

    for name in &plugin_names {
        let plugin = ngfd_plugins::builtin_plugin(name)
            .with_context(|| format!("plugin '{name}' is not a known built-in plugin"))?;
        let params = load_plugin_params(&paths.plugin_params_dir(), name)
            .with_context(|| format!("loading parameters for plugin '{name}'"))?;

        info!(plugin = %name, "loading plugin");
        let loaded = {
            let mut registrar = PluginRegistrar::new(&mut core);
            plugin.load(&mut registrar, &params)
        };
        if !loaded {
            return Err(ngfd_core::CoreError::PluginLoadFailed(name.clone()).into());
        }

        loaded_plugins.push(plugin);
    }

    core.start().context("starting dispatcher")?;
    info!("dispatcher ready");

    let running = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(true));
    let handler_flag = running.clone();
    ctrlc::set_handler(move || {
        handler_flag.store(false, std::sync::atomic::Ordering::SeqCst);
    })
    .context("installing signal handler")?;

    while running.load(std::sync::atomic::Ordering::SeqCst) {
        if core.pump() == 0 {
            thread::sleep(IDLE_SLEEP);
        }
    }

    info!("shutting down");
    core.shutdown();
    for plugin in loaded_plugins.iter().rev() {
        plugin.unload();
    }

    Ok(())
}
