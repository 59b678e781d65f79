//! GWM Bridge - Entry Point
//!
//! A standalone daemon that polls the GWM cloud gateway for one vehicle's
//! last-known status and republishes the decoded telemetry to Home
//! Assistant over MQTT discovery.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use gwm_bridge::app::options::AppOptions;
use gwm_bridge::app::run::run;
use gwm_bridge::logs::{init_logging, LogOptions};
use gwm_bridge::setup::run_setup;
use gwm_bridge::storage::layout::StorageLayout;
use gwm_bridge::storage::settings::Settings;
use gwm_bridge::utils::version_info;
use gwm_bridge::workers::poller;

use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        println!("gwm-bridge {}", version.version);
        return;
    }

    // Run the setup wizard
    if cli_args.contains_key("setup") {
        let _ = init_logging(LogOptions::default());
        return run_setup(&cli_args).await;
    }

    // Run the bridge starting here

    let layout = match cli_args.get("storage") {
        Some(path) => StorageLayout::new(path),
        None => StorageLayout::default(),
    };

    // Retrieve the settings file
    let settings_file = layout.settings_file();
    let settings = match settings_file.read_json::<Settings>().await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to read settings file {:?}: {}", settings_file.path(), e);
            eprintln!("Run: gwm-bridge --setup --email=<address> --password=<password>");
            return;
        }
    };

    let account = match settings.account.clone() {
        Some(account) => account,
        None => {
            eprintln!("No vehicle configured yet.");
            eprintln!("Run: gwm-bridge --setup --email=<address> --password=<password>");
            return;
        }
    };

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        log_dir: Some(layout.logs_dir().path().to_path_buf()),
        ..Default::default()
    };
    if let Err(e) = init_logging(log_options) {
        println!("Failed to initialize logging: {e}");
    }

    // Run the bridge
    let options = AppOptions {
        gateway: settings.gateway.clone(),
        mqtt_broker: settings.mqtt_broker.clone(),
        storage: layout,
        poller: poller::Options {
            interval: Duration::from_secs(settings.polling_interval_secs),
            ..Default::default()
        },
        ..Default::default()
    };

    info!("Running GWM bridge {} for vin {}", version.version, account.vin);
    let result = run(options, account, await_shutdown_signal()).await;
    if let Err(e) = result {
        error!("Failed to run the bridge: {e}");
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                return std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_err() {
            return std::future::pending::<()>().await;
        }
        info!("Ctrl+C received, shutting down...");
    }
}
