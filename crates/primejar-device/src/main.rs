//! Device binary for the Jar of Primes.
//!
//! Wires the step engine to the network surface and runs unattended
//! until interrupted. The jar has no work of its own between requests:
//! it advances only when an observer commands a step, then announces
//! the prime it lands on.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `primejar-config.yaml`
//! 3. Build the primality rule (warning on configured exceptions)
//! 4. Construct the step engine at the configured value
//! 5. Spawn the request gateway, push listener, and liveness sweep
//! 6. Wait for Ctrl-C

mod error;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use primejar_core::config::DeviceConfig;
use primejar_core::engine::PrimeEngine;
use primejar_core::prime::PrimalityRule;
use primejar_observer::server::ServerConfig;
use primejar_observer::state::AppState;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::DeviceError;

/// Application entry point for the device.
///
/// # Errors
///
/// Returns an error if any startup step fails; after that the process
/// runs until interrupted.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("jar-device starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        device_name = config.jar.name,
        counter_modulus = config.jar.counter_modulus,
        initial_value = config.jar.initial_value,
        http_port = config.listen.http_port,
        push_port = config.listen.push_port,
        "Configuration loaded"
    );

    // 3. Build the primality rule. Exceptions are a historical firmware
    //    quirk; make them loud.
    let rule = PrimalityRule::with_exceptions(config.primality.extra_primes.iter().copied());
    for value in rule.exceptions().iter().copied() {
        warn!(value, "configured to treat a non-prime as prime");
    }

    // 4. Construct the step engine.
    let engine = Arc::new(
        PrimeEngine::new(config.jar.initial_value, config.jar.counter_modulus, rule)
            .map_err(DeviceError::from)?,
    );
    info!(current = engine.current().await, "Step engine initialized");

    // 5. Spawn the network surface.
    let server_config = ServerConfig {
        host: config.listen.host.clone(),
        http_port: config.listen.http_port,
        push_port: config.listen.push_port,
    };
    let state = Arc::new(AppState::new(Arc::clone(&engine), config.jar.name.clone()));
    let probe_interval = Duration::from_secs(config.hub.probe_interval_secs);
    let handles = primejar_observer::spawn_observer(&server_config, &state, probe_interval)
        .map_err(DeviceError::from)?;
    info!("Network surface up, jar running unattended");

    // 6. Run until interrupted.
    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received, shutting down");

    handles.gateway.abort();
    handles.push.abort();
    handles.sweep.abort();

    info!(final_value = engine.current().await, "jar-device shutdown complete");

    Ok(())
}

/// Load the device configuration from `primejar-config.yaml`.
///
/// Looks for the config file relative to the current working directory.
fn load_config() -> Result<DeviceConfig, DeviceError> {
    let config_path = Path::new("primejar-config.yaml");
    if config_path.exists() {
        let config = DeviceConfig::from_file(config_path)?;
        Ok(config)
    } else {
        info!("Config file not found, using defaults");
        Ok(DeviceConfig::default())
    }
}
