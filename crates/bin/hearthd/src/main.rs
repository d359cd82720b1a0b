//! # hearthd — hearth daemon
//!
//! Composition root that wires all adapters together and starts the
//! controller.
//!
//! ## Responsibilities
//! - Load configuration (TOML file + env overrides)
//! - Initialize tracing
//! - Open the `SQLite` pool and run migrations
//! - Construct the MQTT bridge, SMTP notifier, and sample store
//! - Build the control loop and spawn it as the single state-owning task
//! - Build the axum router, bind, and serve
//! - Handle graceful shutdown (SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates. It is the
//! wiring layer — no domain logic belongs here.

use anyhow::Context;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use hearth_adapter_http_axum::AppState;
use hearth_adapter_mqtt::MqttBridge;
use hearth_adapter_smtp::SmtpNotifier;
use hearth_adapter_storage_sqlite_sqlx::{Database, SqliteSampleStore};
use hearth_app::alerting::AlertingEngine;
use hearth_app::control_loop::{ControlLoop, Engine};
use hearth_app::registry::DeviceRegistry;
use hearth_app::scheduler::Scheduler;

mod config;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Storage
    let db = Database::initialize(&config.storage.url)
        .await
        .context("opening sample database")?;
    let store = SqliteSampleStore::new(db.pool().clone());

    // Engine
    let registry = DeviceRegistry::new(
        &config.devices.bulbs,
        &config.devices.outlets,
        &config.devices.sensors,
        config.reconcile_timeout(),
    )
    .context("building device registry")?;
    let scheduler = Scheduler::new(
        config.group_schedules(),
        config.sample_period(),
        config.location(),
    );
    let alerts = AlertingEngine::new(config.thresholds());
    let notifier = SmtpNotifier::new(&config.smtp).context("building SMTP notifier")?;

    // Bridge
    let (events_tx, events_rx) = hearth_app::control_loop::bus_channel();
    let bridge = MqttBridge::connect(&config.broker, events_tx);

    let (control, handle) = ControlLoop::new(
        bridge,
        store.clone(),
        notifier,
        Engine {
            registry,
            scheduler,
            alerts,
        },
        config.control_settings(),
        events_rx,
    );

    // Control loop
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let loop_task = tokio::spawn(control.run(shutdown_rx));

    // HTTP
    let app = hearth_adapter_http_axum::build(AppState::new(handle, store));
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    tracing::info!(%bind_addr, "hearthd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await
        .context("serving HTTP")?;

    // Stop the control loop after the HTTP surface has drained.
    let _ = shutdown_tx.send(true);
    let _ = loop_task.await;

    Ok(())
}
