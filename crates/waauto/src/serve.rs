// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `waauto serve` command implementation.
//!
//! Brings up storage, the bridge transport, the dispatch pipeline, the
//! scheduler, the transport event relay, and the dashboard server, then runs
//! until a shutdown signal arrives.

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use waauto_bus::{DashboardEvent, EventBus};
use waauto_config::WaautoConfig;
use waauto_core::WaautoError;
use waauto_core::traits::Transport;
use waauto_core::types::TransportEvent;
use waauto_engine::{AutoReply, BulkSender, Dispatcher, Scheduler};
use waauto_gateway::GatewayState;
use waauto_storage::Database;
use waauto_wweb::WwebTransport;

/// Runs the `waauto serve` command.
pub async fn run_serve(config: WaautoConfig) -> Result<(), WaautoError> {
    init_tracing(&config.daemon.log_level);

    info!("starting waauto serve");

    // Storage first: nothing has a safe degraded mode without it.
    let db = Database::open(&config.storage).await?;
    info!(path = %config.storage.database_path, "storage ready");

    let bus = EventBus::new(256);

    // Bridge transport. A bridge that is down is reported on the dashboard,
    // not fatal here.
    let transport = Arc::new(WwebTransport::new(config.bridge.clone()));
    transport.connect().await?;
    let transport: Arc<dyn Transport> = transport;

    // Dispatch pipeline.
    let dispatcher = Arc::new(Dispatcher::new(transport.clone(), db.clone()));
    let autoreply = Arc::new(AutoReply::new(db.clone(), dispatcher.clone(), bus.clone()).await?);
    let bulk = Arc::new(BulkSender::new(db.clone(), dispatcher.clone(), bus.clone()));

    let cancel = CancellationToken::new();

    // Relay transport events to the dashboard and the auto-reply matcher.
    {
        let transport = transport.clone();
        let autoreply = autoreply.clone();
        let bus = bus.clone();
        let relay_cancel = cancel.clone();
        tokio::spawn(async move {
            relay_events(transport, autoreply, bus, relay_cancel).await;
        });
    }

    // Scheduler loop.
    let scheduler = Scheduler::new(
        db.clone(),
        dispatcher.clone(),
        bus.clone(),
        config.scheduler.tick_secs,
    );
    let scheduler_handle = scheduler.spawn(cancel.clone());

    // Dashboard server.
    if config.server.bearer_token.is_none() {
        warn!("no bearer token configured -- the dashboard is open on the bind address");
    }
    let state = GatewayState {
        db: db.clone(),
        transport: transport.clone(),
        dispatcher,
        autoreply,
        bulk,
        bus,
        upload_dir: PathBuf::from(&config.server.upload_dir),
        bearer_token: config.server.bearer_token.clone(),
    };
    let server_config = config.server.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = waauto_gateway::start_server(&server_config, state).await {
            error!(error = %e, "dashboard server exited");
        }
    });

    // Run until interrupted.
    tokio::signal::ctrl_c().await.map_err(|e| {
        WaautoError::Internal(format!("failed to install signal handler: {e}"))
    })?;
    info!("shutdown signal received");

    cancel.cancel();
    let _ = scheduler_handle.await;
    server_handle.abort();

    db.close().await?;
    info!("waauto serve shutdown complete");
    Ok(())
}

/// Consume transport events until cancelled.
///
/// Lifecycle events become dashboard status/QR broadcasts; inbound messages
/// flow into the auto-reply matcher (which also logs and relays them).
async fn relay_events(
    transport: Arc<dyn Transport>,
    autoreply: Arc<AutoReply>,
    bus: EventBus,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            event = transport.receive() => event,
            _ = cancel.cancelled() => {
                info!("event relay shutting down");
                return;
            }
        };

        let event = match event {
            Ok(event) => event,
            Err(e) => {
                error!(error = %e, "transport event stream ended");
                return;
            }
        };

        match event {
            TransportEvent::Qr(data_url) => {
                info!("pairing QR received, relaying to dashboard");
                publish_status(&bus, &transport);
                bus.publish(DashboardEvent::Qr { data_url });
            }
            TransportEvent::Ready(client_info) => {
                info!(pushname = %client_info.pushname, phone = %client_info.phone, "whatsapp client ready");
                publish_status(&bus, &transport);
                bus.publish(DashboardEvent::Ready { info: client_info });
            }
            TransportEvent::Authenticated => {
                info!("whatsapp client authenticated");
            }
            TransportEvent::AuthFailure(reason) => {
                error!(reason = %reason, "whatsapp auth failure");
                publish_status(&bus, &transport);
                bus.publish(DashboardEvent::AuthFailure { reason });
            }
            TransportEvent::Disconnected(reason) => {
                warn!(reason = %reason, "whatsapp client disconnected");
                publish_status(&bus, &transport);
            }
            TransportEvent::Message(incoming) => {
                if let Err(e) = autoreply.handle_incoming(&incoming).await {
                    error!(error = %e, "failed to process inbound message");
                }
            }
        }
    }
}

fn publish_status(bus: &EventBus, transport: &Arc<dyn Transport>) {
    let snapshot = transport.status();
    bus.publish(DashboardEvent::Status {
        status: snapshot.status,
        info: snapshot.info,
        error: snapshot.error,
    });
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("waauto={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
