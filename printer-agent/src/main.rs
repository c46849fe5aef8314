use comanda_client::{ChannelConfig, PrinterChannel, TcpConnector};
use comanda_printer::{AvailabilityMonitor, NetworkDeviceProvider, PrintExecutor, PrinterSession};
use printer_agent::{AgentConfig, BasicRenderer, init_logger_with_file};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let config = AgentConfig::from_env();
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    info!(
        restaurant_id = %config.restaurant_id,
        printer = %config.printer_addr,
        backend = %config.backend_addr,
        "Printer agent starting"
    );

    // Session core
    let session = Arc::new(PrinterSession::new());
    let provider = Arc::new(NetworkDeviceProvider::new(&config.printer_addr)?);
    let monitor = Arc::new(
        AvailabilityMonitor::new(session.clone(), provider.clone())
            .with_poll_interval(config.poll_interval())
            .with_probe_timeout(config.probe_timeout()),
    );
    let monitor_handle = monitor.start();

    let renderer = Arc::new(BasicRenderer::new(
        config.locale.clone(),
        config.currency.clone(),
        config.paper_width,
    ));
    let executor = Arc::new(PrintExecutor::new(session.clone(), provider, renderer));

    // Backend channel
    let channel_config = ChannelConfig {
        reconnect_delay: Duration::from_millis(config.reconnect_delay_ms),
        max_reconnect_delay: Duration::from_millis(config.max_reconnect_delay_ms),
        settle_delay: Duration::from_millis(config.settle_delay_ms),
        heartbeat_interval: Duration::from_millis(config.heartbeat_interval_ms),
    };
    let connector = Arc::new(TcpConnector::new(config.backend_addr.clone()));
    let channel = PrinterChannel::new(
        connector,
        session.clone(),
        monitor.clone(),
        executor,
        config.retry_policy(),
        channel_config,
    );
    channel.join_channel(&config.restaurant_id).await;
    channel.connect();

    wait_for_shutdown().await;
    info!("Shutdown signal received");

    let teardown = async {
        channel.shutdown().await;
        monitor.shutdown();
        let _ = monitor_handle.await;
        session.shutdown().await;
    };
    if tokio::time::timeout(config.shutdown_timeout(), teardown)
        .await
        .is_err()
    {
        warn!("Shutdown grace period expired, exiting anyway");
    }

    info!("Printer agent stopped");
    Ok(())
}

async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut term = match signal(SignalKind::terminate()) {
            Ok(term) => term,
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
