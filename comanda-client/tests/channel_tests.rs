//! End-to-end channel tests over the in-memory transport
//!
//! A fake backend sits on the other end of a broadcast channel pair:
//! it pushes printOrder / status-check events and observes everything
//! the agent sends back.

use async_trait::async_trait;
use comanda_client::{ChannelConfig, MemoryConnector, PrinterChannel};
use comanda_printer::{
    AvailabilityMonitor, Device, DeviceProvider, PrintError, PrintExecutor, PrintJob, PrintResult,
    PrinterSession, Renderer, RetryPolicy,
};
use shared::message::{
    ChannelMessage, EventType, JoinPrinterPayload, PrintOrderPayload, PrintResultPayload,
    PrinterErrorPayload, PrinterStatusPayload,
};
use shared::models::{Order, Restaurant};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;

#[derive(Clone)]
struct TestProvider {
    available: Arc<AtomicBool>,
    opens: Arc<AtomicU32>,
}

impl TestProvider {
    fn new(available: bool) -> Self {
        Self {
            available: Arc::new(AtomicBool::new(available)),
            opens: Arc::new(AtomicU32::new(0)),
        }
    }

    fn opens(&self) -> u32 {
        self.opens.load(Ordering::SeqCst)
    }
}

impl DeviceProvider for TestProvider {
    fn device(&self) -> Box<dyn Device> {
        Box::new(TestDevice {
            available: self.available.clone(),
            opens: self.opens.clone(),
        })
    }
}

struct TestDevice {
    available: Arc<AtomicBool>,
    opens: Arc<AtomicU32>,
}

#[async_trait]
impl Device for TestDevice {
    async fn open(&mut self) -> PrintResult<()> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(PrintError::Unavailable("no device".to_string()))
        }
    }

    async fn write(&mut self, _data: &[u8]) -> PrintResult<()> {
        Ok(())
    }

    async fn close(&mut self) -> PrintResult<()> {
        Ok(())
    }
}

enum RenderBehavior {
    Ok,
    Fails,
    Slow(Duration),
}

struct TestRenderer {
    behavior: RenderBehavior,
}

#[async_trait]
impl Renderer for TestRenderer {
    async fn render(&self, device: &mut dyn Device, _job: &PrintJob) -> PrintResult<()> {
        match &self.behavior {
            RenderBehavior::Ok => device.write(b"ticket").await,
            RenderBehavior::Fails => {
                Err(PrintError::Render("essential content failed".to_string()))
            }
            RenderBehavior::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                device.write(b"ticket").await
            }
        }
    }
}

struct Harness {
    backend_tx: broadcast::Sender<ChannelMessage>,
    from_agent: broadcast::Receiver<ChannelMessage>,
    channel: PrinterChannel,
    provider: TestProvider,
}

async fn start_agent(provider: TestProvider, behavior: RenderBehavior) -> Harness {
    let (backend_tx, _) = broadcast::channel(64);
    let (client_tx, from_agent) = broadcast::channel(64);
    let connector = Arc::new(MemoryConnector::new(&backend_tx, &client_tx));

    let session = Arc::new(PrinterSession::new());
    let monitor = Arc::new(AvailabilityMonitor::new(
        session.clone(),
        Arc::new(provider.clone()),
    ));
    let executor = Arc::new(PrintExecutor::new(
        session.clone(),
        Arc::new(provider.clone()),
        Arc::new(TestRenderer { behavior }),
    ));

    let policy = RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(10),
    };
    let config = ChannelConfig {
        reconnect_delay: Duration::from_millis(10),
        max_reconnect_delay: Duration::from_millis(100),
        settle_delay: Duration::from_millis(20),
        heartbeat_interval: Duration::from_secs(60),
    };

    let channel = PrinterChannel::new(connector, session, monitor, executor, policy, config);
    channel.join_channel("rest-1").await;
    channel.connect();

    Harness {
        backend_tx,
        from_agent,
        channel,
        provider,
    }
}

async fn next_of(rx: &mut broadcast::Receiver<ChannelMessage>, event: EventType) -> ChannelMessage {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let msg = rx.recv().await.expect("agent channel closed");
            if msg.event_type == event {
                return msg;
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {}", event))
}

fn order_message(order_id: &str) -> ChannelMessage {
    ChannelMessage::print_order(&PrintOrderPayload {
        order: Order {
            id: order_id.to_string(),
            status: "pending".to_string(),
            created_at: 1705912335000,
            table: None,
            order_items: Vec::new(),
        },
        restaurant: Restaurant::default(),
    })
}

#[tokio::test]
async fn test_join_then_initial_status() {
    let mut harness = start_agent(TestProvider::new(true), RenderBehavior::Ok).await;

    let join = next_of(&mut harness.from_agent, EventType::JoinPrinter).await;
    let payload: JoinPrinterPayload = join.parse_payload().unwrap();
    assert_eq!(payload.restaurant_id, "rest-1");

    let status = next_of(&mut harness.from_agent, EventType::PrinterStatus).await;
    let payload: PrinterStatusPayload = status.parse_payload().unwrap();
    assert_eq!(payload.restaurant_id, "rest-1");
    assert!(payload.available);
    assert!(payload.timestamp > 0);
}

#[tokio::test]
async fn test_print_order_reports_success() {
    let mut harness = start_agent(TestProvider::new(true), RenderBehavior::Ok).await;
    next_of(&mut harness.from_agent, EventType::PrinterStatus).await;

    harness.backend_tx.send(order_message("order-7")).unwrap();

    let result = next_of(&mut harness.from_agent, EventType::PrintResult).await;
    let payload: PrintResultPayload = result.parse_payload().unwrap();
    assert!(payload.success);
    assert_eq!(payload.order_id.as_deref(), Some("order-7"));
    assert_eq!(payload.job_type.as_deref(), Some("receipt"));
}

#[tokio::test]
async fn test_rejects_job_when_printer_unavailable() {
    let mut harness = start_agent(TestProvider::new(false), RenderBehavior::Ok).await;

    // Initial report says unavailable
    let status = next_of(&mut harness.from_agent, EventType::PrinterStatus).await;
    let payload: PrinterStatusPayload = status.parse_payload().unwrap();
    assert!(!payload.available);

    let probes = harness.provider.opens();
    harness.backend_tx.send(order_message("order-9")).unwrap();

    let error = next_of(&mut harness.from_agent, EventType::PrinterError).await;
    let payload: PrinterErrorPayload = error.parse_payload().unwrap();
    assert_eq!(payload.error, "Printer is not available");
    assert_eq!(payload.order_id.as_deref(), Some("order-9"));

    let result = next_of(&mut harness.from_agent, EventType::PrintResult).await;
    let payload: PrintResultPayload = result.parse_payload().unwrap();
    assert!(!payload.success);

    // No print attempt touched the device
    assert_eq!(harness.provider.opens(), probes);
}

#[tokio::test]
async fn test_retry_exhaustion_reports_last_error() {
    let mut harness = start_agent(TestProvider::new(true), RenderBehavior::Fails).await;
    next_of(&mut harness.from_agent, EventType::PrinterStatus).await;

    harness.backend_tx.send(order_message("order-3")).unwrap();

    let error = next_of(&mut harness.from_agent, EventType::PrinterError).await;
    let payload: PrinterErrorPayload = error.parse_payload().unwrap();
    assert!(payload.error.contains("essential content failed"));
    assert_eq!(payload.order_id.as_deref(), Some("order-3"));

    let result = next_of(&mut harness.from_agent, EventType::PrintResult).await;
    let payload: PrintResultPayload = result.parse_payload().unwrap();
    assert!(!payload.success);
    assert_eq!(payload.order_id.as_deref(), Some("order-3"));
}

#[tokio::test]
async fn test_status_check_emits_exactly_one_report() {
    let mut harness = start_agent(TestProvider::new(true), RenderBehavior::Ok).await;
    next_of(&mut harness.from_agent, EventType::PrinterStatus).await;

    harness
        .backend_tx
        .send(ChannelMessage::empty(EventType::CheckPrinterStatus))
        .unwrap();

    let status = next_of(&mut harness.from_agent, EventType::PrinterStatus).await;
    let payload: PrinterStatusPayload = status.parse_payload().unwrap();
    assert!(payload.available);

    // One request, one report
    let extra = tokio::time::timeout(
        Duration::from_millis(200),
        next_of(&mut harness.from_agent, EventType::PrinterStatus),
    )
    .await;
    assert!(extra.is_err());
}

#[tokio::test]
async fn test_status_check_during_job_reports_last_known() {
    let mut harness = start_agent(
        TestProvider::new(true),
        RenderBehavior::Slow(Duration::from_millis(400)),
    )
    .await;
    next_of(&mut harness.from_agent, EventType::PrinterStatus).await;

    harness.backend_tx.send(order_message("order-11")).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    let opens_mid_job = harness.provider.opens();

    // Status check lands while the job holds the device: no competing
    // probe, and the healthy printer is still reported available
    harness
        .backend_tx
        .send(ChannelMessage::empty(EventType::CheckPrinterStatus))
        .unwrap();

    let status = next_of(&mut harness.from_agent, EventType::PrinterStatus).await;
    let payload: PrinterStatusPayload = status.parse_payload().unwrap();
    assert!(payload.available);
    assert_eq!(harness.provider.opens(), opens_mid_job);

    let result = next_of(&mut harness.from_agent, EventType::PrintResult).await;
    let payload: PrintResultPayload = result.parse_payload().unwrap();
    assert!(payload.success);
}

#[tokio::test]
async fn test_third_concurrent_job_is_rejected_as_busy() {
    let mut harness = start_agent(
        TestProvider::new(true),
        RenderBehavior::Slow(Duration::from_millis(500)),
    )
    .await;
    next_of(&mut harness.from_agent, EventType::PrinterStatus).await;

    // First job runs, second waits in the queue, third has nowhere to go
    for id in ["order-1", "order-2", "order-3"] {
        harness.backend_tx.send(order_message(id)).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let mut successes = 0;
    let mut busy_rejections = 0;
    for _ in 0..3 {
        let result = next_of(&mut harness.from_agent, EventType::PrintResult).await;
        let payload: PrintResultPayload = result.parse_payload().unwrap();
        if payload.success {
            successes += 1;
        } else {
            assert!(payload.message.contains("busy"));
            busy_rejections += 1;
        }
    }

    assert_eq!(successes, 2);
    assert_eq!(busy_rejections, 1);
}

#[tokio::test]
async fn test_disconnect_is_idempotent() {
    let mut harness = start_agent(TestProvider::new(true), RenderBehavior::Ok).await;
    next_of(&mut harness.from_agent, EventType::PrinterStatus).await;

    harness.channel.disconnect().await;
    harness.channel.disconnect().await;
    assert_eq!(
        harness.channel.state(),
        comanda_client::ConnectionState::Disconnected
    );
}
