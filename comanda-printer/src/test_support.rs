//! Scripted fakes for exercising the session core without hardware

use crate::device::{Device, DeviceProvider};
use crate::error::{PrintError, PrintResult};
use crate::executor::Renderer;
use crate::job::PrintJob;
use crate::session::PrinterSession;
use async_trait::async_trait;
use shared::message::PrintOrderPayload;
use shared::models::{Order, Restaurant};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Device provider whose open outcomes follow a script
///
/// Each `open()` call pops the next scripted outcome; once the script is
/// exhausted the default outcome applies. Every open attempt is counted.
#[derive(Clone)]
pub(crate) struct FakeProvider {
    script: Arc<Mutex<VecDeque<bool>>>,
    default_ok: bool,
    opens: Arc<AtomicU32>,
}

impl FakeProvider {
    pub fn always_ok() -> Self {
        Self::script(&[], true)
    }

    pub fn open_fails() -> Self {
        Self::script(&[], false)
    }

    pub fn script(outcomes: &[bool], default_ok: bool) -> Self {
        Self {
            script: Arc::new(Mutex::new(outcomes.iter().copied().collect())),
            default_ok,
            opens: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Number of open attempts made so far
    pub fn opens(&self) -> u32 {
        self.opens.load(Ordering::SeqCst)
    }
}

impl DeviceProvider for FakeProvider {
    fn device(&self) -> Box<dyn Device> {
        Box::new(FakeDevice {
            script: self.script.clone(),
            default_ok: self.default_ok,
            opens: self.opens.clone(),
            open: false,
        })
    }
}

struct FakeDevice {
    script: Arc<Mutex<VecDeque<bool>>>,
    default_ok: bool,
    opens: Arc<AtomicU32>,
    open: bool,
}

#[async_trait]
impl Device for FakeDevice {
    async fn open(&mut self) -> PrintResult<()> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let ok = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.default_ok);
        if ok {
            self.open = true;
            Ok(())
        } else {
            Err(PrintError::Unavailable("fake device absent".to_string()))
        }
    }

    async fn write(&mut self, _data: &[u8]) -> PrintResult<()> {
        if self.open {
            Ok(())
        } else {
            Err(PrintError::Unavailable("fake device not open".to_string()))
        }
    }

    async fn close(&mut self) -> PrintResult<()> {
        self.open = false;
        Ok(())
    }
}

enum RenderMode {
    Ok,
    Fails,
    Hangs(Duration),
    Observing(Arc<PrinterSession>, Arc<AtomicBool>),
}

/// Renderer with a fixed behavior per test
pub(crate) struct FakeRenderer {
    mode: RenderMode,
}

impl FakeRenderer {
    pub fn ok() -> Self {
        Self {
            mode: RenderMode::Ok,
        }
    }

    pub fn fails() -> Self {
        Self {
            mode: RenderMode::Fails,
        }
    }

    pub fn hangs_for(duration: Duration) -> Self {
        Self {
            mode: RenderMode::Hangs(duration),
        }
    }

    /// Records whether the session was busy while rendering
    pub fn observing(session: Arc<PrinterSession>, saw_busy: Arc<AtomicBool>) -> Self {
        Self {
            mode: RenderMode::Observing(session, saw_busy),
        }
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn render(&self, device: &mut dyn Device, _job: &PrintJob) -> PrintResult<()> {
        match &self.mode {
            RenderMode::Ok => device.write(b"ticket").await,
            RenderMode::Fails => Err(PrintError::Render("essential content failed".to_string())),
            RenderMode::Hangs(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(())
            }
            RenderMode::Observing(session, saw_busy) => {
                if session.is_busy() {
                    saw_busy.store(true, Ordering::SeqCst);
                }
                device.write(b"ticket").await
            }
        }
    }
}

/// Minimal receipt job for tests
pub(crate) fn receipt_job() -> PrintJob {
    PrintJob::receipt(PrintOrderPayload {
        order: Order {
            id: "order-1".to_string(),
            status: "pending".to_string(),
            created_at: 1705912335000,
            table: None,
            order_items: Vec::new(),
        },
        restaurant: Restaurant::default(),
    })
}
