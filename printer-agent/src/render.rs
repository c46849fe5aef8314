//! Receipt rendering
//!
//! Builds the ESC/POS byte sequence for a job and hands it to the
//! device in one write. Layout here is deliberately plain text; logo
//! and QR images are out of scope for the agent.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use comanda_printer::{Device, JobPayload, PrintJob, PrintResult, Renderer};
use shared::message::{PrintOrderPayload, PrintQrCodePayload};

/// ESC/POS command builder
///
/// Thin fluent wrapper over the raw byte sequence. Text is written as
/// UTF-8; the target printers are configured for it.
pub struct TicketBuilder {
    buf: Vec<u8>,
    width: usize,
}

impl TicketBuilder {
    /// Create a new builder with the paper width in characters
    ///
    /// 58mm paper fits 32 characters, 80mm fits 48.
    pub fn new(width: usize) -> Self {
        let mut buf = Vec::with_capacity(1024);
        // Initialize printer (ESC @)
        buf.extend_from_slice(&[0x1B, 0x40]);
        Self { buf, width }
    }

    pub fn text(&mut self, s: &str) -> &mut Self {
        self.buf.extend_from_slice(s.as_bytes());
        self
    }

    pub fn line(&mut self, s: &str) -> &mut Self {
        self.text(s);
        self.buf.push(b'\n');
        self
    }

    pub fn newline(&mut self) -> &mut Self {
        self.buf.push(b'\n');
        self
    }

    pub fn center(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x61, 0x01]);
        self
    }

    pub fn left(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x61, 0x00]);
        self
    }

    pub fn bold(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x45, 0x01]);
        self
    }

    pub fn bold_off(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x45, 0x00]);
        self
    }

    /// Print a line of '-' characters
    pub fn sep(&mut self) -> &mut Self {
        self.line(&"-".repeat(self.width))
    }

    /// Print left and right text on the same line
    pub fn line_lr(&mut self, left: &str, right: &str) -> &mut Self {
        let lw = left.chars().count();
        let rw = right.chars().count();

        if lw + rw >= self.width {
            self.text(left);
            self.text(" ");
            self.line(right);
        } else {
            let spaces = self.width - lw - rw;
            self.text(left);
            self.text(&" ".repeat(spaces));
            self.line(right);
        }
        self
    }

    /// Feed n lines then full cut (GS V 66 n)
    pub fn cut_feed(&mut self, lines: u8) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x56, 0x42, lines]);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        self.buf.clone()
    }
}

/// Plain-text renderer for receipts and QR slips
pub struct BasicRenderer {
    locale: String,
    currency: String,
    width: usize,
}

impl BasicRenderer {
    pub fn new(locale: impl Into<String>, currency: impl Into<String>, width: usize) -> Self {
        Self {
            locale: locale.into(),
            currency: currency.into(),
            width,
        }
    }

    fn money(&self, value: f64) -> String {
        format!("{:.2} {}", value, self.currency)
    }

    fn receipt_bytes(&self, payload: &PrintOrderPayload) -> Vec<u8> {
        let mut ticket = TicketBuilder::new(self.width);
        let order = &payload.order;

        ticket
            .center()
            .bold()
            .line(payload.restaurant.name.get(&self.locale))
            .bold_off()
            .left()
            .sep();

        ticket.line_lr("Order", &order.id);
        if let Some(table) = &order.table {
            ticket.line_lr("Table", table.name.get(&self.locale));
        }
        let created = Utc
            .timestamp_millis_opt(order.created_at)
            .single()
            .unwrap_or_else(Utc::now);
        ticket.line_lr("Time", &created.format("%Y-%m-%d %H:%M").to_string());
        ticket.sep();

        for item in &order.order_items {
            let name = item
                .food
                .as_ref()
                .map(|f| f.name.get(&self.locale))
                .unwrap_or("(unknown item)");
            let line_total = item
                .food
                .as_ref()
                .map_or(0.0, |f| f.price * item.quantity as f64);
            ticket.line_lr(
                &format!("{} x {}", item.quantity, name),
                &self.money(line_total),
            );
            if let Some(note) = &item.special_instructions {
                ticket.line(&format!("  * {}", note));
            }
        }

        ticket.sep();
        ticket.bold();
        ticket.line_lr("TOTAL", &self.money(order.subtotal()));
        ticket.bold_off();
        ticket.newline();
        ticket.cut_feed(4);

        ticket.build()
    }

    fn qr_bytes(&self, payload: &PrintQrCodePayload) -> Vec<u8> {
        let mut ticket = TicketBuilder::new(self.width);

        ticket.center();
        if let Some(restaurant) = &payload.restaurant {
            ticket.bold().line(restaurant.name.get(&self.locale)).bold_off();
        }
        if let Some(title) = &payload.title {
            ticket.line(title);
        }
        if let Some(subtitle) = &payload.subtitle {
            ticket.line(subtitle);
        }
        if let Some(table) = &payload.table {
            ticket.line(&format!("Table {}", table.name.get(&self.locale)));
        }

        ticket.newline();
        ticket.line(&payload.url);
        ticket.left();
        ticket.cut_feed(4);

        ticket.build()
    }
}

#[async_trait]
impl Renderer for BasicRenderer {
    async fn render(&self, device: &mut dyn Device, job: &PrintJob) -> PrintResult<()> {
        let data = match &job.payload {
            JobPayload::Receipt(payload) => self.receipt_bytes(payload),
            JobPayload::QrCode(payload) => self.qr_bytes(payload),
        };
        device.write(&data).await
    }
}
