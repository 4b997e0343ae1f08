//! Fire-and-forget sinks for telemetry rows

use std::io::Write;

use tokio::sync::mpsc;

use super::row::TelemetryRow;

/// Receives telemetry rows.
///
/// Delivery is fire-and-forget: sinks swallow their own failures and never
/// report back to the negotiation.
pub trait RowSink: Send {
    fn send_row(&mut self, row: &TelemetryRow);
}

/// Default sink: emits each row as a structured `tracing` event
#[derive(Debug, Default)]
pub struct TraceSink;

impl RowSink for TraceSink {
    fn send_row(&mut self, row: &TelemetryRow) {
        match serde_json::to_string(row) {
            Ok(json) => tracing::info!(target: "haggle::telemetry", row = %json, "Round logged"),
            Err(e) => tracing::warn!("Failed to encode telemetry row: {}", e),
        }
    }
}

/// Writes one JSON object per line
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_row(&mut self, row: &TelemetryRow) -> crate::error::Result<()> {
        serde_json::to_writer(&mut self.writer, row)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

impl JsonLinesSink<std::io::BufWriter<std::fs::File>> {
    /// Append rows to the file at `path`, creating it if needed
    pub fn append_to(path: impl AsRef<std::path::Path>) -> crate::error::Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self::new(std::io::BufWriter::new(file)))
    }
}

impl<W: Write + Send> RowSink for JsonLinesSink<W> {
    fn send_row(&mut self, row: &TelemetryRow) {
        if let Err(e) = self.write_row(row) {
            tracing::warn!("Failed to write telemetry row: {}", e);
        }
    }
}

/// Forwards rows into an unbounded channel
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<TelemetryRow>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<TelemetryRow>) -> Self {
        Self { tx }
    }

    /// Create a sink together with its receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TelemetryRow>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl RowSink for ChannelSink {
    fn send_row(&mut self, row: &TelemetryRow) {
        if self.tx.send(row.clone()).is_err() {
            tracing::debug!("Telemetry receiver dropped, row discarded");
        }
    }
}
