//! Telemetry rows emitted once per round and per terminal event

pub mod row;
pub mod sink;

pub use row::TelemetryRow;
pub use sink::{ChannelSink, JsonLinesSink, RowSink, TraceSink};
