//! Parse tracing: events emitted by the runtime and per-parse metrics.

mod events;

pub use events::{NullEventHandler, ParseEvent, ParseEventHandler, ParseMetrics, RecordingHandler};
