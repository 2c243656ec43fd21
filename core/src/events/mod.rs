//! Engine output: event values and the sinks that consume them.

mod event;
pub mod sink;

pub use event::{ComplianceEvent, EventKind};
pub use sink::{EventSink, JsonLinesSink, LogSink};
