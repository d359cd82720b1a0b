//! Port traits implemented by adapter crates, and the event types that
//! cross them.

mod bus;
mod notifier;
mod sink;

pub use bus::{BusEvent, CommandBus};
pub use notifier::Notifier;
pub use sink::{SampleQuery, SampleSink};
