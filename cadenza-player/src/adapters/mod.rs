//! In-process collaborators for the console harness and local testing

pub mod console_channel;
pub mod direct_resolver;
pub mod simulated_sink;

pub use console_channel::ConsoleChannel;
pub use direct_resolver::DirectUrlResolver;
pub use simulated_sink::{SimulatedSink, SimulatedSinkFactory};
