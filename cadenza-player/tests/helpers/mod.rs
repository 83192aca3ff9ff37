//! Test helper modules for cadenza-player integration tests
//!
//! In-memory collaborators for the traits the core depends on:
//! - MockSink / MockSinkFactory: record sink calls, end streams on demand
//! - MockResolver: deterministic resolution with failure and gating control
//! - MockChannel: record messages and inject marker events
//! - Harness: a controller wired to the mocks with manual completion delivery

#![allow(dead_code)]

pub mod harness;
pub mod mock_channel;
pub mod mock_resolver;
pub mod mock_sink;

pub use harness::{track_for, Harness};
pub use mock_channel::{ChannelCall, MockChannel};
pub use mock_resolver::MockResolver;
pub use mock_sink::{MockSink, MockSinkFactory, SinkCall};
