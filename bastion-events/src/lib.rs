//! Operator events for Bastion servers.
//!
//! Operator events are short, human-readable records of cluster-level
//! happenings (nodes joining and leaving, handshake rejections, resource
//! pressure) meant for whoever runs the cluster rather than for application
//! code. Each event carries a collapse key: consumers may fold repeated
//! events with the same non-empty key into one line.
//!
//! Events are built with the constructors in [`factory`] and published with
//! [`OperatorEvent::emit`], which writes them to the `tracing` pipeline.

mod event;
pub mod factory;

pub use event::{EventLevel, EventSubsystem, EventType, OperatorEvent, OperatorEventId};
