//! Logship Core
//!
//! Core types and abstractions shared by the logship client and collector.
//!
//! This crate contains:
//! - Domain types: the log record, severity levels, collector endpoint
//! - Clock: the time source used to stamp records
//! - Wire: newline-delimited framing shared by senders and receivers

pub mod clock;
pub mod domain;
pub mod wire;

pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::endpoint::Endpoint;
pub use domain::level::LogLevel;
pub use domain::record::LogRecord;
