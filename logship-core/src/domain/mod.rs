//! Core domain types
//!
//! This module contains the structures a log shipper works with: the record
//! that travels on the wire, the severity names it carries, and the collector
//! it is sent to.

pub mod endpoint;
pub mod level;
pub mod record;
