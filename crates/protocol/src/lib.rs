//! Wire types for the AR engine boundary.
//!
//! This crate contains the serde-serializable types exchanged with the
//! native AR engine, plus the constant catalogs that form the stable
//! vocabulary between engine and application (configuration names, event
//! channels, anchor/tracking/alignment identifiers).
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond (de)serialization and identifier
//!   conversion
//! * 1:1 with the engine: catalog identifiers are carried verbatim for
//!   wire compatibility
//! * Stable: Changes only when the engine contract changes
//!
//! Higher-level session control is built on top of these types in
//! `arbridge`.

pub mod catalog;
pub mod types;

pub use catalog::*;
pub use types::*;
