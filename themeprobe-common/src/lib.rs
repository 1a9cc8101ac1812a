//! # Theme Probe Common Library
//!
//! Shared code for the probe controller and the rendering-side listener:
//! - Error type
//! - Configuration loading (TOML + environment + compiled defaults)
//! - Mapping data model (hits, mapping items, run results)
//! - Cross-context wire protocol (envelopes, message bodies)

pub mod config;
pub mod error;
pub mod model;
pub mod protocol;

pub use error::{Error, Result};
pub use model::{Hit, LayerStatus, LayerSummary, MappingItem, MappingStatus, ProbeRunResult, StatusTotals};
pub use protocol::{Envelope, MessageBody, PROTOCOL_VERSION};
