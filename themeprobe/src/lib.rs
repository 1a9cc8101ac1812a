//! # Theme Probe Library (themeprobe)
//!
//! Runtime theme-to-element mapping by perturbation testing.
//!
//! **Purpose:** Discover which scalar field of a layered theme document controls
//! the rendered appearance of which UI element, without any static mapping.
//! Each scalar is replaced by a distinctive signal value, observed element styles
//! are diffed, and the original value is restored before the next path.
//!
//! **Architecture:** Sequential async pipeline over two collaborator traits
//! ([`adapter::ThemeAdapter`] for the configuration store and
//! [`surface::RenderSurface`] for the rendered UI), reachable from another
//! execution context through the [`transport`] bridge/listener pair.

pub mod adapter;
pub mod config;
pub mod document;
pub mod engine;
pub mod enumerate;
pub mod error;
pub mod layer;
pub mod report;
pub mod scene;
pub mod scorer;
pub mod signal;
pub mod surface;
pub mod transport;

pub use engine::ProbeEngine;
pub use error::{Error, Result};
