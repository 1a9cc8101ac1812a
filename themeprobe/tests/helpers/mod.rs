//! Test helpers for themeprobe integration tests
//!
//! - SceneBuilder: compact scene construction
//! - Faulty collaborators: surfaces and adapters that misbehave on cue
//! - ListenerOpener: a ContextOpener that starts a fresh listener

#![allow(dead_code, unused_imports)]

pub mod faults;
pub mod scene_builder;

pub use faults::{PanickingAdapter, SlowSurface, UnrestorableAdapter, VanishingSurface};
pub use scene_builder::{
    element, hidden_element, probe_setup, probe_setup_with, ListenerOpener, ProbeSetup, SceneBuilder,
};
