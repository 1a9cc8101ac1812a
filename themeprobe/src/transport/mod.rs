//! Cross-context transport
//!
//! The probe engine runs in the rendering context; a controller drives it
//! from another context with no shared memory. Both sides exchange JSON
//! [`Envelope`](themeprobe_common::protocol::Envelope)s over an ordered,
//! unicast channel:
//!
//! ```text
//! Bridge ──PING──▶ Listener      Bridge ──RUN {screen}──▶ Listener
//! Bridge ◀─READY── Listener      Bridge ◀─RESULT──────── Listener
//! ```
//!
//! Every wait is scoped to one correlation id and one timeout. A run that
//! times out on the bridge side is not cancelled remotely: the listener
//! finishes it, restores the document, and its late RESULT is dropped.

pub mod bridge;
pub mod channel;
pub mod listener;

pub use bridge::{ContextOpener, ProbeBridge};
pub use channel::{context_pair, ContextEndpoint, ContextSender};
pub use listener::{ListenerHandle, ProbeListener};
