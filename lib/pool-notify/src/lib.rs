//! Alert, digest and delivery building blocks
//!
//! This library provides:
//! - `AlertComposer`: edge-triggered transition messages
//! - `DigestComposer`: periodic summaries with hash power concentration checks
//! - `Notifier` and `Renderer` collaborator traits with webhook and SVG implementations
pub mod alert;
pub mod digest;
pub mod error;
pub mod notifier;
pub mod render;

pub use alert::{Alert, AlertComposer, AlertDecision, AlertKind};
pub use digest::{Digest, DigestComposer};
pub use error::{NotifierError, RenderError};
pub use notifier::{Notifier, WebhookCredentials, WebhookNotifier};
pub use render::{Renderer, StyleOptions, SvgRenderer};
