//! Chat orchestration
//!
//! - [`message`] -- transcript entries
//! - [`conversation`] -- the per-session transcript owner
//! - [`registry`] -- session list and active-session selection for an agent

pub mod conversation;
pub mod message;
pub mod registry;

pub use conversation::{ConversationStore, IgnoreReason, SendOutcome};
pub use message::{Message, Role};
pub use registry::{SessionRegistry, SessionState};
