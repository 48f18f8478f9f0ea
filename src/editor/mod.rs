//! User-facing editing session.
//!
//! # Modules
//!
//! - `session`: checks preconditions, builds edits and runs them through history

pub mod session;

pub use session::EditorSession;
