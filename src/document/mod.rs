//! Protocol document model.
//!
//! - `content`: body items (text, typed parameters) and step annotations
//! - `step`: the [`Step`](step::Step) node
//! - `tree`: the arena-backed [`Document`](tree::Document) and its handles

pub mod content;
pub mod step;
pub mod tree;
