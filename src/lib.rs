//! stepquill: an undoable editing engine for hierarchical protocol documents.
//!
//! A protocol is a tree of [`Step`](document::step::Step)s stored in a
//! [`Document`](document::tree::Document) arena. Every change is an
//! [`Edit`](edit::Edit) recorded in a linear [`History`](edit::history::History)
//! so it can be undone and redone.

pub mod config;
pub mod document;
pub mod edit;
pub mod editor;
pub mod error;
pub mod input;
pub mod ui;
pub mod view;

pub use error::{EditError, Result};
