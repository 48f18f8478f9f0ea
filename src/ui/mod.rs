//! Text rendering of documents for the terminal driver.

pub mod outline;

pub use outline::{build_outline, render_outline, OutlineLine};
