//! ui
//!
//! Terminal output.
//!
//! # Modules
//!
//! - [`output`] - Verbosity, messages and column formatting

pub mod output;
