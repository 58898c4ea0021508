//! Report module - summarizing job results

pub mod summary;

pub use summary::*;
