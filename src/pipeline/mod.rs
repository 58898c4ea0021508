//! Pipeline module - loading, cleaning, encoding and splitting the raw dataset

pub mod clean;
pub mod config;
pub mod encode;
pub mod loader;
pub mod split;

pub use clean::*;
pub use config::*;
pub use encode::*;
pub use loader::*;
pub use split::*;
