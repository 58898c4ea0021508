//! Experiment tracking: runs, params, metrics, model artifacts and a model registry

pub mod config;
pub mod error;
pub mod file_store;
pub mod rest_store;
pub mod run;
pub mod store;

pub use config::*;
pub use error::*;
pub use file_store::*;
pub use rest_store::RestStore;
pub use run::*;
pub use store::*;
