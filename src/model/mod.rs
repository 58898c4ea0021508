//! Model module - feature extraction, logistic regression and evaluation metrics

pub mod features;
pub mod logistic;
pub mod metrics;

pub use features::*;
pub use logistic::*;
pub use metrics::*;
