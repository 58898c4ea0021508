//! churnflow: Telco Churn Pipeline Library
//!
//! Data preparation (cleaning, encoding, stratified splitting), a logistic
//! regression classifier with its evaluation metrics, and an experiment
//! tracking client for runs and registered models.

pub mod cli;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod tracking;
pub mod utils;
