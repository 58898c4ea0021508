//! CLI module - argument parsing and the two jobs

pub mod args;
pub mod preprocess;
pub mod train;

pub use args::{Cli, Commands, PreprocessArgs, TrainArgs};
pub use preprocess::{partition_paths, run_preprocess, run_preprocess_with};
pub use train::{run_train, run_train_with};
