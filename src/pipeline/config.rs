//! Job configuration for the Telco churn dataset

/// Identifier column, never used as a feature
pub const ID_COLUMN: &str = "customerID";

/// Binary churn label
pub const LABEL_COLUMN: &str = "Churn";

/// Cumulative charges column that arrives with blanks for new customers
pub const CHARGES_COLUMN: &str = "TotalCharges";

/// Yes/No columns mapped to 1/0. The label is one of them.
pub const BINARY_COLUMNS: [&str; 5] = [
    "Partner",
    "Dependents",
    "PhoneService",
    "PaperlessBilling",
    "Churn",
];

/// Seed shared by the split and the classifier
pub const DEFAULT_SEED: u64 = 42;

/// Default name for the registered model
pub const DEFAULT_MODEL_NAME: &str = "telco-churn-model";

/// Model type identifier logged with each run
pub const MODEL_TYPE: &str = "LogisticRegression";

/// Settings for the preprocessing job
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    pub id_column: String,
    pub label_column: String,
    pub charges_column: String,
    pub binary_columns: Vec<String>,
    /// Fraction of all rows held out for the test partition
    pub test_fraction: f64,
    /// Fraction of all rows held out for the validation partition
    pub val_fraction: f64,
    pub seed: u64,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            id_column: ID_COLUMN.to_string(),
            label_column: LABEL_COLUMN.to_string(),
            charges_column: CHARGES_COLUMN.to_string(),
            binary_columns: BINARY_COLUMNS.iter().map(|s| s.to_string()).collect(),
            test_fraction: 0.15,
            val_fraction: 0.15,
            seed: DEFAULT_SEED,
        }
    }
}

impl PreprocessConfig {
    /// Fraction of the post-test remainder that goes to validation.
    ///
    /// With the defaults this is `0.15 / 0.85`, so validation ends up at 15% of all rows.
    pub fn val_fraction_of_rest(&self) -> f64 {
        self.val_fraction / (1.0 - self.test_fraction)
    }
}

/// Settings for the training job
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub id_column: String,
    pub label_column: String,
    pub max_iter: usize,
    /// Inverse L2 regularization strength
    pub c: f64,
    pub tol: f64,
    pub random_state: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            id_column: ID_COLUMN.to_string(),
            label_column: LABEL_COLUMN.to_string(),
            max_iter: 1000,
            c: 1.0,
            tol: 1e-4,
            random_state: DEFAULT_SEED,
        }
    }
}
