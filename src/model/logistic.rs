//! L2-regularized logistic regression for binary classification
//!
//! Minimizes `Σ logloss(y_i, σ(x_i·w + b)) + ||w||² / (2C)` with Newton-Raphson
//! steps (iteratively reweighted least squares). The intercept `b` is not
//! penalized. Each step forms the Hessian `Xᵀ W X + I/C` with faer matrix
//! products and solves it with faer's Cholesky factorization.

use anyhow::Result;
use faer::prelude::SpSolver;
use faer::{Mat, Side};
use serde::{Deserialize, Serialize};

use super::features::FeatureSet;
use crate::pipeline::TrainConfig;

/// Floor for the IRLS weights `p(1-p)` so saturated rows keep the Hessian well-posed
const MIN_WEIGHT: f64 = 1e-12;

/// Ridge added to the unpenalized intercept entry of the Hessian
const INTERCEPT_JITTER: f64 = 1e-10;

/// Hyperparameters, recorded alongside the fitted model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    pub max_iter: usize,
    /// Inverse regularization strength
    pub c: f64,
    pub tol: f64,
    /// The Newton solver is deterministic; the seed is kept for provenance
    pub random_state: u64,
}

/// Unfitted estimator
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    params: LogisticParams,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::from_config(&TrainConfig::default())
    }
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &TrainConfig) -> Self {
        Self {
            params: LogisticParams {
                max_iter: config.max_iter,
                c: config.c,
                tol: config.tol,
                random_state: config.random_state,
            },
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.params.max_iter = max_iter;
        self
    }

    pub fn with_c(mut self, c: f64) -> Self {
        self.params.c = c;
        self
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.params.tol = tol;
        self
    }

    /// Fit on a feature set whose labels are 0/1 and contain both classes
    pub fn fit(&self, data: &FeatureSet) -> Result<FittedLogistic> {
        let n = data.n_rows();
        let p = data.n_features();

        if n == 0 {
            anyhow::bail!("Cannot fit logistic regression on an empty training set");
        }
        if self.params.c <= 0.0 || !self.params.c.is_finite() {
            anyhow::bail!("Regularization strength C must be positive, got {}", self.params.c);
        }
        let positives = data.y.iter().filter(|&&l| l == 1).count();
        if positives == 0 || positives == n {
            anyhow::bail!(
                "Training labels contain a single class; logistic regression needs both 0 and 1"
            );
        }

        let lambda = 1.0 / self.params.c;
        let dim = p + 1;

        // Design matrix with a trailing column of ones for the intercept
        let mut xa = Mat::<f64>::zeros(n, dim);
        for i in 0..n {
            for j in 0..p {
                xa[(i, j)] = data.x[(i, j)];
            }
            xa[(i, p)] = 1.0;
        }

        let mut beta = Mat::<f64>::zeros(dim, 1);
        let mut n_iter = 0;
        let mut converged = false;

        for _ in 0..self.params.max_iter {
            n_iter += 1;

            let z = &xa * &beta;
            let mut residual = Mat::<f64>::zeros(n, 1);
            let mut xw = Mat::<f64>::zeros(n, dim);
            for i in 0..n {
                let prob = sigmoid(z[(i, 0)]);
                residual[(i, 0)] = prob - data.y[i] as f64;
                let w = (prob * (1.0 - prob)).max(MIN_WEIGHT).sqrt();
                for j in 0..dim {
                    xw[(i, j)] = xa[(i, j)] * w;
                }
            }

            let mut gradient = xa.transpose() * &residual;
            let mut hessian = xw.transpose() * &xw;
            for j in 0..p {
                gradient[(j, 0)] += lambda * beta[(j, 0)];
                hessian[(j, j)] += lambda;
            }
            hessian[(p, p)] += INTERCEPT_JITTER;

            let step = solve_spd(&hessian, &gradient)?;

            let mut max_step: f64 = 0.0;
            for j in 0..dim {
                let delta = step[(j, 0)];
                beta[(j, 0)] -= delta;
                max_step = max_step.max(delta.abs());
            }

            if !max_step.is_finite() {
                anyhow::bail!("Logistic regression diverged (non-finite update)");
            }
            if max_step < self.params.tol {
                converged = true;
                break;
            }
        }

        let coefficients: Vec<f64> = (0..p).map(|j| beta[(j, 0)]).collect();
        let intercept = beta[(p, 0)];

        Ok(FittedLogistic {
            feature_names: data.feature_names.clone(),
            coefficients,
            intercept,
            n_iter,
            converged,
            params: self.params,
        })
    }
}

/// A fitted classifier together with the feature schema it was trained on.
///
/// Immutable after fit; this is what gets logged as the model artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedLogistic {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub n_iter: usize,
    pub converged: bool,
    pub params: LogisticParams,
}

impl FittedLogistic {
    /// Probability of class 1 for each row of `x`
    pub fn predict_proba(&self, x: &Mat<f64>) -> Result<Vec<f64>> {
        if x.ncols() != self.coefficients.len() {
            anyhow::bail!(
                "Model expects {} feature(s), got {}",
                self.coefficients.len(),
                x.ncols()
            );
        }

        let probabilities = (0..x.nrows())
            .map(|i| {
                let z = self
                    .coefficients
                    .iter()
                    .enumerate()
                    .fold(self.intercept, |acc, (j, w)| acc + w * x[(i, j)]);
                sigmoid(z)
            })
            .collect();

        Ok(probabilities)
    }

    /// Class labels: 1 when the probability is strictly above 0.5
    pub fn predict(&self, x: &Mat<f64>) -> Result<Vec<i64>> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| i64::from(p > 0.5))
            .collect())
    }

    /// Mean log loss on a feature set (without the penalty term)
    pub fn log_loss(&self, data: &FeatureSet) -> Result<f64> {
        let probabilities = self.predict_proba(&data.x)?;
        if probabilities.is_empty() {
            return Ok(0.0);
        }
        let eps = 1e-15;
        let total: f64 = probabilities
            .iter()
            .zip(data.y.iter())
            .map(|(&p, &y)| {
                let p = p.clamp(eps, 1.0 - eps);
                if y == 1 {
                    -p.ln()
                } else {
                    -(1.0 - p).ln()
                }
            })
            .sum();
        Ok(total / probabilities.len() as f64)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Numerically stable logistic function
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Solve `a · x = b` for a symmetric positive definite `a` via Cholesky (`a = L Lᵀ`)
fn solve_spd(a: &Mat<f64>, b: &Mat<f64>) -> Result<Mat<f64>> {
    let llt = a
        .cholesky(Side::Lower)
        .map_err(|e| anyhow::anyhow!("Hessian is not positive definite: {:?}", e))?;
    Ok(llt.solve(b.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature_set(rows: &[[f64; 2]], y: &[i64]) -> FeatureSet {
        let mut x = Mat::<f64>::zeros(rows.len(), 2);
        for (i, row) in rows.iter().enumerate() {
            x[(i, 0)] = row[0];
            x[(i, 1)] = row[1];
        }
        FeatureSet {
            feature_names: vec!["a".to_string(), "b".to_string()],
            x,
            y: y.to_vec(),
        }
    }

    fn noisy_data() -> FeatureSet {
        feature_set(
            &[
                [-2.0, 1.0],
                [-1.5, 0.0],
                [-1.0, 1.0],
                [-0.5, 0.0],
                [0.2, 1.0],
                [-0.2, 0.0],
                [0.5, 1.0],
                [1.0, 0.0],
                [1.5, 1.0],
                [2.0, 0.0],
            ],
            &[0, 0, 0, 0, 1, 0, 1, 1, 1, 1],
        )
    }

    #[test]
    fn test_solve_spd_known_system() {
        let mut a = Mat::<f64>::zeros(2, 2);
        a[(0, 0)] = 4.0;
        a[(0, 1)] = 2.0;
        a[(1, 0)] = 2.0;
        a[(1, 1)] = 3.0;

        let mut b = Mat::<f64>::zeros(2, 1);
        b[(0, 0)] = 2.0;
        b[(1, 0)] = 1.0;

        let x = solve_spd(&a, &b).unwrap();
        // 4x + 2y = 2, 2x + 3y = 1 -> x = 0.5, y = 0
        assert!((x[(0, 0)] - 0.5).abs() < 1e-12);
        assert!(x[(1, 0)].abs() < 1e-12);
    }

    #[test]
    fn test_solve_spd_rejects_indefinite() {
        let mut a = Mat::<f64>::zeros(2, 2);
        a[(0, 0)] = 1.0;
        a[(0, 1)] = 2.0;
        a[(1, 0)] = 2.0;
        a[(1, 1)] = 1.0;
        let b = Mat::<f64>::zeros(2, 1);
        assert!(solve_spd(&a, &b).is_err());
    }

    #[test]
    fn test_sigmoid_is_stable_at_extremes() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(!sigmoid(-800.0).is_nan());
    }

    #[test]
    fn test_fit_converges_and_learns_direction() {
        let data = noisy_data();
        let model = LogisticRegression::new().fit(&data).unwrap();

        assert!(model.converged);
        assert!(model.n_iter < 50);
        assert!(model.coefficients[0] > 0.0, "positive feature should push towards churn");

        let preds = model.predict(&data.x).unwrap();
        let correct = preds.iter().zip(&data.y).filter(|(p, y)| p == y).count();
        assert!(correct >= 8);
    }

    #[test]
    fn test_gradient_vanishes_at_solution() {
        let data = noisy_data();
        let est = LogisticRegression::new().with_c(0.5).with_tol(1e-10);
        let model = est.fit(&data).unwrap();
        let probs = model.predict_proba(&data.x).unwrap();

        let lambda = 1.0 / 0.5;
        for j in 0..2 {
            let g: f64 = (0..data.n_rows())
                .map(|i| (probs[i] - data.y[i] as f64) * data.x[(i, j)])
                .sum::<f64>()
                + lambda * model.coefficients[j];
            assert!(g.abs() < 1e-6, "gradient[{}] = {}", j, g);
        }
        let g_intercept: f64 = (0..data.n_rows()).map(|i| probs[i] - data.y[i] as f64).sum();
        assert!(g_intercept.abs() < 1e-6);
    }

    #[test]
    fn test_separable_data_stays_finite() {
        let data = feature_set(
            &[[-3.0, 0.0], [-2.0, 0.0], [-1.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0]],
            &[0, 0, 0, 1, 1, 1],
        );
        let model = LogisticRegression::new().fit(&data).unwrap();
        assert!(model.coefficients.iter().all(|c| c.is_finite()));
        assert_eq!(model.predict(&data.x).unwrap(), vec![0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_single_class_is_rejected() {
        let data = feature_set(&[[1.0, 0.0], [2.0, 1.0]], &[1, 1]);
        let err = LogisticRegression::new().fit(&data).unwrap_err().to_string();
        assert!(err.contains("single class"));
    }

    #[test]
    fn test_predict_checks_feature_count() {
        let model = LogisticRegression::new().fit(&noisy_data()).unwrap();
        let x = Mat::<f64>::zeros(3, 5);
        assert!(model.predict(&x).is_err());
    }

    #[test]
    fn test_artifact_json_carries_schema() {
        let model = LogisticRegression::new().with_max_iter(1000).fit(&noisy_data()).unwrap();
        let json = model.to_json().unwrap();
        assert!(json.contains("\"feature_names\""));
        assert!(json.contains("\"random_state\": 42"));

        let restored: FittedLogistic = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.feature_names, model.feature_names);
    }

    #[test]
    fn test_log_loss_is_below_chance() {
        let data = noisy_data();
        let model = LogisticRegression::new().fit(&data).unwrap();
        assert!(model.log_loss(&data).unwrap() < std::f64::consts::LN_2);
    }
}
