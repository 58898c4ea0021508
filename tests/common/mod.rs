//! Shared test utilities and fixture generators

#![allow(dead_code)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tempfile::TempDir;

pub const HEADER: &str = "customerID,gender,SeniorCitizen,Partner,Dependents,tenure,PhoneService,\
MultipleLines,InternetService,Contract,PaperlessBilling,PaymentMethod,MonthlyCharges,TotalCharges,Churn";

const CONTRACTS: [&str; 3] = ["Month-to-month", "One year", "Two year"];
const INTERNET: [&str; 3] = ["DSL", "Fiber optic", "No"];
const PAYMENT: [&str; 4] = [
    "Bank transfer (automatic)",
    "Credit card (automatic)",
    "Electronic check",
    "Mailed check",
];

/// Generate a Telco-style raw dataset as CSV text.
///
/// Deterministic for a given `seed`. Churn depends on contract and tenure so a
/// linear model has signal to learn. Roughly one row in nine has a blank
/// `TotalCharges`, and a few Yes/No cells hold unexpected values.
pub fn telco_csv(rows: usize, seed: u64) -> String {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut csv = String::from(HEADER);
    csv.push('\n');

    for i in 0..rows {
        let contract = *CONTRACTS.choose(&mut rng).unwrap_or(&CONTRACTS[0]);
        let tenure: u32 = rng.gen_range(0..72);
        let monthly: f64 = rng.gen_range(18.0..118.0);

        let churn_prob = match contract {
            "Month-to-month" if tenure < 12 => 0.8,
            "Month-to-month" => 0.3,
            _ => 0.05,
        };
        let churn = rng.gen_bool(churn_prob);

        let total = if i % 9 == 4 {
            " ".to_string()
        } else {
            format!("{:.2}", monthly * f64::from(tenure.max(1)))
        };

        let partner = match i % 23 {
            0 => "Maybe",
            1 => "",
            _ => yes_no(rng.gen_bool(0.5)),
        };

        let _ = writeln!(
            csv,
            "{:04}-CUST,{},{},{},{},{},{},{},{},{},{},{},{:.2},{},{}",
            i,
            if rng.gen_bool(0.5) { "Male" } else { "Female" },
            u8::from(rng.gen_bool(0.16)),
            partner,
            yes_no(rng.gen_bool(0.3)),
            tenure,
            if i % 31 == 0 { "yes" } else { yes_no(rng.gen_bool(0.9)) },
            ["No", "Yes", "No phone service"][rng.gen_range(0..3)],
            INTERNET.choose(&mut rng).unwrap_or(&INTERNET[0]),
            contract,
            yes_no(rng.gen_bool(0.6)),
            PAYMENT.choose(&mut rng).unwrap_or(&PAYMENT[0]),
            monthly,
            total,
            yes_no(churn),
        );
    }

    csv
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

/// Write a generated dataset into a fresh temp dir, returning the dir and file path
pub fn write_telco_csv(rows: usize, seed: u64) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("telco.csv");
    std::fs::write(&path, telco_csv(rows, seed)).unwrap();
    (dir, path)
}

/// Write arbitrary CSV text to `<dir>/<name>`
pub fn write_csv(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// Number of positive labels in the generated dataset
pub fn expected_churners(csv: &str) -> usize {
    csv.lines()
        .skip(1)
        .filter(|line| line.ends_with(",Yes"))
        .count()
}
