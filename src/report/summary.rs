//! End-of-job summary tables

use std::time::Duration;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::model::ClassificationMetrics;

/// Rows and positive-class rate of one written partition
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionStats {
    pub name: String,
    pub rows: usize,
    pub positive_rate: f64,
}

/// Summary of a preprocessing run
#[derive(Debug, Default)]
pub struct PreprocessSummary {
    pub input_rows: usize,
    pub input_columns: usize,
    pub imputed_values: usize,
    pub imputed_median: Option<f64>,
    pub encoded_columns: Vec<String>,
    pub output_columns: usize,
    pub partitions: Vec<PartitionStats>,
    pub elapsed: Duration,
}

impl PreprocessSummary {
    pub fn new(input_rows: usize, input_columns: usize) -> Self {
        Self {
            input_rows,
            input_columns,
            ..Default::default()
        }
    }

    pub fn set_imputation(&mut self, imputed_values: usize, median: Option<f64>) {
        self.imputed_values = imputed_values;
        self.imputed_median = median;
    }

    pub fn set_encoding(&mut self, encoded_columns: Vec<String>, output_columns: usize) {
        self.encoded_columns = encoded_columns;
        self.output_columns = output_columns;
    }

    pub fn add_partition(&mut self, name: &str, rows: usize, positive_rate: f64) {
        self.partitions.push(PartitionStats {
            name: name.to_string(),
            rows,
            positive_rate,
        });
    }

    pub fn set_elapsed(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
    }

    /// Rows across all written partitions
    pub fn written_rows(&self) -> usize {
        self.partitions.iter().map(|p| p.rows).sum()
    }

    pub fn render(&self) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![
            Cell::new("📁 Input Shape"),
            Cell::new(format!("({}, {})", self.input_rows, self.input_columns)),
        ]);

        let imputed = match self.imputed_median {
            Some(median) => format!("{} (median {:.2})", self.imputed_values, median),
            None => self.imputed_values.to_string(),
        };
        table.add_row(vec![
            Cell::new("🩹 Imputed Values"),
            Cell::new(imputed).fg(if self.imputed_values > 0 {
                Color::Yellow
            } else {
                Color::White
            }),
        ]);

        table.add_row(vec![
            Cell::new("🔢 Indicator Columns"),
            Cell::new(self.encoded_columns.len()),
        ]);

        table.add_row(vec![
            Cell::new("📐 Output Columns"),
            Cell::new(self.output_columns),
        ]);

        for partition in &self.partitions {
            table.add_row(vec![
                Cell::new(format!("✂️  {}", partition.name)),
                Cell::new(format!(
                    "{} rows, {:.1}% churn",
                    partition.rows,
                    partition.positive_rate * 100.0
                ))
                .fg(Color::Cyan),
            ]);
        }

        table.add_row(vec![
            Cell::new("⏱  Elapsed"),
            Cell::new(format!("{:.2}s", self.elapsed.as_secs_f64())),
        ]);

        table.to_string()
    }

    pub fn display(&self) {
        print_section_title("📋", "PREPROCESSING SUMMARY");
        print_indented(&self.render());
    }
}

/// Summary of a training run
#[derive(Debug)]
pub struct TrainingSummary {
    pub run_id: String,
    pub experiment_name: String,
    pub model_name: String,
    pub model_version: String,
    pub n_train: usize,
    pub n_val: usize,
    pub n_features: usize,
    pub n_iter: usize,
    pub converged: bool,
    pub metrics: ClassificationMetrics,
    /// Mean log loss of the predicted probabilities; reported, not logged
    pub val_log_loss: f64,
}

impl TrainingSummary {
    pub fn render(&self) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![Cell::new("🧪 Experiment"), Cell::new(&self.experiment_name)]);
        table.add_row(vec![Cell::new("🏷️  Run ID"), Cell::new(&self.run_id)]);
        table.add_row(vec![
            Cell::new("📦 Registered Model"),
            Cell::new(format!("{} v{}", self.model_name, self.model_version))
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new("📐 Train / Val Rows"),
            Cell::new(format!("{} / {}", self.n_train, self.n_val)),
        ]);
        table.add_row(vec![Cell::new("🔢 Features"), Cell::new(self.n_features)]);
        table.add_row(vec![
            Cell::new("🔁 Solver Iterations"),
            Cell::new(if self.converged {
                self.n_iter.to_string()
            } else {
                format!("{} (not converged)", self.n_iter)
            })
            .fg(if self.converged { Color::White } else { Color::Yellow }),
        ]);

        for (name, value) in self.metrics.as_logged() {
            table.add_row(vec![
                Cell::new(name),
                Cell::new(format!("{:.4}", value)).fg(Color::Cyan),
            ]);
        }

        table.add_row(vec![
            Cell::new("val_log_loss"),
            Cell::new(format!("{:.4}", self.val_log_loss)).fg(Color::Cyan),
        ]);

        let m = &self.metrics;
        table.add_row(vec![
            Cell::new("Confusion (TP/FP/TN/FN)"),
            Cell::new(format!("{} / {} / {} / {}", m.tp, m.fp, m.tn, m.fn_count)),
        ]);

        table.to_string()
    }

    pub fn display(&self) {
        print_section_title("📋", "TRAINING SUMMARY");
        print_indented(&self.render());
    }
}

fn print_section_title(icon: &str, title: &str) {
    println!();
    println!("    {} {}", style(icon).cyan(), style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
    println!();
}

fn print_indented(table: &str) {
    for line in table.lines() {
        println!("    {}", line);
    }
}
