//! Output formatting and progress bars for CLI

use indicatif::{ProgressBar, ProgressStyle};

use crate::{Error, Result};

/// Create a progress bar counting `unit`s (e.g. "sessions")
pub fn create_progress(total: u64, unit: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new(total);
    let template = format!("[{{elapsed_precise}}] {{bar:40.cyan/blue}} {{pos}}/{{len}} {unit} ({{msg}})");
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&template)
            .map_err(|e| Error::ProgressBarTemplate {
                message: e.to_string(),
            })?
            .progress_chars("=>-"),
    );
    Ok(pb)
}

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

/// Print a subsection header
pub fn print_subsection(title: &str) {
    println!("\n{title}");
    println!("{}", "-".repeat(40));
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:24} {}", format!("{}:", key), value);
}

/// Print statistics table
pub fn print_stats_table(stats: &[(&str, String)]) {
    for (key, value) in stats {
        print_kv(key, value);
    }
}

/// Format a probability as a percentage with two decimals
pub fn format_percent(p: f64) -> String {
    format!("{:.2}%", p * 100.0)
}

/// Format a payment amount in dollars
pub fn format_money(amount: f64) -> String {
    format!("${amount:.2}")
}
