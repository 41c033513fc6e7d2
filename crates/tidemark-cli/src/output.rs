use anyhow::Result;
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use serde::Serialize;
use tidemark_engine::JobReport;
use tidemark_types::{ConfidenceTier, RiskTier};

use crate::args::OutputFormat;

pub fn colors_enabled() -> bool {
    std::io::stdout().is_terminal()
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Render a job report: one summary line plus per-item failures in
/// plain mode, the full structure in json mode.
pub fn print_report(report: &JobReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Plain => {
            println!("{}", report.summary_line());
            for failure in &report.failures {
                let line = format!("  failed {}: {}", failure.path, failure.error);
                if colors_enabled() {
                    eprintln!("{}", line.red());
                } else {
                    eprintln!("{}", line);
                }
            }
            Ok(())
        }
    }
}

pub fn tier_label(tier: ConfidenceTier) -> String {
    if !colors_enabled() {
        return tier.as_str().to_string();
    }
    match tier {
        ConfidenceTier::High => tier.as_str().green().to_string(),
        ConfidenceTier::Medium => tier.as_str().yellow().to_string(),
        ConfidenceTier::Low => tier.as_str().red().to_string(),
    }
}

pub fn risk_label(tier: RiskTier) -> String {
    if !colors_enabled() {
        return tier.as_str().to_string();
    }
    match tier {
        RiskTier::Safe => tier.as_str().green().to_string(),
        RiskTier::Review => tier.as_str().yellow().to_string(),
        RiskTier::Manual => tier.as_str().red().to_string(),
    }
}
