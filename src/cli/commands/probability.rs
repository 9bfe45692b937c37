//! Probability command - Query the exact probability engine

use anyhow::{Result, bail};
use clap::Parser;
use serde::Serialize;

use crate::{
    cli::output::{format_percent, print_kv, print_section, print_subsection},
    probability::{GroundTruth, outcome_distribution, tie_probability},
};

#[derive(Parser, Debug)]
#[command(about = "Exact win/loss probabilities for a board position")]
pub struct ProbabilityArgs {
    /// Player's current sum
    pub player_sum: i64,

    /// House's current sum
    pub house_sum: i64,

    /// Stages left to roll (including the next one)
    pub remaining: u32,

    /// Faces per die
    #[arg(long, default_value_t = 6)]
    pub sides: u32,

    /// Also print the distribution of the sum still to be rolled
    #[arg(long)]
    pub distribution: bool,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ProbabilityReport {
    player_sum: i64,
    house_sum: i64,
    remaining_stages: u32,
    sides: u32,
    win: f64,
    loss: f64,
    tie: f64,
    entropy: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    distribution: Option<Vec<(u32, f64)>>,
}

pub fn execute(args: ProbabilityArgs) -> Result<()> {
    if args.sides < 2 && args.remaining > 0 {
        bail!("a die needs at least 2 sides (got {})", args.sides);
    }

    let truth = GroundTruth::evaluate(args.player_sum, args.house_sum, args.remaining, args.sides);
    let report = ProbabilityReport {
        player_sum: args.player_sum,
        house_sum: args.house_sum,
        remaining_stages: args.remaining,
        sides: args.sides,
        win: truth.probabilities.win,
        loss: truth.probabilities.loss,
        tie: tie_probability(args.player_sum, args.house_sum, args.remaining, args.sides),
        entropy: truth.entropy,
        distribution: args
            .distribution
            .then(|| outcome_distribution(args.remaining, args.sides).iter().collect()),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_section("Ground Truth");
    print_kv("Player sum", &report.player_sum.to_string());
    print_kv("House sum", &report.house_sum.to_string());
    print_kv("Remaining stages", &report.remaining_stages.to_string());
    print_kv("Sides", &report.sides.to_string());
    print_subsection("Probabilities");
    print_kv("Win", &format!("{} ({})", format_percent(report.win), report.win));
    print_kv("Loss", &format!("{} ({})", format_percent(report.loss), report.loss));
    print_kv("  of which tie", &format_percent(report.tie));
    print_kv("Entropy (bits)", &format!("{:.6}", report.entropy));

    if let Some(distribution) = &report.distribution {
        print_subsection("Sum still to roll (per player)");
        for (sum, p) in distribution {
            print_kv(&sum.to_string(), &format_percent(*p));
        }
    }

    Ok(())
}
