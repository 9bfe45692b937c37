//! Play command - Run the task in a terminal
//!
//! A line-based presentation layer: every prompt reads one line from stdin
//! and forwards it to the matching session entry point.

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::Arc,
    thread,
};

use anyhow::{Context, Result, bail};
use clap::Parser;

use crate::{
    adapters::{CsvFileRecorder, InMemoryRecorder},
    app::App,
    cli::{config::ExperimentArgs, output::format_money},
    ports::Recorder,
    session::{Continuation, EndReason, Phase, TrialSession, questionnaire::ANSWER_LABELS},
};

#[derive(Parser, Debug)]
#[command(about = "Take part in the experiment from the terminal")]
pub struct PlayArgs {
    #[command(flatten)]
    pub experiment: ExperimentArgs,

    /// Write every stage snapshot to this CSV file at the end
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Skip the pause before each trial's first stage
    #[arg(long)]
    pub no_delay: bool,
}

pub fn execute(args: PlayArgs) -> Result<()> {
    let mut config = args.experiment.resolve()?;
    if args.no_delay {
        config.board_reveal_delay_ms = 0;
    }

    let recorder: Arc<dyn Recorder> = match &args.output {
        Some(path) => Arc::new(CsvFileRecorder::new(path.clone())),
        None => Arc::new(InMemoryRecorder::new()),
    };
    let app = App::for_testing()
        .with_shared_recorder(Arc::clone(&recorder))
        .build();
    let mut session = app.create_session(config)?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    play(&mut session, stdin.lock(), stdout.lock())?;

    recorder.flush()?;
    if let Some(path) = &args.output {
        println!("Saved {} rows to {}", recorder.rows().len(), path.display());
    }
    Ok(())
}

/// Drive `session` to its end from line-based input.
pub fn play<R: BufRead, W: Write>(
    session: &mut TrialSession,
    mut input: R,
    mut out: W,
) -> Result<()> {
    while !session.phase().is_terminal() {
        let view = session.view();
        let transition = match view.phase {
            Phase::Welcome => {
                writeln!(out, "Welcome, {}.", view.participant_id)?;
                wait_for_enter(&mut input, &mut out)?;
                session.start_questionnaire()
            }
            Phase::Questionnaire => {
                let question = view.question.as_deref().unwrap_or_default();
                writeln!(out, "\nQ{}. {question}", view.question_index + 1)?;
                for (value, label) in ANSWER_LABELS.iter().enumerate() {
                    writeln!(out, "  {value} = {label}")?;
                }
                let answer = prompt(&mut input, &mut out, "answer (0-3)", |line| {
                    line.parse::<u8>().ok()
                })?;
                session.answer_questionnaire_item(answer)
            }
            Phase::Instructions => {
                writeln!(
                    out,
                    "\nYou and the house each roll one {}-sided die per stage for {} stages.",
                    view.dice_sides, view.n_stages
                )?;
                writeln!(
                    out,
                    "The higher total wins twice the bet; a tie goes to the house."
                )?;
                writeln!(
                    out,
                    "Before each roll, adjust your bet and say how likely you are to win."
                )?;
                wait_for_enter(&mut input, &mut out)?;
                session.begin_experiment()
            }
            Phase::TrialStart => {
                writeln!(
                    out,
                    "\n=== Trial {} of {} | wealth {} | bet {} ===",
                    view.trial_index + 1,
                    view.n_trials,
                    view.wealth,
                    view.current_bet
                )?;
                if let Some(Continuation::OpenFirstStage { after }) = view.continuation
                    && !after.is_zero()
                {
                    thread::sleep(after);
                }
                session.open_first_stage()
            }
            Phase::StageAction => {
                writeln!(
                    out,
                    "\nStage {}/{} | you {} vs house {} | wealth {} | bet {}",
                    view.stage,
                    view.n_stages,
                    view.player_sum,
                    view.house_sum,
                    view.wealth,
                    view.current_bet
                )?;
                let token = read_line(&mut input, &mut out, "[r]etract, [h]old or [a]dd")?;
                session.handle_action_token(&token)
            }
            Phase::StageBelief => {
                let belief = prompt(&mut input, &mut out, "chance of winning (0-100)", |line| {
                    line.trim_end_matches('%')
                        .parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite())
                })?;
                session.handle_belief(belief)
            }
            Phase::StageInfo => {
                if let (Some(p), Some(h)) = (view.player_rolls.last(), view.house_rolls.last()) {
                    writeln!(
                        out,
                        "You rolled {p}, the house rolled {h}. Totals: {} vs {}",
                        view.player_sum, view.house_sum
                    )?;
                }
                session.acknowledge_info()
            }
            Phase::StageResult => {
                if let Some(result) = view.last_result {
                    writeln!(
                        out,
                        "\nTrial {}: {} (payout {}), wealth now {}",
                        result.trial_id,
                        result.outcome,
                        result.payout,
                        session.wealth()
                    )?;
                }
                wait_for_enter(&mut input, &mut out)?;
                session.end_trial()
            }
            Phase::BlockBreak => {
                writeln!(out, "\nTake a short break.")?;
                wait_for_enter(&mut input, &mut out)?;
                session.resume()
            }
            Phase::End(_) => break,
        };

        if !transition.is_advanced() {
            bail!("session rejected input in phase {}", view.phase);
        }
    }

    print_summary(session, &mut out)?;
    Ok(())
}

fn print_summary<W: Write>(session: &TrialSession, out: &mut W) -> Result<()> {
    let Some(stats) = session.final_stats() else {
        return Ok(());
    };
    writeln!(out)?;
    if session.phase() == Phase::End(EndReason::Bankrupt) {
        writeln!(out, "You ran out of money.")?;
    }
    writeln!(out, "Final wealth:       {}", stats.final_wealth)?;
    writeln!(out, "Mean accuracy:      {:.4}", stats.mean_accuracy)?;
    writeln!(out, "Performance reward: {}", format_money(stats.performance_reward))?;
    writeln!(out, "Total payment:      {}", format_money(stats.total_payment))?;
    Ok(())
}

fn read_line<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> Result<String> {
    write!(out, "{label}> ")?;
    out.flush()?;
    let mut line = String::new();
    let read = input.read_line(&mut line).context("reading input")?;
    if read == 0 {
        bail!("input closed before the session ended");
    }
    Ok(line.trim().to_string())
}

fn prompt<R: BufRead, W: Write, T>(
    input: &mut R,
    out: &mut W,
    label: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T> {
    loop {
        let line = read_line(input, out, label)?;
        if let Some(value) = parse(&line) {
            return Ok(value);
        }
        writeln!(out, "Could not read '{line}', try again.")?;
    }
}

fn wait_for_enter<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<()> {
    read_line(input, out, "press enter")?;
    Ok(())
}
