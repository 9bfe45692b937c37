//! Flat per-stage rows and their CSV serialisation.

use std::{fs::File, io::Write, path::Path};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, session::TrialRecord, types::NOT_APPLICABLE};

/// One exported row: a stage snapshot with its trial and session context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    pub participant_number: String,
    pub trial_id: u32,
    pub stage: u32,
    pub outcome: String,
    pub wealth_start: i64,
    pub wealth_end: i64,

    pub p_roll: Option<u32>,
    pub h_roll: Option<u32>,
    pub p_sum: i64,
    pub h_sum: i64,
    pub p_sum_after_roll: Option<i64>,
    pub h_sum_after_roll: Option<i64>,
    pub wealth_available: i64,
    pub current_bet: i64,
    pub remaining_stages: u32,

    pub win_prob: f64,
    pub loss_prob: f64,
    pub entropy: f64,

    pub action_taken: String,
    pub belief_reported: Option<f64>,
    pub bet_after_action: i64,

    pub brier_score: Option<f64>,
    pub accuracy_score: Option<f64>,

    pub performance_reward: Option<f64>,
    pub total_payment: Option<f64>,
    pub mean_accuracy: Option<f64>,

    pub questionnaire_total: Option<u32>,
    pub questionnaire_answers: Vec<u8>,
}

impl ExportRow {
    /// One row per snapshot of `record`, in stage order.
    pub fn flatten(record: &TrialRecord) -> Vec<ExportRow> {
        let stats = record.final_stats.as_ref();
        record
            .history
            .iter()
            .map(|snapshot| ExportRow {
                participant_number: record.participant_id.to_string(),
                trial_id: record.trial_id,
                stage: snapshot.stage,
                outcome: record.outcome.to_string(),
                wealth_start: record.wealth_start,
                wealth_end: record.wealth_end,
                p_roll: snapshot.roll.map(|roll| roll.player_die),
                h_roll: snapshot.roll.map(|roll| roll.house_die),
                p_sum: snapshot.player_sum,
                h_sum: snapshot.house_sum,
                p_sum_after_roll: snapshot.roll.map(|roll| roll.player_sum_after),
                h_sum_after_roll: snapshot.roll.map(|roll| roll.house_sum_after),
                wealth_available: snapshot.wealth_available,
                current_bet: snapshot.current_bet,
                remaining_stages: snapshot.remaining_stages(),
                win_prob: snapshot.ground_truth.probabilities.win,
                loss_prob: snapshot.ground_truth.probabilities.loss,
                entropy: snapshot.ground_truth.entropy,
                action_taken: snapshot
                    .decision
                    .action()
                    .map_or_else(|| NOT_APPLICABLE.to_string(), |a| a.to_string()),
                belief_reported: snapshot.decision.belief(),
                bet_after_action: snapshot.bet_after_action,
                brier_score: snapshot.score.map(|s| s.brier),
                accuracy_score: snapshot.score.map(|s| s.accuracy),
                performance_reward: stats.map(|s| s.performance_reward),
                total_payment: stats.map(|s| s.total_payment),
                mean_accuracy: stats.map(|s| s.mean_accuracy),
                questionnaire_total: record.questionnaire.as_ref().map(|q| q.total()),
                questionnaire_answers: record
                    .questionnaire
                    .as_ref()
                    .map(|q| q.answers().to_vec())
                    .unwrap_or_default(),
            })
            .collect()
    }

    /// Row values in header order, padded to `item_columns` answers.
    fn fields(&self, item_columns: usize) -> Vec<String> {
        let mut fields = vec![
            self.participant_number.clone(),
            self.trial_id.to_string(),
            self.stage.to_string(),
            self.outcome.clone(),
            self.wealth_start.to_string(),
            self.wealth_end.to_string(),
            opt(self.p_roll),
            opt(self.h_roll),
            self.p_sum.to_string(),
            self.h_sum.to_string(),
            opt(self.p_sum_after_roll),
            opt(self.h_sum_after_roll),
            self.wealth_available.to_string(),
            self.current_bet.to_string(),
            self.remaining_stages.to_string(),
            self.win_prob.to_string(),
            self.loss_prob.to_string(),
            self.entropy.to_string(),
            self.action_taken.clone(),
            self.belief_reported
                .map_or_else(|| NOT_APPLICABLE.to_string(), |b| b.to_string()),
            self.bet_after_action.to_string(),
            opt(self.brier_score),
            opt(self.accuracy_score),
            opt(self.performance_reward),
            opt(self.total_payment),
            opt(self.mean_accuracy),
            opt(self.questionnaire_total),
        ];
        fields.extend(
            (0..item_columns).map(|i| opt(self.questionnaire_answers.get(i).copied())),
        );
        fields
    }
}

/// Empty cell for a missing value; `Display` otherwise (shortest round-trip
/// form for floats).
fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

const FIXED_COLUMNS: [&str; 27] = [
    "participant_number",
    "trial_id",
    "stage",
    "outcome",
    "wealth_start",
    "wealth_end",
    "p_roll",
    "h_roll",
    "p_sum",
    "h_sum",
    "p_sum_after_roll",
    "h_sum_after_roll",
    "wealth_available",
    "current_bet",
    "remaining_stages",
    "win_prob",
    "loss_prob",
    "entropy",
    "action_taken",
    "belief_reported",
    "bet_after_action",
    "brier_score",
    "accuracy_score",
    "performance_reward",
    "total_payment",
    "mean_accuracy",
    "questionnaire_total",
];

/// Writer for flattened rows.
pub struct CsvExporter;

impl CsvExporter {
    /// Header for rows carrying up to `item_columns` questionnaire answers.
    pub fn header(item_columns: usize) -> Vec<String> {
        FIXED_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain((1..=item_columns).map(|i| format!("q{i}")))
            .collect()
    }

    /// Write a header and all rows. Cells containing separators or quotes are
    /// quoted by the CSV writer.
    pub fn write<W: Write>(rows: &[ExportRow], writer: W) -> Result<()> {
        let item_columns = rows
            .iter()
            .map(|row| row.questionnaire_answers.len())
            .max()
            .unwrap_or(0);

        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(Self::header(item_columns))?;
        for row in rows {
            csv.write_record(row.fields(item_columns))?;
        }
        csv.flush()?;
        Ok(())
    }

    pub fn write_to_path(rows: &[ExportRow], path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create export file {path:?}"),
            source,
        })?;
        Self::write(rows, file)
    }

    /// Render to an in-memory string.
    pub fn to_csv_string(rows: &[ExportRow]) -> Result<String> {
        let mut buffer = Vec::new();
        Self::write(rows, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| Error::Io {
            operation: "encode CSV as UTF-8".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        identifiers::ParticipantId,
        probability::GroundTruth,
        scoring::{BeliefScore, FinalStats},
        session::{QuestionnaireAnswers, StageRoll, StageSnapshot},
        types::{Action, Decision, Outcome},
    };

    fn record() -> TrialRecord {
        let mut questionnaire = QuestionnaireAnswers::new();
        questionnaire.record(1);
        questionnaire.record(2);
        TrialRecord {
            participant_id: ParticipantId::new("P-1,\"x\""),
            trial_id: 1,
            outcome: Outcome::Win,
            payout: 30,
            wealth_start: 500,
            wealth_end: 515,
            history: vec![
                StageSnapshot {
                    stage: 1,
                    player_sum: 0,
                    house_sum: 0,
                    wealth_available: 485,
                    current_bet: 15,
                    ground_truth: GroundTruth::evaluate(0, 0, 1, 6),
                    decision: Decision::Taken {
                        action: Action::Hold,
                        belief: 0.8,
                    },
                    bet_after_action: 15,
                    roll: Some(StageRoll {
                        player_die: 4,
                        house_die: 2,
                        player_sum_after: 4,
                        house_sum_after: 2,
                    }),
                    score: Some(BeliefScore::score(0.8, Outcome::Win)),
                },
                StageSnapshot {
                    stage: 1,
                    player_sum: 4,
                    house_sum: 2,
                    wealth_available: 515,
                    current_bet: 15,
                    ground_truth: GroundTruth::evaluate(4, 2, 0, 6),
                    decision: Decision::NotApplicable,
                    bet_after_action: 15,
                    roll: None,
                    score: None,
                },
            ],
            questionnaire: Some(questionnaire),
            final_stats: Some(FinalStats::compute(&[0.96], 515, 3.0)),
        }
    }

    #[test]
    fn flatten_produces_a_row_per_snapshot() {
        let rows = ExportRow::flatten(&record());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].action_taken, "hold");
        assert_eq!(rows[1].action_taken, NOT_APPLICABLE);
        assert_eq!(rows[1].belief_reported, None);
        assert_eq!(rows[1].p_roll, None);
        assert_eq!(rows[0].questionnaire_total, Some(3));
        assert!(rows.iter().all(|r| r.total_payment == rows[0].total_payment));
    }

    #[test]
    fn csv_quotes_separators_and_keeps_floats_exact() {
        let rows = ExportRow::flatten(&record());
        let text = CsvExporter::to_csv_string(&rows).unwrap();
        let mut lines = text.lines();

        let header = lines.next().unwrap();
        assert!(header.starts_with("participant_number,trial_id,stage"));
        assert!(header.ends_with("questionnaire_total,q1,q2"));

        let first = lines.next().unwrap();
        assert!(first.starts_with("\"P-1,\"\"x\"\"\",1,1,WIN"));

        let terminal = lines.next().unwrap();
        assert!(terminal.contains(",N/A,N/A,"));

        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let parsed = reader.records().next().unwrap().unwrap();
        assert_eq!(&parsed[0], "P-1,\"x\"");
        let win: f64 = parsed[15].parse().unwrap();
        let entropy: f64 = parsed[17].parse().unwrap();
        assert_eq!(win, rows[0].win_prob);
        assert_eq!(entropy, rows[0].entropy);
    }

    #[test]
    fn header_without_questionnaire_has_no_item_columns() {
        let header = CsvExporter::header(0);
        assert_eq!(header.len(), FIXED_COLUMNS.len());
        assert_eq!(header.last().map(String::as_str), Some("questionnaire_total"));
    }
}
