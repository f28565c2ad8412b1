//! Scoring engine
//!
//! Pure functions from a survey's questions and an employee's answers to
//! per-aspect totals, percentages, bands, and quadrants. No storage access;
//! both the submission path and the reporting path go through this module.
//!
//! Each question carries two parallel option tables (present and future
//! aspect); every option holds a creativity and a morality mark. The max
//! score for any single dimension is `question_count * MARKS_PER_QUESTION`,
//! independent of how many options a question offers.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::constants::MARKS_PER_QUESTION;
use crate::models::survey::Question;
use crate::models::response::{Answer, AnswerSelection};

/// Coarse performance classification derived from a percentage score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "score_band"))]
pub enum Band {
    Early,
    Emerging,
    Leading,
}

impl Band {
    /// Band thresholds: below 40 is Early, below 50 is Emerging, 50 and
    /// above is Leading. The submission path and the reporting path use the
    /// same thresholds.
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage < 40.0 {
            Band::Early
        } else if percentage < 50.0 {
            Band::Emerging
        } else {
            Band::Leading
        }
    }
}

/// Joint classification of creativity% and morality% into one of four named
/// zones. Both axes are inclusive at 50.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum Quadrant {
    #[serde(rename = "Hope in Action (IGEN Zone)")]
    HopeInAction,
    #[serde(rename = "Unbounded Power")]
    UnboundedPower,
    #[serde(rename = "Safe Stagnation")]
    SafeStagnation,
    #[serde(rename = "Extraction Engine")]
    ExtractionEngine,
}

impl Quadrant {
    pub fn classify(creativity_percentage: f64, morality_percentage: f64) -> Self {
        match (creativity_percentage >= 50.0, morality_percentage >= 50.0) {
            (true, true) => Quadrant::HopeInAction,
            (true, false) => Quadrant::UnboundedPower,
            (false, true) => Quadrant::SafeStagnation,
            (false, false) => Quadrant::ExtractionEngine,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Quadrant::HopeInAction => "Hope in Action (IGEN Zone)",
            Quadrant::UnboundedPower => "Unbounded Power",
            Quadrant::SafeStagnation => "Safe Stagnation",
            Quadrant::ExtractionEngine => "Extraction Engine",
        }
    }
}

/// Totals, percentages and bands for one aspect (present or future).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct AspectScore {
    pub creativity_total: i32,
    pub morality_total: i32,
    pub creativity_percentage: f64,
    pub morality_percentage: f64,
    pub creativity_band: Band,
    pub morality_band: Band,
}

impl AspectScore {
    fn from_totals(creativity_total: i32, morality_total: i32, max_score: i32) -> Self {
        let creativity_percentage = percentage(creativity_total, max_score);
        let morality_percentage = percentage(morality_total, max_score);
        AspectScore {
            creativity_total,
            morality_total,
            creativity_percentage,
            morality_percentage,
            creativity_band: Band::from_percentage(creativity_percentage),
            morality_band: Band::from_percentage(morality_percentage),
        }
    }

    /// Quadrant for this aspect (reporting only; never stored).
    pub fn quadrant(&self) -> Quadrant {
        Quadrant::classify(self.creativity_percentage, self.morality_percentage)
    }
}

/// Full score of a response: both aspects plus the shared max score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct ScoreCard {
    pub present: AspectScore,
    pub future: AspectScore,
    pub max_score: i32,
}

impl ScoreCard {
    /// Submission path: resolve each selected option index against the
    /// survey's option tables and total the marks per aspect. An absent or
    /// out-of-range selection contributes zero. Returns the scored card
    /// together with the marked answers to persist.
    pub fn from_selections(questions: &[Question], selections: &[AnswerSelection]) -> (Self, Vec<Answer>) {
        let mut present_creativity = 0;
        let mut present_morality = 0;
        let mut future_creativity = 0;
        let mut future_morality = 0;

        let answers: Vec<Answer> = selections
            .iter()
            .map(|selection| {
                let question = questions.iter().find(|q| q.id == selection.question_id);
                let mut answer = Answer {
                    question_id: selection.question_id,
                    question_number: question
                        .map(|q| q.question_number.clone())
                        .unwrap_or_default(),
                    present_option_index: selection.present_option_index,
                    present_creativity_marks: 0,
                    present_morality_marks: 0,
                    future_option_index: selection.future_option_index,
                    future_creativity_marks: 0,
                    future_morality_marks: 0,
                };

                if let Some(question) = question {
                    if let Some(option) = selection
                        .present_option_index
                        .and_then(|i| question.present_options.get(i as usize))
                    {
                        answer.present_creativity_marks = option.creativity_marks;
                        answer.present_morality_marks = option.morality_marks;
                    }
                    if let Some(option) = selection
                        .future_option_index
                        .and_then(|i| question.future_options.get(i as usize))
                    {
                        answer.future_creativity_marks = option.creativity_marks;
                        answer.future_morality_marks = option.morality_marks;
                    }
                }

                present_creativity += answer.present_creativity_marks;
                present_morality += answer.present_morality_marks;
                future_creativity += answer.future_creativity_marks;
                future_morality += answer.future_morality_marks;
                answer
            })
            .collect();

        let max_score = max_score(questions.len());
        let card = ScoreCard {
            present: AspectScore::from_totals(present_creativity, present_morality, max_score),
            future: AspectScore::from_totals(future_creativity, future_morality, max_score),
            max_score,
        };
        (card, answers)
    }

    /// Reporting path: total the marks already stored on submitted answers.
    pub fn from_marked_answers(answers: &[Answer], question_count: usize) -> Self {
        let mut present_creativity = 0;
        let mut present_morality = 0;
        let mut future_creativity = 0;
        let mut future_morality = 0;

        for answer in answers {
            present_creativity += answer.present_creativity_marks;
            present_morality += answer.present_morality_marks;
            future_creativity += answer.future_creativity_marks;
            future_morality += answer.future_morality_marks;
        }

        let max_score = max_score(question_count);
        ScoreCard {
            present: AspectScore::from_totals(present_creativity, present_morality, max_score),
            future: AspectScore::from_totals(future_creativity, future_morality, max_score),
            max_score,
        }
    }
}

/// Max score for one dimension of one aspect.
pub fn max_score(question_count: usize) -> i32 {
    question_count as i32 * MARKS_PER_QUESTION
}

/// Percentage of `total` over `max_score`, rounded to one decimal.
/// Zero when `max_score` is zero.
pub fn percentage(total: i32, max_score: i32) -> f64 {
    if max_score <= 0 {
        return 0.0;
    }
    let raw = f64::from(total) / f64::from(max_score) * 100.0;
    (raw * 10.0).round() / 10.0
}

/// Completion rate as a whole percentage, rounded to nearest integer.
/// Zero when nothing is assigned.
pub fn completion_rate(completed: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_rounds_to_one_decimal() {
        // 7 / 30 = 23.333...%
        assert_eq!(percentage(7, 30), 23.3);
        // 8 / 30 = 26.666...%
        assert_eq!(percentage(8, 30), 26.7);
        assert_eq!(percentage(0, 30), 0.0);
        assert_eq!(percentage(30, 30), 100.0);
    }

    #[test]
    fn percentage_is_zero_for_empty_survey() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(12, 0), 0.0);
    }

    #[test]
    fn completion_rate_rounds_to_nearest_integer() {
        assert_eq!(completion_rate(0, 0), 0);
        assert_eq!(completion_rate(1, 3), 33);
        assert_eq!(completion_rate(2, 3), 67);
        assert_eq!(completion_rate(5, 5), 100);
    }
}
