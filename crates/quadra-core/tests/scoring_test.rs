//! Scoring engine tests: band boundaries, quadrant table, mark resolution,
//! and the max-score law.

use quadra_core::models::response::{Answer, AnswerSelection};
use quadra_core::models::survey::{Question, QuestionOption};
use quadra_core::scoring::{max_score, Band, Quadrant, ScoreCard};
use uuid::Uuid;

fn option(text: &str, creativity: i32, morality: i32) -> QuestionOption {
    QuestionOption {
        text: text.to_string(),
        creativity_marks: creativity,
        morality_marks: morality,
    }
}

fn question(number: &str, options: Vec<QuestionOption>) -> Question {
    Question {
        id: Uuid::new_v4(),
        question_number: number.to_string(),
        text: format!("Question {}", number),
        present_options: options.clone(),
        future_options: options,
        required: true,
    }
}

#[test]
fn band_boundaries() {
    assert_eq!(Band::from_percentage(0.0), Band::Early);
    assert_eq!(Band::from_percentage(39.9), Band::Early);
    assert_eq!(Band::from_percentage(40.0), Band::Emerging);
    assert_eq!(Band::from_percentage(49.9), Band::Emerging);
    assert_eq!(Band::from_percentage(50.0), Band::Leading);
    assert_eq!(Band::from_percentage(100.0), Band::Leading);
}

#[test]
fn quadrant_table() {
    assert_eq!(Quadrant::classify(60.0, 60.0), Quadrant::HopeInAction);
    assert_eq!(Quadrant::classify(60.0, 40.0), Quadrant::UnboundedPower);
    assert_eq!(Quadrant::classify(40.0, 60.0), Quadrant::SafeStagnation);
    assert_eq!(Quadrant::classify(40.0, 40.0), Quadrant::ExtractionEngine);
    // Both axes are inclusive at 50.
    assert_eq!(Quadrant::classify(50.0, 50.0), Quadrant::HopeInAction);
    assert_eq!(Quadrant::classify(50.0, 49.9), Quadrant::UnboundedPower);
    assert_eq!(Quadrant::classify(49.9, 50.0), Quadrant::SafeStagnation);
}

#[test]
fn quadrant_display_names() {
    assert_eq!(
        Quadrant::HopeInAction.as_str(),
        "Hope in Action (IGEN Zone)"
    );
    assert_eq!(Quadrant::UnboundedPower.as_str(), "Unbounded Power");
    assert_eq!(Quadrant::SafeStagnation.as_str(), "Safe Stagnation");
    assert_eq!(Quadrant::ExtractionEngine.as_str(), "Extraction Engine");
}

#[test]
fn max_score_is_five_per_question() {
    assert_eq!(max_score(0), 0);
    assert_eq!(max_score(1), 5);
    assert_eq!(max_score(12), 60);
}

#[test]
fn selections_resolve_marks_from_the_chosen_options() {
    let questions = vec![
        question("1.01", vec![option("a", 5, 2), option("b", 1, 4)]),
        question("1.02", vec![option("a", 3, 3), option("b", 0, 5)]),
    ];
    let selections = vec![
        AnswerSelection {
            question_id: questions[0].id,
            present_option_index: Some(0),
            future_option_index: Some(1),
        },
        AnswerSelection {
            question_id: questions[1].id,
            present_option_index: Some(1),
            future_option_index: Some(0),
        },
    ];

    let (card, answers) = ScoreCard::from_selections(&questions, &selections);

    assert_eq!(card.max_score, 10);
    // Present: option a of q1 (5,2) + option b of q2 (0,5).
    assert_eq!(card.present.creativity_total, 5);
    assert_eq!(card.present.morality_total, 7);
    // Future: option b of q1 (1,4) + option a of q2 (3,3).
    assert_eq!(card.future.creativity_total, 4);
    assert_eq!(card.future.morality_total, 7);

    assert_eq!(card.present.creativity_percentage, 50.0);
    assert_eq!(card.present.morality_percentage, 70.0);
    assert_eq!(card.present.creativity_band, Band::Leading);
    assert_eq!(card.future.creativity_percentage, 40.0);
    assert_eq!(card.future.creativity_band, Band::Emerging);

    assert_eq!(answers.len(), 2);
    assert_eq!(answers[0].question_number, "1.01");
    assert_eq!(answers[0].present_creativity_marks, 5);
    assert_eq!(answers[1].future_morality_marks, 3);
}

#[test]
fn absent_or_out_of_range_selections_contribute_zero() {
    let questions = vec![question("1.01", vec![option("a", 5, 5)])];
    let selections = vec![
        // Unknown question id.
        AnswerSelection {
            question_id: Uuid::new_v4(),
            present_option_index: Some(0),
            future_option_index: Some(0),
        },
        // Out-of-range index and no future selection at all.
        AnswerSelection {
            question_id: questions[0].id,
            present_option_index: Some(7),
            future_option_index: None,
        },
    ];

    let (card, answers) = ScoreCard::from_selections(&questions, &selections);
    assert_eq!(card.present.creativity_total, 0);
    assert_eq!(card.present.morality_total, 0);
    assert_eq!(card.future.creativity_total, 0);
    assert_eq!(card.present.creativity_percentage, 0.0);
    assert_eq!(card.present.creativity_band, Band::Early);
    assert_eq!(answers[1].present_creativity_marks, 0);
}

#[test]
fn empty_survey_scores_zero_percent() {
    let (card, _) = ScoreCard::from_selections(&[], &[]);
    assert_eq!(card.max_score, 0);
    assert_eq!(card.present.creativity_percentage, 0.0);
    assert_eq!(card.future.morality_percentage, 0.0);
}

#[test]
fn percentages_stay_within_bounds() {
    for count in [1usize, 3, 10, 40] {
        let questions: Vec<Question> = (0..count)
            .map(|i| question(&format!("{}.01", i), vec![option("max", 5, 5)]))
            .collect();
        let selections: Vec<AnswerSelection> = questions
            .iter()
            .map(|q| AnswerSelection {
                question_id: q.id,
                present_option_index: Some(0),
                future_option_index: Some(0),
            })
            .collect();
        let (card, _) = ScoreCard::from_selections(&questions, &selections);
        for pct in [
            card.present.creativity_percentage,
            card.present.morality_percentage,
            card.future.creativity_percentage,
            card.future.morality_percentage,
        ] {
            assert!((0.0..=100.0).contains(&pct));
        }
        assert_eq!(card.present.creativity_percentage, 100.0);
    }
}

#[test]
fn reporting_path_totals_stored_marks() {
    let answers = vec![
        Answer {
            question_id: Uuid::new_v4(),
            question_number: "1.01".to_string(),
            present_option_index: Some(0),
            present_creativity_marks: 4,
            present_morality_marks: 2,
            future_option_index: Some(1),
            future_creativity_marks: 3,
            future_morality_marks: 5,
        },
        Answer {
            question_id: Uuid::new_v4(),
            question_number: "1.02".to_string(),
            present_option_index: Some(1),
            present_creativity_marks: 1,
            present_morality_marks: 3,
            future_option_index: Some(0),
            future_creativity_marks: 2,
            future_morality_marks: 0,
        },
    ];

    let card = ScoreCard::from_marked_answers(&answers, 2);
    assert_eq!(card.max_score, 10);
    assert_eq!(card.present.creativity_total, 5);
    assert_eq!(card.present.morality_total, 5);
    assert_eq!(card.future.creativity_total, 5);
    assert_eq!(card.future.morality_total, 5);
    assert_eq!(card.present.creativity_percentage, 50.0);
    assert_eq!(card.present.quadrant(), Quadrant::HopeInAction);
}

#[test]
fn one_decimal_rounding_matches_submission_contract() {
    // 7/15 = 46.666...% -> 46.7, Emerging.
    let questions = vec![
        question("1", vec![option("a", 4, 0)]),
        question("2", vec![option("a", 3, 0)]),
        question("3", vec![option("a", 0, 0)]),
    ];
    let selections: Vec<AnswerSelection> = questions
        .iter()
        .map(|q| AnswerSelection {
            question_id: q.id,
            present_option_index: Some(0),
            future_option_index: None,
        })
        .collect();
    let (card, _) = ScoreCard::from_selections(&questions, &selections);
    assert_eq!(card.present.creativity_total, 7);
    assert_eq!(card.present.creativity_percentage, 46.7);
    assert_eq!(card.present.creativity_band, Band::Emerging);
}
