//! All-or-nothing quiz attempt.
//!
//! While in progress, each question shows its options in seeded shuffled order
//! and selections are made by displayed position. Selections are stored as
//! original positions so they survive the switch back to original order. A
//! single `submit` reveals every question at once; the shuffle mappings are
//! dropped at that point and the attempt renders in original order from then on.

use serde::{Deserialize, Serialize};

use crate::domain::Question;
use crate::error::QuizError;

use super::shuffle::{arrange_options, shuffle_seed, ShuffleMapping, ShuffledOption};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
  InProgress,
  Submitted,
}

/// Result for one question after submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
  Correct,
  Incorrect,
  Unanswered,
  /// No correct option could be resolved
  Ungraded,
}

/// Where a question stands in the attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "verdict", rename_all = "snake_case")]
pub enum QuestionPhase {
  Unanswered,
  Selected,
  Revealed(Verdict),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOutcome {
  pub question_id: String,
  /// Original position of the stored selection
  pub selected: Option<usize>,
  /// Original position of the resolved correct option
  pub correct: Option<usize>,
  pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizOutcome {
  pub questions: Vec<QuestionOutcome>,
  pub score: usize,
  /// Number of questions that could be graded
  pub graded: usize,
}

#[derive(Debug, Clone)]
pub struct QuizAttempt {
  course_id: Option<String>,
  lesson_id: Option<String>,
  questions: Vec<Question>,
  /// One per question; emptied on submit
  mappings: Vec<ShuffleMapping>,
  selections: Vec<Option<usize>>,
  status: AttemptStatus,
}

impl QuizAttempt {
  pub fn new(questions: Vec<Question>, course_id: Option<&str>, lesson_id: Option<&str>) -> Self {
    let mappings = questions
      .iter()
      .map(|q| ShuffleMapping::seeded(q.options.len(), &shuffle_seed(&q.id, course_id, lesson_id)))
      .collect();
    let selections = vec![None; questions.len()];

    Self {
      course_id: course_id.map(str::to_string),
      lesson_id: lesson_id.map(str::to_string),
      questions,
      mappings,
      selections,
      status: AttemptStatus::InProgress,
    }
  }

  pub fn course_id(&self) -> Option<&str> {
    self.course_id.as_deref()
  }

  pub fn lesson_id(&self) -> Option<&str> {
    self.lesson_id.as_deref()
  }

  pub fn status(&self) -> AttemptStatus {
    self.status
  }

  pub fn is_submitted(&self) -> bool {
    self.status == AttemptStatus::Submitted
  }

  pub fn questions(&self) -> &[Question] {
    &self.questions
  }

  fn question(&self, index: usize) -> Result<&Question, QuizError> {
    self.questions.get(index).ok_or(QuizError::QuestionOutOfRange {
      index,
      len: self.questions.len(),
    })
  }

  /// Mapping in effect for a question: seeded while in progress, identity after submit
  pub fn mapping(&self, index: usize) -> Result<ShuffleMapping, QuizError> {
    let question = self.question(index)?;
    Ok(
      self
        .mappings
        .get(index)
        .cloned()
        .unwrap_or_else(|| ShuffleMapping::identity(question.options.len())),
    )
  }

  pub fn displayed_options(&self, index: usize) -> Result<Vec<ShuffledOption>, QuizError> {
    let mapping = self.mapping(index)?;
    Ok(arrange_options(&self.question(index)?.options, &mapping))
  }

  /// Select the option shown at `displayed`; returns its original position
  pub fn select(&mut self, index: usize, displayed: usize) -> Result<usize, QuizError> {
    if self.is_submitted() {
      return Err(QuizError::AlreadySubmitted);
    }
    let mapping = self.mapping(index)?;
    let original = mapping.original_index(displayed).ok_or(QuizError::OptionOutOfRange {
      index: displayed,
      len: mapping.len(),
    })?;
    self.selections[index] = Some(original);
    Ok(original)
  }

  pub fn clear_selection(&mut self, index: usize) -> Result<(), QuizError> {
    if self.is_submitted() {
      return Err(QuizError::AlreadySubmitted);
    }
    self.question(index)?;
    self.selections[index] = None;
    Ok(())
  }

  /// Stored selection as an original position
  pub fn selection(&self, index: usize) -> Option<usize> {
    self.selections.get(index).copied().flatten()
  }

  /// Stored selection as a position in the current display order
  pub fn displayed_selection(&self, index: usize) -> Option<usize> {
    let original = self.selection(index)?;
    self.mapping(index).ok()?.shuffled_index(original)
  }

  pub fn answered_count(&self) -> usize {
    self.selections.iter().filter(|s| s.is_some()).count()
  }

  pub fn is_complete(&self) -> bool {
    self.answered_count() == self.questions.len()
  }

  fn verdict(&self, index: usize) -> Verdict {
    let correct = self.questions[index].correct_index();
    match (self.selections[index], correct) {
      (_, None) => Verdict::Ungraded,
      (None, Some(_)) => Verdict::Unanswered,
      (Some(selected), Some(correct)) if selected == correct => Verdict::Correct,
      (Some(_), Some(_)) => Verdict::Incorrect,
    }
  }

  pub fn phase(&self, index: usize) -> Result<QuestionPhase, QuizError> {
    self.question(index)?;
    Ok(match (self.status, self.selections[index]) {
      (AttemptStatus::Submitted, _) => QuestionPhase::Revealed(self.verdict(index)),
      (AttemptStatus::InProgress, None) => QuestionPhase::Unanswered,
      (AttemptStatus::InProgress, Some(_)) => QuestionPhase::Selected,
    })
  }

  /// Submit the whole attempt and reveal every question
  pub fn submit(&mut self) -> Result<QuizOutcome, QuizError> {
    if self.is_submitted() {
      return Err(QuizError::AlreadySubmitted);
    }
    self.status = AttemptStatus::Submitted;
    self.mappings.clear();
    tracing::debug!(
      "Quiz submitted: {}/{} questions answered",
      self.answered_count(),
      self.questions.len()
    );
    self.outcome().ok_or(QuizError::InvalidTransition("outcome unavailable"))
  }

  /// Graded outcome; `None` until submitted
  pub fn outcome(&self) -> Option<QuizOutcome> {
    if !self.is_submitted() {
      return None;
    }
    let questions: Vec<QuestionOutcome> = (0..self.questions.len())
      .map(|i| QuestionOutcome {
        question_id: self.questions[i].id.clone(),
        selected: self.selections[i],
        correct: self.questions[i].correct_index(),
        verdict: self.verdict(i),
      })
      .collect();
    let score = questions.iter().filter(|q| q.verdict == Verdict::Correct).count();
    let graded = questions.iter().filter(|q| q.verdict != Verdict::Ungraded).count();

    Some(QuizOutcome {
      questions,
      score,
      graded,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::quiz::resolver::resolve_question;
  use serde_json::json;

  fn capitals_question(id: &str, correct_index: i64) -> Question {
    resolve_question(
      &serde_json::from_value(json!({
        "id": id,
        "question": "Capital?",
        "options": ["Paris", "London", "Berlin", "Madrid"],
        "correct_index": correct_index,
      }))
      .unwrap(),
    )
  }

  fn ungraded_question(id: &str) -> Question {
    resolve_question(&serde_json::from_value(json!({"id": id, "options": ["x", "y"]})).unwrap())
  }

  #[test]
  fn test_new_attempt_is_unanswered() {
    let attempt = QuizAttempt::new(vec![capitals_question("q1", 0)], Some("c1"), Some("l1"));
    assert_eq!(attempt.status(), AttemptStatus::InProgress);
    assert_eq!(attempt.phase(0), Ok(QuestionPhase::Unanswered));
    assert_eq!(attempt.answered_count(), 0);
    assert!(!attempt.is_complete());
    assert!(attempt.outcome().is_none());
  }

  #[test]
  fn test_displayed_options_are_shuffled_while_in_progress() {
    let attempt = QuizAttempt::new(vec![capitals_question("q1", 0)], Some("c1"), Some("l1"));
    let texts: Vec<_> = attempt
      .displayed_options(0)
      .unwrap()
      .into_iter()
      .map(|o| o.option.text)
      .collect();
    assert_eq!(texts, vec!["Berlin", "Madrid", "London", "Paris"]);
  }

  #[test]
  fn test_select_translates_to_original_position() {
    let mut attempt = QuizAttempt::new(vec![capitals_question("q1", 0)], Some("c1"), Some("l1"));
    // Paris is displayed last (D)
    assert_eq!(attempt.select(0, 3), Ok(0));
    assert_eq!(attempt.selection(0), Some(0));
    assert_eq!(attempt.displayed_selection(0), Some(3));
    assert_eq!(attempt.phase(0), Ok(QuestionPhase::Selected));
  }

  #[test]
  fn test_end_to_end_correct_after_translation() {
    let mut attempt = QuizAttempt::new(vec![capitals_question("q1", 0)], Some("c1"), Some("l1"));
    let paris_displayed = attempt
      .displayed_options(0)
      .unwrap()
      .iter()
      .position(|o| o.option.text == "Paris")
      .unwrap();
    attempt.select(0, paris_displayed).unwrap();

    let outcome = attempt.submit().unwrap();
    assert_eq!(outcome.score, 1);
    assert_eq!(outcome.questions[0].verdict, Verdict::Correct);
    assert_eq!(outcome.questions[0].selected, Some(0));
    assert_eq!(outcome.questions[0].correct, Some(0));
  }

  #[test]
  fn test_submit_reveals_in_original_order() {
    let mut attempt = QuizAttempt::new(vec![capitals_question("q1", 0)], Some("c1"), Some("l1"));
    attempt.select(0, 0).unwrap(); // Berlin
    attempt.submit().unwrap();

    let displayed = attempt.displayed_options(0).unwrap();
    let texts: Vec<_> = displayed.iter().map(|o| o.option.text.as_str()).collect();
    assert_eq!(texts, vec!["Paris", "London", "Berlin", "Madrid"]);
    assert_eq!(displayed[2].letter, "C");
    assert_eq!(attempt.displayed_selection(0), Some(2));
    assert_eq!(attempt.phase(0), Ok(QuestionPhase::Revealed(Verdict::Incorrect)));
  }

  #[test]
  fn test_submit_is_all_or_nothing() {
    let mut attempt = QuizAttempt::new(
      vec![
        capitals_question("q1", 0),
        capitals_question("q2", 1),
        ungraded_question("q3"),
      ],
      Some("c1"),
      None,
    );
    let correct_q2 = attempt.mapping(1).unwrap().shuffled_index(1).unwrap();
    attempt.select(1, correct_q2).unwrap();

    let outcome = attempt.submit().unwrap();
    assert_eq!(outcome.questions[0].verdict, Verdict::Unanswered);
    assert_eq!(outcome.questions[1].verdict, Verdict::Correct);
    assert_eq!(outcome.questions[2].verdict, Verdict::Ungraded);
    assert_eq!(outcome.score, 1);
    assert_eq!(outcome.graded, 2);
    for i in 0..3 {
      assert!(matches!(attempt.phase(i), Ok(QuestionPhase::Revealed(_))));
    }
  }

  #[test]
  fn test_no_changes_after_submit() {
    let mut attempt = QuizAttempt::new(vec![capitals_question("q1", 0)], None, None);
    attempt.submit().unwrap();

    assert_eq!(attempt.select(0, 1), Err(QuizError::AlreadySubmitted));
    assert_eq!(attempt.clear_selection(0), Err(QuizError::AlreadySubmitted));
    assert_eq!(attempt.submit(), Err(QuizError::AlreadySubmitted));
  }

  #[test]
  fn test_selection_can_change_before_submit() {
    let mut attempt = QuizAttempt::new(vec![capitals_question("q1", 0)], None, None);
    attempt.select(0, 0).unwrap();
    attempt.select(0, 1).unwrap();
    assert_eq!(attempt.answered_count(), 1);

    attempt.clear_selection(0).unwrap();
    assert_eq!(attempt.selection(0), None);
  }

  #[test]
  fn test_out_of_range_errors() {
    let mut attempt = QuizAttempt::new(vec![capitals_question("q1", 0)], None, None);
    assert_eq!(
      attempt.select(1, 0),
      Err(QuizError::QuestionOutOfRange { index: 1, len: 1 })
    );
    assert_eq!(
      attempt.select(0, 4),
      Err(QuizError::OptionOutOfRange { index: 4, len: 4 })
    );
    assert!(attempt.displayed_options(5).is_err());
  }

  #[test]
  fn test_is_complete() {
    let mut attempt = QuizAttempt::new(
      vec![capitals_question("q1", 0), capitals_question("q2", 2)],
      None,
      None,
    );
    attempt.select(0, 0).unwrap();
    assert!(!attempt.is_complete());
    attempt.select(1, 0).unwrap();
    assert!(attempt.is_complete());
  }
}
