//! Review-mode quiz where every question is answered independently.
//!
//! Per question: select an option, check it, and either land on `Correct`
//! (terminal, can be flagged for later) or `Incorrect`. "Try again" reopens
//! selection with the wrong option recorded as rejected, so each retry
//! narrows the remaining candidates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::Question;
use crate::error::QuizError;

use super::shuffle::{arrange_options, shuffle_seed, ShuffleMapping, ShuffledOption};

/// Per-question state; option positions are original positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "option", rename_all = "snake_case")]
pub enum ReviewPhase {
  Unanswered,
  Selected(usize),
  Correct(usize),
  Incorrect(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewQuestionState {
  pub phase: ReviewPhase,
  /// Options already checked and found wrong
  pub rejected: BTreeSet<usize>,
  pub flagged: bool,
  /// Number of distinct checks performed
  pub attempts: u32,
}

impl Default for ReviewQuestionState {
  fn default() -> Self {
    Self {
      phase: ReviewPhase::Unanswered,
      rejected: BTreeSet::new(),
      flagged: false,
      attempts: 0,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
  pub question_id: String,
  /// Original position of the checked option
  pub selected: usize,
  pub correct: bool,
  /// True only on the check that first moved the question to `Correct`
  pub newly_correct: bool,
  pub rejected: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct ReviewQuiz {
  course_id: Option<String>,
  lesson_id: Option<String>,
  questions: Vec<Question>,
  mappings: Vec<ShuffleMapping>,
  states: Vec<ReviewQuestionState>,
}

impl ReviewQuiz {
  pub fn new(questions: Vec<Question>, course_id: Option<&str>, lesson_id: Option<&str>) -> Self {
    let mappings = questions
      .iter()
      .map(|q| ShuffleMapping::seeded(q.options.len(), &shuffle_seed(&q.id, course_id, lesson_id)))
      .collect();
    let states = vec![ReviewQuestionState::default(); questions.len()];

    Self {
      course_id: course_id.map(str::to_string),
      lesson_id: lesson_id.map(str::to_string),
      questions,
      mappings,
      states,
    }
  }

  pub fn course_id(&self) -> Option<&str> {
    self.course_id.as_deref()
  }

  pub fn lesson_id(&self) -> Option<&str> {
    self.lesson_id.as_deref()
  }

  pub fn questions(&self) -> &[Question] {
    &self.questions
  }

  fn check_index(&self, index: usize) -> Result<(), QuizError> {
    if index < self.questions.len() {
      Ok(())
    } else {
      Err(QuizError::QuestionOutOfRange {
        index,
        len: self.questions.len(),
      })
    }
  }

  pub fn state(&self, index: usize) -> Result<&ReviewQuestionState, QuizError> {
    self.check_index(index)?;
    Ok(&self.states[index])
  }

  /// At least one graded question, and every graded question answered correctly
  pub fn is_completed(&self) -> bool {
    let mut graded = self
      .questions
      .iter()
      .zip(&self.states)
      .filter(|(q, _)| q.is_graded())
      .peekable();
    graded.peek().is_some() && graded.all(|(_, s)| matches!(s.phase, ReviewPhase::Correct(_)))
  }

  /// Seeded order until the quiz is completed, original order afterwards
  pub fn mapping(&self, index: usize) -> Result<ShuffleMapping, QuizError> {
    self.check_index(index)?;
    if self.is_completed() {
      return Ok(ShuffleMapping::identity(self.questions[index].options.len()));
    }
    Ok(self.mappings[index].clone())
  }

  pub fn displayed_options(&self, index: usize) -> Result<Vec<ShuffledOption>, QuizError> {
    let mapping = self.mapping(index)?;
    Ok(arrange_options(&self.questions[index].options, &mapping))
  }

  /// Select the option shown at `displayed`; returns its original position.
  /// An `Incorrect` question needs [`ReviewQuiz::try_again`] first.
  pub fn select(&mut self, index: usize, displayed: usize) -> Result<usize, QuizError> {
    let mapping = self.mapping(index)?;
    let original = mapping.original_index(displayed).ok_or(QuizError::OptionOutOfRange {
      index: displayed,
      len: mapping.len(),
    })?;

    let state = &mut self.states[index];
    match state.phase {
      ReviewPhase::Correct(_) => return Err(QuizError::AlreadyCorrect),
      ReviewPhase::Incorrect(_) => {
        return Err(QuizError::InvalidTransition("try again before selecting another option"))
      }
      ReviewPhase::Unanswered | ReviewPhase::Selected(_) => {}
    }
    if state.rejected.contains(&original) {
      return Err(QuizError::OptionRejected(original));
    }
    state.phase = ReviewPhase::Selected(original);
    Ok(original)
  }

  /// Check the current selection against the resolved correct option.
  ///
  /// Re-checking an `Incorrect` question re-evaluates the same option without
  /// counting a new attempt; checking a `Correct` question reports it again
  /// with `newly_correct` false.
  pub fn check(&mut self, index: usize) -> Result<CheckOutcome, QuizError> {
    self.check_index(index)?;
    let question = &self.questions[index];
    let correct = question.correct_index().ok_or(QuizError::Ungraded)?;
    let state = &mut self.states[index];

    let (selected, fresh) = match state.phase {
      ReviewPhase::Unanswered => return Err(QuizError::NothingSelected),
      ReviewPhase::Selected(option) => (option, true),
      ReviewPhase::Incorrect(option) | ReviewPhase::Correct(option) => (option, false),
    };
    let was_correct = matches!(state.phase, ReviewPhase::Correct(_));

    if fresh {
      state.attempts += 1;
    }
    let is_correct = selected == correct;
    if is_correct {
      state.phase = ReviewPhase::Correct(selected);
    } else {
      state.phase = ReviewPhase::Incorrect(selected);
      state.rejected.insert(selected);
    }

    Ok(CheckOutcome {
      question_id: question.id.clone(),
      selected,
      correct: is_correct,
      newly_correct: is_correct && !was_correct,
      rejected: state.rejected.iter().copied().collect(),
    })
  }

  /// Leave `Incorrect` and reopen selection among the remaining options
  pub fn try_again(&mut self, index: usize) -> Result<(), QuizError> {
    self.check_index(index)?;
    let state = &mut self.states[index];
    match state.phase {
      ReviewPhase::Incorrect(_) => {
        state.phase = ReviewPhase::Unanswered;
        Ok(())
      }
      ReviewPhase::Correct(_) => Err(QuizError::AlreadyCorrect),
      _ => Err(QuizError::InvalidTransition("try again is only valid after an incorrect check")),
    }
  }

  /// Toggle the "review later" flag on a correctly answered question
  pub fn toggle_flag(&mut self, index: usize) -> Result<bool, QuizError> {
    self.check_index(index)?;
    let state = &mut self.states[index];
    if !matches!(state.phase, ReviewPhase::Correct(_)) {
      return Err(QuizError::InvalidTransition("only correct answers can be flagged"));
    }
    state.flagged = !state.flagged;
    Ok(state.flagged)
  }

  /// Original positions still selectable for a question
  pub fn remaining_options(&self, index: usize) -> Result<Vec<usize>, QuizError> {
    self.check_index(index)?;
    let rejected = &self.states[index].rejected;
    Ok(
      (0..self.questions[index].options.len())
        .filter(|i| !rejected.contains(i))
        .collect(),
    )
  }

  pub fn correct_count(&self) -> usize {
    self
      .states
      .iter()
      .filter(|s| matches!(s.phase, ReviewPhase::Correct(_)))
      .count()
  }

  pub fn flagged_questions(&self) -> Vec<String> {
    self
      .questions
      .iter()
      .zip(&self.states)
      .filter(|(_, s)| s.flagged)
      .map(|(q, _)| q.id.clone())
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::quiz::resolver::resolve_question;
  use serde_json::json;

  fn quiz() -> ReviewQuiz {
    let questions = vec![
      resolve_question(
        &serde_json::from_value(json!({
          "id": "q1",
          "options": ["Paris", "London", "Berlin", "Madrid"],
          "correct_index": 0,
        }))
        .unwrap(),
      ),
      resolve_question(
        &serde_json::from_value(json!({
          "id": "q2",
          "options": ["2", "3", "4"],
          "correct_answer": {"text": "4"},
        }))
        .unwrap(),
      ),
    ];
    ReviewQuiz::new(questions, Some("c1"), Some("l1"))
  }

  fn displayed_of(quiz: &ReviewQuiz, index: usize, original: usize) -> usize {
    quiz.mapping(index).unwrap().shuffled_index(original).unwrap()
  }

  #[test]
  fn test_select_then_check_correct() {
    let mut quiz = quiz();
    let d = displayed_of(&quiz, 0, 0);
    assert_eq!(quiz.select(0, d), Ok(0));
    assert_eq!(quiz.state(0).unwrap().phase, ReviewPhase::Selected(0));

    let outcome = quiz.check(0).unwrap();
    assert!(outcome.correct);
    assert!(outcome.newly_correct);
    assert_eq!(quiz.state(0).unwrap().phase, ReviewPhase::Correct(0));
    assert_eq!(quiz.state(0).unwrap().attempts, 1);
  }

  #[test]
  fn test_incorrect_records_rejection() {
    let mut quiz = quiz();
    let d = displayed_of(&quiz, 0, 2);
    quiz.select(0, d).unwrap();

    let outcome = quiz.check(0).unwrap();
    assert!(!outcome.correct);
    assert_eq!(outcome.rejected, vec![2]);
    assert_eq!(quiz.state(0).unwrap().phase, ReviewPhase::Incorrect(2));
  }

  #[test]
  fn test_recheck_same_incorrect_option_is_idempotent() {
    let mut quiz = quiz();
    let d = displayed_of(&quiz, 0, 1);
    quiz.select(0, d).unwrap();

    quiz.check(0).unwrap();
    let second = quiz.check(0).unwrap();

    assert_eq!(second.rejected, vec![1]);
    let state = quiz.state(0).unwrap();
    assert_eq!(state.rejected.len(), 1);
    assert_eq!(state.attempts, 1);
  }

  #[test]
  fn test_try_again_narrows_candidates() {
    let mut quiz = quiz();
    let d = displayed_of(&quiz, 0, 3);
    quiz.select(0, d).unwrap();
    quiz.check(0).unwrap();
    quiz.try_again(0).unwrap();

    assert_eq!(quiz.state(0).unwrap().phase, ReviewPhase::Unanswered);
    assert_eq!(quiz.remaining_options(0).unwrap(), vec![0, 1, 2]);
    assert_eq!(quiz.select(0, d), Err(QuizError::OptionRejected(3)));

    let d2 = displayed_of(&quiz, 0, 1);
    quiz.select(0, d2).unwrap();
    quiz.check(0).unwrap();
    quiz.try_again(0).unwrap();
    assert_eq!(quiz.remaining_options(0).unwrap(), vec![0, 2]);
    assert_eq!(quiz.state(0).unwrap().attempts, 2);
  }

  #[test]
  fn test_questions_transition_independently() {
    let mut quiz = quiz();
    let d = displayed_of(&quiz, 1, 2);
    quiz.select(1, d).unwrap();
    quiz.check(1).unwrap();

    assert_eq!(quiz.state(0).unwrap().phase, ReviewPhase::Unanswered);
    assert_eq!(quiz.state(1).unwrap().phase, ReviewPhase::Correct(2));
    assert_eq!(quiz.correct_count(), 1);
    assert!(!quiz.is_completed());
  }

  #[test]
  fn test_correct_is_terminal() {
    let mut quiz = quiz();
    let d = displayed_of(&quiz, 0, 0);
    quiz.select(0, d).unwrap();
    quiz.check(0).unwrap();

    assert_eq!(quiz.select(0, 0), Err(QuizError::AlreadyCorrect));
    assert_eq!(quiz.try_again(0), Err(QuizError::AlreadyCorrect));
    let again = quiz.check(0).unwrap();
    assert!(again.correct);
    assert!(!again.newly_correct);
  }

  #[test]
  fn test_flag_only_when_correct() {
    let mut quiz = quiz();
    assert!(matches!(quiz.toggle_flag(0), Err(QuizError::InvalidTransition(_))));

    let d = displayed_of(&quiz, 0, 0);
    quiz.select(0, d).unwrap();
    quiz.check(0).unwrap();
    assert_eq!(quiz.toggle_flag(0), Ok(true));
    assert_eq!(quiz.flagged_questions(), vec!["q1".to_string()]);
    assert_eq!(quiz.toggle_flag(0), Ok(false));
    assert!(quiz.flagged_questions().is_empty());
  }

  #[test]
  fn test_check_requires_selection() {
    let mut quiz = quiz();
    assert_eq!(quiz.check(0), Err(QuizError::NothingSelected));
    assert!(matches!(quiz.try_again(0), Err(QuizError::InvalidTransition(_))));
  }

  #[test]
  fn test_ungraded_question_cannot_be_checked() {
    let question = resolve_question(
      &serde_json::from_value(json!({"id": "u", "options": ["a", "b"]})).unwrap(),
    );
    let mut quiz = ReviewQuiz::new(vec![question], None, None);
    quiz.select(0, 0).unwrap();
    assert_eq!(quiz.check(0), Err(QuizError::Ungraded));
    assert!(!quiz.is_completed());
  }

  #[test]
  fn test_ungraded_only_quiz_stays_shuffled() {
    let question = resolve_question(
      &serde_json::from_value(json!({"id": "q1", "options": ["Paris", "London", "Berlin", "Madrid"]}))
        .unwrap(),
    );
    let quiz = ReviewQuiz::new(vec![question], Some("c1"), Some("l1"));
    assert!(!quiz.is_completed());

    let texts: Vec<_> = quiz
      .displayed_options(0)
      .unwrap()
      .into_iter()
      .map(|o| o.option.text)
      .collect();
    assert_eq!(texts, vec!["Berlin", "Madrid", "London", "Paris"]);
  }

  #[test]
  fn test_incorrect_requires_try_again_before_reselecting() {
    let mut quiz = quiz();
    let wrong = displayed_of(&quiz, 0, 2);
    quiz.select(0, wrong).unwrap();
    quiz.check(0).unwrap();

    let right = displayed_of(&quiz, 0, 0);
    assert!(matches!(quiz.select(0, right), Err(QuizError::InvalidTransition(_))));
    assert_eq!(quiz.state(0).unwrap().phase, ReviewPhase::Incorrect(2));

    quiz.try_again(0).unwrap();
    assert_eq!(quiz.select(0, right), Ok(0));
    assert!(quiz.check(0).unwrap().correct);
  }

  #[test]
  fn test_completion_switches_to_original_order() {
    let mut quiz = quiz();
    for (index, correct) in [(0, 0), (1, 2)] {
      let d = displayed_of(&quiz, index, correct);
      quiz.select(index, d).unwrap();
      quiz.check(index).unwrap();
    }
    assert!(quiz.is_completed());

    let texts: Vec<_> = quiz
      .displayed_options(0)
      .unwrap()
      .into_iter()
      .map(|o| o.option.text)
      .collect();
    assert_eq!(texts, vec!["Paris", "London", "Berlin", "Madrid"]);
  }

  #[test]
  fn test_out_of_range() {
    let mut quiz = quiz();
    assert!(matches!(quiz.select(9, 0), Err(QuizError::QuestionOutOfRange { .. })));
    assert!(matches!(quiz.select(0, 9), Err(QuizError::OptionOutOfRange { .. })));
    assert!(quiz.state(2).is_err());
  }
}
