pub mod attempt;
pub mod resolver;
pub mod review_quiz;
pub mod shuffle;

pub use attempt::{AttemptStatus, QuestionOutcome, QuestionPhase, QuizAttempt, QuizOutcome, Verdict};
pub use resolver::{
  collect_candidates, resolve_correct_index, resolve_correct_option, resolve_question,
  CorrectnessCandidate,
};
pub use review_quiz::{CheckOutcome, ReviewPhase, ReviewQuestionState, ReviewQuiz};
pub use shuffle::{shuffle_options, shuffle_seed, ShuffleMapping, ShuffledOption, ShuffledOptions};
