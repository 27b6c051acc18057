//! Question and option records.
//!
//! `RawQuestion` / `RawOption` mirror whatever the content source sends: options
//! may be bare strings or objects, ids may be numbers, and the correct answer
//! can hide in any of several differently-named fields. `Question` / `QuizOption`
//! are the resolved, read-only forms used by the quiz state machines.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys carrying an option's explicit correctness flag
const FLAG_KEYS: [&str; 3] = ["correct", "is_correct", "isCorrect"];

/// Option as delivered by the content source.
///
/// Deserialization never fails: bare strings, numbers and booleans become
/// [`RawOption::Text`], objects become [`RawOption::Detailed`] and anything else
/// an empty option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged, from = "Value")]
pub enum RawOption {
  /// Bare option text, e.g. `"Paris"` or `3`
  Text(String),
  Detailed(RawOptionFields),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawOptionFields {
  pub id: Option<Value>,
  pub text: Option<String>,
  pub label: Option<String>,
  pub value: Option<Value>,
  /// Explicit correctness flag; when present on any option it overrides every other field
  pub correct: Option<bool>,
  /// A flag key held a non-boolean, or two flag keys disagreed
  #[serde(skip)]
  pub flag_malformed: bool,
  pub explanation: Option<String>,
}

/// Remove every key in `keys` and return the first non-null value, in key order
fn take_first(map: &mut Map<String, Value>, keys: &[&str]) -> Option<Value> {
  let mut found = None;
  for key in keys {
    if let Some(value) = map.remove(*key) {
      if found.is_none() && !value.is_null() {
        found = Some(value);
      }
    }
  }
  found
}

fn take_text(map: &mut Map<String, Value>, keys: &[&str]) -> Option<String> {
  take_first(map, keys).as_ref().and_then(value_as_text)
}

/// Read the flag keys: `(flag, malformed)`. Agreeing duplicates are one flag.
fn take_flag(map: &mut Map<String, Value>) -> (Option<bool>, bool) {
  let mut flag = None;
  let mut malformed = false;
  for key in FLAG_KEYS {
    match map.remove(key) {
      None | Some(Value::Null) => {}
      Some(Value::Bool(b)) if flag.is_none_or(|f| f == b) => flag = Some(b),
      Some(_) => malformed = true,
    }
  }
  if malformed { (None, true) } else { (flag, false) }
}

impl From<Map<String, Value>> for RawOptionFields {
  fn from(mut map: Map<String, Value>) -> Self {
    let (correct, flag_malformed) = take_flag(&mut map);
    Self {
      id: take_first(&mut map, &["id"]),
      text: take_text(&mut map, &["text", "content", "option", "option_text", "optionText"]),
      label: take_text(&mut map, &["label"]),
      value: take_first(&mut map, &["value"]),
      correct,
      flag_malformed,
      explanation: take_text(&mut map, &["explanation"]),
    }
  }
}

impl From<Value> for RawOption {
  fn from(value: Value) -> Self {
    match value {
      Value::Object(map) => Self::Detailed(map.into()),
      other => match value_as_text(&other) {
        Some(text) => Self::Text(text),
        None => Self::Detailed(RawOptionFields::default()),
      },
    }
  }
}

impl RawOption {
  pub fn fields(&self) -> RawOptionFields {
    match self {
      Self::Text(text) => RawOptionFields {
        text: Some(text.clone()),
        ..Default::default()
      },
      Self::Detailed(fields) => fields.clone(),
    }
  }

  pub fn explicit_flag(&self) -> Option<bool> {
    match self {
      Self::Text(_) => None,
      Self::Detailed(fields) => fields.correct,
    }
  }

  pub fn has_malformed_flag(&self) -> bool {
    matches!(self, Self::Detailed(fields) if fields.flag_malformed)
  }
}

/// Question as delivered by the content source.
///
/// Each field accepts several key spellings; when more than one is present the
/// first in the listed order wins. Deserialization never fails, so one odd
/// question cannot reject the batch it arrives in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct RawQuestion {
  pub id: Option<Value>,
  pub prompt: Option<String>,
  pub options: Vec<RawOption>,
  pub explanation: Option<String>,

  // Correctness candidates, tried in declaration order
  pub correct_option_id: Option<Value>,
  pub correct_index: Option<Value>,
  pub correct_answer: Option<Value>,
  pub answer: Option<Value>,
  pub correct: Option<Value>,
  pub solution: Option<Value>,
}

impl From<Value> for RawQuestion {
  fn from(value: Value) -> Self {
    let Value::Object(mut map) = value else {
      return Self::default();
    };
    let options = match take_first(&mut map, &["options", "choices", "answers"]) {
      Some(Value::Array(items)) => items.into_iter().map(RawOption::from).collect(),
      _ => Vec::new(),
    };

    Self {
      id: take_first(&mut map, &["id", "question_id", "questionId"]),
      prompt: take_text(&mut map, &["prompt", "question", "text", "content"]),
      options,
      explanation: take_text(&mut map, &["explanation"]),
      correct_option_id: take_first(
        &mut map,
        &["correct_option_id", "correctOptionId", "correct_option"],
      ),
      correct_index: take_first(
        &mut map,
        &["correct_index", "correctIndex", "answer_index", "answerIndex"],
      ),
      correct_answer: take_first(&mut map, &["correct_answer", "correctAnswer"]),
      answer: take_first(&mut map, &["answer"]),
      correct: take_first(&mut map, &["correct"]),
      solution: take_first(&mut map, &["solution"]),
    }
  }
}

impl RawQuestion {
  /// Stable question id; empty when the source omitted it
  pub fn id(&self) -> String {
    self.id.as_ref().and_then(value_as_text).unwrap_or_default()
  }
}

/// Render a scalar JSON value as text (strings verbatim, numbers formatted)
pub fn value_as_text(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}

/// Resolved option. `correct` is true on at most one option of a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizOption {
  pub id: String,
  pub text: String,
  pub label: Option<String>,
  pub value: Option<String>,
  pub correct: bool,
  pub explanation: Option<String>,
}

impl QuizOption {
  /// Build from raw fields. Options without an id get `opt-<position>`.
  pub fn from_raw(raw: &RawOption, position: usize) -> Self {
    let fields = raw.fields();
    let id = fields
      .id
      .as_ref()
      .and_then(value_as_text)
      .unwrap_or_else(|| format!("opt-{}", position));
    let value = fields.value.as_ref().and_then(value_as_text);
    let text = fields
      .text
      .clone()
      .or_else(|| fields.label.clone())
      .or_else(|| value.clone())
      .unwrap_or_default();

    Self {
      id,
      text,
      label: fields.label,
      value,
      correct: false,
      explanation: fields.explanation,
    }
  }
}

/// Resolved, read-only question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
  pub id: String,
  pub prompt: String,
  pub options: Vec<QuizOption>,
  pub explanation: Option<String>,
}

impl Question {
  /// Index of the option marked correct, if the question is graded
  pub fn correct_index(&self) -> Option<usize> {
    self.options.iter().position(|o| o.correct)
  }

  pub fn correct_option(&self) -> Option<&QuizOption> {
    self.options.iter().find(|o| o.correct)
  }

  pub fn is_graded(&self) -> bool {
    self.correct_index().is_some()
  }
}
