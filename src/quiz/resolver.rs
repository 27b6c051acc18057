//! Answer-correctness resolution.
//!
//! Content arrives with the correct answer expressed in many shapes: an explicit
//! per-option flag, a zero- or one-based index, an option id, the answer text,
//! or an object wrapping any of those. Each shape becomes a
//! [`CorrectnessCandidate`]; candidates are tried in a fixed priority order and
//! the first one that lands on an in-range option wins.

use serde_json::{Map, Value};
use unicode_normalization::UnicodeNormalization;

use crate::domain::question::value_as_text;
use crate::domain::{Question, QuizOption, RawOption, RawQuestion};

/// One way of pointing at the correct option
#[derive(Debug, Clone, PartialEq)]
pub enum CorrectnessCandidate {
  /// Position of the first option flagged `correct: true`
  ExplicitFlag(usize),
  /// Zero-based index, or one-based if zero-based is out of range
  NumericIndex(i64),
  OptionId(String),
  Text(String),
  Structured(Map<String, Value>),
}

/// Object members consulted for structured candidates, in order
const STRUCTURED_MEMBERS: [&str; 6] = ["index", "id", "text", "label", "value", "answer"];

/// Collect candidates from a raw question in priority order.
///
/// Explicit option flags short-circuit everything: if any option carries a
/// `correct` flag the result holds at most that one candidate, and nothing when
/// every flag is `false`. A malformed flag on any option yields no candidates.
pub fn collect_candidates(raw: &RawQuestion) -> Vec<CorrectnessCandidate> {
  if raw.options.iter().any(RawOption::has_malformed_flag) {
    tracing::debug!("Question '{}' has a malformed correctness flag", raw.id());
    return Vec::new();
  }
  if raw.options.iter().any(|o| o.explicit_flag().is_some()) {
    return raw
      .options
      .iter()
      .position(|o| o.explicit_flag() == Some(true))
      .map(CorrectnessCandidate::ExplicitFlag)
      .into_iter()
      .collect();
  }

  let mut candidates = Vec::new();
  if let Some(value) = &raw.correct_option_id {
    push_candidates(value, true, &mut candidates);
  }
  for value in [
    &raw.correct_index,
    &raw.correct_answer,
    &raw.answer,
    &raw.correct,
    &raw.solution,
  ]
  .into_iter()
  .flatten()
  {
    push_candidates(value, false, &mut candidates);
  }
  candidates
}

fn push_candidates(value: &Value, is_id_field: bool, out: &mut Vec<CorrectnessCandidate>) {
  match value {
    Value::Number(_) => {
      if let Some(n) = integral_number(value) {
        out.push(CorrectnessCandidate::NumericIndex(n));
      }
    }
    Value::String(s) if is_id_field => out.push(CorrectnessCandidate::OptionId(s.clone())),
    Value::String(s) => out.push(CorrectnessCandidate::Text(s.clone())),
    Value::Array(items) => {
      for item in items {
        push_candidates(item, is_id_field, out);
      }
    }
    Value::Object(map) => out.push(CorrectnessCandidate::Structured(map.clone())),
    Value::Bool(_) | Value::Null => {}
  }
}

/// Integer value of a JSON number, accepting integral floats like `2.0`
fn integral_number(value: &Value) -> Option<i64> {
  if let Some(n) = value.as_i64() {
    return Some(n);
  }
  value
    .as_f64()
    .filter(|f| f.is_finite() && f.fract() == 0.0)
    .map(|f| f as i64)
}

/// Interpret a raw number as an option index: zero-based first, then one-based
pub fn numeric_index(raw: i64, len: usize) -> Option<usize> {
  let in_range = |n: i64| usize::try_from(n).ok().filter(|&i| i < len);
  in_range(raw).or_else(|| raw.checked_sub(1).and_then(in_range))
}

fn parse_numeric(text: &str) -> Option<i64> {
  let trimmed = text.trim();
  if let Ok(n) = trimmed.parse::<i64>() {
    return Some(n);
  }
  trimmed
    .parse::<f64>()
    .ok()
    .filter(|f| f.is_finite() && f.fract() == 0.0)
    .map(|f| f as i64)
}

/// Lowercase, NFKC-normalize and collapse whitespace
pub fn normalize_text(input: &str) -> String {
  input
    .nfkc()
    .collect::<String>()
    .to_lowercase()
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
}

/// Drop anything between `<` and `>` so markup in option text doesn't block matching
fn plain_text(input: &str) -> String {
  let mut out = String::with_capacity(input.len());
  let mut in_tag = false;
  for ch in input.chars() {
    match ch {
      '<' => in_tag = true,
      '>' if in_tag => {
        in_tag = false;
        out.push(' ');
      }
      _ if !in_tag => out.push(ch),
      _ => {}
    }
  }
  out
}

fn option_matches_text(option: &QuizOption, needle: &str) -> bool {
  let fields = [
    Some(option.id.clone()),
    option.label.clone(),
    option.value.clone(),
    Some(plain_text(&option.text)),
  ];
  fields
    .iter()
    .flatten()
    .any(|field| normalize_text(field) == needle)
}

fn match_text(options: &[QuizOption], text: &str) -> Option<usize> {
  if let Some(n) = parse_numeric(text) {
    if let Some(index) = numeric_index(n, options.len()) {
      return Some(index);
    }
  }

  let needle = normalize_text(text);
  if needle.is_empty() {
    return None;
  }
  options.iter().position(|o| option_matches_text(o, &needle))
}

/// Exact option id first, then index and text resolution
fn match_id(options: &[QuizOption], id: &str) -> Option<usize> {
  let needle = normalize_text(id);
  options
    .iter()
    .position(|o| normalize_text(&o.id) == needle)
    .or_else(|| match_text(options, id))
}

/// Resolve a single candidate against the options
pub fn resolve_candidate(candidate: &CorrectnessCandidate, options: &[QuizOption]) -> Option<usize> {
  match candidate {
    CorrectnessCandidate::ExplicitFlag(index) => Some(*index).filter(|&i| i < options.len()),
    CorrectnessCandidate::NumericIndex(n) => numeric_index(*n, options.len()),
    CorrectnessCandidate::OptionId(id) => match_id(options, id),
    CorrectnessCandidate::Text(text) => match_text(options, text),
    CorrectnessCandidate::Structured(map) => STRUCTURED_MEMBERS.iter().find_map(|member| {
      let value = map.get(*member)?;
      let mut nested = Vec::new();
      push_candidates(value, *member == "id", &mut nested);
      nested.iter().find_map(|c| resolve_candidate(c, options))
    }),
  }
}

fn build_options(raw: &RawQuestion) -> Vec<QuizOption> {
  raw
    .options
    .iter()
    .enumerate()
    .map(|(i, o)| QuizOption::from_raw(o, i))
    .collect()
}

/// Index of the correct option, or `None` when nothing resolves
pub fn resolve_correct_index(raw: &RawQuestion) -> Option<usize> {
  let options = build_options(raw);
  if options.is_empty() {
    return None;
  }
  collect_candidates(raw)
    .iter()
    .find_map(|c| resolve_candidate(c, &options))
}

/// Id of the correct option, or `None` when the question is ungraded
pub fn resolve_correct_option(raw: &RawQuestion) -> Option<String> {
  let index = resolve_correct_index(raw)?;
  build_options(raw).into_iter().nth(index).map(|o| o.id)
}

/// Build the resolved question with exactly the resolved option marked correct
pub fn resolve_question(raw: &RawQuestion) -> Question {
  let correct = resolve_correct_index(raw);
  let mut options = build_options(raw);
  for (i, option) in options.iter_mut().enumerate() {
    option.correct = Some(i) == correct;
  }
  if correct.is_none() && !options.is_empty() {
    tracing::debug!("Question '{}' has no resolvable correct option", raw.id());
  }

  Question {
    id: raw.id(),
    prompt: raw.prompt.clone().unwrap_or_default(),
    options,
    explanation: raw.explanation.clone(),
  }
}
