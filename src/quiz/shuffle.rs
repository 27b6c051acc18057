//! Deterministic option shuffling.
//!
//! The display order of a question's options is derived from
//! `question_id + course_id + lesson_id`: the seed string is hashed with a
//! 31-multiplier rolling hash over UTF-16 code units, the hash seeds a
//! mulberry32 generator, and a Fisher-Yates pass produces the permutation.
//! Every step is wrapping 32-bit arithmetic, so the same seed string gives the
//! same order on every call and in every process.

use serde::{Deserialize, Serialize};

use crate::domain::QuizOption;

/// Build the seed string for a question within a course lesson
pub fn shuffle_seed(question_id: &str, course_id: Option<&str>, lesson_id: Option<&str>) -> String {
  format!(
    "{}{}{}",
    question_id,
    course_id.unwrap_or(""),
    lesson_id.unwrap_or("")
  )
}

/// `hash = hash * 31 + code_unit`, truncated to 32 bits
pub fn seed_hash(seed: &str) -> u32 {
  seed
    .encode_utf16()
    .fold(0u32, |hash, unit| hash.wrapping_mul(31).wrapping_add(u32::from(unit)))
}

/// mulberry32 pseudo-random generator
#[derive(Debug, Clone)]
pub struct Mulberry32 {
  state: u32,
}

impl Mulberry32 {
  pub fn new(seed: u32) -> Self {
    Self { state: seed }
  }

  pub fn next_u32(&mut self) -> u32 {
    self.state = self.state.wrapping_add(0x6D2B_79F5);
    let mut t = self.state;
    t = (t ^ (t >> 15)).wrapping_mul(t | 1);
    t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
    t ^ (t >> 14)
  }

  /// Float in [0, 1)
  pub fn next_f64(&mut self) -> f64 {
    f64::from(self.next_u32()) / 4_294_967_296.0
  }
}

/// Bijection between original option positions and displayed positions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShuffleMapping {
  /// `to_original[displayed] = original`
  pub to_original: Vec<usize>,
  /// `to_shuffled[original] = displayed`
  pub to_shuffled: Vec<usize>,
}

impl ShuffleMapping {
  pub fn identity(len: usize) -> Self {
    Self {
      to_original: (0..len).collect(),
      to_shuffled: (0..len).collect(),
    }
  }

  /// Build from `permutation[displayed] = original`
  fn from_permutation(permutation: Vec<usize>) -> Self {
    let mut to_shuffled = vec![0; permutation.len()];
    for (displayed, &original) in permutation.iter().enumerate() {
      to_shuffled[original] = displayed;
    }
    Self {
      to_original: permutation,
      to_shuffled,
    }
  }

  /// Seeded Fisher-Yates permutation of `len` positions
  pub fn seeded(len: usize, seed: &str) -> Self {
    let mut rng = Mulberry32::new(seed_hash(seed));
    let mut permutation: Vec<usize> = (0..len).collect();
    for i in (1..len).rev() {
      let j = (rng.next_f64() * (i + 1) as f64).floor() as usize;
      permutation.swap(i, j);
    }
    Self::from_permutation(permutation)
  }

  pub fn len(&self) -> usize {
    self.to_original.len()
  }

  pub fn is_empty(&self) -> bool {
    self.to_original.is_empty()
  }

  pub fn original_index(&self, displayed: usize) -> Option<usize> {
    self.to_original.get(displayed).copied()
  }

  pub fn shuffled_index(&self, original: usize) -> Option<usize> {
    self.to_shuffled.get(original).copied()
  }
}

/// Display letter for a position: A..Z, then AA, AB, ...
pub fn option_letter(position: usize) -> String {
  let mut n = position + 1;
  let mut letters = Vec::new();
  while n > 0 {
    let rem = (n - 1) % 26;
    letters.push((b'A' + rem as u8) as char);
    n = (n - 1) / 26;
  }
  letters.iter().rev().collect()
}

/// An option in display position, relabeled by that position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShuffledOption {
  pub letter: String,
  pub original_index: usize,
  pub option: QuizOption,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShuffledOptions {
  pub options: Vec<ShuffledOption>,
  pub mapping: ShuffleMapping,
}

/// Lay options out according to a mapping
pub fn arrange_options(options: &[QuizOption], mapping: &ShuffleMapping) -> Vec<ShuffledOption> {
  mapping
    .to_original
    .iter()
    .enumerate()
    .filter_map(|(displayed, &original)| {
      options.get(original).map(|option| ShuffledOption {
        letter: option_letter(displayed),
        original_index: original,
        option: option.clone(),
      })
    })
    .collect()
}

/// Shuffle options deterministically for a seed string
pub fn shuffle_options(options: &[QuizOption], seed: &str) -> ShuffledOptions {
  let mapping = ShuffleMapping::seeded(options.len(), seed);
  ShuffledOptions {
    options: arrange_options(options, &mapping),
    mapping,
  }
}
