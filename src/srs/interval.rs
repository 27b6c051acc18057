use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::domain::ReviewTier;
use crate::error::SchedulerError;

/// Remaining time never counts as less than an hour
pub const MIN_MINUTES_REMAINING: f64 = 60.0;

/// Nor as more than a hundred years
pub const MAX_MINUTES_REMAINING: f64 = 100.0 * 365.0 * 24.0 * 60.0;

/// (fraction of remaining minutes, floor in minutes) per tier
fn tier_policy(tier: ReviewTier) -> (f64, i64) {
  match tier {
    ReviewTier::Again => (0.001, 1),
    ReviewTier::Hard => (0.01, 5),
    ReviewTier::Good => (0.10, 30),
    ReviewTier::Easy => (0.25, 60),
  }
}

/// Minutes until a card should resurface.
///
/// `interval = max(floor, round(minutes_remaining * fraction))` where
/// `minutes_remaining = max(seconds_remaining / 60, 60)`, capped at
/// [`MAX_MINUTES_REMAINING`]. Negative or NaN input counts as zero remaining.
pub fn compute_review_interval(seconds_remaining: f64, tier: ReviewTier) -> i64 {
  let (fraction, floor) = tier_policy(tier);
  let minutes_remaining = (seconds_remaining.max(0.0) / 60.0)
    .max(MIN_MINUTES_REMAINING)
    .min(MAX_MINUTES_REMAINING);
  let scaled = (minutes_remaining * fraction).round() as i64;
  scaled.max(floor)
}

/// Same as [`compute_review_interval`] for a tier given by name; unknown names fail
pub fn compute_review_interval_named(seconds_remaining: f64, tier: &str) -> Result<i64, SchedulerError> {
  let tier: ReviewTier = tier.parse()?;
  Ok(compute_review_interval(seconds_remaining, tier))
}

/// Seconds from `now` until `target`, clamped at zero
pub fn seconds_until(target: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
  ((target - now).num_milliseconds() as f64 / 1000.0).max(0.0)
}

/// `now` pushed forward by `minutes`; fails past the representable date range
fn add_minutes(now: DateTime<Utc>, minutes: i64) -> Result<DateTime<Utc>, SchedulerError> {
  TimeDelta::try_minutes(minutes)
    .and_then(|delta| now.checked_add_signed(delta))
    .ok_or(SchedulerError::IntervalOutOfRange(minutes))
}

pub fn next_show_timestamp(
  now: DateTime<Utc>,
  seconds_remaining: f64,
  tier: ReviewTier,
) -> Result<DateTime<Utc>, SchedulerError> {
  add_minutes(now, compute_review_interval(seconds_remaining, tier))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledReview {
  pub tier: ReviewTier,
  pub interval_minutes: i64,
  pub next_show: DateTime<Utc>,
}

/// Schedule a card of a course with the given target completion.
/// A course without a target is treated as having no time left.
pub fn schedule_review(
  target_completion: Option<DateTime<Utc>>,
  now: DateTime<Utc>,
  tier: ReviewTier,
) -> Result<ScheduledReview, SchedulerError> {
  let remaining = target_completion
    .map(|target| seconds_until(target, now))
    .unwrap_or(0.0);
  let interval_minutes = compute_review_interval(remaining, tier);

  Ok(ScheduledReview {
    tier,
    interval_minutes,
    next_show: add_minutes(now, interval_minutes)?,
  })
}
