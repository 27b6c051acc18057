pub mod interval;
pub mod store;

pub use interval::{
  compute_review_interval, compute_review_interval_named, next_show_timestamp, schedule_review,
  seconds_until, ScheduledReview,
};
pub use store::ReviewStore;
