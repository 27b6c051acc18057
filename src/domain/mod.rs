pub mod question;
pub mod review;

pub use question::{Question, QuizOption, RawOption, RawOptionFields, RawQuestion};
pub use review::{Course, Flashcard, ReviewTier};
