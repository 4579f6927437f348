pub mod analyzer;
pub mod db;
pub mod error;
pub mod metrics;
pub mod models;
pub mod period;
pub mod report;
pub mod repository;
pub mod source;

pub use analyzer::{FeedbackAnalyzer, FilterMode};
pub use error::FeedbackError;
pub use models::{FeedbackRecord, FilterSpec};
pub use period::{Clock, FixedClock, Period, SystemClock};
pub use repository::FeedbackRepository;
