//! The monitoring engine: snapshot aggregation, change detection,
//! notification eligibility and the polling loop.

pub mod aggregator;
pub mod change_detector;
pub mod cooldown;
pub mod counters;
pub mod history;
pub mod policy;
pub mod poller;
pub mod renderer;

pub use aggregator::{ProductDetail, SizeAggregator};
pub use cooldown::CooldownLedger;
pub use counters::DailyCounters;
pub use history::HistoryBook;
pub use poller::Poller;
