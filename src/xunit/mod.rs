//! xunit（JUnit 风格）XML 报告：统计与合并

pub mod merge;
pub mod summary;

pub use merge::{SuiteCounts, merge};
pub use summary::{XunitSummary, summarize, summarize_str};
