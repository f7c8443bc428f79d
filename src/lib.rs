pub mod config;
pub mod error;
pub mod logger;
pub mod runner;
pub mod xunit;

// 重新导出常用类型
pub use config::{ConfigLoader, Settings};
pub use error::{MultisuiteError, Result};
pub use runner::{Aggregator, Executor, Reporter, Run};
