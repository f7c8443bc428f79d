pub mod aggregator;
pub mod batch;
pub mod executor;
pub mod reporter;
pub mod types;
pub mod validator;

pub use aggregator::{AggregateOutcome, Aggregator};
pub use batch::{BatchOutcome, run_batch};
pub use executor::Executor;
pub use reporter::Reporter;
pub use types::Run;
pub use validator::{validate, validate_all};
