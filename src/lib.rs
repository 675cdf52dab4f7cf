pub mod common;
pub mod config;
pub mod error;
pub mod memory;
pub mod pipeline;

pub use common::{Clock, GeoPoint, ImageReference, ManualClock, SystemClock};
pub use config::Configuration;
pub use error::{AppError, ErrorKind, WorkflowError};
pub use memory::{InMemoryBank, MemoryBank, MemoryRecord, NewReport, SqliteMemoryBank};
pub use pipeline::services::orchestration::{RunOutcome, WorkflowEngine, WorkflowState};
pub use pipeline::{PipelineFactory, Severity};
