pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod pixels;
pub mod provenance;
pub mod request;
pub mod scheduler;
pub mod seed;

pub use batch::{BatchReport, BatchRunner, RunOutcome, RunStatus};
pub use config::{FailurePolicy, Mode, RunConfig};
pub use engine::{Engine, GenerationResult};
pub use request::GenerationRequest;
pub use scheduler::{SchedulerFactory, SchedulerKind, SchedulerSpec};
pub use seed::{GeneratorHandle, SeedController};
