pub mod job_order;
pub mod repo;
pub mod types;

pub use job_order::{DefaultJobOrder, JobOrderPair};
pub use repo::{SettingsRepo, TerriaFilters};
pub use types::{ImageRepo, JobTypeName, NextJobTypeName, RunStatus, WorkflowTypeName};
