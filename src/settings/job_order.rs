use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::settings::types::WorkflowTypeName;

/// One link in a workflow's default job chain: the job-order record id and
/// the job type id that should follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct JobOrderPair {
    pub job_id: i64,
    pub next_job_type_id: i64,
}

/// Default (job id, next job type id) sequences per workflow type.
///
/// This is deployment data, not logic: it ships as a JSON data file
/// (`data/default_job_order.json`, overridable via `JOB_ORDER_PATH`) so a
/// deployment can change its sequences without a rebuild.
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultJobOrder(HashMap<WorkflowTypeName, Vec<JobOrderPair>>);

impl DefaultJobOrder {
    /// Load from `path`, or fall back to the table compiled into the binary.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let table: Self = match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)
                    .with_context(|| format!("reading job order file {}", p.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing job order file {}", p.display()))?
            }
            None => serde_json::from_str(include_str!("../../data/default_job_order.json"))
                .context("parsing built-in job order table")?,
        };

        Ok(table)
    }

    /// The default chain for `workflow`; empty when the deployment has none
    /// configured for it.
    pub fn pairs_for(&self, workflow: WorkflowTypeName) -> &[JobOrderPair] {
        self.0.get(&workflow).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_loads() {
        let table = DefaultJobOrder::load(None).unwrap();

        assert_eq!(table.pairs_for(WorkflowTypeName::Asgs).len(), 8);
        assert_eq!(table.pairs_for(WorkflowTypeName::Ecflow).len(), 8);
        assert_eq!(
            table.pairs_for(WorkflowTypeName::Hecras),
            &[JobOrderPair {
                job_id: 201,
                next_job_type_id: 21
            }]
        );
    }

    #[test]
    fn asgs_chain_starts_at_staging_and_ends_complete() {
        let table = DefaultJobOrder::load(None).unwrap();
        let pairs = table.pairs_for(WorkflowTypeName::Asgs);

        assert_eq!(
            pairs.first(),
            Some(&JobOrderPair {
                job_id: 1,
                next_job_type_id: 23
            })
        );
        // last link points at the terminal `complete` type (21)
        assert_eq!(pairs.last().map(|p| p.next_job_type_id), Some(21));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = DefaultJobOrder::load(Some(Path::new("/nonexistent/job_order.json")));
        assert!(err.is_err());
    }
}
