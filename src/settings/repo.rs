use std::sync::Arc;

use anyhow::{bail, Context};
use serde::Deserialize;
use serde_json::Value;

use crate::db::{DbRegistry, ProcResult};
use crate::settings::job_order::{DefaultJobOrder, JobOrderPair};
use crate::settings::types::{RunStatus, WorkflowTypeName};

/// Handle names registered by the composition root.
pub const ASGS: &str = "asgs";
/// Same database as [`ASGS`], registered with auto-commit disabled; used
/// only by the all-or-nothing job-order reset.
pub const ASGS_BATCH: &str = "asgs-batch";
pub const APSVIZ: &str = "apsviz";

/// Optional filters for the terria map catalog procedure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TerriaFilters {
    pub grid_type: Option<String>,
    pub event_type: Option<String>,
    pub instance_name: Option<String>,
    pub run_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<i64>,
}

/// Domain repository over the supervisor's stored procedures.
///
/// Every operation formats exactly one `SELECT public.<procedure>(...)`
/// statement and dispatches it by handle name; none of the job-ordering
/// logic lives here.
#[derive(Clone)]
pub struct SettingsRepo {
    db: Arc<DbRegistry>,
    job_order: Arc<DefaultJobOrder>,
}

impl SettingsRepo {
    pub fn new(db: Arc<DbRegistry>, job_order: Arc<DefaultJobOrder>) -> Self {
        Self { db, job_order }
    }

    /// First scalar of a select-style procedure call, or an error when the
    /// statement failed or returned nothing.
    async fn fetch_scalar(&self, handle: &str, sql: &str) -> anyhow::Result<Value> {
        match self.db.exec_sql(handle, sql, true).await? {
            ProcResult::Rows(rows) => rows
                .into_iter()
                .next()
                .context("procedure returned an empty row"),
            ProcResult::Empty => bail!("procedure returned no rows"),
            ProcResult::Failed(cause) => bail!("statement failed: {cause}"),
            ProcResult::Done(_) => bail!("unexpected non-select result"),
        }
    }

    /// One update-style procedure call; commit only when it did not fail.
    async fn update(&self, sql: &str) -> anyhow::Result<()> {
        match self.db.exec_sql(ASGS, sql, true).await? {
            ProcResult::Failed(cause) => bail!("statement failed: {cause}"),
            _ => {
                self.db.commit(ASGS).await?;
                Ok(())
            }
        }
    }

    /// The current linked-list job order for a workflow, as the database
    /// reports it.
    pub async fn get_job_order(&self, workflow: WorkflowTypeName) -> anyhow::Result<Value> {
        let sql = format!(
            "SELECT public.get_supervisor_job_order('{}')",
            workflow.as_str()
        );
        self.fetch_scalar(ASGS, &sql).await
    }

    /// Reset a workflow's job chain to the shipped default, all-or-nothing.
    ///
    /// Holds the batch handle's transaction exclusively for the whole loop:
    /// concurrent requests serialize behind the guard instead of interleaving
    /// statements or committing each other's partial batch. Nothing commits
    /// until every link updates cleanly; an abort drops the guard and rolls
    /// the whole batch back.
    pub async fn reset_job_order(&self, workflow: WorkflowTypeName) -> anyhow::Result<()> {
        let pairs = self.job_order.pairs_for(workflow);
        if pairs.is_empty() {
            bail!("no default job order configured for workflow {workflow}");
        }

        let mut batch = self.db.begin_batch(ASGS_BATCH).await?;

        for pair in pairs {
            let sql = reset_pair_statement(pair, workflow);

            match batch.exec_sql(&sql, true).await? {
                ProcResult::Rows(_) => {}
                other => bail!(
                    "job order reset aborted at record {}: update returned {other:?}",
                    pair.job_id
                ),
            }
        }

        batch.commit().await?;
        Ok(())
    }

    /// Supervisor job definitions, folded into one map with the
    /// JSON-encoded array fields decoded.
    pub async fn get_job_defs(&self) -> anyhow::Result<Value> {
        let raw = self
            .fetch_scalar(ASGS, "SELECT public.get_supervisor_job_defs_json()")
            .await?;
        shape_job_defs(raw)
    }

    /// Run information for the last 100 runs.
    pub async fn get_run_list(&self) -> anyhow::Result<Value> {
        self.fetch_scalar(ASGS, "SELECT public.get_supervisor_run_list()")
            .await
    }

    /// run.properties items for one run.
    pub async fn get_run_props(&self, instance_id: i64, uid: &str) -> anyhow::Result<Value> {
        let sql = format!(
            "SELECT public.get_run_props({instance_id}, '{}')",
            quote_literal(uid)
        );
        self.fetch_scalar(ASGS, &sql).await
    }

    /// Point one job at a new successor in a workflow's chain.
    pub async fn update_next_job_for_job(
        &self,
        job_key: &str,
        next_job_type_id: i64,
        workflow: WorkflowTypeName,
    ) -> anyhow::Result<()> {
        self.update(&next_job_statement(job_key, next_job_type_id, workflow))
            .await
    }

    /// Replace the image a job type runs with.
    pub async fn update_job_image_version(&self, job_key: &str, image: &str) -> anyhow::Result<()> {
        self.update(&job_image_statement(job_key, image)).await
    }

    /// Set a run's `supervisor_job_status` config item.
    pub async fn update_run_status(
        &self,
        instance_id: i64,
        uid: &str,
        status: RunStatus,
    ) -> anyhow::Result<()> {
        self.update(&run_status_statement(instance_id, uid, status))
            .await
    }

    /// Terria map UI catalog data, optionally filtered.
    pub async fn get_terria_map_data(&self, filters: &TerriaFilters) -> anyhow::Result<Value> {
        self.fetch_scalar(APSVIZ, &terria_statement(filters)).await
    }
}

/// One `update_next_job_for_job` call for a default job-order pair.
fn reset_pair_statement(pair: &JobOrderPair, workflow: WorkflowTypeName) -> String {
    format!(
        "SELECT public.update_next_job_for_job({}, {}, '{}')",
        pair.job_id,
        pair.next_job_type_id,
        workflow.as_str()
    )
}

fn next_job_statement(job_key: &str, next_job_type_id: i64, workflow: WorkflowTypeName) -> String {
    format!(
        "SELECT public.update_next_job_for_job('{}', {next_job_type_id}, '{}')",
        quote_literal(job_key),
        workflow.as_str()
    )
}

fn job_image_statement(job_key: &str, image: &str) -> String {
    format!(
        "SELECT public.update_job_image('{}', '{}')",
        quote_literal(job_key),
        quote_literal(image)
    )
}

fn run_status_statement(instance_id: i64, uid: &str, status: RunStatus) -> String {
    format!(
        "SELECT public.set_config_item({instance_id}, '{}', 'supervisor_job_status', '{}')",
        quote_literal(uid),
        status.as_str()
    )
}

fn terria_statement(filters: &TerriaFilters) -> String {
    format!(
        "SELECT public.get_terria_data_json(_grid_type:={}, _event_type:={}, \
         _instance_name:={}, _run_date:={}, _end_date:={}, _limit:={})",
        sql_opt(filters.grid_type.as_deref()),
        sql_opt(filters.event_type.as_deref()),
        sql_opt(filters.instance_name.as_deref()),
        sql_opt(filters.run_date.as_deref()),
        sql_opt(filters.end_date.as_deref()),
        filters.limit.unwrap_or(4),
    )
}

/// Escape a string for direct substitution into a stored-procedure call.
fn quote_literal(s: &str) -> String {
    s.replace('\'', "''")
}

/// `null` for an absent filter, a quoted literal otherwise.
fn sql_opt(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => format!("'{}'", quote_literal(v)),
        _ => "null".to_string(),
    }
}

/// The job-definition procedure returns an array of one-key objects whose
/// array-valued fields arrive as JSON-encoded strings. Fold it into a single
/// map and decode those fields; a null `PARALLEL` stays null.
fn shape_job_defs(raw: Value) -> anyhow::Result<Value> {
    let Value::Array(items) = raw else {
        bail!("unexpected job definition payload shape");
    };

    let mut defs = serde_json::Map::new();

    for item in items {
        let Value::Object(entry) = item else {
            bail!("unexpected job definition entry shape");
        };

        for (name, mut def) in entry {
            if let Value::Object(fields) = &mut def {
                for key in ["COMMAND_LINE", "COMMAND_MATRIX", "PARALLEL"] {
                    if let Some(field) = fields.get_mut(key) {
                        if let Value::String(encoded) = field {
                            *field = serde_json::from_str(encoded)
                                .with_context(|| format!("decoding {key} for job {name}"))?;
                        }
                    }
                }
            }
            defs.insert(name, def);
        }
    }

    Ok(Value::Object(defs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quote_literal_doubles_single_quotes() {
        assert_eq!(quote_literal("plain"), "plain");
        assert_eq!(quote_literal("o'brien"), "o''brien");
        assert_eq!(quote_literal("a''b"), "a''''b");
    }

    #[test]
    fn sql_opt_substitutes_null() {
        assert_eq!(sql_opt(None), "null");
        assert_eq!(sql_opt(Some("")), "null");
        assert_eq!(sql_opt(Some("ec95d")), "'ec95d'");
    }

    #[test]
    fn run_status_statement_substitutes_literals_positionally() {
        assert_eq!(
            run_status_statement(3057, "2021062406-namforecast", RunStatus::DoNotRerun),
            "SELECT public.set_config_item(3057, '2021062406-namforecast', \
             'supervisor_job_status', 'do not rerun')"
        );
    }

    #[test]
    fn reset_pair_statement_formats_one_update_per_pair() {
        let pair = JobOrderPair {
            job_id: 1,
            next_job_type_id: 23,
        };
        assert_eq!(
            reset_pair_statement(&pair, WorkflowTypeName::Asgs),
            "SELECT public.update_next_job_for_job(1, 23, 'ASGS')"
        );
    }

    #[test]
    fn next_job_statement_quotes_the_job_key() {
        assert_eq!(
            next_job_statement("staging-", 21, WorkflowTypeName::Ecflow),
            "SELECT public.update_next_job_for_job('staging-', 21, 'ECFLOW')"
        );
    }

    #[test]
    fn job_image_statement_escapes_both_arguments() {
        assert_eq!(
            job_image_statement("hazus-", "containers.renci.org/eds/adras:v2.0.0"),
            "SELECT public.update_job_image('hazus-', 'containers.renci.org/eds/adras:v2.0.0')"
        );
    }

    #[test]
    fn terria_statement_defaults_absent_filters_to_null() {
        let filters = TerriaFilters {
            grid_type: Some("ec95d".to_string()),
            ..TerriaFilters::default()
        };
        assert_eq!(
            terria_statement(&filters),
            "SELECT public.get_terria_data_json(_grid_type:='ec95d', _event_type:=null, \
             _instance_name:=null, _run_date:=null, _end_date:=null, _limit:=4)"
        );
    }

    #[test]
    fn job_defs_fold_and_decode() {
        let raw = json!([
            {
                "staging": {
                    "COMMAND_LINE": "[\"python\", \"stage.py\"]",
                    "COMMAND_MATRIX": "[[\"--all\"]]",
                    "PARALLEL": null,
                    "IMAGE": "containers.renci.org/eds/stagedata:v1.0.0"
                }
            },
            {
                "hazus": {
                    "COMMAND_LINE": "[\"run\"]",
                    "COMMAND_MATRIX": "[]",
                    "PARALLEL": "[25, 26]",
                    "IMAGE": "containers.renci.org/eds/adras:v2.0.0"
                }
            }
        ]);

        let shaped = shape_job_defs(raw).unwrap();

        assert_eq!(shaped["staging"]["COMMAND_LINE"], json!(["python", "stage.py"]));
        assert_eq!(shaped["staging"]["PARALLEL"], Value::Null);
        assert_eq!(shaped["hazus"]["PARALLEL"], json!([25, 26]));
        assert_eq!(
            shaped["hazus"]["IMAGE"],
            json!("containers.renci.org/eds/adras:v2.0.0")
        );
    }

    #[test]
    fn job_defs_reject_non_array_payload() {
        assert!(shape_job_defs(json!({"not": "an array"})).is_err());
    }
}
