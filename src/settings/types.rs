//! Closed enumerations for the supervisor's workflow, job, status, and image
//! repository names, plus the static mapping tables hanging off them.
//!
//! The id and image-suffix mappings are configuration data, not logic: they
//! mirror what the supervisor deployment registers in the database.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Supervisor workflow pipeline variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowTypeName {
    #[serde(rename = "ASGS")]
    Asgs,
    #[serde(rename = "ECFLOW")]
    Ecflow,
    #[serde(rename = "HECRAS")]
    Hecras,
}

impl WorkflowTypeName {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowTypeName::Asgs => "ASGS",
            WorkflowTypeName::Ecflow => "ECFLOW",
            WorkflowTypeName::Hecras => "HECRAS",
        }
    }
}

impl fmt::Display for WorkflowTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// k8s job type names the supervisor launches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobTypeName {
    #[serde(rename = "adcirc2cog-tiff-job")]
    Adcirc2CogTiffJob,
    #[serde(rename = "adcirctime-to-cog-job")]
    AdcircTimeToCogJob,
    #[serde(rename = "adcirc-to-kalpana-cog-job")]
    AdcircToKalpanaCogJob,
    #[serde(rename = "ast-run-harvester-job")]
    AstRunHarvesterJob,
    #[serde(rename = "collab-data-sync-job")]
    CollabDataSyncJob,
    #[serde(rename = "final-staging-job")]
    FinalStagingJob,
    #[serde(rename = "geotiff2cog-job")]
    Geotiff2CogJob,
    #[serde(rename = "hazus")]
    Hazus,
    #[serde(rename = "load-geo-server-job")]
    LoadGeoServerJob,
    #[serde(rename = "load-geo-server-s3-job")]
    LoadGeoServerS3Job,
    #[serde(rename = "obs-mod-ast-job")]
    ObsModAstJob,
    #[serde(rename = "staging")]
    Staging,
    #[serde(rename = "timeseriesdb-ingest-job")]
    TimeseriesDbIngestJob,
}

impl JobTypeName {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobTypeName::Adcirc2CogTiffJob => "adcirc2cog-tiff-job",
            JobTypeName::AdcircTimeToCogJob => "adcirctime-to-cog-job",
            JobTypeName::AdcircToKalpanaCogJob => "adcirc-to-kalpana-cog-job",
            JobTypeName::AstRunHarvesterJob => "ast-run-harvester-job",
            JobTypeName::CollabDataSyncJob => "collab-data-sync-job",
            JobTypeName::FinalStagingJob => "final-staging-job",
            JobTypeName::Geotiff2CogJob => "geotiff2cog-job",
            JobTypeName::Hazus => "hazus",
            JobTypeName::LoadGeoServerJob => "load-geo-server-job",
            JobTypeName::LoadGeoServerS3Job => "load-geo-server-s3-job",
            JobTypeName::ObsModAstJob => "obs-mod-ast-job",
            JobTypeName::Staging => "staging",
            JobTypeName::TimeseriesDbIngestJob => "timeseriesdb-ingest-job",
        }
    }

    /// Stable integer id the job-order stored procedures key on.
    pub fn id(&self) -> i64 {
        match self {
            JobTypeName::Adcirc2CogTiffJob => 23,
            JobTypeName::AdcircTimeToCogJob => 26,
            JobTypeName::AdcircToKalpanaCogJob => 30,
            JobTypeName::AstRunHarvesterJob => 27,
            JobTypeName::CollabDataSyncJob => 29,
            JobTypeName::FinalStagingJob => 20,
            JobTypeName::Geotiff2CogJob => 24,
            JobTypeName::Hazus => 12,
            JobTypeName::LoadGeoServerJob => 19,
            JobTypeName::LoadGeoServerS3Job => 28,
            JobTypeName::ObsModAstJob => 25,
            JobTypeName::Staging => 11,
            JobTypeName::TimeseriesDbIngestJob => 31,
        }
    }

    /// Container image name fragment between the repo path and the version
    /// tag.
    pub fn image_suffix(&self) -> &'static str {
        match self {
            JobTypeName::Adcirc2CogTiffJob => "/adcirc2cog:",
            JobTypeName::AdcircTimeToCogJob => "/adcirctime2cogs:",
            JobTypeName::AdcircToKalpanaCogJob => "/adcirc-to-kalpana-cog-job:",
            JobTypeName::AstRunHarvesterJob => "/ast_run_harvester:",
            JobTypeName::CollabDataSyncJob => "/apsviz-collab-sync:",
            JobTypeName::FinalStagingJob => "/stagedata:",
            JobTypeName::Geotiff2CogJob => "/adcirc2cog:",
            JobTypeName::Hazus => "/adras:",
            JobTypeName::LoadGeoServerJob => "/load_geoserver:",
            JobTypeName::LoadGeoServerS3Job => "/load_geoserver:",
            JobTypeName::ObsModAstJob => "/ast_supp:",
            JobTypeName::Staging => "/stagedata:",
            JobTypeName::TimeseriesDbIngestJob => "/apsviz-timeseriesdb-ingest:",
        }
    }

    /// Key format the database stores job types under. Every launchable job
    /// type carries a trailing hyphen; only the pseudo-type `complete` (which
    /// is not launchable and so not in this enum) goes bare.
    pub fn db_key(&self) -> String {
        format!("{}-", self.as_str())
    }
}

impl fmt::Display for JobTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Legal successors in a job chain: any launchable job type, or `complete`
/// to terminate the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NextJobTypeName {
    #[serde(rename = "adcirc2cog-tiff-job")]
    Adcirc2CogTiffJob,
    #[serde(rename = "adcirctime-to-cog-job")]
    AdcircTimeToCogJob,
    #[serde(rename = "adcirc-to-kalpana-cog-job")]
    AdcircToKalpanaCogJob,
    #[serde(rename = "ast-run-harvester-job")]
    AstRunHarvesterJob,
    #[serde(rename = "collab-data-sync-job")]
    CollabDataSyncJob,
    #[serde(rename = "complete")]
    Complete,
    #[serde(rename = "final-staging-job")]
    FinalStagingJob,
    #[serde(rename = "geotiff2cog-job")]
    Geotiff2CogJob,
    #[serde(rename = "hazus")]
    Hazus,
    #[serde(rename = "load-geo-server-job")]
    LoadGeoServerJob,
    #[serde(rename = "load-geo-server-s3-job")]
    LoadGeoServerS3Job,
    #[serde(rename = "obs-mod-ast-job")]
    ObsModAstJob,
    #[serde(rename = "staging")]
    Staging,
    #[serde(rename = "timeseriesdb-ingest-job")]
    TimeseriesDbIngestJob,
}

impl NextJobTypeName {
    pub fn as_str(&self) -> &'static str {
        match self {
            NextJobTypeName::Adcirc2CogTiffJob => "adcirc2cog-tiff-job",
            NextJobTypeName::AdcircTimeToCogJob => "adcirctime-to-cog-job",
            NextJobTypeName::AdcircToKalpanaCogJob => "adcirc-to-kalpana-cog-job",
            NextJobTypeName::AstRunHarvesterJob => "ast-run-harvester-job",
            NextJobTypeName::CollabDataSyncJob => "collab-data-sync-job",
            NextJobTypeName::Complete => "complete",
            NextJobTypeName::FinalStagingJob => "final-staging-job",
            NextJobTypeName::Geotiff2CogJob => "geotiff2cog-job",
            NextJobTypeName::Hazus => "hazus",
            NextJobTypeName::LoadGeoServerJob => "load-geo-server-job",
            NextJobTypeName::LoadGeoServerS3Job => "load-geo-server-s3-job",
            NextJobTypeName::ObsModAstJob => "obs-mod-ast-job",
            NextJobTypeName::Staging => "staging",
            NextJobTypeName::TimeseriesDbIngestJob => "timeseriesdb-ingest-job",
        }
    }

    /// Stable integer id, including the terminal `complete` (21).
    pub fn id(&self) -> i64 {
        match self {
            NextJobTypeName::Adcirc2CogTiffJob => 23,
            NextJobTypeName::AdcircTimeToCogJob => 26,
            NextJobTypeName::AdcircToKalpanaCogJob => 30,
            NextJobTypeName::AstRunHarvesterJob => 27,
            NextJobTypeName::CollabDataSyncJob => 29,
            NextJobTypeName::Complete => 21,
            NextJobTypeName::FinalStagingJob => 20,
            NextJobTypeName::Geotiff2CogJob => 24,
            NextJobTypeName::Hazus => 12,
            NextJobTypeName::LoadGeoServerJob => 19,
            NextJobTypeName::LoadGeoServerS3Job => 28,
            NextJobTypeName::ObsModAstJob => 25,
            NextJobTypeName::Staging => 11,
            NextJobTypeName::TimeseriesDbIngestJob => 31,
        }
    }
}

impl fmt::Display for NextJobTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run status values a run's `supervisor_job_status` config item may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    #[serde(rename = "new")]
    New,
    #[serde(rename = "debug")]
    Debug,
    #[serde(rename = "do not rerun")]
    DoNotRerun,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::New => "new",
            RunStatus::Debug => "debug",
            RunStatus::DoNotRerun => "do not rerun",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Container registries job images may live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageRepo {
    #[serde(rename = "containers.renci.org")]
    Containers,
    #[serde(rename = "renciorg")]
    RenciOrg,
}

impl ImageRepo {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageRepo::Containers => "containers.renci.org",
            ImageRepo::RenciOrg => "renciorg",
        }
    }

    /// Registry path images are actually pushed under.
    pub fn repo_path(&self) -> &'static str {
        match self {
            ImageRepo::Containers => "containers.renci.org/eds",
            ImageRepo::RenciOrg => "renciorg",
        }
    }
}

impl fmt::Display for ImageRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
