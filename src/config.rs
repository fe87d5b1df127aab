use std::path::PathBuf;

use serde::Deserialize;

use crate::db::RetryPolicy;

/// Connection parameters for one named database, pulled from the
/// deployment's secrets.
#[derive(Clone, Debug)]
pub struct DbParams {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl DbParams {
    fn from_env(prefix: &str) -> anyhow::Result<Self> {
        Ok(Self {
            host: require(&format!("{prefix}_HOST"))?,
            port: env_or(&format!("{prefix}_PORT"))
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            database: require(&format!("{prefix}_DATABASE"))?,
            username: require(&format!("{prefix}_USERNAME"))?,
            password: require(&format!("{prefix}_PASSWORD"))?,
        })
    }

    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}

/// A sibling deployment whose component image versions we compare against.
#[derive(Clone, Debug, Deserialize)]
pub struct PeerDeployment {
    pub namespace: String,
    pub url: String,
    pub token: String,
}

/// Runtime configuration, loaded once from the environment by the
/// composition root.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: String,
    /// Namespace this deployment reports itself as in version comparisons.
    pub system: String,
    pub asgs_db: DbParams,
    pub apsviz_db: DbParams,
    pub retry: RetryPolicy,
    pub log_path: PathBuf,
    pub temp_file_path: PathBuf,
    /// Image-version updates are refused while this sentinel file exists.
    pub freeze_path: PathBuf,
    pub jwt_secret: String,
    /// Optional override for the default job order data file.
    pub job_order_path: Option<PathBuf>,
    pub peers: Vec<PeerDeployment>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let bind_addr = env_or("SETTINGS_BIND_ADDR").unwrap_or_else(|| "0.0.0.0:4000".to_string());
        let system = env_or("SYSTEM").unwrap_or_else(|| "local".to_string());

        let asgs_db = DbParams::from_env("ASGS_DB")?;
        let apsviz_db = DbParams::from_env("APSVIZ_DB")?;

        let retry = RetryPolicy {
            base_seconds: env_num("SETTINGS_DB_RETRY_SECONDS").unwrap_or(5),
            max_seconds: env_num("SETTINGS_DB_RETRY_MAX_SECONDS").unwrap_or(5),
            jitter_pct: env_or("SETTINGS_DB_RETRY_JITTER_PCT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.0),
            max_attempts: env_num("SETTINGS_DB_MAX_RETRIES").map(|n| n as u32),
        };

        let log_path = PathBuf::from(env_or("LOG_PATH").unwrap_or_else(|| "logs".to_string()));
        let temp_file_path = env_or("TEMP_FILE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        let freeze_path =
            PathBuf::from(env_or("FREEZE_PATH").unwrap_or_else(|| "freeze".to_string()));

        let jwt_secret = require("JWT_SECRET")?;
        let job_order_path = env_or("JOB_ORDER_PATH").map(PathBuf::from);

        let peers = match env_or("SV_COMPONENT_PEERS") {
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| anyhow::anyhow!("SV_COMPONENT_PEERS is not valid JSON: {e}"))?,
            None => Vec::new(),
        };

        Ok(Self {
            bind_addr,
            system,
            asgs_db,
            apsviz_db,
            retry,
            log_path,
            temp_file_path,
            freeze_path,
            jwt_secret,
            job_order_path,
            peers,
        })
    }

    /// Freeze mode: the deployment drops a sentinel file on disk to disable
    /// image-version updates without a restart.
    pub fn freeze_active(&self) -> bool {
        self.freeze_path.exists()
    }
}

fn require(key: &str) -> anyhow::Result<String> {
    env_or(key).ok_or_else(|| anyhow::anyhow!("{key} is missing"))
}

fn env_or(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn env_num(key: &str) -> Option<u64> {
    env_or(key).and_then(|s| s.parse().ok())
}
