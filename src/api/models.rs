use serde::Deserialize;

use crate::settings::TerriaFilters;

/// Query parameters for the terria catalog file download.
#[derive(Debug, Deserialize)]
pub struct TerriaFileQuery {
    pub file_name: Option<String>,
    pub grid_type: Option<String>,
    pub event_type: Option<String>,
    pub instance_name: Option<String>,
    pub run_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<i64>,
}

impl TerriaFileQuery {
    pub fn filters(&self) -> TerriaFilters {
        TerriaFilters {
            grid_type: self.grid_type.clone(),
            event_type: self.event_type.clone(),
            instance_name: self.instance_name.clone(),
            run_date: self.run_date.clone(),
            end_date: self.end_date.clone(),
            limit: self.limit,
        }
    }
}

/// Query parameters for a single log-file fetch.
#[derive(Debug, Deserialize)]
pub struct LogFileQuery {
    pub log_file: String,
}
