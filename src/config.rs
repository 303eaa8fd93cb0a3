use crate::calendar::ExamCalendarConfig;
use crate::exam::OrderingMode;
use crate::planner::DEFAULT_INVIGILATOR_RATIO;
use crate::repository::{PersistenceError, PersistenceResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "EXAM_PLANNER_CONFIG";
pub const DATABASE_PATH_ENV: &str = "EXAM_PLANNER_DB";
pub const LOG_FILTER_ENV: &str = "EXAM_PLANNER_LOG";

/// Runtime settings. Missing fields fall back to their defaults, so an empty
/// JSON object is a valid config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// SQLite file; an in-memory store is used when absent.
    pub database_path: Option<PathBuf>,
    pub ordering: OrderingMode,
    pub invigilator_ratio: u32,
    pub log_filter: String,
    pub calendar: Option<ExamCalendarConfig>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            ordering: OrderingMode::default(),
            invigilator_ratio: DEFAULT_INVIGILATOR_RATIO,
            log_filter: "info".to_string(),
            calendar: None,
        }
    }
}

impl PlannerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> PersistenceResult<Self> {
        let file = File::open(path)?;
        let config: PlannerConfig = serde_json::from_reader(file)?;
        if config.invigilator_ratio == 0 {
            return Err(PersistenceError::InvalidData(
                "invigilator_ratio must be at least 1".into(),
            ));
        }
        Ok(config)
    }

    pub fn from_env() -> PersistenceResult<Self> {
        Self::resolve(|key| std::env::var(key).ok())
    }

    /// Like `from_env`, reading variables through `lookup`.
    pub fn resolve<F>(lookup: F) -> PersistenceResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            Some(path) => Self::load(path.trim())?,
            None => Self::default(),
        };
        config.apply_overrides(lookup);
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(DATABASE_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            self.database_path = Some(PathBuf::from(path.trim()));
        }
        if let Some(filter) = lookup(LOG_FILTER_ENV).filter(|f| !f.trim().is_empty()) {
            self.log_filter = filter.trim().to_string();
        }
    }
}
