use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::simulation::StopCondition;
use crate::workload::WorkloadParams;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("invalid distribution parameters: {0}")]
    Distribution(#[from] rand_distr::NormalError),
}

/// Parameters for a generated run, loadable from JSON.
///
/// Times are in simulated ticks. Inter-arrival gaps and service durations
/// are drawn from log-normal distributions described by their mean and
/// coefficient of variation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u64,
    pub customers: usize,
    pub mean_interarrival: f32,
    pub interarrival_cv: f32,
    pub mean_service: f32,
    pub service_cv: f32,
    pub max_time: Option<u64>,
    pub max_events: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            seed: 0,
            customers: 100,
            mean_interarrival: 5.0,
            interarrival_cv: 1.0,
            mean_service: 4.0,
            service_cv: 0.5,
            max_time: None,
            max_events: None,
        }
    }
}

impl SimulationConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: SimulationConfig = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("mean_interarrival", self.mean_interarrival)?;
        positive("mean_service", self.mean_service)?;
        non_negative("interarrival_cv", self.interarrival_cv)?;
        non_negative("service_cv", self.service_cv)?;
        Ok(())
    }

    pub fn workload(&self) -> WorkloadParams {
        WorkloadParams {
            customers: self.customers,
            mean_interarrival: self.mean_interarrival,
            interarrival_cv: self.interarrival_cv,
            mean_service: self.mean_service,
            service_cv: self.service_cv,
        }
    }

    pub fn stop_condition(&self) -> StopCondition {
        StopCondition {
            max_time: self.max_time,
            max_events: self.max_events,
        }
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected a positive number, got {value}"),
        })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected a non-negative number, got {value}"),
        })
    }
}
