//! Pipeline configuration: which services start and how big their queues are.

use std::collections::BTreeMap;

use crate::Opts;
use crate::engine::operations::OperationType;
use crate::error::ConfigError;
use crate::utils::config::QueueCapacity;

/// Resolved startup configuration handed to [`PipelineController::configure`](crate::pipeline::PipelineController::configure).
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    capacities: BTreeMap<OperationType, Option<usize>>,
    default_capacity: Option<usize>,
    backend_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capacities: BTreeMap::new(),
            default_capacity: None,
            backend_capacity: QueueCapacity::BACKEND,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable `operation`. `None` capacity falls back to the default capacity.
    pub fn with_service(mut self, operation: OperationType, capacity: Option<usize>) -> Self {
        self.capacities.insert(operation, capacity);
        self
    }

    pub fn with_default_capacity(mut self, capacity: usize) -> Self {
        self.default_capacity = Some(capacity);
        self
    }

    pub fn with_backend_capacity(mut self, capacity: usize) -> Self {
        self.backend_capacity = capacity;
        self
    }

    /// Enabled operation types in id order.
    pub fn enabled_operations(&self) -> Vec<OperationType> {
        self.capacities.keys().copied().collect()
    }

    /// Explicit capacity, else the default capacity, else 1.
    pub fn resolve_capacity(&self, operation: OperationType) -> usize {
        self.capacities
            .get(&operation)
            .copied()
            .flatten()
            .or(self.default_capacity)
            .unwrap_or(QueueCapacity::FALLBACK)
    }

    pub fn backend_capacity(&self) -> usize {
        self.backend_capacity
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacities.is_empty() {
            return Err(ConfigError::NoServices);
        }
        if self.default_capacity == Some(0) {
            return Err(ConfigError::InvalidCapacity {
                target: "default queue".to_string(),
                capacity: 0,
            });
        }
        if self.backend_capacity == 0 {
            return Err(ConfigError::InvalidCapacity {
                target: "backend queue".to_string(),
                capacity: 0,
            });
        }
        if let Some(op) = self.capacities.iter().find_map(|(op, c)| (*c == Some(0)).then_some(op)) {
            return Err(ConfigError::InvalidCapacity {
                target: op.to_string(),
                capacity: 0,
            });
        }
        Ok(())
    }
}

impl TryFrom<&Opts> for PipelineConfig {
    type Error = ConfigError;

    fn try_from(opts: &Opts) -> Result<Self, Self::Error> {
        let config = PipelineConfig {
            capacities: opts.services.clone(),
            default_capacity: opts.default_capacity,
            backend_capacity: opts.backend_capacity.unwrap_or(QueueCapacity::BACKEND),
        };
        config.validate()?;
        Ok(config)
    }
}
