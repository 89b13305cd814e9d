use clap::Parser;
use std::path::PathBuf;

use crate::engine::operations::OperationType;
use crate::error::ConfigError;

/// A `-s` argument: operation plus optional queue capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServiceSpec {
    pub operation: OperationType,
    pub capacity: Option<usize>,
}

/// Parse `OP` or `OP:CAPACITY` (also `OP=CAPACITY`). OP is an id 0-9 or a name.
pub fn parse_service_spec(s: &str) -> Result<ServiceSpec, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidServiceSpec {
        spec: s.to_string(),
        reason,
    };
    let (op, capacity) = match s.split_once([':', '=']) {
        Some((op, cap)) => (op, Some(cap.trim())),
        None => (s, None),
    };
    let operation = op
        .parse::<OperationType>()
        .map_err(|e| invalid(e.to_string()))?;
    let capacity = match capacity {
        None => None,
        Some(cap) => {
            let n = cap
                .parse::<usize>()
                .map_err(|_| invalid(format!("capacity '{cap}' is not a number")))?;
            if n == 0 {
                return Err(ConfigError::InvalidCapacity {
                    target: operation.to_string(),
                    capacity: 0,
                });
            }
            Some(n)
        }
    };
    Ok(ServiceSpec {
        operation,
        capacity,
    })
}

/// Parallel computation service simulator.
#[derive(Clone, Parser)]
#[command(name = "parsim")]
#[command(
    about = "Start services, then read `sequence:ops:operand1:operand2:delays` lines from stdin. A line `0` ends input."
)]
pub struct Cli {
    /// Start a service: OP or OP:CAPACITY, OP is an id 0-9 (SUM SUB MULT DIV MOD AND OR XOR NAND NOR) or a name. Repeatable.
    #[arg(long = "service", short = 's', value_name = "OP[:CAPACITY]", value_parser = parse_service_spec)]
    pub services: Vec<ServiceSpec>,

    /// Queue capacity for services started without one. Default: 1.
    #[arg(long, short = 'c', value_parser = clap::value_parser!(usize))]
    pub default_capacity: Option<usize>,

    /// Capacity of the shared result queue. Default: 1.
    #[arg(long, short = 'b', value_parser = clap::value_parser!(usize))]
    pub backend_capacity: Option<usize>,

    /// Verbose output.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,

    /// Config file. Default: `.parsim.toml` in the working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
