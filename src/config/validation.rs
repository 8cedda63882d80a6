//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::collections::HashSet;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("at least one [[node]] is required")]
    NoNodes,
    #[error("cluster.{0} must be at least 1")]
    ZeroQuorum(&'static str),
    #[error("cluster.{name} = {value} exceeds the {nodes} configured nodes")]
    QuorumTooLarge {
        name: &'static str,
        value: usize,
        nodes: usize,
    },
    #[error("cluster.rpc_timeout_ms must be greater than 0")]
    ZeroRpcTimeout,
    #[error("node id '{0}' is used more than once")]
    DuplicateNodeId(String),
    #[error("node endpoint '{0}' is used more than once")]
    DuplicateEndpoint(String),
    #[error("node '{0}' has an empty id or address")]
    EmptyNodeField(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let node_count = config.nodes.len();

    if node_count == 0 {
        errors.push(ValidationError::NoNodes);
    }

    for (name, value) in [
        ("write_quorum", config.cluster.write_quorum),
        ("read_quorum", config.cluster.read_quorum),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroQuorum(name));
        } else if node_count > 0 && value > node_count {
            errors.push(ValidationError::QuorumTooLarge {
                name,
                value,
                nodes: node_count,
            });
        }
    }

    if config.cluster.rpc_timeout_ms == 0 {
        errors.push(ValidationError::ZeroRpcTimeout);
    }

    let mut ids = HashSet::new();
    let mut endpoints = HashSet::new();
    for node in &config.nodes {
        if node.id.is_empty() || node.address.is_empty() {
            errors.push(ValidationError::EmptyNodeField(node.identity().to_string()));
        }
        if !ids.insert(node.id.as_str()) {
            errors.push(ValidationError::DuplicateNodeId(node.id.clone()));
        }
        let endpoint = node.identity().endpoint();
        if !endpoints.insert(endpoint.clone()) {
            errors.push(ValidationError::DuplicateEndpoint(endpoint));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
