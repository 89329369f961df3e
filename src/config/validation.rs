//! Semantic configuration validation.
//!
//! Serde handles the syntactic side; this pass checks value ranges and
//! referential sanity, and collects every error rather than stopping at
//! the first.

use std::collections::HashSet;

use crate::config::schema::AppConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("server.bind_address '{0}' is not a valid socket address")]
    InvalidBindAddress(String),

    #[error("server.request_timeout_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("client.request_timeout_secs must be greater than zero")]
    ZeroClientTimeout,

    #[error("pool.core_workers must be greater than zero")]
    ZeroCoreWorkers,

    #[error("pool.max_workers ({max}) must be >= pool.core_workers ({core})")]
    MaxBelowCore { core: usize, max: usize },

    #[error("pool.queue_capacity must be greater than zero")]
    ZeroQueueCapacity,

    #[error("observability.metrics_address '{0}' is not a valid socket address")]
    InvalidMetricsAddress(String),

    #[error("service '{0}' is declared more than once")]
    DuplicateService(String),

    #[error("service '{name}' has invalid base_url '{url}'")]
    InvalidServiceUrl { name: String, url: String },
}

/// Check an already-parsed config; returns every violation found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.server.bind_address.clone(),
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }
    if config.client.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroClientTimeout);
    }

    if config.pool.core_workers == 0 {
        errors.push(ValidationError::ZeroCoreWorkers);
    }
    if config.pool.max_workers < config.pool.core_workers {
        errors.push(ValidationError::MaxBelowCore {
            core: config.pool.core_workers,
            max: config.pool.max_workers,
        });
    }
    if config.pool.queue_capacity == 0 {
        errors.push(ValidationError::ZeroQueueCapacity);
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    let mut seen = HashSet::new();
    for service in &config.services {
        if !seen.insert(service.name.as_str()) {
            errors.push(ValidationError::DuplicateService(service.name.clone()));
        }
        if service.base_url.parse::<url::Url>().is_err() {
            errors.push(ValidationError::InvalidServiceUrl {
                name: service.name.clone(),
                url: service.base_url.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
