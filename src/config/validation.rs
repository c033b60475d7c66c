//! Configuration validation.
//!
//! Returns every problem found, not just the first.

use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("target_host is mandatory")]
    MissingTargetHost,

    #[error("target_port must be between 1 and 65535")]
    InvalidTargetPort,

    #[error("dns.refresh_rate_secs must be > 0 when dns.need_refresh is enabled")]
    ZeroRefreshRate,

    #[error("observability.metrics_address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.target_host.trim().is_empty() {
        errors.push(ValidationError::MissingTargetHost);
    }
    if config.target_port == 0 {
        errors.push(ValidationError::InvalidTargetPort);
    }
    if config.dns.need_refresh && config.dns.refresh_rate_secs == 0 {
        errors.push(ValidationError::ZeroRefreshRate);
    }
    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config_passes() {
        let config = ProxyConfig::for_target("localhost", 8080);
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_reports_all_errors() {
        let mut config = ProxyConfig::default();
        config.dns.refresh_rate_secs = 0;
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "nope".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::MissingTargetHost,
                ValidationError::InvalidTargetPort,
                ValidationError::ZeroRefreshRate,
                ValidationError::InvalidMetricsAddress("nope".into()),
            ]
        );
    }

    #[test]
    fn test_zero_refresh_rate_allowed_without_refresh() {
        let mut config = ProxyConfig::for_target("localhost", 8080);
        config.dns.need_refresh = false;
        config.dns.refresh_rate_secs = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_unknown_balancer_is_not_an_error() {
        let mut config = ProxyConfig::for_target("localhost", 8080);
        config.dns.balancer = "weighted".into();
        assert!(validate_config(&config).is_ok());
    }
}
