use crate::config::types::{
    Config, DomainDelayConfig, DomainEntry, EngineConfig, HttpClientPoolConfig, ProxySettingsConfig,
    QualityEntry, RetryPolicyConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_engine_config(&config.engine)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_retry_policy_config(&config.retry)?;
    validate_proxy_settings_config(&config.proxy)?;
    validate_http_client_pool_config(&config.http_client_pool)?;
    validate_domain_delay_config(&config.domain_delay)?;
    validate_quality_domains(&config.quality)?;
    validate_blacklist_domains(&config.blacklist)?;
    validate_stub_domains(&config.stub)?;
    Ok(())
}

/// Validates engine configuration
fn validate_engine_config(config: &EngineConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_tasks < 1 || config.max_concurrent_tasks > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_tasks must be between 1 and 100, got {}",
            config.max_concurrent_tasks
        )));
    }

    if config.timeout_seconds < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_seconds must be >= 1, got {}",
            config.timeout_seconds
        )));
    }

    if config.max_concurrent_per_domain < 1 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_per_domain must be >= 1, got {}",
            config.max_concurrent_per_domain
        )));
    }

    if config.enable_auto_stop && config.auto_stop_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "auto_stop_timeout_secs must be >= 1 when enable_auto_stop is set".to_string(),
        ));
    }

    for pattern in &config.blocked_patterns {
        regex::Regex::new(pattern)
            .map_err(|e| ConfigError::InvalidPattern(format!("invalid blocked-pattern '{pattern}': {e}")))?;
    }

    for domain in &config.allowed_domains {
        validate_domain_pattern(domain)?;
    }

    for domain in &config.high_priority_domains {
        validate_domain_pattern(domain)?;
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    // Validate contact URL
    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    // Validate contact email (basic validation)
    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &crate::config::types::OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates retry policy configuration
fn validate_retry_policy_config(config: &RetryPolicyConfig) -> Result<(), ConfigError> {
    if config.backoff_multiplier <= 1.0 {
        return Err(ConfigError::Validation(format!(
            "backoff_multiplier must be > 1.0, got {}",
            config.backoff_multiplier
        )));
    }

    if config.max_delay_ms < config.initial_delay_ms {
        return Err(ConfigError::Validation(
            "max_delay_ms must be >= initial_delay_ms".to_string(),
        ));
    }

    Ok(())
}

/// Validates proxy pool configuration
fn validate_proxy_settings_config(config: &ProxySettingsConfig) -> Result<(), ConfigError> {
    if !config.enabled {
        return Ok(());
    }

    if config.proxy_urls.is_empty() {
        return Err(ConfigError::Validation(
            "proxy.enabled is true but proxy-urls is empty".to_string(),
        ));
    }

    match config.rotation_strategy.as_str() {
        "round-robin" | "random" | "by-success-rate" | "by-usage" => {}
        other => {
            return Err(ConfigError::Validation(format!(
                "unknown rotation-strategy '{other}', expected one of: round-robin, random, by-success-rate, by-usage"
            )))
        }
    }

    Ok(())
}

/// Validates the HTTP client pool configuration
fn validate_http_client_pool_config(config: &HttpClientPoolConfig) -> Result<(), ConfigError> {
    if config.max_clients < 1 {
        return Err(ConfigError::Validation(
            "max-clients must be >= 1".to_string(),
        ));
    }

    if config.max_clients_per_domain < 1 || config.max_clients_per_domain > config.max_clients {
        return Err(ConfigError::Validation(
            "max-clients-per-domain must be >= 1 and <= max-clients".to_string(),
        ));
    }

    Ok(())
}

/// Validates the domain delay manager configuration
fn validate_domain_delay_config(config: &DomainDelayConfig) -> Result<(), ConfigError> {
    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(
            "min-delay-ms must be <= max-delay-ms".to_string(),
        ));
    }

    if config.default_delay_ms < config.min_delay_ms || config.default_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(
            "default-delay-ms must fall within [min-delay-ms, max-delay-ms]".to_string(),
        ));
    }

    Ok(())
}

/// Validates quality domain entries
fn validate_quality_domains(domains: &[QualityEntry]) -> Result<(), ConfigError> {
    for entry in domains {
        validate_domain_pattern(&entry.domain)?;

        if entry.seeds.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Quality domain '{}' must have at least one seed URL",
                entry.domain
            )));
        }

        for seed in &entry.seeds {
            let url = Url::parse(seed).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e))
            })?;

            if url.scheme() != "https" {
                return Err(ConfigError::Validation(format!(
                    "Seed URL '{}' must use HTTPS scheme",
                    seed
                )));
            }
        }
    }

    Ok(())
}

/// Validates blacklist domain entries
fn validate_blacklist_domains(domains: &[DomainEntry]) -> Result<(), ConfigError> {
    for entry in domains {
        validate_domain_pattern(&entry.domain)?;
    }
    Ok(())
}

/// Validates stub domain entries
fn validate_stub_domains(domains: &[DomainEntry]) -> Result<(), ConfigError> {
    for entry in domains {
        validate_domain_pattern(&entry.domain)?;
    }
    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    // Check if it's a wildcard pattern
    if let Some(domain) = pattern.strip_prefix("*.") {
        // Validate the base domain part
        validate_domain_string(domain)?;
    } else {
        // Regular domain
        validate_domain_string(pattern)?;
    }

    Ok(())
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    // Check for invalid characters
    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    // Check that it doesn't start or end with a dot or hyphen
    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    // Check for consecutive dots
    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    // Must contain at least one dot (e.g., example.com, not just "example")
    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Basic email format check: must contain @ and have text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    // Domain part should contain at least one dot
    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_domain_pattern() {
        assert!(validate_domain_pattern("example.com").is_ok());
        assert!(validate_domain_pattern("*.example.com").is_ok());
        assert!(validate_domain_pattern("sub.example.com").is_ok());

        assert!(validate_domain_pattern("").is_err());
        assert!(validate_domain_pattern("*.").is_err());
        assert!(validate_domain_pattern("example").is_err());
        assert!(validate_domain_pattern(".example.com").is_err());
        assert!(validate_domain_pattern("example.com.").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
    }

    #[test]
    fn test_validate_engine_config_rejects_bad_concurrency() {
        let mut config = EngineConfig::default();
        config.max_concurrent_tasks = 0;
        assert!(validate_engine_config(&config).is_err());
    }

    #[test]
    fn test_validate_engine_config_rejects_bad_pattern() {
        let mut config = EngineConfig::default();
        config.blocked_patterns = vec!["[unterminated".to_string()];
        assert!(matches!(
            validate_engine_config(&config),
            Err(ConfigError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_validate_engine_config_auto_stop_requires_timeout() {
        let mut config = EngineConfig::default();
        config.enable_auto_stop = true;
        config.auto_stop_timeout_secs = 0;
        assert!(validate_engine_config(&config).is_err());
    }

    #[test]
    fn test_validate_retry_policy_rejects_weak_multiplier() {
        let mut config = RetryPolicyConfig::default();
        config.backoff_multiplier = 1.0;
        assert!(validate_retry_policy_config(&config).is_err());
    }

    #[test]
    fn test_validate_proxy_settings_requires_urls_when_enabled() {
        let config = ProxySettingsConfig {
            enabled: true,
            proxy_urls: vec![],
            rotation_strategy: "round-robin".to_string(),
        };
        assert!(validate_proxy_settings_config(&config).is_err());
    }

    #[test]
    fn test_validate_proxy_settings_rejects_unknown_strategy() {
        let config = ProxySettingsConfig {
            enabled: true,
            proxy_urls: vec!["http://127.0.0.1:8080".to_string()],
            rotation_strategy: "least-latency".to_string(),
        };
        assert!(validate_proxy_settings_config(&config).is_err());
    }

    #[test]
    fn test_validate_http_client_pool_caps_per_domain() {
        let mut config = HttpClientPoolConfig::default();
        config.max_clients = 4;
        config.max_clients_per_domain = 10;
        assert!(validate_http_client_pool_config(&config).is_err());
    }

    #[test]
    fn test_validate_domain_delay_bounds() {
        let mut config = DomainDelayConfig::default();
        config.min_delay_ms = 5000;
        config.max_delay_ms = 1000;
        assert!(validate_domain_delay_config(&config).is_err());
    }
}
