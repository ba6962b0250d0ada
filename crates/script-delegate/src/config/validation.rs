//! Configuration validation.

use super::Config;
use crate::drivers::common::SslMode;
use crate::error::{DelegateError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    let target = &config.target;
    let kind = target.kind()?;

    if target.host.trim().is_empty() {
        return Err(DelegateError::Config("target.host is required".into()));
    }
    if let Some(0) = target.port {
        return Err(DelegateError::Config("target.port must be non-zero".into()));
    }

    SslMode::parse(&target.ssl_mode)?;

    if kind.is_sql() {
        if target.database.is_empty() {
            return Err(DelegateError::Config(format!(
                "target.database is required for {} targets",
                kind.name()
            )));
        }
        if target.user.is_empty() {
            return Err(DelegateError::Config(format!(
                "target.user is required for {} targets",
                kind.name()
            )));
        }
    }

    #[cfg(not(feature = "mysql"))]
    if kind == super::DatabaseKind::Mysql {
        return Err(DelegateError::Config(
            "mysql targets require the 'mysql' feature".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseKind, TargetConfig};
    use crate::core::ExecutionPolicy;

    fn valid_config() -> Config {
        Config {
            target: TargetConfig {
                r#type: "postgres".to_string(),
                host: "localhost".to_string(),
                port: Some(5432),
                database: "app".to_string(),
                user: "postgres".to_string(),
                password: "password".to_string(),
                ssl_mode: "disable".to_string(),
            },
            execution: ExecutionPolicy::default(),
            reuse: None,
        }
    }

    #[test]
    fn test_valid_config() {
        let config = valid_config();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_missing_host() {
        let mut config = valid_config();
        config.target.host = "  ".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_unknown_type() {
        let mut config = valid_config();
        config.target.r#type = "oracle".to_string();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("Unknown database type: 'oracle'"));
    }

    #[test]
    fn test_zero_port() {
        let mut config = valid_config();
        config.target.port = Some(0);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_invalid_ssl_mode() {
        let mut config = valid_config();
        config.target.ssl_mode = "prefer".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_sql_target_requires_database_and_user() {
        let mut config = valid_config();
        config.target.database.clear();
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.target.user.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_cassandra_target_needs_only_host() {
        let mut config = valid_config();
        config.target.r#type = "cassandra".to_string();
        config.target.port = None;
        config.target.database.clear();
        config.target.user.clear();
        assert!(validate(&config).is_ok());
        assert_eq!(config.target.kind().unwrap(), DatabaseKind::Cassandra);
        assert_eq!(config.target.address().unwrap(), "localhost:9042");
    }

    #[test]
    fn test_default_ports() {
        let mut config = valid_config();
        config.target.port = None;
        assert_eq!(config.target.effective_port().unwrap(), 5432);
        config.target.r#type = "sqlserver".to_string();
        assert_eq!(config.target.effective_port().unwrap(), 1433);
    }

    #[test]
    fn test_target_config_debug_redacts_password() {
        let mut config = valid_config();
        config.target.password = "super_secret_password_456".to_string();
        let debug_output = format!("{:?}", config.target);
        assert!(
            debug_output.contains("[REDACTED]"),
            "Debug output should contain [REDACTED]"
        );
        assert!(
            !debug_output.contains("super_secret_password_456"),
            "Debug output should not contain actual password value"
        );
    }

    #[test]
    fn test_from_yaml_with_execution_and_reuse() {
        let yaml = r#"
target:
  type: postgres
  host: db.internal
  database: app
  user: app
  password: secret
execution:
  ignore_failed_drops: true
reuse:
  container_name: pg-fixture
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.target.ssl_mode, "disable");
        assert_eq!(config.target.effective_port().unwrap(), 5432);
        assert_eq!(config.execution, ExecutionPolicy::new(false, true));

        let reuse = config.reuse.unwrap();
        assert_eq!(reuse.container_name(), "pg-fixture");
        assert!(reuse.is_enabled());
    }

    #[test]
    fn test_from_yaml_rejects_blank_reuse_name() {
        let yaml = r#"
target:
  type: cassandra
  host: localhost
reuse:
  container_name: ""
"#;
        assert!(Config::from_yaml(yaml).is_err());
    }
}
