//! SQL Server connection over Tiberius.

use async_trait::async_trait;
use tiberius::{AuthMethod, Client, Config, EncryptionLevel};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, warn};

use super::common::SslMode;
use super::sql::SqlConnection;
use crate::config::TargetConfig;
use crate::error::DriverError;

/// A single SQL Server session.
pub struct MssqlConnection {
    client: Client<Compat<TcpStream>>,
}

impl MssqlConnection {
    /// Build the Tiberius configuration for `target`.
    pub fn tiberius_config(
        target: &TargetConfig,
        port: u16,
    ) -> std::result::Result<Config, DriverError> {
        let ssl_mode =
            SslMode::parse(&target.ssl_mode).map_err(|e| DriverError::Tls(e.to_string()))?;

        let mut config = Config::new();
        config.host(&target.host);
        config.port(port);
        config.database(&target.database);
        config.authentication(AuthMethod::sql_server(&target.user, &target.password));

        if ssl_mode.requires_tls() {
            if ssl_mode.trusts_any_cert() {
                config.trust_cert();
            }
            config.encryption(EncryptionLevel::Required);
        } else {
            config.encryption(EncryptionLevel::NotSupported);
        }
        Ok(config)
    }

    /// Open a session to `target` on `port`.
    pub async fn connect(
        target: &TargetConfig,
        port: u16,
    ) -> std::result::Result<Self, DriverError> {
        let config = Self::tiberius_config(target, port)?;
        let tcp = TcpStream::connect(config.get_addr()).await?;
        if let Err(e) = tcp.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY on SQL Server connection: {}", e);
        }

        let client = Client::connect(config, tcp.compat_write()).await?;
        debug!("SQL Server session opened");
        Ok(Self { client })
    }
}

#[async_trait]
impl SqlConnection for MssqlConnection {
    async fn execute(&mut self, sql: &str) -> std::result::Result<u64, DriverError> {
        let result = self.client.execute(sql, &[]).await?;
        Ok(result.total())
    }

    async fn close(self) -> std::result::Result<(), DriverError> {
        self.client.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(ssl_mode: &str) -> TargetConfig {
        TargetConfig {
            r#type: "mssql".to_string(),
            host: "sqlserver.internal".to_string(),
            port: None,
            database: "master".to_string(),
            user: "sa".to_string(),
            password: "A_Str0ng_Required_Password".to_string(),
            ssl_mode: ssl_mode.to_string(),
        }
    }

    #[test]
    fn test_config_uses_target_address() {
        let config = MssqlConnection::tiberius_config(&target("disable"), 11433).unwrap();
        assert_eq!(config.get_addr(), "sqlserver.internal:11433");
    }

    #[test]
    fn test_config_rejects_invalid_ssl_mode() {
        let result = MssqlConnection::tiberius_config(&target("maybe"), 1433);
        assert!(matches!(result, Err(DriverError::Tls(_))));
    }
}
