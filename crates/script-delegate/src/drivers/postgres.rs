//! PostgreSQL connection.

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};
use tracing::debug;

use super::common::SslMode;
use super::sql::SqlConnection;
use crate::config::TargetConfig;
use crate::error::DriverError;

type DriverTask = JoinHandle<std::result::Result<(), tokio_postgres::Error>>;

/// A single PostgreSQL session.
///
/// The protocol task is spawned on the current runtime and joined on close.
pub struct PgConnection {
    client: Client,
    driver: DriverTask,
}

impl PgConnection {
    /// Build the client configuration for `target`.
    pub fn pg_config(target: &TargetConfig, port: u16) -> tokio_postgres::Config {
        let mut pg = tokio_postgres::Config::new();
        pg.host(&target.host)
            .port(port)
            .dbname(&target.database)
            .user(&target.user)
            .password(&target.password)
            .application_name("script-delegate");
        pg
    }

    /// Open a session to `target` on `port`.
    pub async fn connect(
        target: &TargetConfig,
        port: u16,
    ) -> std::result::Result<Self, DriverError> {
        let ssl_mode =
            SslMode::parse(&target.ssl_mode).map_err(|e| DriverError::Tls(e.to_string()))?;
        Self::open(Self::pg_config(target, port), ssl_mode).await
    }

    async fn open(
        pg: tokio_postgres::Config,
        ssl_mode: SslMode,
    ) -> std::result::Result<Self, DriverError> {
        let (client, driver) = match ssl_mode.postgres_connector() {
            Some(tls) => {
                let (client, connection) = pg.connect(tls).await?;
                (client, tokio::spawn(connection))
            }
            None => {
                debug!("PostgreSQL connection is not encrypted (ssl_mode=disable)");
                let (client, connection) = pg.connect(NoTls).await?;
                (client, tokio::spawn(connection))
            }
        };
        debug!("PostgreSQL session opened");
        Ok(Self { client, driver })
    }
}

#[async_trait]
impl SqlConnection for PgConnection {
    async fn execute(&mut self, sql: &str) -> std::result::Result<u64, DriverError> {
        let messages = self.client.simple_query(sql).await?;
        Ok(messages
            .iter()
            .map(|m| match m {
                SimpleQueryMessage::CommandComplete(rows) => *rows,
                _ => 0,
            })
            .sum())
    }

    async fn close(self) -> std::result::Result<(), DriverError> {
        let Self { client, driver } = self;
        // The protocol task finishes once the last client handle is gone.
        drop(client);
        match driver.await {
            Ok(result) => result.map_err(DriverError::from),
            Err(e) => Err(DriverError::Other(format!(
                "PostgreSQL connection task failed: {}",
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> TargetConfig {
        TargetConfig {
            r#type: "postgres".to_string(),
            host: "db.internal".to_string(),
            port: None,
            database: "app".to_string(),
            user: "app_user".to_string(),
            password: "secret".to_string(),
            ssl_mode: "disable".to_string(),
        }
    }

    #[test]
    fn test_pg_config_carries_target_fields() {
        let pg = PgConnection::pg_config(&target(), 15432);
        assert_eq!(pg.get_ports(), &[15432]);
        assert_eq!(pg.get_dbname(), Some("app"));
        assert_eq!(pg.get_user(), Some("app_user"));
        assert_eq!(pg.get_application_name(), Some("script-delegate"));
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_ssl_mode() {
        let mut target = target();
        target.ssl_mode = "sometimes".to_string();
        let err = PgConnection::connect(&target, 5432).await.err().unwrap();
        assert!(matches!(err, DriverError::Tls(_)));
    }
}
