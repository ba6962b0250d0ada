//! MySQL/MariaDB connection (feature `mysql`).

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder, SslOpts};
use tracing::debug;

use super::common::SslMode;
use super::sql::SqlConnection;
use crate::config::TargetConfig;
use crate::error::DriverError;

/// A single MySQL session.
pub struct MysqlConnection {
    conn: Conn,
}

impl MysqlConnection {
    /// Build connection options for `target`.
    pub fn opts(target: &TargetConfig, port: u16) -> std::result::Result<Opts, DriverError> {
        let ssl_mode =
            SslMode::parse(&target.ssl_mode).map_err(|e| DriverError::Tls(e.to_string()))?;

        let mut builder = OptsBuilder::default()
            .ip_or_hostname(&target.host)
            .tcp_port(port)
            .db_name(Some(&target.database))
            .user(Some(&target.user))
            .pass(Some(&target.password))
            .init(vec!["SET NAMES utf8mb4"]);

        if ssl_mode.requires_tls() {
            let ssl = SslOpts::default().with_danger_accept_invalid_certs(ssl_mode.trusts_any_cert());
            builder = builder.ssl_opts(ssl);
        }
        Ok(builder.into())
    }

    /// Open a session to `target` on `port`.
    pub async fn connect(
        target: &TargetConfig,
        port: u16,
    ) -> std::result::Result<Self, DriverError> {
        let conn = Conn::new(Self::opts(target, port)?).await?;
        debug!("MySQL session opened");
        Ok(Self { conn })
    }
}

#[async_trait]
impl SqlConnection for MysqlConnection {
    async fn execute(&mut self, sql: &str) -> std::result::Result<u64, DriverError> {
        self.conn.query_drop(sql).await?;
        Ok(self.conn.affected_rows())
    }

    async fn close(self) -> std::result::Result<(), DriverError> {
        self.conn.disconnect().await?;
        Ok(())
    }
}
