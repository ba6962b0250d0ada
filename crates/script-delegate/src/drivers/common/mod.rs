//! Helpers shared by the SQL connection implementations.

pub mod tls;

pub use tls::SslMode;
