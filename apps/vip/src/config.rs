//! Server configuration.
//!
//! Values come from CLI flags with environment fallbacks (see [`crate::cli`]):
//! `HOST`, `PORT`, `VIP_DB_PATH`, `VIP_API_KEY`, `VIP_RATE_LIMIT`.

use std::path::PathBuf;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_PATH: &str = "vip.redb";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// When set, `/vip/*` routes require `Authorization: Bearer <key>`.
    pub api_key: Option<String>,
    /// Requests per second across all clients. 0 disables limiting.
    pub rate_limit: u32,
}

impl ServerConfig {
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            api_key: None,
            rate_limit: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_binds_all_interfaces() {
        assert_eq!(ServerConfig::default().bind_address(), "0.0.0.0:3000");
    }
}
