//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (optional): PostgreSQL connection string. Without it the
///   service keeps licenses in memory, which is only useful for local runs.
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `UPSTREAM_URL` (optional): chat endpoint requests are forwarded to
/// - `ADMIN_TOKEN` (optional): bearer token guarding `/api/*`
/// - `PANEL_PATH` (optional): admin panel HTML file
/// - `DEVELOPER_NAME` / `DEVELOPER_ID` (optional): echoed in proxy responses
/// - `LOG_FILE` (optional): extra JSON log destination
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: Option<String>,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,

    pub admin_token: Option<String>,

    #[serde(default = "default_panel_path")]
    pub panel_path: String,

    #[serde(default = "default_developer_name")]
    pub developer_name: String,

    #[serde(default = "default_developer_id")]
    pub developer_id: String,

    pub log_file: Option<String>,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_upstream_url() -> String {
    "https://api.binjie.fun/api/generateStream".to_string()
}

fn default_panel_path() -> String {
    "public/panel.html".to_string()
}

fn default_developer_name() -> String {
    "Ehsan Fazli".to_string()
}

fn default_developer_id() -> String {
    "@abj0o".to_string()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable value cannot be parsed
    /// into its expected type (e.g. a non-numeric `SERVER_PORT`).
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: upstream_url -> UPSTREAM_URL
        envy::from_env::<Config>()
    }

    /// Admin token, ignoring an empty `ADMIN_TOKEN=` line.
    pub fn admin_token(&self) -> Option<&str> {
        self.admin_token.as_deref().filter(|token| !token.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_variables_are_absent() {
        let config: Config = envy::from_iter(Vec::<(String, String)>::new()).unwrap();

        assert_eq!(config.server_port, 3000);
        assert_eq!(config.upstream_url, default_upstream_url());
        assert_eq!(config.panel_path, "public/panel.html");
        assert!(config.database_url.is_none());
        assert!(config.admin_token().is_none());
    }

    #[test]
    fn empty_admin_token_counts_as_unset() {
        let config: Config = envy::from_iter(vec![
            ("ADMIN_TOKEN".to_string(), String::new()),
            ("SERVER_PORT".to_string(), "8080".to_string()),
        ])
        .unwrap();

        assert_eq!(config.server_port, 8080);
        assert!(config.admin_token().is_none());
    }
}
