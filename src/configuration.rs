use anyhow::Context;
use std::env;

use crate::geo::DEFAULT_CENTRAL_ZONE;
use crate::util::line::LINE_API_BASE_URL;
use crate::util::telegram::TELEGRAM_API_BASE_URL;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub staff_api_key: String,
    pub line_api_base_url: String,
    pub telegram_api_base_url: String,
    pub image_dir: String,
    pub image_base_url: String,
    pub central_zone_name: String,
}

impl Settings {
    /// Reads the process environment; call after `dotenv()`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let port = match var("APP_PORT") {
            Some(raw) => raw.parse().with_context(|| format!("APP_PORT is not a port: {raw}"))?,
            None => 8080,
        };

        Ok(Self {
            database_url: var("DATABASE_URL").context("DATABASE_URL must be set")?,
            host: or("APP_HOST", "127.0.0.1"),
            port,
            staff_api_key: var("STAFF_API_KEY").context("STAFF_API_KEY must be set")?,
            line_api_base_url: or("LINE_API_BASE_URL", LINE_API_BASE_URL),
            telegram_api_base_url: or("TELEGRAM_API_BASE_URL", TELEGRAM_API_BASE_URL),
            image_dir: or("IMAGE_DIR", "./uploads"),
            image_base_url: or("IMAGE_BASE_URL", "/uploads"),
            central_zone_name: or("CENTRAL_ZONE_NAME", DEFAULT_CENTRAL_ZONE),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> anyhow::Result<Settings> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_fill_optional_values() {
        let settings = settings(&[("DATABASE_URL", "mysql://localhost/complaints"), ("STAFF_API_KEY", "k")]).unwrap();

        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.line_api_base_url, "https://api.line.me");
        assert_eq!(settings.telegram_api_base_url, "https://api.telegram.org");
        assert_eq!(settings.image_dir, "./uploads");
        assert_eq!(settings.central_zone_name, "โซนกลาง");
    }

    #[test]
    fn required_values_must_be_present() {
        let err = settings(&[("DATABASE_URL", "mysql://x"), ("STAFF_API_KEY", "  ")]).unwrap_err();
        assert!(err.to_string().contains("STAFF_API_KEY"));

        assert!(settings(&[("STAFF_API_KEY", "k")]).is_err());
    }

    #[test]
    fn bad_port_is_reported() {
        let err = settings(&[("DATABASE_URL", "mysql://x"), ("STAFF_API_KEY", "k"), ("APP_PORT", "eighty")])
            .unwrap_err();
        assert!(err.to_string().contains("APP_PORT"));
    }
}
