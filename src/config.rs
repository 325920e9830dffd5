/// Base URL used when the production flag is absent or falsy.
pub const DEV_BASE_URL: &str = "http://localhost:55555";

/// Base URL used in production, where the service is reverse-proxied
/// under the same origin as the web front end.
pub const PROD_BASE_URL: &str = "/api";

/// Environment variable selecting the production endpoint.
pub const PRODUCTION_FLAG: &str = "CHIQUINHO_PRODUCTION";

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
}

impl Config {
    /// Read the production/development flag once at startup. There is no
    /// other configuration surface.
    pub fn from_env() -> Self {
        let flag = std::env::var(PRODUCTION_FLAG).ok();
        Self {
            base_url: resolve(flag.as_deref()).to_string(),
        }
    }
}

/// A missing or non-truthy flag means development.
pub fn resolve(flag: Option<&str>) -> &'static str {
    match flag {
        Some(value) if is_truthy(value) => PROD_BASE_URL,
        _ => DEV_BASE_URL,
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}
