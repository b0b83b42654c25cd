use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataServiceConfig {
    pub url: String,
    pub admin_secret: String,
    pub timeout_secs: u64,
    /// Local-dev escape hatch only; certificate validation stays on unless
    /// this is explicitly set to "true".
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub data_service: DataServiceConfig,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parse configuration out of any name/value lookup; tests feed this a
    /// map instead of touching process-global env vars.
    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let require =
            |key: &str| get(key).ok_or_else(|| anyhow::anyhow!("{key} is not set"));

        let data_service = DataServiceConfig {
            url: require("DATA_SERVICE_URL")?,
            admin_secret: require("DATA_SERVICE_ADMIN_SECRET")?,
            timeout_secs: get("DATA_SERVICE_TIMEOUT_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(10),
            accept_invalid_certs: get("DATA_SERVICE_ACCEPT_INVALID_CERTS")
                .map(|v| v == "true")
                .unwrap_or(false),
        };
        let jwt = JwtConfig {
            secret: require("JWT_SECRET")?,
            ttl_hours: get("JWT_TTL_HOURS")
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(24),
        };
        if jwt.secret.is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }
        if jwt.ttl_hours <= 0 {
            anyhow::bail!("JWT_TTL_HOURS must be positive");
        }
        Ok(Self { data_service, jwt })
    }
}
