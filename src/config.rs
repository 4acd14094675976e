use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub struct AppConfig {
    pub http_bind: String,
    pub api_base: String,
    pub preferences_path: PathBuf,
    pub backend_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            http_bind: env_var("HTTP_BIND", "0.0.0.0:2024"),
            api_base: env_var("TC_API_BASE", "http://127.0.0.1:2023/tc/api/v1/"),
            preferences_path: PathBuf::from(env_var(
                "PREFERENCES_PATH",
                "tc-console-preferences.json",
            )),
            backend_timeout: Duration::from_secs(
                env_var("BACKEND_TIMEOUT_SECS", "30").parse().unwrap_or(30),
            ),
        }
    }

    /// Port the console listens on. The backend leaves it out of any shaping
    /// so the operator does not lock themselves out.
    pub fn api_port(&self) -> Option<u16> {
        self.http_bind
            .parse::<SocketAddr>()
            .ok()
            .map(|addr| addr.port())
            .or_else(|| self.http_bind.rsplit(':').next()?.parse().ok())
    }
}

fn env_var(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
