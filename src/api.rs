use crate::error::ApiError;
use crate::model::Interface;
use crate::scan::{SCAN_EXPRESSION, SCAN_TIMEOUT_SECS, ScanReport, ScanRequest};
use crate::submit::SetupParams;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

/// The traffic-control backend as seen by the console.
pub trait TcBackend: Send + Sync {
    fn init(&self) -> impl Future<Output = Result<Vec<Interface>, ApiError>> + Send;

    fn scan(
        &self,
        request: &ScanRequest,
    ) -> impl Future<Output = Result<ScanReport, ApiError>> + Send;

    fn query(&self, iface: &str) -> impl Future<Output = Result<TcConfig, ApiError>> + Send;

    fn reset(&self, iface: &str) -> impl Future<Output = Result<Value, ApiError>> + Send;

    fn setup(&self, params: &SetupParams) -> impl Future<Output = Result<Value, ApiError>> + Send;
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcConfig {
    #[serde(default)]
    pub cmd: String,
    #[serde(default)]
    pub output: String,
}

#[derive(Default, Deserialize)]
struct InitData {
    #[serde(default)]
    ifaces: Vec<Interface>,
}

#[derive(Clone)]
pub struct TcClient {
    http: reqwest::Client,
    base: Url,
}

impl TcClient {
    pub fn new(base: &str, timeout: Duration) -> Result<Self, ApiError> {
        let mut base = Url::parse(base).map_err(|err| ApiError::Url(format!("{base}: {err}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ApiError::Transport {
                url: base.to_string(),
                source,
            })?;
        Ok(Self { http, base })
    }

    pub fn url_for(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self
            .base
            .join(path)
            .map_err(|err| ApiError::Url(format!("{path}: {err}")))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url_for(path, query)?;
        let url_text = url.to_string();
        tracing::debug!("GET {url_text}");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url_text.clone(),
                source,
            })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ApiError::Transport {
                url: url_text.clone(),
                source,
            })?;

        decode_envelope(&url_text, status, body)
    }
}

fn decode_envelope<T: DeserializeOwned>(
    url: &str,
    status: reqwest::StatusCode,
    body: String,
) -> Result<T, ApiError> {
    let parsed: Option<Value> = serde_json::from_str(&body).ok();
    let code = parsed.as_ref().and_then(|v| v.get("code")).and_then(Value::as_i64);
    let message = parsed
        .as_ref()
        .and_then(|v| v.pointer("/data/message"))
        .and_then(Value::as_str)
        .map(str::to_string);

    if !status.is_success() {
        return Err(ApiError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            code,
            message,
            body,
        });
    }

    let Some(envelope) = parsed else {
        return Err(ApiError::Decode {
            url: url.to_string(),
            reason: "body is not JSON".into(),
            body,
        });
    };
    if let Some(code) = code.filter(|c| *c != 0) {
        return Err(ApiError::Backend {
            url: url.to_string(),
            status: status.as_u16(),
            code,
            message,
            body,
        });
    }

    let data = envelope.get("data").cloned().unwrap_or(Value::Null);
    serde_json::from_value(data).map_err(|err| ApiError::Decode {
        url: url.to_string(),
        reason: err.to_string(),
        body,
    })
}

impl TcBackend for TcClient {
    async fn init(&self) -> Result<Vec<Interface>, ApiError> {
        let data: Option<InitData> = self.get("init", &[]).await?;
        let ifaces = data.unwrap_or_default().ifaces;
        tracing::info!(
            "Backend reports interfaces: {}",
            ifaces
                .iter()
                .map(|i| i.name.as_str())
                .collect::<Vec<_>>()
                .join(",")
        );
        Ok(ifaces)
    }

    async fn scan(&self, request: &ScanRequest) -> Result<ScanReport, ApiError> {
        let ifaces = request.ifaces_param();
        tracing::info!("Scanning {ifaces} for {SCAN_TIMEOUT_SECS}s");
        let query = [
            ("ifaces", ifaces),
            ("timeout", SCAN_TIMEOUT_SECS.to_string()),
            ("exp", SCAN_EXPRESSION.to_string()),
        ];
        let report: Option<ScanReport> = self.get("scan", &query).await?;
        Ok(report.unwrap_or_default())
    }

    async fn query(&self, iface: &str) -> Result<TcConfig, ApiError> {
        let config: Option<TcConfig> = self
            .get("config/query", &[("iface", iface.to_string())])
            .await?;
        Ok(config.unwrap_or_default())
    }

    async fn reset(&self, iface: &str) -> Result<Value, ApiError> {
        self.get("config/reset", &[("iface", iface.to_string())])
            .await
    }

    async fn setup(&self, params: &SetupParams) -> Result<Value, ApiError> {
        self.get(params.endpoint().path(), params.pairs()).await
    }
}
