use crate::config::AppConfig;
use crate::logger::Logger;
use serde::Deserialize;
use std::time::Duration;

// ── Response types (BrasilAPI CNPJ payload) ─────────────────────────────

fn not_available() -> String {
    "N/A".to_string()
}

/// One company as returned by `GET {base}/{cnpj}`.
///
/// Only the fields the formatter renders are declared; everything else in
/// the payload is ignored. Fields the API always sends get an "N/A" default
/// so a partial payload still deserializes; truly optional fields stay
/// `Option` and the formatter substitutes its own placeholder.
#[derive(Debug, Clone, Deserialize)]
pub struct CompanyRecord {
    #[serde(default = "not_available")]
    pub razao_social: String,
    #[serde(default = "not_available")]
    pub nome_fantasia: String,
    #[serde(default = "not_available")]
    pub municipio: String,
    #[serde(default = "not_available")]
    pub uf: String,
    #[serde(default = "not_available")]
    pub descricao_situacao_cadastral: String,
    #[serde(default = "not_available")]
    pub cnae_fiscal_descricao: String,
    #[serde(default)]
    pub ddd_telefone_1: Option<String>,
    #[serde(default)]
    pub porte: Option<String>,
}

// ── Client ──────────────────────────────────────────────────────────────

/// Thin client for the public company registry.
///
/// One bounded-timeout GET per lookup, no retry: any non-200 status,
/// transport failure or unparseable body is logged and collapses to `None`
/// so callers deal with a clean optional instead of a propagated fault.
pub struct RegistryClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl RegistryClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.registry_api_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    /// Fetch one company by CNPJ. Absent on any failure.
    pub async fn fetch_company(&self, cnpj: &str, logger: &Logger) -> Option<CompanyRecord> {
        let url = format!("{}/{}", self.base_url, cnpj);

        let resp = match self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                let _ = logger.log_error(&format!("registry request failed for {cnpj}: {e}"));
                return None;
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let _ = logger.log_error(&format!("registry returned {status} for {cnpj}"));
            return None;
        }

        match resp.json::<CompanyRecord>().await {
            Ok(record) => Some(record),
            Err(e) => {
                let _ = logger.log_error(&format!("registry body unreadable for {cnpj}: {e}"));
                None
            }
        }
    }
}
