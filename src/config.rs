use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Application configuration, loaded from `cnpjbot.toml`.
///
/// The bot token deliberately lives outside this file — it is a secret and
/// comes from the `TOKEN` environment variable instead.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub registry_api_url: String,
    pub telegram_api_url: String,
    pub db_path: String,
    pub csv_path: String,
    pub request_timeout_secs: u64,
    pub poll_timeout_secs: u64,
    pub city_result_limit: u32,
    pub require_authorization: bool,
    pub log_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            registry_api_url: "https://brasilapi.com.br/api/cnpj/v1".to_string(),
            telegram_api_url: "https://api.telegram.org".to_string(),
            db_path: "dados.db".to_string(),
            csv_path: "empresas.csv".to_string(),
            request_timeout_secs: 10,
            poll_timeout_secs: 30,
            city_result_limit: 10,
            require_authorization: false,
            log_dir: "logs".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration with the chain: `./cnpjbot.toml` -> `~/cnpjbot.toml` -> defaults.
    pub fn load() -> Self {
        let candidates = Self::config_paths();
        for path in &candidates {
            if let Ok(contents) = fs::read_to_string(path) {
                match toml::from_str::<AppConfig>(&contents) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: failed to parse {}: {}", path.display(), e);
                    }
                }
            }
        }
        Self::default()
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("cnpjbot.toml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join("cnpjbot.toml"));
        }
        paths
    }
}
