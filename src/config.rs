use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";
pub const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
pub const DRIVE_UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";

/// Loaded once for the binary. Library code takes values explicitly.
pub static CONFIG: LazyLock<Config> =
    LazyLock::new(|| Config::load().expect("FATAL: failed to load configuration"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Discord user allowed to run owner-only commands.
    pub owner_id: i64,
    /// Drive folder every upload is placed under.
    pub cutegirls_parent: String,
    /// Shared secret the chat front-end presents to the command gateway.
    pub gateway_key: String,
    pub database_url: String,
    pub client_secrets_path: PathBuf,
    pub token_path: PathBuf,
    pub redirect_url: Url,
    pub listen_addr: String,
    pub loglevel: String,
    pub proxy: Option<Url>,
    pub download_cache_size: usize,
    pub max_upload_bytes: usize,
    pub http_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            owner_id: 0,
            cutegirls_parent: String::new(),
            gateway_key: String::new(),
            database_url: "sqlite:./data/dynamic/ouka2.db".to_string(),
            client_secrets_path: PathBuf::from("client_secrets.json"),
            token_path: PathBuf::from("token.json"),
            redirect_url: Url::parse("http://localhost:8000/auth/callback")
                .expect("static redirect url is valid"),
            listen_addr: "0.0.0.0:8000".to_string(),
            loglevel: "info".to_string(),
            proxy: None,
            download_cache_size: 50,
            max_upload_bytes: 25 * 1024 * 1024,
            http_timeout_secs: 60,
        }
    }
}

impl Config {
    /// Defaults, then the bare `OWNER_ID`/`CUTEGIRLS_PARENT` names, then `OUKA_*`.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::raw().only(&["owner_id", "cutegirls_parent"]))
            .merge(Env::prefixed("OUKA_"))
            .extract()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.cutegirls_parent.trim().is_empty() {
            return Err("CUTEGIRLS_PARENT must name the Drive upload folder".to_string());
        }
        if self.gateway_key.trim().is_empty() {
            return Err("OUKA_GATEWAY_KEY must be set for the command gateway".to_string());
        }
        if self.download_cache_size == 0 {
            return Err("download_cache_size must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }

    /// HTTP client shared by the Drive session and the Drive API.
    pub fn http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("ouka2/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .timeout(self.http_timeout());
        if let Some(proxy_url) = self.proxy.as_ref() {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
        }
        builder.build()
    }
}
