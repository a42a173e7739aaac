use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub oauth: OAuthConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub recommendations: RecommendationsConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Where OAuth callbacks send the browser back to
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
    /// Origins allowed by CORS
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            api_port: default_api_port(),
            data_dir: default_data_dir(),
            frontend_url: default_frontend_url(),
            cors_origins: default_cors_origins(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    5000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Lifetime of a login session in days
    #[serde(default = "default_session_ttl_days")]
    pub session_ttl_days: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_days: default_session_ttl_days(),
        }
    }
}

fn default_session_ttl_days() -> i64 {
    7
}

/// Ten years
const MAX_SESSION_TTL_DAYS: i64 = 3650;

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OAuthConfig {
    #[serde(default)]
    pub spotify: Option<OAuthProviderConfig>,
    #[serde(default)]
    pub google: Option<OAuthProviderConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthProviderConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// OAuth redirect URI (callback URL)
    pub redirect_uri: Option<String>,
}

impl OAuthProviderConfig {
    /// Redirect URI, falling back to this server's own callback route
    pub fn redirect_uri_or(&self, fallback: &str) -> String {
        self.redirect_uri
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Endpoints and limits for outbound calls
#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersConfig {
    /// Timeout applied to every outbound request, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Number of tracks requested from a search provider
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
    #[serde(default = "default_spotify_api_url")]
    pub spotify_api_url: String,
    #[serde(default = "default_spotify_accounts_url")]
    pub spotify_accounts_url: String,
    #[serde(default = "default_saavn_api_url")]
    pub saavn_api_url: String,
    #[serde(default = "default_google_auth_url")]
    pub google_auth_url: String,
    #[serde(default = "default_google_token_url")]
    pub google_token_url: String,
    #[serde(default = "default_google_userinfo_url")]
    pub google_userinfo_url: String,
}

impl ProvidersConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            search_limit: default_search_limit(),
            spotify_api_url: default_spotify_api_url(),
            spotify_accounts_url: default_spotify_accounts_url(),
            saavn_api_url: default_saavn_api_url(),
            google_auth_url: default_google_auth_url(),
            google_token_url: default_google_token_url(),
            google_userinfo_url: default_google_userinfo_url(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_search_limit() -> u32 {
    10
}

fn default_spotify_api_url() -> String {
    "https://api.spotify.com".to_string()
}

fn default_spotify_accounts_url() -> String {
    "https://accounts.spotify.com".to_string()
}

fn default_saavn_api_url() -> String {
    "https://saavn.dev".to_string()
}

fn default_google_auth_url() -> String {
    "https://accounts.google.com/o/oauth2/v2/auth".to_string()
}

fn default_google_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_google_userinfo_url() -> String {
    "https://www.googleapis.com/oauth2/v3/userinfo".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationsConfig {
    /// Languages offered when a recommendation request names none
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
}

impl Default for RecommendationsConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
        }
    }
}

pub fn default_languages() -> Vec<String> {
    ["Hindi", "English", "Bengali", "Marathi", "Telugu", "Tamil"]
        .iter()
        .map(|l| l.to_string())
        .collect()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ClassifierConfig {
    /// HTTP endpoint of the facial emotion inference service.
    /// Image detection answers 503 when unset.
    pub endpoint: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| "Failed to parse configuration file")?;
            config.validate()?;
            Ok(config)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    /// Reject values that would break request handling at runtime
    pub fn validate(&self) -> Result<()> {
        let ttl = self.auth.session_ttl_days;
        if !(1..=MAX_SESSION_TTL_DAYS).contains(&ttl) {
            bail!(
                "auth.session_ttl_days must be between 1 and {}, got {}",
                MAX_SESSION_TTL_DAYS,
                ttl
            );
        }
        Ok(())
    }
}
