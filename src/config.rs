use crate::generation::credentials::{Credential, CredentialPool};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_STABILITY_ENDPOINT: &str =
    "https://api.stability.ai/v2beta/stable-image/control/structure";
pub const DEFAULT_STABILITY_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 16 * 1024 * 1024;
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATABASE_FILE: &str = "app.db";

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn flag(value: Option<String>, default: bool) -> bool {
    value.map_or(default, |val| val.trim().eq_ignore_ascii_case("true"))
}

/// Upstream image transformation endpoint settings.
#[derive(Debug, Clone)]
pub struct StabilitySettings {
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for StabilitySettings {
    fn default() -> Self {
        StabilitySettings {
            endpoint: DEFAULT_STABILITY_ENDPOINT.to_string(),
            timeout: Duration::from_secs(DEFAULT_STABILITY_TIMEOUT_SECS),
        }
    }
}

impl StabilitySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let endpoint = non_empty(lookup("STABILITY_API_URL")).unwrap_or(defaults.endpoint);
        let timeout = lookup("STABILITY_TIMEOUT_SECS")
            .and_then(|secs| secs.trim().parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        StabilitySettings { endpoint, timeout }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<Credential>,
    pub model: String,
    pub base_url: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        OpenAiConfig {
            api_key: None,
            model: DEFAULT_OPENAI_MODEL.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
        }
    }
}

impl OpenAiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        OpenAiConfig {
            api_key: non_empty(lookup("OPENAI_API_KEY")).map(Credential::new),
            model: non_empty(lookup("OPENAI_MODEL")).unwrap_or(defaults.model),
            base_url: non_empty(lookup("OPENAI_BASE_URL"))
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(Credential::new(api_key));
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub server: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<Credential>,
    pub recipient: Option<String>,
    pub use_tls: bool,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        SmtpConfig {
            server: None,
            port: 587,
            username: None,
            password: None,
            recipient: None,
            use_tls: true,
        }
    }
}

impl SmtpConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        SmtpConfig {
            server: non_empty(lookup("SMTP_SERVER")),
            port: lookup("SMTP_PORT")
                .and_then(|port| port.trim().parse().ok())
                .unwrap_or(587),
            username: non_empty(lookup("SMTP_USERNAME")),
            password: non_empty(lookup("SMTP_PASSWORD")).map(Credential::new),
            recipient: non_empty(lookup("CONTACT_EMAIL_TO")),
            use_tls: flag(lookup("SMTP_USE_TLS"), true),
        }
    }

    pub fn with_server(mut self, server: impl Into<String>, port: u16) -> Self {
        self.server = Some(server.into());
        self.port = port;
        self
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(Credential::new(password));
        self
    }

    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    /// Explicit recipient, or the SMTP username when none is set.
    pub fn recipient(&self) -> Option<&str> {
        self.recipient.as_deref().or(self.username.as_deref())
    }
}

#[derive(Debug, Clone, Default)]
pub struct PostgresConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
}

impl PostgresConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        PostgresConfig {
            host: lookup("POSTGRES_HOST"),
            port: lookup("POSTGRES_PORT").and_then(|s| s.parse().ok()),
            username: lookup("POSTGRES_USERNAME"),
            password: lookup("POSTGRES_PASSWORD"),
            database: lookup("POSTGRES_DATABASE"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: Option<u16>,
    pub base_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub result_dir: PathBuf,
    /// SQLite file holding accounts unless PostgreSQL is enabled.
    pub database_path: PathBuf,
    pub max_content_length: usize,
    pub credentials: CredentialPool,
    pub stability: StabilitySettings,
    pub openai: OpenAiConfig,
    pub smtp: SmtpConfig,
    pub use_psql: bool,
    pub postgres: Option<PostgresConfig>,
}

impl Default for Config {
    fn default() -> Self {
        let base_dir = PathBuf::from(".");
        Config {
            host: "127.0.0.1".to_string(),
            port: None,
            upload_dir: base_dir.join("uploads"),
            result_dir: base_dir.join("results"),
            database_path: base_dir.join(DEFAULT_DATABASE_FILE),
            base_dir,
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            credentials: CredentialPool::default(),
            stability: StabilitySettings::default(),
            openai: OpenAiConfig::default(),
            smtp: SmtpConfig::default(),
            use_psql: false,
            postgres: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_dir = non_empty(lookup("BASE_DIR"))
            .map(PathBuf::from)
            .or_else(|| env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        let mut config = Config::new().with_base_dir(&base_dir);
        config.host = non_empty(lookup("HOST")).unwrap_or(config.host);
        config.port = lookup("PORT").and_then(|port| port.trim().parse().ok());
        if let Some(dir) = non_empty(lookup("UPLOAD_FOLDER")) {
            config.upload_dir = PathBuf::from(dir);
        }
        if let Some(dir) = non_empty(lookup("RESULT_FOLDER")) {
            config.result_dir = PathBuf::from(dir);
        }
        if let Some(path) = non_empty(lookup("DATABASE_PATH")) {
            config.database_path = PathBuf::from(path);
        }
        config.max_content_length = lookup("MAX_CONTENT_LENGTH")
            .and_then(|len| len.trim().parse().ok())
            .unwrap_or(DEFAULT_MAX_CONTENT_LENGTH);
        config.credentials = CredentialPool::from_lookup(&lookup);
        config.stability = StabilitySettings::from_lookup(&lookup);
        config.openai = OpenAiConfig::from_lookup(&lookup);
        config.smtp = SmtpConfig::from_lookup(&lookup);
        config.use_psql = flag(lookup("USE_PSQL"), false);
        if config.use_psql {
            config.postgres = Some(PostgresConfig::from_lookup(&lookup));
        }
        config
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the base directory and moves uploads, results and the account
    /// database underneath it.
    pub fn with_base_dir(mut self, base_dir: impl AsRef<Path>) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        self.upload_dir = base_dir.join("uploads");
        self.result_dir = base_dir.join("results");
        self.database_path = base_dir.join(DEFAULT_DATABASE_FILE);
        self.base_dir = base_dir;
        self
    }

    pub fn with_credentials(mut self, credentials: CredentialPool) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_stability(mut self, settings: StabilitySettings) -> Self {
        self.stability = settings;
        self
    }

    pub fn with_openai(mut self, config: OpenAiConfig) -> Self {
        self.openai = config;
        self
    }

    pub fn with_smtp(mut self, config: SmtpConfig) -> Self {
        self.smtp = config;
        self
    }

    pub fn with_postgres(mut self, config: PostgresConfig) -> Self {
        self.postgres = Some(config);
        self.use_psql = true;
        self
    }

    pub fn with_database_path(mut self, path: impl AsRef<Path>) -> Self {
        self.database_path = path.as_ref().to_path_buf();
        self
    }

    pub fn with_max_content_length(mut self, bytes: usize) -> Self {
        self.max_content_length = bytes;
        self
    }
}
