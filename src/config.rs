use std::env;
use std::time::Duration;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,

    // Session signing key; OAuth login is disabled without it.
    pub secret_key: Option<String>,

    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub oauth_redirect_uri: String,
    pub post_login_redirect: String,

    pub openai_api_key: Option<String>,
    pub openai_api_base: String,
    pub openai_model: String,
    pub analyzer_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "memory://".into(),
            host: "0.0.0.0".into(),
            port: 10000,
            cors_origins: Vec::new(),
            secret_key: None,
            google_client_id: None,
            google_client_secret: None,
            oauth_redirect_uri: "http://localhost:10000/callback".into(),
            post_login_redirect: "/".into(),
            openai_api_key: None,
            openai_api_base: "https://api.openai.com/v1".into(),
            openai_model: "gpt-4".into(),
            analyzer_timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            host: env::var("HOST").unwrap_or(defaults.host),
            port: match env::var("PORT") {
                Ok(raw) => raw.parse().context("PORT must be a number")?,
                Err(_) => defaults.port,
            },
            cors_origins: env::var("CORS_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),

            secret_key: non_empty("SECRET_KEY"),

            google_client_id: non_empty("GOOGLE_CLIENT_ID"),
            google_client_secret: non_empty("GOOGLE_CLIENT_SECRET"),
            oauth_redirect_uri: env::var("OAUTH_REDIRECT_URI")
                .unwrap_or(defaults.oauth_redirect_uri),
            post_login_redirect: env::var("POST_LOGIN_REDIRECT")
                .unwrap_or(defaults.post_login_redirect),

            openai_api_key: non_empty("OPENAI_API_KEY"),
            openai_api_base: env::var("OPENAI_API_BASE").unwrap_or(defaults.openai_api_base),
            openai_model: env::var("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            analyzer_timeout_secs: match env::var("ANALYZER_TIMEOUT_SECS") {
                Ok(raw) => raw
                    .parse()
                    .context("ANALYZER_TIMEOUT_SECS must be a number")?,
                Err(_) => defaults.analyzer_timeout_secs,
            },
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn analyzer_timeout(&self) -> Duration {
        Duration::from_secs(self.analyzer_timeout_secs)
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}
