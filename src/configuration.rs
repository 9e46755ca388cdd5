use config::{Config, Environment, File, FileFormat};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, Tokio1Executor};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::email_client::SmtpEmailClient;
use crate::youtube_client::YoutubeClient;

#[derive(Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub job: JobSettings,
    pub youtube: YoutubeSettings,
    pub email_client: EmailClientSettings,
}

#[derive(Deserialize)]
pub struct DatabaseSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub username: String,
    pub password: Secret<String>,
    pub database: String,
    #[serde(default)]
    pub require_ssl: bool,
}

impl DatabaseSettings {
    pub fn connect_options(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };

        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(self.password.expose_secret())
            .database(&self.database)
            .ssl_mode(ssl_mode)
    }
}

#[derive(Deserialize)]
pub struct ApplicationSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

#[derive(Deserialize, Clone)]
pub struct JobSettings {
    pub secret_token: Secret<String>,
    #[serde(
        default = "default_subscriber_limit",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub subscriber_limit: i64,
    pub notification: NotificationSettings,
}

fn default_subscriber_limit() -> i64 {
    5
}

/// Content of the email every subscriber receives on a run.
#[derive(Deserialize, Clone, Debug)]
pub struct NotificationSettings {
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

#[derive(Deserialize)]
pub struct YoutubeSettings {
    pub base_url: String,
    pub api_key: Secret<String>,
    #[serde(
        default = "default_batch_size",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    50
}

impl YoutubeSettings {
    pub fn client(&self) -> Result<YoutubeClient, anyhow::Error> {
        YoutubeClient::new(
            self.base_url.clone(),
            self.api_key.clone(),
            self.batch_size,
        )
    }
}

#[derive(Deserialize)]
pub struct EmailClientSettings {
    pub smtp_host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub smtp_port: u16,
    pub username: String,
    pub password: Secret<String>,
    pub sender_email: String,
    pub sender_name: String,
}

impl EmailClientSettings {
    /// Builds the pooled STARTTLS transport once; every message of every run goes through it.
    pub fn client(&self) -> Result<SmtpEmailClient, anyhow::Error> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.smtp_host)?
            .port(self.smtp_port)
            .credentials(Credentials::new(
                self.username.clone(),
                self.password.expose_secret().clone(),
            ))
            .build();

        SmtpEmailClient::new(transport, &self.sender_name, &self.sender_email)
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let settings = Config::builder()
        .add_source(File::new("configuration.yaml", FileFormat::Yaml))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
