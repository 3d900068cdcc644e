use serde::Deserialize;
use std::fmt;

const REDACTED: &str = "[REDACTED]";

fn redact(secret: &Option<String>) -> Option<&'static str> {
    secret.as_ref().map(|_| REDACTED)
}

/// Outbound mail settings. Only built when host, port, sender and admin
/// recipient are all present.
#[derive(Clone, Deserialize)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub from: String,
    pub to: String,
}

impl MailConfig {
    /// Credentials are only used when both halves are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.user.as_deref(), self.pass.as_deref()) {
            (Some(user), Some(pass)) => Some((user, pass)),
            _ => None,
        }
    }
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("pass", &redact(&self.pass))
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

#[derive(Clone, Deserialize)]
pub struct Config {
    pub database_url: Option<String>,
    pub database_name: Option<String>,
    pub port: u16,
    pub admin_key: Option<String>,
    pub mail: Option<MailConfig>,
}

// The database URL may embed a password, so it is redacted alongside the keys.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &redact(&self.database_url))
            .field("database_name", &self.database_name)
            .field("port", &self.port)
            .field("admin_key", &redact(&self.admin_key))
            .field("mail", &self.mail)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|key| std::env::var(key).ok())?;

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!(
            "Database URL configured: {}",
            config.database_url.is_some()
        );
        if let Some(ref name) = config.database_name {
            tracing::debug!("Database name: {}", name);
        }
        if let Some(ref mail) = config.mail {
            tracing::debug!("SMTP relay: {}:{}", mail.host, mail.port);
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    /// Builds the configuration from an arbitrary variable source. Blank
    /// values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            None => 8000,
        };

        let smtp_port = var("SMTP_PORT")
            .map(|raw| {
                raw.trim().parse::<u16>().map_err(|_| {
                    anyhow::anyhow!("SMTP_PORT must be a valid number between 1-65535")
                })
            })
            .transpose()?;

        let mail = match (var("SMTP_HOST"), smtp_port, var("EMAIL_FROM"), var("EMAIL_TO")) {
            (Some(host), Some(port), Some(from), Some(to)) => Some(MailConfig {
                host,
                port,
                user: var("SMTP_USER"),
                pass: var("SMTP_PASS"),
                from,
                to,
            }),
            _ => None,
        };

        Ok(Self {
            database_url: var("DATABASE_URL"),
            database_name: var("DATABASE_NAME"),
            port,
            admin_key: var("ADMIN_KEY"),
            mail,
        })
    }
}
