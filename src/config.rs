//! Configuration types, built from environment variables.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default Resend endpoint.
pub const DEFAULT_RESEND_API_URL: &str = "https://api.resend.com";

/// Default Resend sender (Resend's shared onboarding domain).
pub const DEFAULT_RESEND_FROM: &str = "Investment Team <onboarding@resend.dev>";

/// Template file name inside the assets directory.
pub const TEMPLATE_FILE: &str = "template.png";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP listen port.
    pub port: u16,
    pub paths: PathsConfig,
    pub card: CardConfig,
    pub transport: TransportConfig,
}

/// Filesystem locations consulted by the core.
#[derive(Debug, Clone)]
pub struct PathsConfig {
    /// Holds the card template.
    pub assets_dir: PathBuf,
    /// Transient rendered images.
    pub output_dir: PathBuf,
    /// Transient uploaded spreadsheets.
    pub uploads_dir: PathBuf,
}

impl PathsConfig {
    /// Fixed template location used by the renderer and the template upload.
    pub fn template_path(&self) -> PathBuf {
        self.assets_dir.join(TEMPLATE_FILE)
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("assets"),
            output_dir: PathBuf::from("output"),
            uploads_dir: PathBuf::from("uploads"),
        }
    }
}

/// Which card renderer a deployment uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererKind {
    /// Text overlay on the template image, sent as a PNG.
    Image,
    /// HTML card inlined into the message body.
    Markup,
}

impl std::str::FromStr for RendererKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "markup" | "html" => Ok(Self::Markup),
            other => Err(format!("unknown renderer '{other}' (expected image or markup)")),
        }
    }
}

/// Card rendering settings.
#[derive(Debug, Clone)]
pub struct CardConfig {
    pub renderer: RendererKind,
    /// Bold TrueType font for the overlay label. `None` uses the bundled DejaVu Sans Bold.
    pub font_path: Option<PathBuf>,
    /// Middle segment of the label, e.g. a registration number.
    pub identifier: Option<String>,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            renderer: RendererKind::Image,
            font_path: None,
            identifier: None,
        }
    }
}

/// SMTP connection security.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpTls {
    /// Implicit TLS (port 465).
    Tls,
    /// STARTTLS upgrade (port 587).
    StartTls,
    /// Plaintext, for local relays and test servers only.
    None,
}

impl std::str::FromStr for SmtpTls {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tls" => Ok(Self::Tls),
            "starttls" => Ok(Self::StartTls),
            "none" => Ok(Self::None),
            other => Err(format!("unknown TLS mode '{other}' (expected tls, starttls or none)")),
        }
    }
}

/// SMTP account settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub tls: SmtpTls,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    /// Sender address; falls back to the username.
    pub from: Option<String>,
}

/// Resend HTTP API settings.
#[derive(Debug, Clone)]
pub struct ResendConfig {
    pub api_key: Option<SecretString>,
    pub from: String,
    pub api_url: String,
}

/// Transport selection. Credentials are validated when a batch starts.
#[derive(Debug, Clone)]
pub enum TransportConfig {
    Smtp(SmtpConfig),
    Resend(ResendConfig),
}

impl TransportConfig {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Smtp(_) => "smtp",
            Self::Resend(_) => "resend",
        }
    }
}

impl AppConfig {
    /// Build config from the process environment (after loading `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| var(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = parse_or(var("PORT"), "PORT", 5000)?;

        let defaults = PathsConfig::default();
        let paths = PathsConfig {
            assets_dir: var("ASSETS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.assets_dir),
            output_dir: var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            uploads_dir: var("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.uploads_dir),
        };

        let card = CardConfig {
            renderer: parse_or(var("CARD_RENDERER"), "CARD_RENDERER", RendererKind::Image)?,
            font_path: var("CARD_FONT_PATH").map(PathBuf::from),
            identifier: var("CARD_IDENTIFIER"),
        };

        let transport = match var("TRANSPORT").as_deref().unwrap_or("smtp") {
            "smtp" => {
                let username = var("EMAIL");
                TransportConfig::Smtp(SmtpConfig {
                    host: var("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
                    port: parse_or(var("SMTP_PORT"), "SMTP_PORT", 465)?,
                    tls: parse_or(var("SMTP_TLS"), "SMTP_TLS", SmtpTls::Tls)?,
                    from: var("EMAIL_FROM").or_else(|| username.clone()),
                    username,
                    password: var("APP_PASSWORD").map(SecretString::from),
                })
            }
            "resend" => TransportConfig::Resend(ResendConfig {
                api_key: var("RESEND_API_KEY").map(SecretString::from),
                from: var("RESEND_FROM").unwrap_or_else(|| DEFAULT_RESEND_FROM.to_string()),
                api_url: var("RESEND_API_URL")
                    .unwrap_or_else(|| DEFAULT_RESEND_API_URL.to_string()),
            }),
            other => {
                return Err(ConfigError::InvalidValue {
                    key: "TRANSPORT".into(),
                    message: format!("unknown transport '{other}' (expected smtp or resend)"),
                });
            }
        };

        Ok(Self {
            port,
            paths,
            card,
            transport,
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}
