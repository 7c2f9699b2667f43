//! Service configuration loaded from environment variables.
//!
//! ## Required
//! - `DATABASE_URL` - PostgreSQL connection string
//! - `STRIPE_SECRET_KEY` - payment gateway secret key
//! - `ADMIN_JWT_SECRET` - signing secret for admin tokens (min 32 chars)
//! - `IDENTITY_JWT_SECRET` - shared secret the identity provider signs customer tokens with
//! - `PUBLIC_BASE_URL` - storefront URL used for checkout redirects
//!
//! ## Optional
//! - `HOST` / `PORT` - bind address (default 0.0.0.0:8083)
//! - `STRIPE_PUBLISHABLE_KEY`, `STRIPE_API_BASE`, `CURRENCY` (default usd)
//! - `SHIPPING_FEE` (default 4.50), `FREE_SHIPPING_THRESHOLD` (default 75.00)
//! - `ADMIN_TOKEN_TTL_HOURS` (default 24)
//! - `ADMIN_BOOTSTRAP_EMAIL` + `ADMIN_BOOTSTRAP_PASSWORD`
//! - `SMTP_HOST`, `SMTP_PORT` (default 587), `SMTP_USERNAME`, `SMTP_PASSWORD`,
//!   `SMTP_FROM`, `ORDER_ALERT_TO`. Without `SMTP_HOST` notifications are off.

use std::net::{IpAddr, SocketAddr};

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;

use crate::services::checkout::ShippingPolicy;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    pub public_base_url: String,
    pub payments: PaymentConfig,
    pub shipping: ShippingPolicy,
    pub auth: AuthConfig,
    /// `None` disables order notifications.
    pub email: Option<EmailConfig>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Payment gateway credentials. `Debug` comes from `SecretString`, which redacts.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub secret_key: SecretString,
    pub publishable_key: Option<String>,
    pub api_base: String,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub admin_jwt_secret: SecretString,
    pub identity_jwt_secret: SecretString,
    pub admin_token_ttl_hours: i64,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: SecretString,
    pub from_address: String,
    /// Where new-order alerts go.
    pub alert_address: String,
}

#[derive(Debug, Clone)]
pub struct BootstrapAdmin { pub email: String, pub password: SecretString }

impl AppConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let host = env.parsed("HOST", "0.0.0.0")?;
        let port = env.parsed("PORT", "8083")?;
        let admin_jwt_secret = env.required("ADMIN_JWT_SECRET")?;
        if admin_jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::InvalidEnvVar(
                "ADMIN_JWT_SECRET".into(),
                format!("must be at least {MIN_JWT_SECRET_LENGTH} characters"),
            ));
        }

        let payments = PaymentConfig {
            secret_key: SecretString::from(env.required("STRIPE_SECRET_KEY")?),
            publishable_key: env.optional("STRIPE_PUBLISHABLE_KEY"),
            api_base: env.or_default("STRIPE_API_BASE", DEFAULT_STRIPE_API_BASE).trim_end_matches('/').to_string(),
            currency: env.or_default("CURRENCY", "usd").to_lowercase(),
        };
        let shipping = ShippingPolicy {
            flat_fee: env.parsed::<Decimal>("SHIPPING_FEE", "4.50")?,
            free_threshold: env.parsed::<Decimal>("FREE_SHIPPING_THRESHOLD", "75.00")?,
        };
        let auth = AuthConfig {
            admin_jwt_secret: SecretString::from(admin_jwt_secret),
            identity_jwt_secret: SecretString::from(env.required("IDENTITY_JWT_SECRET")?),
            admin_token_ttl_hours: env.parsed("ADMIN_TOKEN_TTL_HOURS", "24")?,
        };
        let bootstrap_admin = match (env.optional("ADMIN_BOOTSTRAP_EMAIL"), env.optional("ADMIN_BOOTSTRAP_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password: SecretString::from(password) }),
            (None, None) => None,
            _ => return Err(ConfigError::InvalidEnvVar(
                "ADMIN_BOOTSTRAP_*".into(),
                "ADMIN_BOOTSTRAP_EMAIL and ADMIN_BOOTSTRAP_PASSWORD must be set together".into(),
            )),
        };

        Ok(Self {
            database_url: SecretString::from(env.required("DATABASE_URL")?),
            host,
            port,
            public_base_url: env.required("PUBLIC_BASE_URL")?.trim_end_matches('/').to_string(),
            payments,
            shipping,
            auth,
            email: EmailConfig::from_env(&env)?,
            bootstrap_admin,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr { SocketAddr::new(self.host, self.port) }
}

impl EmailConfig {
    fn from_env(env: &Env<'_>) -> Result<Option<Self>, ConfigError> {
        let Some(smtp_host) = env.optional("SMTP_HOST") else { return Ok(None) };
        let from_address = env.required("SMTP_FROM")?;
        Ok(Some(Self {
            smtp_host,
            smtp_port: env.parsed("SMTP_PORT", "587")?,
            smtp_username: env.required("SMTP_USERNAME")?,
            smtp_password: SecretString::from(env.required("SMTP_PASSWORD")?),
            alert_address: env.optional("ORDER_ALERT_TO").unwrap_or_else(|| from_address.clone()),
            from_address,
        }))
    }
}

struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    fn optional(&self, key: &str) -> Option<String> { (self.0)(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn or_default(&self, key: &str, default: &str) -> String { self.optional(key).unwrap_or_else(|| default.to_string()) }

    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default).parse::<T>().map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn base() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("STRIPE_SECRET_KEY", "sk_test_123"),
            ("ADMIN_JWT_SECRET", "0123456789abcdef0123456789abcdef"),
            ("IDENTITY_JWT_SECRET", "identity-shared"),
            ("PUBLIC_BASE_URL", "https://shop.test/"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|k| vars.get(k).map(|v| (*v).to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = load(&base()).unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8083");
        assert_eq!(config.public_base_url, "https://shop.test");
        assert_eq!(config.shipping.flat_fee, Decimal::new(450, 2));
        assert_eq!(config.shipping.free_threshold, Decimal::new(75, 0));
        assert_eq!(config.payments.currency, "usd");
        assert_eq!(config.auth.admin_token_ttl_hours, 24);
        assert!(config.email.is_none());
        assert!(config.bootstrap_admin.is_none());
    }

    #[test]
    fn test_missing_payment_key_is_fatal() {
        let mut vars = base();
        vars.remove("STRIPE_SECRET_KEY");
        assert!(matches!(load(&vars), Err(ConfigError::MissingEnvVar(k)) if k == "STRIPE_SECRET_KEY"));
    }

    #[test]
    fn test_short_admin_secret() {
        let mut vars = base();
        vars.insert("ADMIN_JWT_SECRET", "short");
        assert!(matches!(load(&vars), Err(ConfigError::InvalidEnvVar(..))));
    }

    #[test]
    fn test_email_section() {
        let mut vars = base();
        vars.extend([("SMTP_HOST", "smtp.test"), ("SMTP_USERNAME", "u"), ("SMTP_PASSWORD", "p"), ("SMTP_FROM", "shop@test")]);
        let email = load(&vars).unwrap().email.unwrap();
        assert_eq!(email.smtp_port, 587);
        assert_eq!(email.alert_address, "shop@test");
        assert_eq!(email.smtp_password.expose_secret(), "p");
        assert!(!format!("{email:?}").contains("\"p\""));
    }

    #[test]
    fn test_bootstrap_requires_both() {
        let mut vars = base();
        vars.insert("ADMIN_BOOTSTRAP_EMAIL", "owner@shop.test");
        assert!(load(&vars).is_err());
    }
}
