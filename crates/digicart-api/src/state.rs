//! # Application State
//!
//! Shared state for the Axum application.
//! Holds the configuration, catalog, gateway and the verifier/token pair.

use chrono::{DateTime, Duration, Utc};
use digicart_core::{
    AccessTokenGate, AccessTokenIssuer, AdminAuthority, AdminCredentials, BoxedOrderGateway,
    CatalogStore, Currency, PaymentVerifier, Secret, SharedClock, ShopError, ShopResult,
    SystemClock, DEFAULT_SESSION_TTL_SECS, DEFAULT_TOKEN_TTL, MAX_TOKEN_TTL,
};
use digicart_razorpay::RazorpayGateway;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Admin login settings; all-or-nothing
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub credentials: AdminCredentials,
    pub session_secret: Secret,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Public base URL used to build download links
    pub public_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Currency for all orders
    pub currency: Currency,
    /// Key for download tokens; distinct from the gateway secret
    pub download_secret: Secret,
    /// Download link lifetime
    pub download_ttl: Duration,
    /// Explicit seed catalog path
    pub catalog_path: Option<PathBuf>,
    /// Directory served for unmatched GET requests
    pub static_dir: PathBuf,
    /// Admin login; `None` disables the admin surface
    pub admin: Option<AdminConfig>,
}

impl AppConfig {
    /// Load from environment variables (and `.env` if present)
    pub fn from_env() -> ShopResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> ShopResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(p) => p
                .trim()
                .parse()
                .map_err(|_| ShopError::Configuration(format!("PORT is not a port: {}", p)))?,
            None => 8080,
        };

        let public_url = var("PUBLIC_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();

        let currency = match var("CURRENCY") {
            Some(c) => c.parse::<Currency>().map_err(ShopError::Configuration)?,
            None => Currency::INR,
        };

        let download_secret = var("DOWNLOAD_SECRET")
            .ok_or_else(|| ShopError::Configuration("DOWNLOAD_SECRET not set".to_string()))
            .and_then(|v| Secret::new(v, "DOWNLOAD_SECRET"))?;

        let download_ttl = match var("DOWNLOAD_TOKEN_TTL_SECS") {
            Some(s) => s
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|secs| (1..=MAX_TOKEN_TTL).contains(secs))
                .and_then(Duration::try_seconds)
                .ok_or_else(|| {
                    ShopError::Configuration(format!(
                        "DOWNLOAD_TOKEN_TTL_SECS must be between 1 and {}: {}",
                        MAX_TOKEN_TTL, s
                    ))
                })?,
            None => Duration::seconds(DEFAULT_TOKEN_TTL),
        };

        let admin = match (
            var("ADMIN_USERNAME"),
            var("ADMIN_PASSWORD"),
            var("SESSION_SECRET"),
        ) {
            (None, None, None) => None,
            (Some(username), Some(password), Some(session_secret)) => Some(AdminConfig {
                credentials: AdminCredentials {
                    username,
                    password: Secret::new(password, "ADMIN_PASSWORD")?,
                },
                session_secret: Secret::new(session_secret, "SESSION_SECRET")?,
            }),
            _ => {
                return Err(ShopError::Configuration(
                    "ADMIN_USERNAME, ADMIN_PASSWORD and SESSION_SECRET must be set together"
                        .to_string(),
                ))
            }
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            public_url,
            environment: var("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            currency,
            download_secret,
            download_ttl,
            catalog_path: var("CATALOG_PATH").map(PathBuf::from),
            static_dir: var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public")),
            admin,
        })
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> ShopResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ShopError::Configuration(format!("Invalid socket address: {}", e)))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: Arc<AppConfig>,
    /// Product catalog
    pub catalog: Arc<CatalogStore>,
    /// Order gateway
    pub gateway: BoxedOrderGateway,
    /// Payment signature verifier (gateway secret)
    pub verifier: Arc<PaymentVerifier>,
    /// Download token issuer (download secret)
    pub issuer: Arc<AccessTokenIssuer>,
    /// Download token gate (download secret)
    pub gate: Arc<AccessTokenGate>,
    /// Admin authority, if admin login is configured
    pub admin: Option<Arc<AdminAuthority>>,
    /// Time source
    pub clock: SharedClock,
}

impl AppState {
    /// Create AppState from the environment with the Razorpay gateway
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let catalog = load_product_catalog(&config)?;

        let gateway = RazorpayGateway::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Razorpay: {}", e))?;
        let gateway_secret = gateway.config().key_secret.clone();
        info!(
            "Razorpay mode: {}",
            if gateway.config().is_test_mode() { "test" } else { "live" }
        );

        let state = Self::build(
            config,
            catalog,
            Arc::new(gateway),
            gateway_secret,
            Arc::new(SystemClock),
        )?;
        Ok(state)
    }

    /// Assemble state from parts
    pub fn build(
        config: AppConfig,
        catalog: CatalogStore,
        gateway: BoxedOrderGateway,
        gateway_secret: Secret,
        clock: SharedClock,
    ) -> ShopResult<Self> {
        if gateway_secret == config.download_secret {
            return Err(ShopError::Configuration(
                "DOWNLOAD_SECRET must differ from the gateway secret".to_string(),
            ));
        }

        let admin = match &config.admin {
            Some(admin) => {
                if admin.session_secret == config.download_secret
                    || admin.session_secret == gateway_secret
                {
                    return Err(ShopError::Configuration(
                        "SESSION_SECRET must differ from the other secrets".to_string(),
                    ));
                }
                Some(Arc::new(AdminAuthority::new(
                    admin.credentials.clone(),
                    &admin.session_secret,
                    Duration::seconds(DEFAULT_SESSION_TTL_SECS),
                )))
            }
            None => {
                warn!("Admin credentials not configured; admin pages are disabled");
                None
            }
        };

        let issuer = AccessTokenIssuer::new(&config.download_secret, config.download_ttl);
        let gate = AccessTokenGate::new(&config.download_secret);

        Ok(Self {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            gateway,
            verifier: Arc::new(PaymentVerifier::new(gateway_secret)),
            issuer: Arc::new(issuer),
            gate: Arc::new(gate),
            admin,
            clock,
        })
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Public download link carrying `token`
    pub fn download_url(&self, token: &str) -> String {
        format!("{}/download?token={}", self.config.public_url, token)
    }
}

/// Load the seed catalog from `CATALOG_PATH` or the usual config locations
fn load_product_catalog(config: &AppConfig) -> anyhow::Result<CatalogStore> {
    if let Some(path) = &config.catalog_path {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        let catalog = CatalogStore::from_toml(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))?;
        info!("Loaded {} products from {}", catalog.len(), path.display());
        return Ok(catalog);
    }

    let config_paths = [
        "config/products.toml",
        "../config/products.toml",
        "../../config/products.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let catalog = CatalogStore::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            info!("Loaded {} products from {}", catalog.len(), path);
            return Ok(catalog);
        }
    }

    // Return empty catalog if no config found
    warn!("No product catalog found, using empty catalog");
    Ok(CatalogStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::from_lookup(lookup(&[("DOWNLOAD_SECRET", "dl")])).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.public_url, "http://localhost:8080");
        assert_eq!(config.currency, Currency::INR);
        assert_eq!(config.download_ttl, Duration::seconds(3600));
        assert!(config.admin.is_none());
        assert!(!config.is_production());
    }

    #[test]
    fn test_download_secret_required() {
        let err = AppConfig::from_lookup(lookup(&[("PORT", "3000")])).unwrap_err();
        assert!(matches!(err, ShopError::Configuration(msg) if msg.contains("DOWNLOAD_SECRET")));
    }

    #[test]
    fn test_partial_admin_config_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("DOWNLOAD_SECRET", "dl"),
            ("ADMIN_USERNAME", "seller"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ShopError::Configuration(_)));
    }

    #[test]
    fn test_public_url_trailing_slash_trimmed() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DOWNLOAD_SECRET", "dl"),
            ("PUBLIC_URL", "https://shop.example/"),
            ("PORT", "3000"),
        ]))
        .unwrap();
        assert_eq!(config.public_url, "https://shop.example");
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_socket_addr() {
        let mut config = AppConfig::from_lookup(lookup(&[("DOWNLOAD_SECRET", "dl")])).unwrap();
        config.host = "127.0.0.1".to_string();
        config.port = 3000;

        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(AppConfig::from_lookup(lookup(&[("DOWNLOAD_SECRET", "dl"), ("PORT", "http")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("DOWNLOAD_SECRET", "dl"), ("CURRENCY", "XYZ")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[
            ("DOWNLOAD_SECRET", "dl"),
            ("DOWNLOAD_TOKEN_TTL_SECS", "0")
        ]))
        .is_err());
    }

    #[test]
    fn test_download_ttl_bounds() {
        for ttl in ["-1", "2592001", "9000000000000", "9223372036854775807"] {
            let err = AppConfig::from_lookup(lookup(&[
                ("DOWNLOAD_SECRET", "dl"),
                ("DOWNLOAD_TOKEN_TTL_SECS", ttl),
            ]))
            .unwrap_err();
            assert!(matches!(err, ShopError::Configuration(_)), "{}", ttl);
        }

        let config = AppConfig::from_lookup(lookup(&[
            ("DOWNLOAD_SECRET", "dl"),
            ("DOWNLOAD_TOKEN_TTL_SECS", "2592000"),
        ]))
        .unwrap();
        assert_eq!(config.download_ttl, Duration::days(30));
    }

    #[test]
    fn test_bad_seed_catalog_aborts_startup() {
        let path = std::env::temp_dir().join(format!(
            "digicart-bad-catalog-{}.toml",
            std::process::id()
        ));
        std::fs::write(
            &path,
            "[[products]]\nid = \"b\"\ntitle = \"B\"\nprice = -5\nurl = \"javascript:alert(1)\"\n",
        )
        .unwrap();

        let mut config = AppConfig::from_lookup(lookup(&[("DOWNLOAD_SECRET", "dl")])).unwrap();
        config.catalog_path = Some(path.clone());
        let result = load_product_catalog(&config);
        std::fs::remove_file(&path).ok();

        assert!(result.is_err());
    }
}
