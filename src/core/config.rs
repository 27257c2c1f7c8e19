use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub swagger: SwaggerConfig,
    pub storage: StorageConfig,
    pub ai: AiConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
    /// Key for the Google Maps embed API; map links are omitted without it
    pub google_maps_api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Employee session cookie settings
#[derive(Clone)]
pub struct SessionConfig {
    /// HMAC secret used to sign session tokens
    pub secret: String,
    pub ttl: Duration,
    /// Sessions with less remaining lifetime than this are re-issued
    pub refresh_threshold: Duration,
    /// Hard limit measured from login; refreshes never extend past it
    pub max_lifetime: Duration,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub bootstrap_employee: Option<BootstrapEmployee>,
}

#[derive(Clone)]
pub struct BootstrapEmployee {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"***")
            .field("ttl", &self.ttl)
            .field("refresh_threshold", &self.refresh_threshold)
            .field("max_lifetime", &self.max_lifetime)
            .field("cookie_name", &self.cookie_name)
            .field("cookie_secure", &self.cookie_secure)
            .field(
                "bootstrap_employee",
                &self.bootstrap_employee.as_ref().map(|b| &b.email),
            )
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// S3-compatible object storage for complaint photos
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// S3/MinIO endpoint URL used by the server
    pub endpoint: String,
    /// Endpoint embedded in public image URLs (defaults to endpoint)
    pub public_endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
}

/// Vision model used to draft complaints
#[derive(Clone)]
pub struct AiConfig {
    /// Drafting is disabled when no key is configured
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            session: SessionConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            ai: AiConfig::from_env()?,
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, String> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| format!("{} must be a valid value", key)),
        Err(_) => Ok(default),
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 10 * 1024 * 1024; // 10MB

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_env::<u16>("PORT", 3000)?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_request_body_size =
            parse_env("MAX_REQUEST_BODY_SIZE", Self::DEFAULT_MAX_REQUEST_BODY_SIZE)?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_request_body_size,
            google_maps_api_key: optional_env("GOOGLE_MAPS_API_KEY"),
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        Ok(Self {
            url,
            max_connections: parse_env("DB_MAX_CONNECTIONS", Self::DEFAULT_MAX_CONNECTIONS)?,
            min_connections: parse_env("DB_MIN_CONNECTIONS", Self::DEFAULT_MIN_CONNECTIONS)?,
            acquire_timeout_secs: parse_env(
                "DB_ACQUIRE_TIMEOUT_SECS",
                Self::DEFAULT_ACQUIRE_TIMEOUT_SECS,
            )?,
            idle_timeout_secs: parse_env("DB_IDLE_TIMEOUT_SECS", Self::DEFAULT_IDLE_TIMEOUT_SECS)?,
            max_lifetime_secs: parse_env("DB_MAX_LIFETIME_SECS", Self::DEFAULT_MAX_LIFETIME_SECS)?,
        })
    }
}

impl SessionConfig {
    const DEFAULT_TTL_SECS: u64 = 8 * 60 * 60;
    const DEFAULT_REFRESH_THRESHOLD_SECS: u64 = 60 * 60;
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 24 * 60 * 60;
    const MIN_SECRET_LEN: usize = 32;
    pub const DEFAULT_COOKIE_NAME: &'static str = "issuesnap_session";

    pub fn from_env() -> Result<Self, String> {
        let secret = env::var("SESSION_SECRET")
            .map_err(|_| "SESSION_SECRET environment variable is required".to_string())?;
        if secret.len() < Self::MIN_SECRET_LEN {
            return Err(format!(
                "SESSION_SECRET must be at least {} bytes",
                Self::MIN_SECRET_LEN
            ));
        }

        let ttl_secs = parse_env("SESSION_TTL_SECS", Self::DEFAULT_TTL_SECS)?;
        let refresh_secs = parse_env(
            "SESSION_REFRESH_THRESHOLD_SECS",
            Self::DEFAULT_REFRESH_THRESHOLD_SECS,
        )?;
        if refresh_secs >= ttl_secs {
            return Err(
                "SESSION_REFRESH_THRESHOLD_SECS must be smaller than SESSION_TTL_SECS".to_string(),
            );
        }
        let max_lifetime_secs =
            parse_env("SESSION_MAX_LIFETIME_SECS", Self::DEFAULT_MAX_LIFETIME_SECS)?;
        if max_lifetime_secs < ttl_secs {
            return Err(
                "SESSION_MAX_LIFETIME_SECS must not be smaller than SESSION_TTL_SECS".to_string(),
            );
        }

        let bootstrap_employee = match (
            optional_env("BOOTSTRAP_EMPLOYEE_EMAIL"),
            optional_env("BOOTSTRAP_EMPLOYEE_PASSWORD"),
        ) {
            (Some(email), Some(password)) => Some(BootstrapEmployee {
                display_name: optional_env("BOOTSTRAP_EMPLOYEE_NAME")
                    .unwrap_or_else(|| "Administrator".to_string()),
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            secret,
            ttl: Duration::from_secs(ttl_secs),
            refresh_threshold: Duration::from_secs(refresh_secs),
            max_lifetime: Duration::from_secs(max_lifetime_secs),
            cookie_name: env::var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|_| Self::DEFAULT_COOKIE_NAME.to_string()),
            cookie_secure: parse_env("SESSION_COOKIE_SECURE", false)?,
            bootstrap_employee,
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            username: optional_env("SWAGGER_USERNAME"),
            password: optional_env("SWAGGER_PASSWORD"),
            title: env::var("SWAGGER_TITLE").unwrap_or_else(|_| "IssueSnap API".to_string()),
            version: env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string()),
            description: env::var("SWAGGER_DESCRIPTION")
                .unwrap_or_else(|_| "Citizen complaint reporting API".to_string()),
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl StorageConfig {
    pub const DEFAULT_BUCKET: &'static str = "complaint-images";

    pub fn from_env() -> Result<Self, String> {
        let endpoint =
            env::var("STORAGE_ENDPOINT").unwrap_or_else(|_| "http://localhost:9000".to_string());
        let public_endpoint =
            optional_env("STORAGE_PUBLIC_ENDPOINT").unwrap_or_else(|| endpoint.clone());

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            public_endpoint: public_endpoint.trim_end_matches('/').to_string(),
            access_key: env::var("STORAGE_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string()),
            secret_key: env::var("STORAGE_SECRET_KEY").unwrap_or_else(|_| "minioadmin".to_string()),
            bucket: env::var("STORAGE_BUCKET").unwrap_or_else(|_| Self::DEFAULT_BUCKET.to_string()),
            region: env::var("STORAGE_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
        })
    }
}

impl AiConfig {
    const DEFAULT_TIMEOUT_SECS: u64 = 60;

    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            api_key: optional_env("AI_API_KEY"),
            base_url: env::var("AI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string())
                .trim_end_matches('/')
                .to_string(),
            model: env::var("AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            timeout: Duration::from_secs(parse_env(
                "AI_TIMEOUT_SECS",
                Self::DEFAULT_TIMEOUT_SECS,
            )?),
        })
    }
}
