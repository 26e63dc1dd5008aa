//! Configuration module
//!
//! Settings are read from the process environment (a `.env` file is loaded
//! first when present) and checked by [`Config::validate`] before the server
//! starts.

use std::env;

use crate::image_host_types::ImageHostBackend;

const SERVER_PORT: u16 = 4000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const AVATAR_MAX_FILE_SIZE_MB: usize = 5;
const TASKS_PAGE_SIZE: u32 = 10;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;
const MIN_SECRET_LENGTH: usize = 32;

/// Settings every deployment needs regardless of which collaborators it uses
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub access_token_secret: String,
    pub http_concurrency_limit: usize,
    pub environment: String,
}

/// Full service configuration
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub base: BaseConfig,
    pub database_url: String,
    // Avatar uploads
    pub avatar_staging_dir: String,
    pub avatar_max_file_size_bytes: usize,
    // Task listing
    pub tasks_page_size: u32,
    // Image host
    pub image_host: ImageHostBackend,
    pub cloudinary_cloud_name: Option<String>,
    pub cloudinary_api_key: Option<String>,
    pub cloudinary_api_secret: Option<String>,
    pub local_image_path: String,
    pub local_image_base_url: String,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ServiceConfig>);

impl Config {
    fn inner(&self) -> &ServiceConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Config(Box::new(ServiceConfig::from_lookup(lookup)?)))
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.inner().base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn access_token_secret(&self) -> &str {
        &self.inner().base.access_token_secret
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.inner().base.http_concurrency_limit
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn avatar_staging_dir(&self) -> &str {
        &self.inner().avatar_staging_dir
    }

    pub fn avatar_max_file_size_bytes(&self) -> usize {
        self.inner().avatar_max_file_size_bytes
    }

    pub fn tasks_page_size(&self) -> u32 {
        self.inner().tasks_page_size
    }

    pub fn image_host(&self) -> ImageHostBackend {
        self.inner().image_host
    }

    pub fn cloudinary_cloud_name(&self) -> Option<&str> {
        self.inner().cloudinary_cloud_name.as_deref()
    }

    pub fn cloudinary_api_key(&self) -> Option<&str> {
        self.inner().cloudinary_api_key.as_deref()
    }

    pub fn cloudinary_api_secret(&self) -> Option<&str> {
        self.inner().cloudinary_api_secret.as_deref()
    }

    pub fn local_image_path(&self) -> &str {
        &self.inner().local_image_path
    }

    pub fn local_image_base_url(&self) -> &str {
        &self.inner().local_image_base_url
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse::<T>().ok()).unwrap_or(default)
}

impl ServiceConfig {
    fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str = lookup("CORS_ORIGINS").unwrap_or_else(|| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let server_port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            None => SERVER_PORT,
        };

        let image_host = match lookup("IMAGE_HOST") {
            Some(raw) => raw.parse::<ImageHostBackend>()?,
            None => ImageHostBackend::Local,
        };

        let avatar_max_file_size_mb =
            parse_or(lookup("AVATAR_MAX_FILE_SIZE_MB"), AVATAR_MAX_FILE_SIZE_MB);

        Ok(ServiceConfig {
            base: BaseConfig {
                server_port,
                cors_origins,
                db_max_connections: parse_or(lookup("DB_MAX_CONNECTIONS"), MAX_CONNECTIONS),
                db_timeout_seconds: parse_or(lookup("DB_TIMEOUT_SECONDS"), CONNECTION_TIMEOUT_SECS),
                access_token_secret: lookup("ACCESS_TOKEN_SECRET").ok_or_else(|| {
                    anyhow::anyhow!("ACCESS_TOKEN_SECRET must be set for authentication")
                })?,
                http_concurrency_limit: parse_or(
                    lookup("HTTP_CONCURRENCY_LIMIT"),
                    HTTP_CONCURRENCY_LIMIT,
                ),
                environment,
            },
            database_url: lookup("DATABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?,
            avatar_staging_dir: lookup("AVATAR_STAGING_DIR")
                .unwrap_or_else(|| "storages/users".to_string()),
            avatar_max_file_size_bytes: avatar_max_file_size_mb * 1024 * 1024,
            tasks_page_size: parse_or(lookup("TASKS_PAGE_SIZE"), TASKS_PAGE_SIZE),
            image_host,
            cloudinary_cloud_name: lookup("CLOUDINARY_CLOUD_NAME"),
            cloudinary_api_key: lookup("CLOUDINARY_API_KEY"),
            cloudinary_api_secret: lookup("CLOUDINARY_API_SECRET"),
            local_image_path: lookup("LOCAL_IMAGE_PATH")
                .unwrap_or_else(|| "storages/public".to_string()),
            local_image_base_url: lookup("LOCAL_IMAGE_BASE_URL")
                .unwrap_or_else(|| "http://localhost:4000/static".to_string()),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.access_token_secret.len() < MIN_SECRET_LENGTH {
            return Err(anyhow::anyhow!(
                "ACCESS_TOKEN_SECRET must be at least 32 characters long"
            ));
        }

        if !self.database_url.starts_with("postgresql://")
            && !self.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.tasks_page_size == 0 {
            return Err(anyhow::anyhow!("TASKS_PAGE_SIZE must be greater than 0"));
        }

        if self.avatar_max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!(
                "AVATAR_MAX_FILE_SIZE_MB must be greater than 0"
            ));
        }

        match self.image_host {
            ImageHostBackend::Cloudinary => {
                if self.cloudinary_cloud_name.is_none()
                    || self.cloudinary_api_key.is_none()
                    || self.cloudinary_api_secret.is_none()
                {
                    return Err(anyhow::anyhow!(
                        "CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET must be set when IMAGE_HOST=cloudinary"
                    ));
                }
            }
            ImageHostBackend::Local => {
                if self.local_image_path.trim().is_empty() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_IMAGE_PATH must not be empty when IMAGE_HOST=local"
                    ));
                }
            }
        }

        Ok(())
    }
}
