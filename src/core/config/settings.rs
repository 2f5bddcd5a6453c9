use super::parsing::{
    env_optional, env_or_default, is_supported_image_extension, parse_bool, parse_cors_origins,
    parse_environment, parse_string_list, parse_u16, parse_u64,
};
use super::secret::resolve_session_secret;
use super::types::{
    AdminSettings, ConfigError, CorsSettings, DatabaseSettings, GoogleSettings, RedisSettings,
    RuntimeSettings, S3Settings, SecuritySettings, ServerHost, ServerPort, ServerSettings,
    Settings, StorageSettings, SweepSettings, TelemetrySettings,
};

const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const GOOGLE_ISSUERS: &[&str] = &["accounts.google.com", "https://accounts.google.com"];
const MAX_ACCESS_TOKEN_EXPIRE_MINUTES: u64 = 366 * 24 * 60;

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("SCHEDULER_HOST", "0.0.0.0");
        let port = env_optional("SCHEDULER_PORT")
            .or_else(|| env_optional("PORT"))
            .unwrap_or_else(|| "5000".to_string());

        let environment = parse_environment(
            env_optional("SCHEDULER_ENV").or_else(|| env_optional("NODE_ENV")),
        );
        let strict_config =
            env_optional("SCHEDULER_STRICT_CONFIG").map(|value| parse_bool(&value)).unwrap_or(false)
                || environment.is_production();

        let secret_key = resolve_session_secret(strict_config)?;
        let access_token_expire_minutes = parse_u64(
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            env_or_default("ACCESS_TOKEN_EXPIRE_MINUTES", "10080"),
        )?;
        let algorithm = env_or_default("ALGORITHM", "HS256");
        let cookie_name = env_or_default("SESSION_COOKIE_NAME", "token");

        let google_client_id = env_or_default("GOOGLE_CLIENT_ID", "");
        let google_jwks_url = env_or_default("GOOGLE_JWKS_URL", GOOGLE_JWKS_URL);
        let google_jwks_cache_seconds = parse_u64(
            "GOOGLE_JWKS_CACHE_SECONDS",
            env_or_default("GOOGLE_JWKS_CACHE_SECONDS", "3600"),
        )?;

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let postgres_server = env_or_default("POSTGRES_SERVER", "localhost");
        let postgres_port = parse_u16("POSTGRES_PORT", env_or_default("POSTGRES_PORT", "5432"))?;
        let postgres_user = env_or_default("POSTGRES_USER", "scheduler");
        let postgres_password = env_or_default("POSTGRES_PASSWORD", "");
        let postgres_db = env_or_default("POSTGRES_DB", "task_scheduler");
        let database_url = env_optional("DATABASE_URL");

        let redis_host = env_or_default("REDIS_HOST", "localhost");
        let redis_port = parse_u16("REDIS_PORT", env_or_default("REDIS_PORT", "6379"))?;
        let redis_db = parse_u16("REDIS_DB", env_or_default("REDIS_DB", "0"))?;
        let redis_password = env_or_default("REDIS_PASSWORD", "");

        let max_upload_size_mb =
            parse_u64("MAX_UPLOAD_SIZE_MB", env_or_default("MAX_UPLOAD_SIZE_MB", "10"))?;
        let allowed_image_extensions = parse_string_list(
            env_optional("ALLOWED_IMAGE_EXTENSIONS"),
            &["jpg", "jpeg", "png", "webp"],
        );

        let s3_endpoint = env_or_default("S3_ENDPOINT", "https://s3.amazonaws.com");
        let s3_access_key = env_or_default("S3_ACCESS_KEY", "");
        let s3_secret_key = env_or_default("S3_SECRET_KEY", "");
        let s3_bucket = env_or_default("S3_BUCKET", "task-scheduler-assets");
        let s3_region = env_or_default("S3_REGION", "us-east-1");
        let s3_public_url = env_optional("S3_PUBLIC_URL");

        let first_admin_email = env_or_default("FIRST_ADMIN_EMAIL", "");
        let first_admin_name = env_or_default("FIRST_ADMIN_NAME", "Administrator");

        let sweep_interval_seconds =
            parse_u64("SWEEP_INTERVAL_SECONDS", env_or_default("SWEEP_INTERVAL_SECONDS", "3600"))?;

        let log_level = env_or_default("SCHEDULER_LOG_LEVEL", "info");
        let json =
            env_optional("SCHEDULER_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            security: SecuritySettings {
                secret_key,
                access_token_expire_minutes,
                algorithm,
                cookie_name,
            },
            google: GoogleSettings {
                client_id: google_client_id,
                jwks_url: google_jwks_url,
                jwks_cache_seconds: google_jwks_cache_seconds,
                issuers: GOOGLE_ISSUERS.iter().map(|item| item.to_string()).collect(),
            },
            cors: CorsSettings { origins: cors_origins },
            database: DatabaseSettings {
                postgres_server,
                postgres_port,
                postgres_user,
                postgres_password,
                postgres_db,
                database_url,
            },
            redis: RedisSettings {
                host: redis_host,
                port: redis_port,
                db: redis_db,
                password: redis_password,
            },
            storage: StorageSettings { max_upload_size_mb, allowed_image_extensions },
            s3: S3Settings {
                endpoint: s3_endpoint,
                access_key: s3_access_key,
                secret_key: s3_secret_key,
                bucket: s3_bucket,
                region: s3_region,
                public_url: s3_public_url,
            },
            admin: AdminSettings { first_admin_email, first_admin_name },
            sweep: SweepSettings { interval_seconds: sweep_interval_seconds },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;

        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn security(&self) -> &SecuritySettings {
        &self.security
    }

    pub(crate) fn google(&self) -> &GoogleSettings {
        &self.google
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn redis(&self) -> &RedisSettings {
        &self.redis
    }

    pub(crate) fn storage(&self) -> &StorageSettings {
        &self.storage
    }

    pub(crate) fn s3(&self) -> &S3Settings {
        &self.s3
    }

    pub(crate) fn admin(&self) -> &AdminSettings {
        &self.admin
    }

    pub(crate) fn sweep(&self) -> &SweepSettings {
        &self.sweep
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.allowed_image_extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "ALLOWED_IMAGE_EXTENSIONS",
                value: String::from("<empty>"),
            });
        }
        for extension in &self.storage.allowed_image_extensions {
            if !is_supported_image_extension(extension) {
                return Err(ConfigError::InvalidValue {
                    field: "ALLOWED_IMAGE_EXTENSIONS",
                    value: extension.clone(),
                });
            }
        }

        let expire_minutes = self.security.access_token_expire_minutes;
        if expire_minutes == 0 || expire_minutes > MAX_ACCESS_TOKEN_EXPIRE_MINUTES {
            return Err(ConfigError::InvalidValue {
                field: "ACCESS_TOKEN_EXPIRE_MINUTES",
                value: expire_minutes.to_string(),
            });
        }

        if self.sweep.interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "SWEEP_INTERVAL_SECONDS",
                value: String::from("0"),
            });
        }

        if !self.runtime.strict_config {
            return Ok(());
        }

        if self.database.database_url.is_none() && self.database.postgres_password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }

        if self.google.client_id.is_empty() {
            return Err(ConfigError::MissingSecret("GOOGLE_CLIENT_ID"));
        }

        if self.s3.access_key.is_empty() || self.s3.secret_key.is_empty() {
            return Err(ConfigError::MissingSecret("S3_ACCESS_KEY/S3_SECRET_KEY"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::core::config::{Environment, Settings};
    use crate::test_support;

    #[tokio::test]
    async fn test_env_loads_with_defaults() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();

        let settings = Settings::load().expect("settings");
        assert_eq!(settings.runtime().environment, Environment::Test);
        assert_eq!(settings.security().cookie_name, "token");
        assert_eq!(settings.security().access_token_expire_minutes, 10080);
        assert_eq!(settings.server_port(), 5000);
        assert!(settings.google().issuers.iter().any(|issuer| issuer == "accounts.google.com"));
    }

    #[tokio::test]
    async fn strict_mode_requires_google_client_id() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::set_var("SCHEDULER_STRICT_CONFIG", "1");
        std::env::remove_var("GOOGLE_CLIENT_ID");

        let result = Settings::load();

        std::env::set_var("SCHEDULER_STRICT_CONFIG", "0");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn unsupported_image_extension_is_rejected() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::set_var("ALLOWED_IMAGE_EXTENSIONS", "png,tiff");

        let result = Settings::load();

        std::env::remove_var("ALLOWED_IMAGE_EXTENSIONS");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn session_lifetime_is_bounded() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();

        std::env::set_var("ACCESS_TOKEN_EXPIRE_MINUTES", u64::MAX.to_string());
        let huge = Settings::load();
        std::env::set_var("ACCESS_TOKEN_EXPIRE_MINUTES", "527040");
        let one_year = Settings::load();

        std::env::remove_var("ACCESS_TOKEN_EXPIRE_MINUTES");
        assert!(huge.is_err());
        assert_eq!(one_year.expect("settings").security().access_token_expire_minutes, 527040);
    }
}
