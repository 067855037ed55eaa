use std::env;
use std::str::FromStr;

use auth::KeyPair;
use auth::PasswordHasher;
use auth::TokenSettings;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use jsonwebtoken::Algorithm;
use serde::Deserialize;

/// Application configuration for journal-service.
///
/// Loaded from configuration files with environment variable overrides.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub environment: String,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub keys: KeysConfig,
    pub password: PasswordConfig,
}

/// PostgreSQL database configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// HTTP server configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

/// Token issuance configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    /// Signature algorithm name, e.g. `RS512`
    pub algorithm: String,
    pub expiration_hours: i64,
}

/// Signing key storage.
#[derive(Debug, Deserialize, Clone)]
pub struct KeysConfig {
    /// Directory holding `private.pem` and `public.pem`, relative to the working directory
    pub directory: String,
    pub bits: usize,
}

/// Argon2 cost parameters.
#[derive(Debug, Deserialize, Clone)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

const ENVIRONMENTS: [&str; 4] = ["development", "test", "staging", "production"];

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JWT__ISSUER, SERVER__HTTP_PORT, etc.)
    /// 2. Environment-specific config file (config/{RUN_MODE}.toml)
    /// 3. Default config file (config/default.toml)
    ///
    /// Token and key settings have no defaults. A missing or invalid value is fatal.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        // Example: JWT__ISSUER=journal overrides jwt.issuer
        Self::load_from("config", &run_mode, Environment::default().separator("__"))
    }

    fn load_from(
        directory: &str,
        run_mode: &str,
        environment: Environment,
    ) -> Result<Self, ConfigError> {
        let configuration = ConfigBuilder::builder()
            // Start with default configuration
            .add_source(File::with_name(&format!("{}/default", directory)).required(false))
            // Layer on environment-specific configuration
            .add_source(File::with_name(&format!("{}/{}", directory, run_mode)).required(false))
            .add_source(environment)
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Reject values that would deserialize but cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !ENVIRONMENTS.contains(&self.environment.as_str()) {
            return Err(ConfigError::Message(format!(
                "environment must be one of {:?}, got {:?}",
                ENVIRONMENTS, self.environment
            )));
        }

        if self.jwt.issuer.trim().is_empty() {
            return Err(ConfigError::Message("jwt.issuer must not be empty".into()));
        }

        self.jwt.algorithm()?;

        if self.jwt.expiration_hours <= 0 {
            return Err(ConfigError::Message(
                "jwt.expiration_hours must be positive".into(),
            ));
        }

        if self.keys.bits < KeyPair::MIN_BITS {
            return Err(ConfigError::Message(format!(
                "keys.bits must be at least {}",
                KeyPair::MIN_BITS
            )));
        }

        self.password.hasher()?;

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl JwtConfig {
    /// Parse the configured algorithm, accepting only RSA signature schemes.
    pub fn algorithm(&self) -> Result<Algorithm, ConfigError> {
        let algorithm = Algorithm::from_str(&self.algorithm).map_err(|_| {
            ConfigError::Message(format!("unknown jwt.algorithm {:?}", self.algorithm))
        })?;

        if !TokenSettings::is_supported_algorithm(algorithm) {
            return Err(ConfigError::Message(format!(
                "jwt.algorithm {:?} is not an RSA signature algorithm",
                self.algorithm
            )));
        }

        Ok(algorithm)
    }

    pub fn token_settings(&self) -> Result<TokenSettings, ConfigError> {
        Ok(TokenSettings::new(
            self.issuer.clone(),
            self.algorithm()?,
            chrono::Duration::hours(self.expiration_hours),
        ))
    }
}

impl PasswordConfig {
    pub fn hasher(&self) -> Result<PasswordHasher, ConfigError> {
        PasswordHasher::with_cost(self.memory_kib, self.iterations, self.parallelism)
            .map_err(|e| ConfigError::Message(format!("password: {}", e)))
    }
}
