//! Redis connection pool (deadpool-redis)

use deadpool_redis::{Config, Connection, Pool, Runtime};

const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Connection settings for [`RedisPool`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisPoolConfig {
    pub url: String,
    pub max_connections: usize,
}

impl Default for RedisPoolConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_REDIS_URL.to_string(),
            max_connections: 16,
        }
    }
}

impl From<&relay_common::RedisConfig> for RedisPoolConfig {
    fn from(config: &relay_common::RedisConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: (config.max_connections as usize).max(1),
        }
    }
}

impl RedisPoolConfig {
    /// URL with any `user:password@` part removed, for logs
    pub fn redacted_url(&self) -> &str {
        match self.url.rsplit_once('@') {
            Some((_, host)) => host,
            None => &self.url,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RedisPoolError {
    #[error("Failed to create Redis pool: {0}")]
    CreatePool(String),

    #[error("Redis connection unavailable: {0}")]
    Connection(#[from] deadpool_redis::PoolError),

    #[error("Redis command failed: {0}")]
    Command(#[from] redis::RedisError),
}

pub type RedisResult<T> = Result<T, RedisPoolError>;

/// Shared, cloneable handle to the Redis pool
#[derive(Clone)]
pub struct RedisPool {
    pool: Pool,
}

impl std::fmt::Debug for RedisPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.pool.status();
        f.debug_struct("RedisPool")
            .field("size", &status.size)
            .field("available", &status.available)
            .finish()
    }
}

impl RedisPool {
    pub fn new(config: RedisPoolConfig) -> RedisResult<Self> {
        let pool = Config::from_url(&config.url)
            .builder()
            .map_err(|e| RedisPoolError::CreatePool(e.to_string()))?
            .max_size(config.max_connections)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| RedisPoolError::CreatePool(e.to_string()))?;

        tracing::info!(
            url = %config.redacted_url(),
            max_connections = config.max_connections,
            "Redis pool created"
        );
        Ok(Self { pool })
    }

    pub fn from_config(config: &relay_common::RedisConfig) -> RedisResult<Self> {
        Self::new(RedisPoolConfig::from(config))
    }

    pub async fn get(&self) -> RedisResult<Connection> {
        Ok(self.pool.get().await?)
    }

    /// Round trip to the server
    pub async fn ping(&self) -> RedisResult<()> {
        let mut conn = self.get().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}
