use async_trait::async_trait;
use redis::AsyncCommands;
use uuid::Uuid;

use crate::db::models::auth::User;
use crate::error::{AppError, AppResult};
use crate::stores::UserStore;

/// Key prefix for cached users.
pub const USER_CACHE_PREFIX: &str = "user:";

/// Read-through Redis cache in front of another `UserStore`.
///
/// The cache is best effort: any Redis or (de)serialization failure is logged
/// and the lookup falls through to the inner store.
pub struct CachedUserStore<S> {
    inner: S,
    redis_client: redis::Client,
    ttl_seconds: u64,
}

impl<S: UserStore> CachedUserStore<S> {
    pub fn new(inner: S, redis_client: redis::Client, ttl_seconds: u64) -> Self {
        Self {
            inner,
            redis_client,
            ttl_seconds,
        }
    }

    pub fn cache_key(user_id: Uuid) -> String {
        format!("{}{}", USER_CACHE_PREFIX, user_id)
    }

    async fn get_connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        Ok(self.redis_client.get_multiplexed_async_connection().await?)
    }

    async fn get_cached(&self, user_id: Uuid) -> AppResult<Option<User>> {
        let mut conn = self.get_connection().await?;
        let user_json: Option<String> = conn.get(Self::cache_key(user_id)).await?;

        match user_json {
            Some(json) => {
                let user = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Failed to deserialize cached user: {}", e))
                })?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    async fn put_cached(&self, user: &User) -> AppResult<()> {
        let mut conn = self.get_connection().await?;
        let user_json = serde_json::to_string(user)
            .map_err(|e| AppError::Internal(format!("Failed to serialize user: {}", e)))?;

        let _: () = conn
            .set_ex(Self::cache_key(user.id), user_json, self.ttl_seconds)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl<S: UserStore> UserStore for CachedUserStore<S> {
    async fn find_by_id(&self, user_id: Uuid) -> AppResult<Option<User>> {
        match self.get_cached(user_id).await {
            Ok(Some(user)) if user.is_active => return Ok(Some(user)),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "User cache read failed");
            }
        }

        let user = self.inner.find_by_id(user_id).await?;
        if let Some(ref user) = user {
            if let Err(e) = self.put_cached(user).await {
                tracing::warn!(user_id = %user_id, error = %e, "User cache write failed");
            }
        }
        Ok(user)
    }
}
