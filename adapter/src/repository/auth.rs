use std::sync::Arc;

use async_trait::async_trait;
use derive_new::new;
use kernel::model::{
    auth::{event::CreateToken, AccessToken},
    id::UnitId,
};
use kernel::repository::auth::AuthRepository;
use shared::error::{AppError, AppResult};

use crate::{
    database::{
        model::auth::{from, AuthorizationKey, AuthorizedUnitId},
        ConnectionPool,
    },
    redis::RedisClient,
};

#[derive(new)]
pub struct AuthRepositoryImpl {
    db: ConnectionPool,
    kv: Arc<RedisClient>,
    ttl: u64,
}

#[async_trait]
impl AuthRepository for AuthRepositoryImpl {
    async fn fetch_unit_id_from_token(
        &self,
        access_token: &AccessToken,
    ) -> AppResult<Option<UnitId>> {
        let key: AuthorizationKey = access_token.into();
        self.kv
            .get(&key)
            .await
            .map(|x| x.map(AuthorizedUnitId::into_inner))
    }

    // パスワードのハッシュ照合は pgcrypto の crypt() で行う
    async fn verify_unit(&self, email: &str, password: &str) -> AppResult<UnitId> {
        let row: Option<(UnitId,)> = sqlx::query_as(
            r#"
                SELECT unit_id
                FROM units
                WHERE email = $1 AND password_hash = crypt($2, password_hash)
            "#,
        )
        .bind(email.trim())
        .bind(password)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        row.map(|(unit_id,)| unit_id)
            .ok_or(AppError::UnauthenticatedError)
    }

    async fn create_token(&self, event: CreateToken) -> AppResult<AccessToken> {
        let (key, value) = from(event);
        self.kv.set_ex(&key, &value, self.ttl).await?;
        Ok(key.into())
    }

    async fn delete_token(&self, access_token: AccessToken) -> AppResult<()> {
        let key: AuthorizationKey = access_token.into();
        self.kv.delete(&key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::config::RedisConfig;

    fn redis() -> Arc<RedisClient> {
        Arc::new(
            RedisClient::new(&RedisConfig {
                host: "localhost".into(),
                port: 6379,
            })
            .unwrap(),
        )
    }

    #[sqlx::test(
        migrations = "./migrations",
        fixtures(path = "../../fixtures", scripts("parking"))
    )]
    #[ignore]
    async fn wrong_password_is_unauthenticated(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo = AuthRepositoryImpl::new(ConnectionPool::new(pool), redis(), 60);

        let unit_id = repo.verify_unit("unit101@example.com", "Pa55w0rd").await?;
        assert_eq!(unit_id, UnitId::new("101"));

        let res = repo.verify_unit("unit101@example.com", "nope").await;
        assert!(matches!(res, Err(AppError::UnauthenticatedError)));
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore]
    async fn token_round_trip_through_redis(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo = AuthRepositoryImpl::new(ConnectionPool::new(pool), redis(), 60);

        let token = repo.create_token(CreateToken::new(UnitId::new("204"))).await?;
        let unit_id = repo.fetch_unit_id_from_token(&token).await?;
        assert_eq!(unit_id, Some(UnitId::new("204")));

        repo.delete_token(token.clone()).await?;
        assert_eq!(repo.fetch_unit_id_from_token(&token).await?, None);
        Ok(())
    }
}
