use std::sync::Arc;

use anyhow::Context;

use amg_auth::{
    AccessPolicy, AuthGuard, PasswordHasher, RevocationStore, Role, SessionService, TokenCodec,
};
use amg_core::{NewUser, UserRepository, validate_password};
use amg_infra::{
    AdminSeed, AppConfig, Argon2PasswordHasher, InMemoryRevocationStore, InMemoryUserRepository,
};

/// Everything handlers need, shared behind one `Arc`.
pub struct AppServices {
    pub guard: AuthGuard,
    pub policy: AccessPolicy,
    pub sessions: SessionService,
    pub users: Arc<dyn UserRepository>,
    pub hasher: Arc<dyn PasswordHasher>,
}

impl AppServices {
    /// Wire the auth core around an in-memory user store.
    pub fn assemble(
        config: &AppConfig,
        store: Arc<dyn RevocationStore>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> anyhow::Result<Self> {
        let keys = config.keys.load()?;
        let codec = Arc::new(
            TokenCodec::new(config.auth.algorithm, &keys, config.auth.token_lifetime)
                .context("loading token signing keys")?,
        );

        let users = Arc::new(InMemoryUserRepository::new());
        let guard = AuthGuard::new(codec.clone(), store.clone(), config.auth.store_timeout);
        let sessions = SessionService::new(
            codec,
            store,
            hasher.clone(),
            users.clone(),
            &config.auth,
        )?;

        Ok(Self {
            guard,
            policy: AccessPolicy::default(),
            sessions,
            users,
            hasher,
        })
    }

    /// Create the bootstrap administrator unless the email is already taken.
    pub fn seed_admin(&self, seed: &AdminSeed) -> anyhow::Result<()> {
        if self.users.find_by_email(&seed.email)?.is_some() {
            tracing::info!(email = %seed.email, "admin account already present");
            return Ok(());
        }

        validate_password(&seed.password).context("ADMIN_PASSWORD")?;
        let password_hash = self.hasher.hash(&seed.password)?;
        let admin = self.users.create(NewUser {
            first_name: "Admin".to_string(),
            last_name: "User".to_string(),
            email: seed.email.clone(),
            password_hash,
            role: Role::ADMIN.to_string(),
        })?;

        tracing::info!(user_id = %admin.id, email = %admin.email, "admin account created");
        Ok(())
    }
}

/// Build services from configuration (used by `main.rs`).
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let store = revocation_store(config).await?;
    let services = AppServices::assemble(config, store, Arc::new(Argon2PasswordHasher::new()))?;

    if let Some(seed) = &config.admin {
        services.seed_admin(seed)?;
    }

    Ok(services)
}

async fn revocation_store(config: &AppConfig) -> anyhow::Result<Arc<dyn RevocationStore>> {
    match config.redis_url.as_deref() {
        #[cfg(feature = "redis")]
        Some(url) => {
            let store =
                amg_infra::RedisRevocationStore::connect(url, config.revocation_prefix.clone())
                    .await
                    .context("connecting to redis revocation store")?;
            tracing::info!("revocation store: redis");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "redis"))]
        Some(_) => {
            tracing::warn!(
                "REDIS_URL is set but the `redis` feature is disabled; revocations are process-local"
            );
            Ok(Arc::new(InMemoryRevocationStore::new()))
        }
        None => {
            tracing::warn!("REDIS_URL not set; revocations are process-local and lost on restart");
            Ok(Arc::new(InMemoryRevocationStore::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig::with_secret("services-test-secret")
    }

    fn cheap_hasher() -> Arc<dyn PasswordHasher> {
        Arc::new(Argon2PasswordHasher::with_params(8, 1, 1).unwrap())
    }

    #[test]
    fn seeding_admin_is_idempotent() {
        let services =
            AppServices::assemble(&config(), Arc::new(InMemoryRevocationStore::new()), cheap_hasher())
                .unwrap();
        let seed = AdminSeed {
            email: "root@example.com".to_string(),
            password: "root-password".to_string(),
        };

        services.seed_admin(&seed).unwrap();
        services.seed_admin(&seed).unwrap();

        let admin = services.users.find_by_email("root@example.com").unwrap().unwrap();
        assert_eq!(admin.role, "admin");
        assert!(services.hasher.verify(&admin.password_hash, "root-password"));
        assert!(services.sessions.login("root@example.com", "root-password").is_ok());
    }

    #[test]
    fn weak_admin_password_is_refused() {
        let services =
            AppServices::assemble(&config(), Arc::new(InMemoryRevocationStore::new()), cheap_hasher())
                .unwrap();
        let seed = AdminSeed {
            email: "root@example.com".to_string(),
            password: "short".to_string(),
        };
        assert!(services.seed_admin(&seed).is_err());
    }
}
