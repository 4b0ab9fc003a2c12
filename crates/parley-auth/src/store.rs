use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parley_core::{RelayError, RelayResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Stable user id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Login email, unique across the store.
    pub email: String,
    /// Argon2id digest of the password. Never the password itself.
    pub password_digest: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// A new user with a fresh id.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_digest: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            password_digest: password_digest.into(),
            created_at: Utc::now(),
        }
    }
}

/// Trait for user persistence backends.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new user. Fails with [`RelayError::Conflict`] if the
    /// email is already registered.
    async fn create(&self, user: &User) -> RelayResult<()>;

    /// Look up a user by email.
    async fn find_by_email(&self, email: &str) -> RelayResult<Option<User>>;
}

/// File-based user store (JSON files on disk). Good enough for MVP.
pub struct FileUserStore {
    dir: PathBuf,
}

impl FileUserStore {
    /// Store rooted at `dir`, created if missing.
    pub async fn new(dir: PathBuf) -> RelayResult<Self> {
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    fn user_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    async fn load_all(&self) -> RelayResult<Vec<User>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut users = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let data = tokio::fs::read_to_string(&path).await?;
            let user: User = serde_json::from_str(&data)
                .map_err(|e| RelayError::Storage(format!("failed to parse user record: {e}")))?;
            users.push(user);
        }
        Ok(users)
    }
}

#[async_trait]
impl UserStore for FileUserStore {
    async fn create(&self, user: &User) -> RelayResult<()> {
        if self.find_by_email(&user.email).await?.is_some() {
            return Err(RelayError::Conflict(format!(
                "user with email {} already exists",
                user.email
            )));
        }
        let json = serde_json::to_string_pretty(user)?;
        tokio::fs::write(self.user_path(user.id), json).await?;
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> RelayResult<Option<User>> {
        Ok(self
            .load_all()
            .await?
            .into_iter()
            .find(|u| u.email == email))
    }
}
