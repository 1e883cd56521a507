// User records for the Airflow metadata store
// A PasswordUser hashes the password the moment it is assigned

use anyhow::{Context, Result};
use bcrypt::Version;

/// Work factor Airflow's password backend uses
pub const BCRYPT_COST: u32 = 12;

/// Row of the `users` table, minus the password column
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub email: String,
    /// Never set by this tool, stored so the row matches the platform schema
    pub superuser: bool,
}

impl User {
    pub fn new() -> Self {
        Self::default()
    }
}

/// User wrapper that owns the password hash.
///
/// The plaintext only lives as long as the `set_password` call. There is no
/// way to read it back, only to check a candidate with [`PasswordUser::authenticate`].
#[derive(Clone)]
pub struct PasswordUser {
    user: User,
    username_set: bool,
    email_set: bool,
    password_hash: Option<String>,
}

impl std::fmt::Debug for PasswordUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordUser")
            .field("user", &self.user)
            .field(
                "password_hash",
                &self.password_hash.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl PasswordUser {
    pub fn new(user: User) -> Self {
        PasswordUser {
            user,
            username_set: false,
            email_set: false,
            password_hash: None,
        }
    }

    pub fn username(&self) -> &str {
        &self.user.username
    }

    pub fn email(&self) -> &str {
        &self.user.email
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn set_username(&mut self, username: impl Into<String>) {
        self.user.username = username.into();
        self.username_set = true;
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.user.email = email.into();
        self.email_set = true;
    }

    /// Hash `plain_text` with bcrypt (`$2b$`, cost 12) and a fresh salt,
    /// replacing any previous hash
    pub fn set_password(&mut self, plain_text: &str) -> Result<()> {
        let hash = bcrypt::hash_with_result(plain_text, BCRYPT_COST)
            .context("Password hash failed")?
            .format_for_version(Version::TwoB);
        self.password_hash = Some(hash);
        Ok(())
    }

    /// Hash as stored in the `password` column
    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    /// Rebuild from a stored row
    pub fn from_hash(user: User, hash: String) -> Self {
        PasswordUser {
            user,
            username_set: true,
            email_set: true,
            password_hash: Some(hash),
        }
    }

    pub fn authenticate(&self, plain_text: &str) -> bool {
        match self.password_hash.as_deref() {
            Some(stored) => bcrypt::verify(plain_text, stored).unwrap_or(false),
            None => false,
        }
    }

    /// Username, email and password have all been assigned, empty or not
    pub fn is_complete(&self) -> bool {
        self.username_set && self.email_set && self.password_hash.is_some()
    }
}
