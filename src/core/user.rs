use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// A registered account. Never hard-deleted; mutated on profile-picture
/// change or preference toggle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// SHA-256 hex digest of the password, never the cleartext.
    pub password_digest: String,
    pub profile_picture: Option<String>,
    pub notifications_enabled: bool,
}

/// Sign-up input, before an id is assigned.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl User {
    pub fn matches_password(&self, password: &str) -> bool {
        self.password_digest == digest_password(password)
    }
}

pub fn digest_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_hex() {
        let d = digest_password("hunter2");
        assert_eq!(d.len(), 64);
        assert_eq!(d, digest_password("hunter2"));
        assert_ne!(d, digest_password("hunter3"));
    }

    #[test]
    fn matches_password_compares_digests() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_digest: digest_password("lovelace"),
            profile_picture: None,
            notifications_enabled: true,
        };
        assert!(user.matches_password("lovelace"));
        assert!(!user.matches_password("byron"));
    }
}
