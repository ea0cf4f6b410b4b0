use rusqlite::{OptionalExtension, Row, params};
use uuid::Uuid;

use crate::core::user::{NewUser, User, digest_password};
use crate::error::{Error, Result};

use super::{Store, conversion_err};

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let id: String = row.get("id")?;
    Ok(User {
        id: Uuid::parse_str(&id).map_err(conversion_err)?,
        name: row.get("name")?,
        email: row.get("email")?,
        password_digest: row.get("password")?,
        profile_picture: row.get("profile_picture")?,
        notifications_enabled: row.get::<_, i64>("notifications_enabled")? != 0,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

impl Store {
    /// Register a new account. Fails with a validation error on empty
    /// fields or an already-registered email.
    pub fn insert_user(&self, new_user: &NewUser) -> Result<User> {
        let name = new_user.name.trim();
        let email = new_user.email.trim();
        if name.is_empty() || email.is_empty() || new_user.password.is_empty() {
            return Err(Error::validation("name, email and password are required"));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_digest: digest_password(&new_user.password),
            profile_picture: None,
            notifications_enabled: true,
        };

        let inserted = self.conn().execute(
            "INSERT INTO users (id, name, email, password, profile_picture, notifications_enabled)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.id.to_string(),
                user.name,
                user.email,
                user.password_digest,
                user.profile_picture,
                user.notifications_enabled as i64,
            ],
        );

        match inserted {
            Ok(_) => Ok(user),
            Err(e) if is_unique_violation(&e) => {
                Err(Error::validation(format!("email already registered: {email}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Look up the account for a login attempt. `None` means the email is
    /// unknown or the password does not match; the two are not distinguished.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>> {
        let user = self
            .conn()
            .query_row(
                "SELECT * FROM users WHERE email = ?1",
                params![email.trim()],
                user_from_row,
            )
            .optional()?;
        Ok(user.filter(|u| u.matches_password(password)))
    }

    pub fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT * FROM users WHERE id = ?1",
                params![user_id.to_string()],
                user_from_row,
            )
            .optional()?)
    }

    /// Persist the notification-preference toggle.
    pub fn set_notifications_enabled(&self, user_id: Uuid, enabled: bool) -> Result<()> {
        self.conn().execute(
            "UPDATE users SET notifications_enabled = ?1 WHERE id = ?2",
            params![enabled as i64, user_id.to_string()],
        )?;
        Ok(())
    }

    pub fn set_profile_picture(&self, user_id: Uuid, picture: Option<&str>) -> Result<()> {
        self.conn().execute(
            "UPDATE users SET profile_picture = ?1 WHERE id = ?2",
            params![picture, user_id.to_string()],
        )?;
        Ok(())
    }
}
