use crate::core::user::User;
use crate::error::{Error, Result};
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Per-process session context: the authenticated user snapshot plus the
/// app-wide preference flags. Passed explicitly to whatever needs it rather
/// than living in a global; nothing here survives the process except what
/// is written back through the store.
#[derive(Debug, Clone)]
pub struct SessionState {
    user: User,
    theme: Theme,
    notifications_enabled: bool,
}

impl SessionState {
    /// Authenticate and build the session, seeding the notification flag
    /// from the user's persisted preference.
    pub fn login(store: &Store, email: &str, password: &str) -> Result<Self> {
        let user = store
            .authenticate(email, password)?
            .ok_or_else(|| Error::validation("invalid email or password"))?;
        log::info!("user {} logged in", user.id);
        Ok(Self::for_user(user))
    }

    /// Session for an already-loaded user (e.g. right after sign-up).
    pub fn for_user(user: User) -> Self {
        let notifications_enabled = user.notifications_enabled;
        Self {
            user,
            theme: Theme::default(),
            notifications_enabled,
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Theme choice is process-local only.
    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notifications_enabled
    }

    /// Toggle the notification preference, persisting it immediately so the
    /// next launch seeds from the same value.
    pub fn set_notifications_enabled(&mut self, store: &Store, enabled: bool) -> Result<()> {
        store.set_notifications_enabled(self.user.id, enabled)?;
        self.notifications_enabled = enabled;
        self.user.notifications_enabled = enabled;
        Ok(())
    }

    /// Refresh the user snapshot after an out-of-band profile change.
    pub fn reload_user(&mut self, store: &Store) -> Result<()> {
        if let Some(user) = store.get_user(self.user.id)? {
            self.user = user;
        }
        Ok(())
    }
}
