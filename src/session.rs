use thiserror::Error;
use uuid::Uuid;

use crate::model::{Role, User};
use crate::store::RecordStore;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no {} with id {}", .role.as_str(), .user_id)]
    NotFound { role: Role, user_id: String },
    #[error("email {0} is already registered")]
    DuplicateEmail(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Two-state identity machine: Anonymous (`current` is None) or
/// Authenticated. The persisted `currentUser` entry mirrors the in-memory
/// state; failed operations leave both untouched.
#[derive(Debug, Default)]
pub struct Session {
    current: Option<User>,
}

impl Session {
    /// Restores a previously persisted identity. The stored value is trusted
    /// as-is; a roster miss is only logged.
    pub fn restore(&mut self, store: &RecordStore) -> anyhow::Result<Option<User>> {
        let Some(user) = store.current_user()? else {
            self.current = None;
            return Ok(None);
        };

        let roster = match user.role {
            Role::Student => store.students()?,
            Role::Admin => store.admins()?,
        };
        if !roster.iter().any(|u| u.id == user.id) {
            tracing::warn!(
                user_id = %user.id,
                role = user.role.as_str(),
                "restored identity is missing from the current roster"
            );
        }

        tracing::info!(user_id = %user.id, role = user.role.as_str(), "restored session");
        self.current = Some(user.clone());
        Ok(Some(user))
    }

    pub fn current(&self) -> Option<&User> {
        self.current.as_ref()
    }

    pub fn role(&self) -> Option<Role> {
        self.current.as_ref().map(|u| u.role)
    }

    pub fn login(
        &mut self,
        store: &mut RecordStore,
        user_id: &str,
        role: Role,
    ) -> Result<User, SessionError> {
        let roster = match role {
            Role::Student => store.students()?,
            Role::Admin => store.admins()?,
        };

        let Some(user) = roster.into_iter().find(|u| u.id == user_id) else {
            return Err(SessionError::NotFound {
                role,
                user_id: user_id.to_string(),
            });
        };

        store.save_current_user(&user)?;
        tracing::info!(user_id = %user.id, role = role.as_str(), "logged in");
        self.current = Some(user.clone());
        Ok(user)
    }

    /// Creates a new identity and logs it in. Field-shape validation is the
    /// caller's job; the only rule enforced here is email uniqueness across
    /// both rosters.
    pub fn register(
        &mut self,
        store: &mut RecordStore,
        name: &str,
        email: &str,
        role: Role,
    ) -> Result<User, SessionError> {
        let students = store.students()?;
        let admins = store.admins()?;
        if students.iter().chain(admins.iter()).any(|u| u.email == email) {
            return Err(SessionError::DuplicateEmail(email.to_string()));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            role,
        };

        match role {
            Role::Student => {
                let mut roster = students;
                roster.push(user.clone());
                store.save_students(&roster)?;
            }
            Role::Admin => {
                let mut roster = admins;
                roster.push(user.clone());
                store.save_admins(&roster)?;
            }
        }

        // Auto-login is part of the registration contract.
        store.save_current_user(&user)?;
        tracing::info!(user_id = %user.id, role = role.as_str(), "registered new user");
        self.current = Some(user.clone());
        Ok(user)
    }

    pub fn logout(&mut self, store: &mut RecordStore) -> anyhow::Result<()> {
        store.clear_current_user()?;
        if let Some(user) = self.current.take() {
            tracing::info!(user_id = %user.id, "logged out");
        }
        Ok(())
    }
}
