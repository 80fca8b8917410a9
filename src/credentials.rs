//! Credential storage collaborator: auth token plus viewer identity.

use std::sync::RwLock;

use crate::types::Role;

/// Snapshot of who is looking at the UI right now.
///
/// Read fresh from the store for every connection attempt and every inbound
/// event — identity can change across login/logout while the socket manager
/// lives, so it is never cached on the manager itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: Option<String>,
    pub role: Option<Role>,
}

impl Viewer {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: Some(user_id.into()),
            role: Some(role),
        }
    }

    /// True when the viewer is the user with the given id.
    pub fn is_user(&self, id: &str) -> bool {
        self.user_id.as_deref() == Some(id)
    }
}

/// Read-only view of the host's credential/session store.
pub trait CredentialStore: Send + Sync {
    fn auth_token(&self) -> Option<String>;
    fn viewer(&self) -> Viewer;
}

/// In-process credential store for hosts without their own, and for tests.
#[derive(Default)]
pub struct MemoryCredentialStore {
    session: RwLock<Session>,
}

#[derive(Default)]
struct Session {
    token: Option<String>,
    viewer: Viewer,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a login.
    pub fn set_session(&self, token: impl Into<String>, user_id: impl Into<String>, role: Role) {
        let mut session = self
            .session
            .write()
            .expect("credential store lock poisoned");
        session.token = Some(token.into());
        session.viewer = Viewer::new(user_id, role);
    }

    /// Clear on logout.
    pub fn clear(&self) {
        *self
            .session
            .write()
            .expect("credential store lock poisoned") = Session::default();
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn auth_token(&self) -> Option<String> {
        self.session
            .read()
            .expect("credential store lock poisoned")
            .token
            .clone()
    }

    fn viewer(&self) -> Viewer {
        self.session
            .read()
            .expect("credential store lock poisoned")
            .viewer
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_roundtrip_and_clear() {
        let store = MemoryCredentialStore::new();
        assert!(store.auth_token().is_none());
        assert_eq!(store.viewer(), Viewer::default());

        store.set_session("tok", "u1", Role::Expert);
        assert_eq!(store.auth_token().as_deref(), Some("tok"));
        assert!(store.viewer().is_user("u1"));
        assert_eq!(store.viewer().role, Some(Role::Expert));

        store.clear();
        assert!(store.auth_token().is_none());
        assert!(store.viewer().user_id.is_none());
    }

    #[test]
    fn test_anonymous_viewer_matches_nobody() {
        let viewer = Viewer::default();
        assert!(!viewer.is_user("u1"));
        assert!(!viewer.is_user(""));
    }
}
