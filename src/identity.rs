//! Sign-in state.
//!
//! The controller only needs to ask "is someone signed in right now?", so the
//! contract is a single synchronous query. [`LocalIdentity`] keeps the session
//! in memory and supports signing in and out.

use parking_lot::RwLock;
use tracing::info;

/// An authenticated session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: String,
}

/// Source of the current session
pub trait IdentitySource: Send + Sync {
    fn current_session(&self) -> Option<Session>;

    fn is_signed_in(&self) -> bool {
        self.current_session().is_some()
    }
}

/// Session held in process memory
#[derive(Debug, Default)]
pub struct LocalIdentity {
    session: RwLock<Option<Session>>,
}

impl LocalIdentity {
    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn signed_in(email: &str) -> Self {
        let identity = Self::default();
        identity.sign_in(email);
        identity
    }

    /// Start a session for `email`, replacing any current one.
    pub fn sign_in(&self, email: &str) -> Session {
        let session = Session {
            user_id: email.trim().to_lowercase(),
            email: email.trim().to_string(),
        };
        info!("Signed in as {}", session.email);
        *self.session.write() = Some(session.clone());
        session
    }

    pub fn sign_out(&self) {
        if let Some(session) = self.session.write().take() {
            info!("Signed out {}", session.email);
        }
    }
}

impl IdentitySource for LocalIdentity {
    fn current_session(&self) -> Option<Session> {
        self.session.read().clone()
    }
}
