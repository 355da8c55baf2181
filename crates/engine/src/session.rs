//! Signed-in user state.
//!
//! A [`SessionStore`] is created once at startup and handed to whoever needs
//! it. API calls borrow the current [`Session`] instead of reading a global.

use std::fmt;

use api_types::auth::{AuthResponse, User};

use crate::{EngineError, ResultEngine};

#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    jwt: String,
    pub user: User,
}

impl Session {
    pub fn new(jwt: impl Into<String>, user: User) -> Self {
        Self {
            jwt: jwt.into(),
            user,
        }
    }

    pub fn user_id(&self) -> u64 {
        self.user.id
    }

    pub fn jwt(&self) -> &str {
        &self.jwt
    }

    /// Value of the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.jwt)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("jwt", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

impl From<AuthResponse> for Session {
    fn from(value: AuthResponse) -> Self {
        Self::new(value.jwt, value.user)
    }
}

#[derive(Debug, Default)]
pub struct SessionStore {
    current: Option<Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sign_in(&mut self, response: AuthResponse) -> &Session {
        tracing::info!("signed in as {}", response.user.username);
        self.current.insert(Session::from(response))
    }

    pub fn sign_out(&mut self) {
        if let Some(session) = self.current.take() {
            tracing::info!("signed out {}", session.user.username);
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> ResultEngine<&Session> {
        self.current.as_ref().ok_or(EngineError::NotSignedIn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response() -> AuthResponse {
        AuthResponse {
            jwt: "token-123".into(),
            user: User {
                id: 5,
                username: "ana@example.com".into(),
                email: Some("ana@example.com".into()),
            },
        }
    }

    #[test]
    fn sign_in_then_out() {
        let mut store = SessionStore::new();
        assert_eq!(store.current().unwrap_err(), EngineError::NotSignedIn);

        let session = store.sign_in(response());
        assert_eq!(session.user_id(), 5);
        assert_eq!(session.bearer(), "Bearer token-123");

        store.sign_out();
        assert!(!store.is_signed_in());
    }

    #[test]
    fn debug_hides_the_token() {
        let session = Session::from(response());
        let debug = format!("{session:?}");
        assert!(!debug.contains("token-123"));
    }
}
