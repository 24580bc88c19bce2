//! Session lifecycle: the token is loaded once at startup, replaced on
//! login and removed on logout. HTTP calls receive it from here.

pub mod claims;
pub mod store;

pub use claims::{decode_claims, Claims, UserMetadata};
pub use store::FileTokenStore;

use crate::domain::model::SessionProfile;
use crate::domain::ports::TokenStore;
use crate::utils::error::{AppError, Result};
use chrono::{DateTime, Utc};

pub const ADMIN_ROLE: &str = "admin";

/// A bearer token plus whatever display data its payload carries.
#[derive(Debug, Clone)]
pub struct Session {
    token: String,
    claims: Option<Claims>,
}

impl Session {
    pub fn new(token: String) -> Self {
        let claims = match decode_claims(&token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                tracing::debug!("Token payload not readable: {}", e);
                None
            }
        };
        Self { token, claims }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }

    pub fn display_name(&self) -> Option<&str> {
        let claims = self.claims.as_ref()?;
        claims.full_name().or(claims.email.as_deref())
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.claims.as_ref()?.exp?, 0)
    }

    /// Tokens without an `exp` claim never count as expired locally; the
    /// server still has the final word.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.claims.as_ref().and_then(|c| c.exp) {
            Some(exp) => now.timestamp() >= exp,
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Token to attach to a request, refused once it has expired.
    pub fn bearer(&self) -> Result<&str> {
        if self.is_expired() {
            return Err(AppError::SessionError {
                message: "session token has expired".to_string(),
            });
        }
        Ok(&self.token)
    }
}

pub struct SessionManager<S: TokenStore> {
    store: S,
    current: Option<Session>,
}

impl<S: TokenStore> SessionManager<S> {
    /// Reads any stored token.
    pub async fn init(store: S) -> Result<Self> {
        let current = store.load().await?.map(Session::new);
        match &current {
            Some(session) if session.is_expired() => {
                tracing::info!("Stored session has expired");
            }
            Some(_) => tracing::debug!("Restored stored session"),
            None => tracing::debug!("No stored session"),
        }
        Ok(Self { store, current })
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.as_ref().is_some_and(|s| !s.is_expired())
    }

    pub fn require(&self) -> Result<&Session> {
        match &self.current {
            Some(session) if !session.is_expired() => Ok(session),
            Some(_) => Err(AppError::SessionError {
                message: "session token has expired".to_string(),
            }),
            None => Err(AppError::SessionError {
                message: "no active session".to_string(),
            }),
        }
    }

    pub async fn login(&mut self, token: String) -> Result<&Session> {
        let token = token.trim().to_string();
        if token.is_empty() {
            return Err(AppError::SessionError {
                message: "empty token".to_string(),
            });
        }
        self.store.save(&token).await?;
        tracing::info!("Session stored");
        Ok(self.current.insert(Session::new(token)))
    }

    pub async fn logout(&mut self) -> Result<()> {
        self.current = None;
        self.store.clear().await?;
        tracing::info!("Session cleared");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    CompleteEvaluations,
    ManageContent,
}

/// Client-side gate for which screens or commands to offer. Decided from
/// the profile the server returned, not from token claims.
pub fn has_capability(profile: &SessionProfile, capability: Capability) -> bool {
    match capability {
        Capability::CompleteEvaluations => true,
        Capability::ManageContent => profile
            .role
            .as_deref()
            .is_some_and(|role| role.eq_ignore_ascii_case(ADMIN_ROLE)),
    }
}
