//! # Authentication Gate
//!
//! The narrow view of authentication the renderer needs: whether the
//! viewer is signed in, or whether that is still being determined.
//! Storing and refreshing session tokens is left to the application.

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// What is known about the current viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthStatus {
    /// The session is still being resolved.
    Determining,
    /// The viewer is signed in.
    Authenticated,
    /// The viewer is known not to be signed in.
    Anonymous,
}

impl AuthStatus {
    /// Whether the status is final.
    pub fn is_resolved(self) -> bool {
        !matches!(self, AuthStatus::Determining)
    }

    /// Parses `determining`, `authenticated` or `anonymous`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "determining" | "pending" => Some(AuthStatus::Determining),
            "authenticated" | "signed-in" => {
                Some(AuthStatus::Authenticated)
            }
            "anonymous" | "signed-out" => Some(AuthStatus::Anonymous),
            _ => None,
        }
    }
}

impl fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AuthStatus::Determining => "determining",
            AuthStatus::Authenticated => "authenticated",
            AuthStatus::Anonymous => "anonymous",
        })
    }
}

/// Source of the viewer's authentication status.
pub trait AuthGate: Send + Sync + fmt::Debug {
    /// Returns the current status.
    fn status(&self) -> AuthStatus;
}

/// A gate with a fixed answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticAuthGate(pub AuthStatus);

impl AuthGate for StaticAuthGate {
    fn status(&self) -> AuthStatus {
        self.0
    }
}

impl Default for StaticAuthGate {
    fn default() -> Self {
        StaticAuthGate(AuthStatus::Anonymous)
    }
}

/// A gate that never changes its answer once it has resolved.
///
/// While the inner gate reports `Determining` this gate does too. The
/// first resolved status it observes is kept for the lifetime of the
/// latch, so a page never flips between outcomes. Clones share the latch.
#[derive(Debug, Clone)]
pub struct LatchedAuthGate<G> {
    inner: G,
    resolved: Arc<RwLock<Option<AuthStatus>>>,
}

impl<G: AuthGate> LatchedAuthGate<G> {
    /// Wraps a gate.
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            resolved: Arc::new(RwLock::new(None)),
        }
    }
}

impl<G: AuthGate> AuthGate for LatchedAuthGate<G> {
    fn status(&self) -> AuthStatus {
        if let Some(status) = *self.resolved.read() {
            return status;
        }

        let mut resolved = self.resolved.write();
        if let Some(status) = *resolved {
            return status;
        }
        let status = self.inner.status();
        if status.is_resolved() {
            *resolved = Some(status);
        }
        status
    }
}
