use serde::Serialize;

use crate::Role;

/// The authenticated caller of a single request.
///
/// Built from verified token claims by the auth guard and dropped with the
/// request. Fields are read-only once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    subject: String,
    role: Role,
}

impl Identity {
    pub fn new(subject: impl Into<String>, role: Role) -> Self {
        Self {
            subject: subject.into(),
            role,
        }
    }

    /// The account the token was issued to (user email).
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn role(&self) -> &Role {
        &self.role
    }
}
