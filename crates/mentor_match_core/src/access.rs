//! crates/mentor_match_core/src/access.rs
//!
//! The verified identity of a caller and the rules operations gate on.

use uuid::Uuid;

use crate::domain::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct AccessDenied {
    pub message: &'static str,
}

/// A declarative access rule evaluated against a [`Caller`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    HasRole(Role),
}

impl Rule {
    pub const ADMIN: Rule = Rule::HasRole(Role::Admin);
    pub const MENTOR: Rule = Rule::HasRole(Role::Mentor);
    pub const MENTEE: Rule = Rule::HasRole(Role::Mentee);

    fn denial(self) -> AccessDenied {
        let message = match self {
            Rule::HasRole(Role::Admin) => "Admin access required",
            Rule::HasRole(Role::Mentor) => "Mentor access required",
            Rule::HasRole(Role::Mentee) => "Mentee access required",
        };
        AccessDenied { message }
    }
}

/// Capability handed to every protected operation once its credential has
/// been verified. Carries nothing that was not signed into the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub subject_id: Uuid,
    pub role: Role,
}

impl Caller {
    pub fn new(subject_id: Uuid, role: Role) -> Self {
        Self { subject_id, role }
    }

    pub fn satisfies(&self, rule: Rule) -> bool {
        match rule {
            Rule::HasRole(role) => self.role == role,
        }
    }

    /// Fails with the first rule the caller does not satisfy.
    pub fn require(&self, rules: &[Rule]) -> Result<(), AccessDenied> {
        match rules.iter().find(|rule| !self.satisfies(**rule)) {
            Some(rule) => Err(rule.denial()),
            None => Ok(()),
        }
    }
}
