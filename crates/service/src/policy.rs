//! Authorization gate.
//!
//! The gate never sees credentials. An external collaborator turns the
//! request's bearer token into a [`Decision`]; the [`PolicyTable`] compares
//! that decision with the role each (collection, operation) pair requires.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use configs::{AccessLevel, CollectionPolicy};
use thiserror::Error;

/// Caller roles, ordered: a role satisfies any requirement at or below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Anonymous,
    User,
    Admin,
}

impl From<AccessLevel> for Role {
    fn from(level: AccessLevel) -> Self {
        match level {
            AccessLevel::Public => Role::Anonymous,
            AccessLevel::Authenticated => Role::User,
            AccessLevel::Admin => Role::Admin,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    /// The role set of a request that carried no credential.
    pub fn anonymous() -> Self { Self([Role::Anonymous].into_iter().collect()) }

    pub fn contains(&self, role: Role) -> bool { self.0.contains(&role) }

    pub fn is_authenticated(&self) -> bool { !self.0.contains(&Role::Anonymous) }

    pub fn satisfies(&self, required: Role) -> bool { self.0.iter().any(|r| *r >= required) }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self { Self(iter.into_iter().collect()) }
}

/// What the authorization collaborator concluded about a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// A credential was presented and rejected.
    Denied,
    Allowed(RoleSet),
}

impl Decision {
    pub fn anonymous() -> Self { Decision::Allowed(RoleSet::anonymous()) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 5] =
        [Operation::List, Operation::Get, Operation::Create, Operation::Update, Operation::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Get => "get",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("insufficient role")]
    Forbidden,
}

/// Required role per (collection, operation).
#[derive(Debug, Clone)]
pub struct PolicyTable {
    rules: HashMap<String, HashMap<Operation, Role>>,
}

impl Default for PolicyTable {
    fn default() -> Self { Self::defaults() }
}

impl PolicyTable {
    /// This deployment's table. The catalog lets any signed-in user list, read
    /// and create, and keeps edits for admins; the audience list is public and
    /// every write there is admin-only.
    pub fn defaults() -> Self {
        let mut table = Self { rules: HashMap::new() };
        for collection in ["categories", "products"] {
            table.set(collection, Operation::List, Role::User);
            table.set(collection, Operation::Get, Role::User);
            table.set(collection, Operation::Create, Role::User);
            table.set(collection, Operation::Update, Role::Admin);
            table.set(collection, Operation::Delete, Role::Admin);
        }
        for collection in ["subscribers", "subscriptions"] {
            table.set(collection, Operation::List, Role::Anonymous);
            table.set(collection, Operation::Get, Role::User);
            table.set(collection, Operation::Create, Role::Admin);
            table.set(collection, Operation::Update, Role::Admin);
            table.set(collection, Operation::Delete, Role::Admin);
        }
        table
    }

    /// Defaults with `[policy.<collection>]` overrides applied on top.
    pub fn from_config(overrides: &BTreeMap<String, CollectionPolicy>) -> Self {
        let mut table = Self::defaults();
        for (collection, p) in overrides {
            let entries = [
                (Operation::List, p.list),
                (Operation::Get, p.get),
                (Operation::Create, p.create),
                (Operation::Update, p.update),
                (Operation::Delete, p.delete),
            ];
            for (op, level) in entries {
                if let Some(level) = level {
                    table.set(collection, op, level.into());
                }
            }
        }
        table
    }

    pub fn set(&mut self, collection: &str, op: Operation, role: Role) {
        self.rules.entry(collection.to_string()).or_default().insert(op, role);
    }

    /// Unlisted pairs require `Admin`.
    pub fn required(&self, collection: &str, op: Operation) -> Role {
        self.rules
            .get(collection)
            .and_then(|ops| ops.get(&op))
            .copied()
            .unwrap_or(Role::Admin)
    }

    pub fn check(&self, collection: &str, op: Operation, decision: &Decision) -> Result<(), AccessError> {
        let required = self.required(collection, op);
        if required == Role::Anonymous {
            return Ok(());
        }
        match decision {
            Decision::Denied => Err(AccessError::InvalidToken),
            Decision::Allowed(roles) if roles.satisfies(required) => Ok(()),
            Decision::Allowed(roles) if !roles.is_authenticated() => Err(AccessError::Unauthenticated),
            Decision::Allowed(_) => Err(AccessError::Forbidden),
        }
    }
}
