// src/domain/identity/entity.rs
use crate::domain::identity::value_objects::{Ability, RoleName, Username};
use std::collections::HashSet;

/// A directory entry for one account.
///
/// `password` is stored verbatim: either cleartext as authored, or the
/// precomputed `MD5(name:realm:password)` digest when the record came from an
/// authorization file. `roles` keeps the membership specification exactly as
/// authored (whitespace/comma separated); `abilities` is derived from it and
/// rebuilt whenever the roles change.
#[derive(Debug, Clone)]
pub struct User {
    pub name: Username,
    pub password: String,
    pub roles: String,
    pub abilities: HashSet<Ability>,
}

impl User {
    pub fn new(name: Username, password: impl Into<String>, roles: impl Into<String>) -> Self {
        Self {
            name,
            password: password.into(),
            roles: roles.into(),
            abilities: HashSet::new(),
        }
    }

    pub fn has_ability(&self, ability: &str) -> bool {
        self.abilities.iter().any(|a| a.as_str() == ability)
    }
}

/// A named bundle of abilities. Members are kept in authored order; a member
/// may itself name another role, which the resolver expands transitively.
#[derive(Debug, Clone)]
pub struct Role {
    pub name: RoleName,
    pub abilities: Vec<Ability>,
}

impl Role {
    pub fn new(name: RoleName, abilities: Vec<Ability>) -> Self {
        Self { name, abilities }
    }
}
