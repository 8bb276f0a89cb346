// src/domain/identity/directory.rs
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::identity::entity::{Role, User};
use crate::domain::identity::value_objects::{Ability, RoleName, Username};
use std::collections::{HashMap, HashSet};

pub const DEFAULT_MAX_DEPTH: usize = 20;

/// In-memory directory of users and roles.
///
/// User and role names are each unique within their own namespace. A user's
/// ability set is always the transitive closure of its role specification over
/// the role table; the directory recomputes it whenever the specification
/// changes, and replaces the set in one assignment so readers never observe a
/// half-built closure.
#[derive(Debug)]
pub struct Directory {
    users: HashMap<String, User>,
    roles: HashMap<String, Role>,
    max_depth: usize,
}

impl Default for Directory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl Directory {
    pub fn new(max_depth: usize) -> Self {
        Self {
            users: HashMap::new(),
            roles: HashMap::new(),
            max_depth,
        }
    }

    pub fn add_user(
        &mut self,
        name: &str,
        password: impl Into<String>,
        roles_spec: impl Into<String>,
    ) -> DomainResult<&User> {
        let username = Username::new(name)?;
        if self.users.contains_key(username.as_str()) {
            tracing::error!(user = name, "user already exists");
            return Err(DomainError::Conflict(format!("user '{name}' already exists")));
        }
        let mut user = User::new(username, password, roles_spec);
        user.abilities = resolve_abilities(&self.roles, &user.roles, self.max_depth);
        trace_abilities(&user);
        let key = user.name.as_str().to_string();
        Ok(self.users.entry(key).or_insert(user))
    }

    pub fn remove_user(&mut self, name: &str) -> DomainResult<()> {
        self.users
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| DomainError::NotFound(format!("user '{name}' is unknown")))
    }

    pub fn lookup_user(&self, name: &str) -> Option<&User> {
        self.users.get(name)
    }

    /// Replace a user's role specification and rebuild its ability closure.
    pub fn set_user_roles(&mut self, name: &str, roles_spec: impl Into<String>) -> DomainResult<()> {
        if !self.users.contains_key(name) {
            return Err(DomainError::NotFound(format!("user '{name}' is unknown")));
        }
        let spec = roles_spec.into();
        let abilities = resolve_abilities(&self.roles, &spec, self.max_depth);
        let user = self.users.get_mut(name).expect("user checked above");
        user.roles = spec;
        user.abilities = abilities;
        trace_abilities(user);
        Ok(())
    }

    pub fn add_role(&mut self, name: &str, abilities: Vec<Ability>) -> DomainResult<&Role> {
        let role_name = RoleName::new(name)?;
        if self.roles.contains_key(role_name.as_str()) {
            tracing::error!(role = name, "role already exists");
            return Err(DomainError::Conflict(format!("role '{name}' already exists")));
        }
        let role = Role::new(role_name, abilities);
        let key = role.name.as_str().to_string();
        Ok(self.roles.entry(key).or_insert(role))
    }

    /// Remove a role definition.
    ///
    /// Does not recompute abilities for users that reference this role; call
    /// [`Directory::compute_all_user_abilities`] afterwards when that matters.
    pub fn remove_role(&mut self, name: &str) -> DomainResult<()> {
        self.roles
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| DomainError::NotFound(format!("role '{name}' is unknown")))
    }

    pub fn lookup_role(&self, name: &str) -> Option<&Role> {
        self.roles.get(name)
    }

    /// Rebuild every user's ability closure. Intended remedy after removing
    /// or redefining roles.
    pub fn compute_all_user_abilities(&mut self) {
        let names: Vec<String> = self.users.keys().cloned().collect();
        for name in names {
            let spec = self.users[&name].roles.clone();
            let abilities = resolve_abilities(&self.roles, &spec, self.max_depth);
            let user = self.users.get_mut(&name).expect("user enumerated above");
            user.abilities = abilities;
            trace_abilities(user);
        }
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.values()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

fn trace_abilities(user: &User) {
    tracing::trace!(
        user = %user.name,
        abilities = ?user.abilities.iter().map(Ability::as_str).collect::<Vec<_>>(),
        "computed user abilities"
    );
}

/// Expand a role specification into its set of terminal abilities.
///
/// Tokens that name a defined role are expanded member by member in authored
/// order; anything else is a terminal ability and lands in the output as-is.
/// A role already on the expansion path marks a recursive definition: it is
/// logged and skipped, keeping the partial closure. The depth cap is a second
/// bound on pathological but acyclic graphs.
fn resolve_abilities(
    roles: &HashMap<String, Role>,
    spec: &str,
    max_depth: usize,
) -> HashSet<Ability> {
    let mut out = HashSet::new();
    let mut path = Vec::new();
    for token in tokenize_spec(spec) {
        expand(roles, token, &mut path, max_depth, &mut out);
    }
    out
}

fn tokenize_spec(spec: &str) -> impl Iterator<Item = &str> {
    spec.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
}

fn expand(
    roles: &HashMap<String, Role>,
    name: &str,
    path: &mut Vec<String>,
    max_depth: usize,
    out: &mut HashSet<Ability>,
) {
    if path.len() > max_depth {
        tracing::error!(role = name, depth = path.len(), "recursive ability definition");
        return;
    }
    match roles.get(name) {
        Some(role) => {
            if path.iter().any(|p| p == name) {
                tracing::error!(role = name, "recursive ability definition");
                return;
            }
            path.push(name.to_string());
            for member in &role.abilities {
                expand(roles, member.as_str(), path, max_depth, out);
            }
            path.pop();
        }
        None => {
            out.insert(Ability::new(name));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abilities(names: &[&str]) -> Vec<Ability> {
        names.iter().map(|n| Ability::from(*n)).collect()
    }

    fn ability_names(user: &User) -> HashSet<String> {
        user.abilities.iter().map(|a| a.as_str().to_string()).collect()
    }

    #[test]
    fn closure_unions_terminal_abilities_of_nested_roles() {
        let mut directory = Directory::default();
        directory.add_role("user", abilities(&["view"])).unwrap();
        directory.add_role("support", abilities(&["view", "reply"])).unwrap();
        directory
            .add_role("admin", abilities(&["user", "support", "manage"]))
            .unwrap();
        directory.add_user("alice", "pw", "admin").unwrap();

        let alice = directory.lookup_user("alice").unwrap();
        assert_eq!(
            ability_names(alice),
            HashSet::from(["view".into(), "reply".into(), "manage".into()])
        );
    }

    #[test]
    fn undefined_role_token_is_kept_as_terminal_ability() {
        let mut directory = Directory::default();
        directory.add_user("bob", "pw", "foo").unwrap();

        let bob = directory.lookup_user("bob").unwrap();
        assert_eq!(ability_names(bob), HashSet::from(["foo".into()]));
    }

    #[test]
    fn cyclic_roles_terminate_with_partial_closure() {
        let mut directory = Directory::default();
        directory.add_role("a", abilities(&["b"])).unwrap();
        directory.add_role("b", abilities(&["a", "terminal"])).unwrap();
        directory.add_user("u", "pw", "a").unwrap();

        let u = directory.lookup_user("u").unwrap();
        assert_eq!(ability_names(u), HashSet::from(["terminal".into()]));
    }

    #[test]
    fn diamond_role_graph_expands_shared_member_once_per_path() {
        let mut directory = Directory::default();
        directory.add_role("d", abilities(&["leaf"])).unwrap();
        directory.add_role("b", abilities(&["d"])).unwrap();
        directory.add_role("c", abilities(&["d", "extra"])).unwrap();
        directory.add_role("a", abilities(&["b", "c"])).unwrap();
        directory.add_user("u", "pw", "a").unwrap();

        let u = directory.lookup_user("u").unwrap();
        assert_eq!(
            ability_names(u),
            HashSet::from(["leaf".into(), "extra".into()])
        );
    }

    #[test]
    fn duplicate_user_is_a_conflict_and_leaves_original() {
        let mut directory = Directory::default();
        directory.add_user("alice", "pw", "admin").unwrap();
        let err = directory.add_user("alice", "other", "user").unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(directory.lookup_user("alice").unwrap().password, "pw");
    }

    #[test]
    fn remove_role_does_not_touch_users_until_recompute() {
        let mut directory = Directory::default();
        directory.add_role("admin", abilities(&["manage"])).unwrap();
        directory.add_user("alice", "pw", "admin").unwrap();
        directory.remove_role("admin").unwrap();

        // Stale closure survives the removal.
        assert!(directory.lookup_user("alice").unwrap().has_ability("manage"));

        directory.compute_all_user_abilities();
        // With the role gone the token now reads as a terminal ability.
        let alice = directory.lookup_user("alice").unwrap();
        assert_eq!(ability_names(alice), HashSet::from(["admin".into()]));
    }

    #[test]
    fn set_user_roles_rebuilds_the_closure() {
        let mut directory = Directory::default();
        directory.add_role("admin", abilities(&["manage", "view"])).unwrap();
        directory.add_user("alice", "pw", "viewer").unwrap();
        directory.set_user_roles("alice", "admin").unwrap();

        let alice = directory.lookup_user("alice").unwrap();
        assert_eq!(alice.roles, "admin");
        assert_eq!(
            ability_names(alice),
            HashSet::from(["manage".into(), "view".into()])
        );
    }

    #[test]
    fn empty_username_is_rejected() {
        let mut directory = Directory::default();
        let err = directory.add_user("  ", "pw", "").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn roles_tokenize_on_whitespace_and_commas() {
        let mut directory = Directory::default();
        directory.add_user("u", "pw", "one, two\tthree  four,").unwrap();
        let u = directory.lookup_user("u").unwrap();
        assert_eq!(
            ability_names(u),
            HashSet::from(["one".into(), "two".into(), "three".into(), "four".into()])
        );
    }
}
