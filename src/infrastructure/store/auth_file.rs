// src/infrastructure/store/auth_file.rs
//! Line-oriented persistence for the identity directory.
//!
//! ```text
//! role name=admin abilities=manage,view,
//!
//! user name=alice password=<md5-or-cleartext> roles=admin support
//! ```
//!
//! The reader tolerates extra whitespace, trailing commas, `#` comments and
//! blank lines; directive order does not matter. The writer emits all roles
//! before all users and replaces the target atomically.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::identity::{Ability, Directory};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Populate `directory` from the file at `path`. Individual bad directives
/// are logged and skipped; only I/O failures abort the load.
pub fn load(directory: &mut Directory, path: &Path) -> DomainResult<()> {
    let text = fs::read_to_string(path)
        .map_err(|err| DomainError::Persistence(format!("cannot read {}: {err}", path.display())))?;

    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let result = match line.split_whitespace().next() {
            Some("role") => load_role(directory, line),
            Some("user") => load_user(directory, line),
            Some(directive) => {
                tracing::warn!(line = lineno + 1, directive, "unknown directive ignored");
                Ok(())
            }
            None => Ok(()),
        };
        if let Err(err) = result {
            tracing::warn!(line = lineno + 1, error = %err, "bad directive ignored");
        }
    }
    Ok(())
}

fn load_role(directory: &mut Directory, line: &str) -> DomainResult<()> {
    let name = token_field(line, "name=")
        .ok_or_else(|| DomainError::Validation("role is missing name".into()))?;
    let abilities = tail_field(line, "abilities=")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(Ability::from)
        .collect();
    directory.add_role(name, abilities).map(|_| ())
}

fn load_user(directory: &mut Directory, line: &str) -> DomainResult<()> {
    let name = token_field(line, "name=")
        .ok_or_else(|| DomainError::Validation("user is missing name".into()))?;
    let password = token_field(line, "password=").unwrap_or_default();
    // The role specification runs to the end of the line and may contain
    // spaces, so it cannot be read as a single whitespace token.
    let roles = tail_field(line, "roles=").unwrap_or_default();
    directory.add_user(name, password, roles).map(|_| ())
}

/// Value of `key=` up to the next whitespace, anywhere in the line.
fn token_field<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    line.split_whitespace()
        .find_map(|token| token.strip_prefix(key))
}

/// Value of `key=` up to the end of the line.
fn tail_field<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    line.find(key)
        .map(|idx| line[idx + key.len()..].trim())
}

/// Write the directory to `path` atomically: temp file in the same
/// directory, fsync, rename. On any failure the original file is untouched
/// and the temp file is removed.
pub fn save(directory: &Directory, path: &Path) -> DomainResult<()> {
    let tmp = path.with_extension("tmp");
    let result = write_snapshot(directory, path, &tmp);
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn write_snapshot(directory: &Directory, path: &Path, tmp: &Path) -> DomainResult<()> {
    let persist = |err: std::io::Error| {
        DomainError::Persistence(format!("cannot write {}: {err}", path.display()))
    };

    let mut file = File::create(tmp).map_err(persist)?;
    file.write_all(render(directory, path).as_bytes()).map_err(persist)?;
    file.sync_all().map_err(persist)?;
    drop(file);
    fs::rename(tmp, path).map_err(persist)
}

fn render(directory: &Directory, path: &Path) -> String {
    let base = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut out = format!("#\n#   {base} - Authorization data\n#\n\n");

    let mut roles: Vec<_> = directory.roles().collect();
    roles.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
    for role in roles {
        out.push_str(&format!("role name={} abilities=", role.name));
        for ability in &role.abilities {
            out.push_str(ability.as_str());
            out.push(',');
        }
        out.push('\n');
    }
    out.push('\n');

    let mut users: Vec<_> = directory.users().collect();
    users.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
    for user in users {
        out.push_str(&format!(
            "user name={} password={} roles={}\n",
            user.name, user.password, user.roles
        ));
    }
    out
}
