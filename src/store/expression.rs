//! Update expression evaluation
//!
//! Understands the subset of the update grammar the handlers emit:
//! a `SET` clause of `path = :value` assignments and a `REMOVE` clause
//! of paths, in either order. Paths are `#placeholders` or plain
//! identifiers; values are always `:placeholders`.

use std::collections::HashSet;

use super::errors::{StoreError, StoreResult};
use super::{AttributeValue, Item, UpdateItem};

/// One resolved mutation
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Set(String, AttributeValue),
    Remove(String),
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
enum Clause {
    Set,
    Remove,
}

/// Parse and resolve an update against its placeholder maps
pub fn parse(update: &UpdateItem, key_attr: &str) -> StoreResult<Vec<Action>> {
    let mut set_parts: Vec<&str> = Vec::new();
    let mut remove_parts: Vec<&str> = Vec::new();
    let mut current: Option<Clause> = None;
    let mut seen = HashSet::new();

    for word in update.expression.split_whitespace() {
        let clause = match word.to_ascii_uppercase().as_str() {
            "SET" => Some(Clause::Set),
            "REMOVE" => Some(Clause::Remove),
            _ => None,
        };
        if let Some(clause) = clause {
            if !seen.insert(clause) {
                return Err(StoreError::Validation(format!(
                    "Clause {word} appears more than once"
                )));
            }
            current = Some(clause);
            continue;
        }
        match current {
            Some(Clause::Set) => set_parts.push(word),
            Some(Clause::Remove) => remove_parts.push(word),
            None => {
                return Err(StoreError::Validation(format!(
                    "Unexpected token before clause keyword: {word}"
                )))
            }
        }
    }

    let mut actions = Vec::new();
    let set_text = set_parts.join(" ");
    if seen.contains(&Clause::Set) {
        for assignment in split_list(&set_text)? {
            let (lhs, rhs) = assignment.split_once('=').ok_or_else(|| {
                StoreError::Validation(format!("Malformed assignment: {assignment}"))
            })?;
            let name = resolve_name(update, lhs.trim())?;
            let value = resolve_value(update, rhs.trim())?;
            actions.push(Action::Set(name, value));
        }
    }

    let remove_text = remove_parts.join(" ");
    if seen.contains(&Clause::Remove) {
        for path in split_list(&remove_text)? {
            actions.push(Action::Remove(resolve_name(update, path)?));
        }
    }

    if actions.is_empty() {
        return Err(StoreError::Validation(
            "Update expression is empty".to_string(),
        ));
    }

    let mut touched = HashSet::new();
    for action in &actions {
        let name = match action {
            Action::Set(name, _) | Action::Remove(name) => name,
        };
        if name == key_attr {
            return Err(StoreError::Validation(format!(
                "Cannot update key attribute {key_attr}"
            )));
        }
        if !touched.insert(name.clone()) {
            return Err(StoreError::Validation(format!(
                "Attribute {name} is updated more than once"
            )));
        }
    }

    Ok(actions)
}

/// Apply resolved actions to an item, returning the newly set values
pub fn apply(item: &mut Item, actions: Vec<Action>) -> Item {
    let mut updated = Item::new();
    for action in actions {
        match action {
            Action::Set(name, value) => {
                item.insert(name.clone(), value.clone());
                updated.insert(name, value);
            }
            Action::Remove(name) => {
                item.remove(&name);
            }
        }
    }
    updated
}

fn split_list(text: &str) -> StoreResult<Vec<&str>> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(StoreError::Validation(format!(
            "Empty element in clause: '{text}'"
        )));
    }
    Ok(parts)
}

fn resolve_name(update: &UpdateItem, token: &str) -> StoreResult<String> {
    if token.starts_with('#') {
        return update.names.get(token).cloned().ok_or_else(|| {
            StoreError::Validation(format!("Unresolved attribute name placeholder {token}"))
        });
    }
    if !token.is_empty() && token.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Ok(token.to_string());
    }
    Err(StoreError::Validation(format!(
        "Invalid attribute path: {token}"
    )))
}

fn resolve_value(update: &UpdateItem, token: &str) -> StoreResult<AttributeValue> {
    if !token.starts_with(':') {
        return Err(StoreError::Validation(format!(
            "Expected a value placeholder, found: {token}"
        )));
    }
    update.values.get(token).cloned().ok_or_else(|| {
        StoreError::Validation(format!("Unresolved value placeholder {token}"))
    })
}
