//! Route matching module
//!
//! Ordered rule table over (method, path). The first matching rule wins,
//! so more specific prefixes are listed before broader ones.

use super::event::RouteDescriptor;
use std::collections::HashMap;

/// Path rule: exact match or prefix match
#[derive(Debug, Clone, Copy)]
pub enum PathMatch {
    Exact(&'static str),
    Prefix(&'static str),
}

impl PathMatch {
    /// Returns the remainder after the prefix for prefix rules,
    /// an empty remainder for exact rules.
    fn capture<'p>(&self, path: &'p str) -> Option<&'p str> {
        match self {
            Self::Exact(exact) => (path == *exact).then_some(""),
            Self::Prefix(prefix) => path.strip_prefix(prefix),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    SpacesCollection,
    OwnerByPath,
    CreateSpace,
    UpdateSpace,
    UpdateSpaceAliased,
    DeleteSpace,
    UserByPath,
}

struct Rule {
    method: &'static str,
    path: PathMatch,
    target: Target,
}

const RULES: &[Rule] = &[
    Rule { method: "GET", path: PathMatch::Prefix("/spaces/hoster/"), target: Target::OwnerByPath },
    Rule { method: "GET", path: PathMatch::Exact("/spaces"), target: Target::SpacesCollection },
    Rule { method: "POST", path: PathMatch::Exact("/spaces"), target: Target::CreateSpace },
    Rule { method: "PUT", path: PathMatch::Exact("/spaces"), target: Target::UpdateSpace },
    Rule { method: "PUT", path: PathMatch::Exact("/spaces/full"), target: Target::UpdateSpaceAliased },
    Rule { method: "DELETE", path: PathMatch::Exact("/spaces"), target: Target::DeleteSpace },
    Rule { method: "GET", path: PathMatch::Prefix("/users/"), target: Target::UserByPath },
];

/// Resolved operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Single space read by `spaceId` query parameter
    GetSpace,
    /// Every space flagged available
    ListAvailable,
    /// Spaces owned by one hoster; `owner` carries the path suffix when present
    ListByOwner { owner: Option<String> },
    CreateSpace,
    UpdateSpace,
    UpdateSpaceAliased,
    DeleteSpace,
    /// User read; `user_id` is the path suffix after `/users/`
    GetUser { user_id: String },
}

/// Find the route for a descriptor
///
/// `GET /spaces` branches on the query: `spaceId` selects the single
/// read, `hoster` the owner listing, otherwise the available listing.
pub fn resolve(descriptor: &RouteDescriptor, query: &HashMap<String, String>) -> Option<Route> {
    let (rule, rest) = RULES.iter().find_map(|rule| {
        if rule.method != descriptor.method {
            return None;
        }
        rule.path.capture(&descriptor.path).map(|rest| (rule, rest))
    })?;

    let route = match rule.target {
        Target::SpacesCollection => {
            if query.contains_key("spaceId") {
                Route::GetSpace
            } else if query.contains_key("hoster") {
                Route::ListByOwner { owner: None }
            } else {
                Route::ListAvailable
            }
        }
        Target::OwnerByPath => Route::ListByOwner {
            owner: Some(rest.trim_matches('/').to_string()).filter(|o| !o.is_empty()),
        },
        Target::CreateSpace => Route::CreateSpace,
        Target::UpdateSpace => Route::UpdateSpace,
        Target::UpdateSpaceAliased => Route::UpdateSpaceAliased,
        Target::DeleteSpace => Route::DeleteSpace,
        Target::UserByPath => Route::GetUser {
            user_id: rest.trim_matches('/').to_string(),
        },
    };
    Some(route)
}
