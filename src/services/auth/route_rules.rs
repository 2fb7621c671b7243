/*
 * Responsibility
 * - static {method, path pattern} -> required roles table
 * - public (no identity needed) allow-list
 * - evaluate(): the route-level gate, before any handler or per-resource policy
 */
use std::borrow::Cow;

use crate::services::auth::identity::{Identity, Role};

pub const API_PREFIX: &str = "/api/v1";

/// Reachable without an identity.
pub const PUBLIC_ROUTES: &[&str] = &["/authenticate", "/register", "/health"];

#[derive(Debug, Clone, Copy)]
pub struct RouteRule {
    pub method: &'static str,
    /// `{name}` matches exactly one segment.
    pub pattern: &'static str,
    pub roles: &'static [Role],
}

const ADMIN: &[Role] = &[Role::Admin];
const ANY_ROLE: &[Role] = &[Role::Admin, Role::User];

const fn rule(method: &'static str, pattern: &'static str, roles: &'static [Role]) -> RouteRule {
    RouteRule {
        method,
        pattern,
        roles,
    }
}

// First match wins: literal segments go before `{id}` patterns.
pub const ROUTE_RULES: &[RouteRule] = &[
    rule("GET", "/tasks", ANY_ROLE),
    rule("GET", "/tasks/author", ANY_ROLE),
    rule("GET", "/tasks/assignee", ANY_ROLE),
    rule("POST", "/tasks", ADMIN),
    rule("GET", "/tasks/{id}", ANY_ROLE),
    rule("PUT", "/tasks/{id}", ADMIN),
    rule("DELETE", "/tasks/{id}", ADMIN),
    rule("PATCH", "/tasks/{id}/assign", ADMIN),
    rule("PATCH", "/tasks/{id}/status", ANY_ROLE),
    rule("PATCH", "/tasks/{id}/priority", ANY_ROLE),
    rule("POST", "/tasks/{id}/comments", ANY_ROLE),
    rule("GET", "/tasks/{id}/comments", ANY_ROLE),
    rule("POST", "/users/{id}/add-admin-role", ADMIN),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    /// No identity on a protected route.
    Unauthenticated,
    /// Identity present but holds none of the required roles.
    Forbidden,
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

pub fn path_matches(pattern: &str, path: &str) -> bool {
    let mut pattern_segments = segments(pattern);
    let mut path_segments = segments(path);

    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return true,
            (Some(p), Some(s)) => {
                let is_param = p.starts_with('{') && p.ends_with('}');
                if !is_param && p != s {
                    return false;
                }
            }
            _ => return false,
        }
    }
}

/// Path relative to the API prefix, or `None` for paths outside it.
fn api_path(path: &str) -> Option<&str> {
    let rest = path.strip_prefix(API_PREFIX)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

pub fn is_public(path: &str) -> bool {
    api_path(path).is_some_and(|rel| PUBLIC_ROUTES.iter().any(|p| path_matches(p, rel)))
}

/// HEAD is served by GET handlers, so it is held to the GET rules.
fn rule_method(method: &str) -> &str {
    if method.eq_ignore_ascii_case("HEAD") {
        "GET"
    } else {
        method
    }
}

/// Roles of the first matching rule. `None` means "any authenticated identity".
///
/// A path listed in the table but requested with an unlisted method needs a role
/// accepted by every rule for that path.
pub fn required_roles(method: &str, path: &str) -> Option<Cow<'static, [Role]>> {
    let rel = api_path(path)?;
    let method = rule_method(method);

    let mut for_path = ROUTE_RULES
        .iter()
        .filter(|r| path_matches(r.pattern, rel))
        .peekable();
    for_path.peek()?;

    let mut strictest: Option<Vec<Role>> = None;
    for r in for_path {
        if r.method.eq_ignore_ascii_case(method) {
            return Some(Cow::Borrowed(r.roles));
        }
        strictest = Some(match strictest {
            None => r.roles.to_vec(),
            Some(mut acc) => {
                acc.retain(|role| r.roles.contains(role));
                acc
            }
        });
    }
    strictest.map(Cow::Owned)
}

pub fn evaluate(method: &str, path: &str, identity: Option<&Identity>) -> GateDecision {
    if is_public(path) {
        return GateDecision::Allow;
    }

    let Some(identity) = identity else {
        return GateDecision::Unauthenticated;
    };

    match required_roles(method, path) {
        Some(roles) if !identity.satisfies_any(&roles) => GateDecision::Forbidden,
        _ => GateDecision::Allow,
    }
}
