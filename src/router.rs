//! Route table and navigation guard.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every navigation is resolved against [`ROUTES`] and checked by [`guard`]
//! before a view is entered. Authentication is judged by the token as
//! currently persisted, re-read on each navigation, so a token removed by
//! another component or process takes effect at the next transition.
//!
//! DESIGN
//! ======
//! The HTTP client never navigates on failure. [`redirect_for`] maps an
//! [`ApiError`] to the location a caller should move to: `/login` for 401,
//! `/error?code=..&from=..` for 403 and 500/502/503, nothing otherwise.

#[cfg(test)]
#[path = "router_test.rs"]
mod router_test;

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Url;

use crate::net::error::{ApiError, FailureKind};
use crate::state::session::SessionContext;

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";
pub const ERROR_PATH: &str = "/error";

/// Scheme and host only exist so `Url` can parse in-app locations.
const LOCATION_ORIGIN: &str = "http://app.local";

/// Bytes left bare in a query component: alphanumerics plus `-_.!~*'()`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Redirect hops followed before giving up on a guard loop.
const MAX_REDIRECTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteName {
    Home,
    MovieDetails,
    SeatSelection,
    Profile,
    TopUp,
    Login,
    ServerError,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteDescriptor {
    /// Pattern; `:name` segments capture params, `*` matches anything.
    pub path: &'static str,
    pub name: RouteName,
    pub requires_auth: bool,
}

/// Application routes in match order. The catch-all must stay last.
pub const ROUTES: &[RouteDescriptor] = &[
    RouteDescriptor { path: "/", name: RouteName::Home, requires_auth: false },
    RouteDescriptor { path: "/movie/:id", name: RouteName::MovieDetails, requires_auth: false },
    RouteDescriptor { path: "/booking/:showtimeId", name: RouteName::SeatSelection, requires_auth: true },
    RouteDescriptor { path: "/profile", name: RouteName::Profile, requires_auth: true },
    RouteDescriptor { path: "/topup", name: RouteName::TopUp, requires_auth: true },
    RouteDescriptor { path: "/login", name: RouteName::Login, requires_auth: false },
    RouteDescriptor { path: "/error", name: RouteName::ServerError, requires_auth: false },
    RouteDescriptor { path: "*", name: RouteName::NotFound, requires_auth: false },
];

/// A location resolved against [`ROUTES`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub route: &'static RouteDescriptor,
    /// Path without query string.
    pub path: String,
    pub params: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
}

impl RouteMatch {
    #[must_use]
    pub fn name(&self) -> RouteName {
        self.route.name
    }

    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Redirect(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Enter the matched route.
    Proceed(RouteMatch),
    /// Go to this location instead.
    Redirect(String),
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Match `location` (path plus optional query) to a route.
///
/// Unparseable or unknown locations resolve to [`RouteName::NotFound`].
#[must_use]
pub fn resolve(location: &str) -> RouteMatch {
    let Some(url) = Url::parse(LOCATION_ORIGIN).ok().and_then(|base| base.join(location).ok()) else {
        return not_found(location.to_owned(), BTreeMap::new());
    };
    let path = url.path().to_owned();
    let query: BTreeMap<String, String> = url.query_pairs().into_owned().collect();

    for route in ROUTES {
        if let Some(params) = match_pattern(route.path, &path) {
            return RouteMatch { route, path, params, query };
        }
    }
    not_found(path, query)
}

fn not_found(path: String, query: BTreeMap<String, String>) -> RouteMatch {
    let route = &ROUTES[ROUTES.len() - 1];
    RouteMatch { route, path, params: BTreeMap::new(), query }
}

fn match_pattern(pattern: &str, path: &str) -> Option<BTreeMap<String, String>> {
    if pattern == "*" {
        return Some(BTreeMap::new());
    }
    let wanted: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let actual: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if wanted.len() != actual.len() {
        return None;
    }

    let mut params = BTreeMap::new();
    for (want, got) in wanted.iter().zip(&actual) {
        if let Some(name) = want.strip_prefix(':') {
            params.insert(name.to_owned(), (*got).to_owned());
        } else if want != got {
            return None;
        }
    }
    Some(params)
}

// =============================================================================
// GUARD
// =============================================================================

/// Decide whether navigation to `target` may proceed.
#[must_use]
pub fn guard(target: &RouteDescriptor, has_token: bool) -> GuardDecision {
    if target.requires_auth && !has_token {
        GuardDecision::Redirect(LOGIN_PATH)
    } else if target.name == RouteName::Login && has_token {
        GuardDecision::Redirect(HOME_PATH)
    } else {
        GuardDecision::Proceed
    }
}

/// Guarded navigation over a shared session.
#[derive(Clone, Debug)]
pub struct Router {
    session: SessionContext,
}

impl Router {
    #[must_use]
    pub fn new(session: SessionContext) -> Self {
        Self { session }
    }

    /// Resolve `location` and apply the guard, following redirects until a
    /// route accepts.
    #[must_use]
    pub fn navigate(&self, location: &str) -> Navigation {
        let has_token = self.session.persisted_token().is_some();
        let mut target = resolve(location);
        let mut redirected = None;

        for _ in 0..MAX_REDIRECTS {
            match guard(target.route, has_token) {
                GuardDecision::Proceed => {
                    return match redirected {
                        Some(to) => Navigation::Redirect(to),
                        None => Navigation::Proceed(target),
                    };
                }
                GuardDecision::Redirect(to) => {
                    tracing::debug!(from = %target.path, to, "navigation redirected");
                    target = resolve(to);
                    redirected = Some(to.to_owned());
                }
            }
        }
        tracing::warn!(location, "redirect loop; falling back to home");
        Navigation::Redirect(HOME_PATH.to_owned())
    }
}

// =============================================================================
// FAILURE REDIRECTS
// =============================================================================

/// `/error?code=<code>&from=<from>` with `from` URL-encoded.
#[must_use]
pub fn error_location(code: u16, from: &str) -> String {
    format!("{ERROR_PATH}?code={code}&from={}", utf8_percent_encode(from, COMPONENT))
}

/// Where to send the user after `error`, when the failure has a global
/// reaction. `from` is the path the user was on.
#[must_use]
pub fn redirect_for(error: &ApiError, from: &str) -> Option<String> {
    match error.kind() {
        FailureKind::Unauthenticated => Some(LOGIN_PATH.to_owned()),
        FailureKind::Forbidden => Some(error_location(403, from)),
        FailureKind::Server(status) => Some(error_location(status, from)),
        FailureKind::Other => None,
    }
}

/// Parameters of the error view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorPage {
    pub code: Option<u16>,
    pub from: Option<String>,
}

impl ErrorPage {
    #[must_use]
    pub fn from_query(query: &BTreeMap<String, String>) -> Self {
        Self {
            code: query.get("code").and_then(|c| c.parse().ok()),
            from: query.get("from").filter(|f| !f.is_empty()).cloned(),
        }
    }

    /// Heading shown for the code.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self.code {
            Some(403) => "Доступ запрещён",
            Some(502) => "Сервер недоступен",
            Some(503) => "Сервис временно недоступен",
            _ => "Ошибка сервера",
        }
    }

    /// Where a "back" action should lead.
    #[must_use]
    pub fn back_location(&self) -> &str {
        self.from.as_deref().unwrap_or(HOME_PATH)
    }
}
