//! Client route guard.
//!
//! Decides whether a page may be shown from the cached session alone. This is
//! navigation only: a stale or forged cache just gets 401/403 from the server.

use crate::db::Role;

use super::cache::CachedSession;

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    Redirect(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAccess {
    Public,
    /// Needs a session, and the given role when there is one
    Protected(Option<Role>),
}

/// Known client pages
pub const PAGES: &[(&str, PageAccess)] = &[
    ("/", PageAccess::Public),
    ("/products", PageAccess::Public),
    ("/register", PageAccess::Public),
    ("/login", PageAccess::Public),
    ("/forgot-password", PageAccess::Public),
    ("/cart", PageAccess::Public),
    ("/buyer-dashboard", PageAccess::Protected(Some(Role::Buyer))),
    ("/orders", PageAccess::Protected(Some(Role::Buyer))),
    ("/dashboard", PageAccess::Protected(Some(Role::Farmer))),
    ("/add-product", PageAccess::Protected(Some(Role::Farmer))),
    ("/edit-product", PageAccess::Protected(Some(Role::Farmer))),
    ("/cooperative-dashboard", PageAccess::Protected(Some(Role::Cooperative))),
    ("/admin-dashboard", PageAccess::Protected(Some(Role::Admin))),
    ("/profile", PageAccess::Protected(None)),
];

pub fn page_access(path: &str) -> Option<PageAccess> {
    let normalized = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    PAGES
        .iter()
        .find(|(page, _)| *page == normalized)
        .map(|(_, access)| *access)
}

/// Gate a protected page on the cached session
pub fn guard(session: Option<&CachedSession>, required: Option<Role>) -> GuardDecision {
    let Some(session) = session.filter(|s| !s.token.is_empty()) else {
        return GuardDecision::Redirect(LOGIN_PATH);
    };

    match required {
        Some(role) if session.user.role != role => {
            GuardDecision::Redirect(session.user.role.dashboard_path())
        }
        _ => GuardDecision::Render,
    }
}

/// Resolve any page, sending unknown paths home
pub fn open_page(path: &str, session: Option<&CachedSession>) -> GuardDecision {
    match page_access(path) {
        Some(PageAccess::Public) => GuardDecision::Render,
        Some(PageAccess::Protected(required)) => guard(session, required),
        None => GuardDecision::Redirect(HOME_PATH),
    }
}

/// Where a freshly signed-in (or signed-out) user lands
pub fn landing_path(session: Option<&CachedSession>) -> &'static str {
    match session {
        Some(session) if !session.token.is_empty() => session.user.role.dashboard_path(),
        _ => HOME_PATH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::AccountResponse;

    fn session(role: Role) -> CachedSession {
        CachedSession {
            token: "t".to_string(),
            user: AccountResponse {
                user_id: 1,
                role,
                full_name: "Jane Doe".to_string(),
                email: "jane@test.rw".to_string(),
            },
        }
    }

    #[test]
    fn test_no_session_goes_to_login() {
        assert_eq!(guard(None, Some(Role::Buyer)), GuardDecision::Redirect("/login"));
        assert_eq!(guard(None, None), GuardDecision::Redirect("/login"));

        let mut blank = session(Role::Buyer);
        blank.token.clear();
        assert_eq!(guard(Some(&blank), None), GuardDecision::Redirect("/login"));
    }

    #[test]
    fn test_wrong_role_goes_to_own_dashboard() {
        let farmer = session(Role::Farmer);
        assert_eq!(
            guard(Some(&farmer), Some(Role::Buyer)),
            GuardDecision::Redirect("/dashboard")
        );

        let buyer = session(Role::Buyer);
        assert_eq!(
            guard(Some(&buyer), Some(Role::Farmer)),
            GuardDecision::Redirect("/buyer-dashboard")
        );
    }

    #[test]
    fn test_matching_role_renders() {
        let buyer = session(Role::Buyer);
        assert_eq!(guard(Some(&buyer), Some(Role::Buyer)), GuardDecision::Render);
        assert_eq!(guard(Some(&buyer), None), GuardDecision::Render);
    }

    #[test]
    fn test_open_page() {
        let farmer = session(Role::Farmer);
        assert_eq!(open_page("products", None), GuardDecision::Render);
        assert_eq!(open_page("/orders", None), GuardDecision::Redirect("/login"));
        assert_eq!(open_page("/orders", Some(&farmer)), GuardDecision::Redirect("/dashboard"));
        assert_eq!(open_page("/add-product", Some(&farmer)), GuardDecision::Render);
        assert_eq!(open_page("/nowhere", Some(&farmer)), GuardDecision::Redirect("/"));
    }

    #[test]
    fn test_landing_path() {
        assert_eq!(landing_path(None), "/");
        assert_eq!(landing_path(Some(&session(Role::Cooperative))), "/cooperative-dashboard");
    }
}
