//! services/client/src/dashboard/routes.rs
//!
//! Which view may render for a given session.

use mail_router_core::domain::{AuthState, Route, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// The session is not settled yet; show the loading state.
    Wait,
    Render,
    Redirect(Route),
}

pub fn guard(route: Route, session: Session) -> RouteDecision {
    match (route, session.state) {
        (_, AuthState::Unresolved | AuthState::Resolving) => RouteDecision::Wait,
        (Route::Dashboard, AuthState::Unauthenticated) => RouteDecision::Redirect(Route::Login),
        (Route::Landing | Route::Login, AuthState::Authenticated) => {
            RouteDecision::Redirect(Route::Dashboard)
        }
        _ => RouteDecision::Render,
    }
}
