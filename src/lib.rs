//! # Ledgergate (Session & Authorization Gateway)
//!
//! `ledgergate` fronts the Ledger personal-finance web application. It owns
//! the session cookie contract, exchanges credentials and refresh tokens
//! against the remote identity backend, and enforces path-based authorization
//! for every inbound request.
//!
//! ## Session model
//!
//! A session is a token pair: a short-lived access token and a rotating
//! refresh token, both delivered as `HttpOnly` cookies together with readable
//! expiry-mirror cookies for the UI. The pair is always replaced wholesale;
//! the backend never rotates one half on its own.
//!
//! ## Request gate
//!
//! Every request is classified against a route table (public, auth-redirect,
//! admin, account-protected) and resolved to a pure allow/redirect decision
//! from the request path and cookies alone. Admin routes additionally require
//! the access token to carry an `ADMIN` role claim; malformed tokens are
//! treated as unauthenticated, never as an error.

pub mod backend;
pub mod cli;
pub mod gateway;
pub mod session;

pub const GIT_COMMIT_HASH: &str = env!("LEDGERGATE_GIT_SHA");

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
