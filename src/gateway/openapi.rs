//! OpenAPI document for the gateway's own endpoints.

use utoipa::OpenApi;

use super::handlers::{auth, health};
use crate::session::{TokenPair, User};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::login,
        auth::logout,
        auth::refresh,
        auth::session,
    ),
    components(schemas(
        health::Health,
        auth::LoginRequest,
        auth::LoginResponse,
        auth::SessionResponse,
        auth::RefreshResponse,
        auth::ErrorResponse,
        TokenPair,
        User,
    )),
    tags(
        (name = "auth", description = "Session endpoints"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_session_endpoint() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        for path in [
            "/health",
            "/auth/login",
            "/auth/logout",
            "/auth/refresh",
            "/auth/session",
        ] {
            assert!(paths.contains_key(path), "missing path {path}");
        }
    }
}
