//! Request gate: path-based authorization middleware.
//!
//! The decision logic is a pure function of the request path and cookie
//! state; the middleware wrapper only translates the decision into a pass
//! or a redirect response. Nothing here survives across requests.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::debug;
use url::form_urlencoded;

use super::config::GatewayState;
use super::routes::{RouteClass, RouteTable};
use crate::session::claims::ClaimsDecoder;
use crate::session::cookies::CookieState;

/// Terminal outcome for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Redirect(String),
}

/// Decide a request's fate from its path and cookies alone.
///
/// Rules, in order of the matched class:
/// - public paths always pass, malformed cookies included;
/// - auth-redirect pages bounce callers holding a live access token home;
/// - admin paths require a verifiable `ADMIN` role claim, anything less
///   redirects home (not an error page, to avoid advertising admin routes);
/// - account paths with no session evidence at all redirect to login with
///   the original destination preserved. A refresh token alone is enough to
///   pass: the page loads and triggers the lazy refresh instead of bouncing
///   a recoverable session to the login form.
#[must_use]
pub fn decide(
    table: &RouteTable,
    decoder: &ClaimsDecoder,
    path: &str,
    cookies: &CookieState,
) -> GateDecision {
    match table.classify(path) {
        RouteClass::Public | RouteClass::Default => GateDecision::Allow,
        RouteClass::AuthRedirect => {
            let authenticated = cookies
                .access_token
                .as_deref()
                .is_some_and(|token| decoder.decode(token).is_ok());
            if authenticated {
                GateDecision::Redirect("/".to_string())
            } else {
                GateDecision::Allow
            }
        }
        RouteClass::Admin => {
            // Decode failures are "not admin", never a crash.
            let is_admin = cookies
                .access_token
                .as_deref()
                .and_then(|token| decoder.decode(token).ok())
                .is_some_and(|claims| claims.is_admin());
            if is_admin {
                GateDecision::Allow
            } else {
                GateDecision::Redirect("/".to_string())
            }
        }
        RouteClass::AccountProtected => {
            if cookies.has_access_token() || cookies.has_refresh_token() {
                GateDecision::Allow
            } else {
                GateDecision::Redirect(login_redirect(path))
            }
        }
    }
}

/// Login redirect preserving the original destination.
#[must_use]
pub fn login_redirect(path: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("callbackUrl", path)
        .finish();
    format!("/login?{query}")
}

/// Axum middleware enforcing the gate decision for every inbound request.
pub async fn authorize(
    State(state): State<Arc<GatewayState>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let cookies = CookieState::read(request.headers());
    match decide(state.routes(), state.decoder(), &path, &cookies) {
        GateDecision::Allow => next.run(request).await,
        GateDecision::Redirect(target) => {
            debug!("Gate redirecting {path} to {target}");
            Redirect::temporary(&target).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::claims::test_support::{TEST_SECRET, claims, encode_token};
    use crate::session::now_millis;
    use axum::http::{HeaderMap, HeaderValue, header::COOKIE};
    use secrecy::SecretString;

    fn decoder() -> ClaimsDecoder {
        ClaimsDecoder::new(&SecretString::from(TEST_SECRET.to_string()))
    }

    fn cookies_from(raw: &str) -> CookieState {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(raw).expect("cookie header"));
        CookieState::read(&headers)
    }

    fn live_token(role: Option<&str>) -> String {
        encode_token(&claims(role, now_millis() / 1000 + 3_600), TEST_SECRET)
    }

    #[test]
    fn public_paths_allow_under_any_cookie_state() {
        let table = RouteTable::default();
        let decoder = decoder();
        let states = [
            CookieState::default(),
            cookies_from("accessToken=garbage; refreshToken=%%%"),
            cookies_from(&format!("accessToken={}", live_token(Some("ADMIN")))),
        ];
        for path in ["/", "/about", "/health", "/assets/logo.svg"] {
            for cookies in &states {
                assert_eq!(
                    decide(&table, &decoder, path, cookies),
                    GateDecision::Allow,
                    "public path {path} must always allow"
                );
            }
        }
    }

    #[test]
    fn admin_allows_only_verified_admin_claims() {
        let table = RouteTable::default();
        let decoder = decoder();

        let admin = cookies_from(&format!("accessToken={}", live_token(Some("admin"))));
        assert_eq!(
            decide(&table, &decoder, "/admin/asset-classes", &admin),
            GateDecision::Allow
        );

        let user = cookies_from(&format!("accessToken={}", live_token(Some("user"))));
        assert_eq!(
            decide(&table, &decoder, "/admin/asset-classes", &user),
            GateDecision::Redirect("/".to_string())
        );

        let missing = CookieState::default();
        assert_eq!(
            decide(&table, &decoder, "/admin", &missing),
            GateDecision::Redirect("/".to_string())
        );

        let malformed = cookies_from("accessToken=not.a.token");
        assert_eq!(
            decide(&table, &decoder, "/admin", &malformed),
            GateDecision::Redirect("/".to_string())
        );
    }

    #[test]
    fn admin_rejects_forged_admin_token() {
        let table = RouteTable::default();
        let decoder = decoder();
        let forged = encode_token(
            &claims(Some("ADMIN"), now_millis() / 1000 + 3_600),
            "attacker-secret",
        );
        let cookies = cookies_from(&format!("accessToken={forged}"));
        assert_eq!(
            decide(&table, &decoder, "/admin", &cookies),
            GateDecision::Redirect("/".to_string())
        );
    }

    #[test]
    fn anonymous_account_access_redirects_to_login_with_callback() {
        let table = RouteTable::default();
        assert_eq!(
            decide(&table, &decoder(), "/account/net-worth", &CookieState::default()),
            GateDecision::Redirect("/login?callbackUrl=%2Faccount%2Fnet-worth".to_string())
        );
    }

    #[test]
    fn refresh_token_alone_keeps_account_paths_reachable() {
        let table = RouteTable::default();
        let cookies = cookies_from("refreshToken=ref-1");
        assert_eq!(
            decide(&table, &decoder(), "/account/net-worth", &cookies),
            GateDecision::Allow
        );
    }

    #[test]
    fn authenticated_users_bounce_off_login_pages() {
        let table = RouteTable::default();
        let decoder = decoder();

        let authenticated = cookies_from(&format!("accessToken={}", live_token(Some("user"))));
        assert_eq!(
            decide(&table, &decoder, "/login", &authenticated),
            GateDecision::Redirect("/".to_string())
        );

        // Expired or malformed access tokens read as unauthenticated.
        let expired = cookies_from(&format!(
            "accessToken={}",
            encode_token(&claims(Some("user"), 1_000), TEST_SECRET)
        ));
        assert_eq!(
            decide(&table, &decoder, "/login", &expired),
            GateDecision::Allow
        );
        assert_eq!(
            decide(&table, &decoder, "/register", &CookieState::default()),
            GateDecision::Allow
        );
    }

    #[test]
    fn unclassified_paths_pass_through() {
        let table = RouteTable::default();
        assert_eq!(
            decide(&table, &decoder(), "/api/quotes", &CookieState::default()),
            GateDecision::Allow
        );
    }

    #[test]
    fn login_redirect_encodes_the_destination() {
        assert_eq!(
            login_redirect("/account/net-worth"),
            "/login?callbackUrl=%2Faccount%2Fnet-worth"
        );
        assert_eq!(
            login_redirect("/account/debts?sort=apr"),
            "/login?callbackUrl=%2Faccount%2Fdebts%3Fsort%3Dapr"
        );
    }
}
