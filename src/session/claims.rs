//! Access-token claims decoding.
//!
//! Claims are recomputed on every decode and never cached, so a rotated pair
//! can never be observed through stale claims. Decode failures degrade to
//! "no claims": the gate treats them as an unauthenticated, non-admin caller.

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::AuthError;

/// Typed claims carried by an access token. Unknown claims are ignored;
/// absent claims default to least privilege.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user id)
    pub sub: String,
    /// Role claim; only `ADMIN` (case-insensitive) grants elevated access
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Expiration time (Unix seconds)
    pub exp: i64,
    /// Issued at (Unix seconds)
    #[serde(default)]
    pub iat: i64,
}

impl AccessClaims {
    /// Case-insensitive admin check with a fail-closed default: a missing
    /// role claim is never admin.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role
            .as_deref()
            .is_some_and(|role| role.eq_ignore_ascii_case("ADMIN"))
    }
}

/// Verifying decoder for access tokens. The gateway shares an HS256 secret
/// with the identity backend, so a forged or tampered token fails to decode
/// rather than granting access based on its payload.
#[derive(Clone)]
pub struct ClaimsDecoder {
    key: DecodingKey,
    validation: Validation,
}

impl ClaimsDecoder {
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
        }
    }

    /// Decode and verify an access token. Signature mismatches, expired
    /// tokens, and garbage input all collapse into `MalformedToken`.
    ///
    /// # Errors
    /// Returns `AuthError::MalformedToken` when the token cannot be verified.
    pub fn decode(&self, token: &str) -> Result<AccessClaims, AuthError> {
        jsonwebtoken::decode::<AccessClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::MalformedToken)
    }
}

impl std::fmt::Debug for ClaimsDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimsDecoder").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::AccessClaims;
    use jsonwebtoken::{Algorithm, EncodingKey, Header};

    pub(crate) const TEST_SECRET: &str = "test-secret";

    pub(crate) fn encode_token(claims: &AccessClaims, secret: &str) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("encode test token")
    }

    pub(crate) fn claims(role: Option<&str>, exp: i64) -> AccessClaims {
        AccessClaims {
            sub: "user-1".to_string(),
            role: role.map(ToString::to_string),
            email: Some("a@b.com".to_string()),
            exp,
            iat: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{TEST_SECRET, claims, encode_token};
    use super::*;

    fn decoder() -> ClaimsDecoder {
        ClaimsDecoder::new(&SecretString::from(TEST_SECRET.to_string()))
    }

    fn far_future() -> i64 {
        crate::session::now_millis() / 1000 + 3_600
    }

    #[test]
    fn decodes_valid_token() {
        let token = encode_token(&claims(Some("admin"), far_future()), TEST_SECRET);
        let decoded = decoder().decode(&token).expect("decode");
        assert_eq!(decoded.sub, "user-1");
        assert!(decoded.is_admin());
    }

    #[test]
    fn admin_check_is_case_insensitive_and_fails_closed() {
        for role in ["ADMIN", "admin", "Admin"] {
            assert!(claims(Some(role), 0).is_admin());
        }
        assert!(!claims(Some("user"), 0).is_admin());
        assert!(!claims(None, 0).is_admin());
    }

    #[test]
    fn rejects_garbage_token() {
        assert_eq!(
            decoder().decode("not-a-token"),
            Err(AuthError::MalformedToken)
        );
        assert_eq!(decoder().decode(""), Err(AuthError::MalformedToken));
    }

    #[test]
    fn rejects_forged_signature() {
        let token = encode_token(&claims(Some("ADMIN"), far_future()), "other-secret");
        assert_eq!(decoder().decode(&token), Err(AuthError::MalformedToken));
    }

    #[test]
    fn rejects_expired_token() {
        let token = encode_token(&claims(Some("ADMIN"), 1_000), TEST_SECRET);
        assert_eq!(decoder().decode(&token), Err(AuthError::MalformedToken));
    }
}
