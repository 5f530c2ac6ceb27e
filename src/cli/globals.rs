use secrecy::SecretString;

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub backend_url: String,
    pub token_secret: SecretString,
    pub public_url: String,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(backend_url: String, token_secret: SecretString, public_url: String) -> Self {
        Self {
            backend_url,
            token_secret,
            public_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new(
            "https://api.ledger.internal".to_string(),
            SecretString::from("shared-secret".to_string()),
            "https://ledger.app".to_string(),
        );
        assert_eq!(args.backend_url, "https://api.ledger.internal");
        assert_eq!(args.token_secret.expose_secret(), "shared-secret");
        assert_eq!(args.public_url, "https://ledger.app");
    }
}
