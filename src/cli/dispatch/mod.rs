use crate::cli::{actions::Action, globals::GlobalArgs};
use anyhow::Result;
use secrecy::SecretString;

pub fn handler(matches: &clap::ArgMatches) -> Result<(Action, GlobalArgs)> {
    let backend_url = matches
        .get_one("backend-url")
        .map(|s: &String| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("missing required argument: --backend-url"))?;

    let token_secret = matches
        .get_one("token-secret")
        .map(|s: &String| SecretString::from(s.to_string()))
        .ok_or_else(|| anyhow::anyhow!("missing required argument: --token-secret"))?;

    let public_url = matches
        .get_one("public-url")
        .map_or_else(|| "http://localhost:3000".to_string(), |s: &String| s.to_string());

    let action = Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
    };

    Ok((action, GlobalArgs::new(backend_url, token_secret, public_url)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;
    use secrecy::ExposeSecret;

    #[test]
    fn handler_builds_action_and_globals() {
        let matches = commands::new().get_matches_from(vec![
            "ledgergate",
            "--port",
            "9090",
            "--backend-url",
            "https://api.ledger.internal",
            "--token-secret",
            "shared-secret",
            "--public-url",
            "https://ledger.app",
        ]);
        let (action, globals) = handler(&matches).expect("handler");
        let Action::Server { port } = action;
        assert_eq!(port, 9090);
        assert_eq!(globals.backend_url, "https://api.ledger.internal");
        assert_eq!(globals.token_secret.expose_secret(), "shared-secret");
        assert_eq!(globals.public_url, "https://ledger.app");
    }
}
