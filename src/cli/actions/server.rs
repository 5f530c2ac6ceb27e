use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::gateway::{self, GatewayConfig};
use anyhow::Result;
use url::Url;

/// Handle the server action
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    match action {
        Action::Server { port } => {
            let backend_url = Url::parse(&globals.backend_url)?;

            let config = GatewayConfig::new(
                backend_url,
                globals.token_secret.clone(),
                globals.public_url.clone(),
            );

            gateway::new(port, config).await?;
        }
    }

    Ok(())
}
