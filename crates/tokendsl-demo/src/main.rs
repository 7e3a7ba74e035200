//! Runs the demo user API until SIGTERM or SIGINT.

use std::sync::Arc;

use tokendsl::prelude::*;
use tokendsl_demo::{api, UserStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::new()
        .with_dotenv()?
        .with_optional_file("tokendsl.toml")?
        .with_env_prefix("TOKENDSL")
        .load()?;

    let store = Arc::new(UserStore::new());
    Service::new(config).serve(api(&store)).await?;
    Ok(())
}
