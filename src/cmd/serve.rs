//! HTTP server command: `section-composer serve`.

use anyhow::Result;

use section_composer::config::ComposerConfig;
use section_composer::sections::server;

pub async fn cmd_serve(config: &ComposerConfig, open: bool) -> Result<()> {
    for warning in config.validate() {
        tracing::warn!("{}", warning);
    }
    server::start_server(config.server_config(open)).await
}
