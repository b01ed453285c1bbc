pub mod delete;
pub mod diff;
pub mod list;
pub mod reconcile;
pub mod status;

use crate::Context;
use crate::config::Config;
use anyhow::Result;

/// Load the config the user pointed at, or the default one
pub fn load_config(ctx: &Context) -> Result<Config> {
    Config::load(ctx.config_path.as_deref())
}

/// Cancellation context for a single-pass command's remote calls
pub fn call_context(config: &Config) -> declarative::Context {
    match config.timeout() {
        Some(timeout) => declarative::Context::with_timeout(timeout),
        None => declarative::Context::background(),
    }
}
