//! Builds project service clients from the config.

use crate::config::Config;
use anyhow::Result;
use argocd::{Project, ProjectExternal, ProjectServiceClient, new_project_service_client};
use declarative::{Connector, Context, Error, Record};

/// Connect to the project service named by `provider` (or the default one).
pub fn service(config: &Config, provider: Option<&str>) -> Result<Box<dyn ProjectServiceClient>> {
    let opts = config.provider(provider)?.client_options()?;
    log::debug!("connecting to {}", opts.server_addr);
    Ok(new_project_service_client(&opts)?)
}

/// Connects each record to the provider config it names.
pub struct ProjectConnector {
    config: Config,
}

impl ProjectConnector {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl Connector<Project> for ProjectConnector {
    type Client = ProjectExternal;

    fn connect(&self, _ctx: &Context, record: &Record<Project>) -> declarative::Result<ProjectExternal> {
        let service = service(&self.config, record.provider_config.as_deref()).map_err(|e| {
            Error::Connect {
                message: format!("{e:#}"),
            }
        })?;
        Ok(ProjectExternal::new(service))
    }
}
