//! Project service client contract and construction.

use crate::backend::local::LocalProjectService;
use crate::types::{AppProject, ProjectCreateRequest, ProjectQuery, ProjectUpdateRequest};
use declarative::{Code, Context, Error, Result};
use log::debug;
use std::path::PathBuf;

/// Marker the project service puts in the status text of a missing project.
pub const ERROR_PROJECT_NOT_FOUND: &str = "code = NotFound desc = project";

/// Operations of the Argo CD project service.
///
/// Every call receives the caller's [`Context`] and must give up once it is
/// cancelled or past its deadline.
pub trait ProjectServiceClient: Send + Sync {
    /// Get a project by name.
    fn get(&self, ctx: &Context, query: &ProjectQuery) -> Result<AppProject>;

    /// List every project, sorted by name.
    fn list(&self, ctx: &Context) -> Result<Vec<AppProject>>;

    /// Create a project, returning it as stored.
    fn create(&self, ctx: &Context, request: &ProjectCreateRequest) -> Result<AppProject>;

    /// Update the masked fields of a project, returning it as stored.
    fn update(&self, ctx: &Context, request: &ProjectUpdateRequest) -> Result<AppProject>;

    /// Delete a project by name.
    fn delete(&self, ctx: &Context, query: &ProjectQuery) -> Result<()>;
}

/// Connection settings for a project service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientOptions {
    /// Server address, e.g. `file:///var/lib/projsync/store`
    pub server_addr: String,
    /// Bearer token presented on every call
    pub auth_token: Option<String>,
    /// Skip TLS verification (network transports only)
    pub insecure: bool,
}

/// Build a client for the server in `opts`.
///
/// Only `file://` addresses are served; any other scheme is a
/// [`Error::Connect`].
pub fn new_project_service_client(opts: &ClientOptions) -> Result<Box<dyn ProjectServiceClient>> {
    let Some(path) = opts.server_addr.strip_prefix("file://") else {
        return Err(Error::Connect {
            message: format!("unsupported server address '{}'", opts.server_addr),
        });
    };
    if path.is_empty() {
        return Err(Error::Connect {
            message: "server address has no path".to_string(),
        });
    }
    if opts.insecure {
        debug!("insecure has no effect for {}", opts.server_addr);
    }

    let service = LocalProjectService::open(PathBuf::from(path), opts.auth_token.clone())?;
    Ok(Box::new(service))
}

/// Whether `err` says the project does not exist.
///
/// Uses the status code when the error carries one and falls back to the
/// status text otherwise.
pub fn is_project_not_found(err: &Error) -> bool {
    match err.code() {
        Some(code) => code == Code::NotFound,
        None => err.to_string().contains(ERROR_PROJECT_NOT_FOUND),
    }
}
