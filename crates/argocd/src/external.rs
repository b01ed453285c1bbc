//! Adapter from the project service to the lifecycle controller.

use crate::client::{ProjectServiceClient, is_project_not_found};
use crate::project::Project;
use crate::types::{AppProject, ProjectCreateRequest, ProjectQuery, ProjectUpdateRequest};
use declarative::{Code, Context, Error, ExternalClient, Result};

/// [`ExternalClient`] for projects, backed by a project service.
pub struct ProjectExternal {
    service: Box<dyn ProjectServiceClient>,
}

impl ProjectExternal {
    /// Wrap a connected project service.
    pub fn new(service: Box<dyn ProjectServiceClient>) -> Self {
        Self { service }
    }

    /// Get the underlying service.
    pub fn service(&self) -> &dyn ProjectServiceClient {
        self.service.as_ref()
    }
}

impl ExternalClient<Project> for ProjectExternal {
    fn get(&self, ctx: &Context, id: &str) -> Result<AppProject> {
        self.service
            .get(ctx, &ProjectQuery::new(id))
            .map_err(normalize)
    }

    fn create(&self, ctx: &Context, request: &ProjectCreateRequest) -> Result<String> {
        let created = self.service.create(ctx, request).map_err(normalize)?;
        Ok(created.metadata.name)
    }

    fn update(&self, ctx: &Context, id: &str, request: &ProjectUpdateRequest) -> Result<()> {
        // The bound identity wins over whatever name the spec carries
        let mut request = request.clone();
        request.project.metadata.name = id.to_string();
        self.service.update(ctx, &request).map_err(normalize)?;
        Ok(())
    }

    fn delete(&self, ctx: &Context, id: &str) -> Result<()> {
        self.service
            .delete(ctx, &ProjectQuery::new(id))
            .map_err(normalize)
    }
}

/// Give codeless failures the status code their text carries.
///
/// A textual `NotFound` only counts when it is about a project; any other
/// `NotFound` text stays codeless so it is never mistaken for an absent
/// project.
fn normalize(err: Error) -> Error {
    if err.code().is_some() {
        return err;
    }
    let text = err.to_string();
    if is_project_not_found(&err) {
        return Error::from_status(&text);
    }
    match Code::from_status_text(&text) {
        Some(Code::NotFound) | None => err,
        Some(_) => Error::from_status(&text),
    }
}
