//! # argocd
//!
//! Argo CD project support for the `declarative` reconciliation core.
//!
//! This crate provides:
//! - The [`Project`] resource kind: late initialization, drift detection and
//!   request building for `AppProject` attributes
//! - The [`ProjectServiceClient`] contract and a file-backed implementation
//! - [`ProjectExternal`], which plugs a project service into the lifecycle
//!   controller
//!
//! ## Example
//!
//! ```no_run
//! use argocd::{ClientOptions, Project, ProjectExternal, ProjectParameters};
//! use declarative::{Context, External, Record};
//!
//! let opts = ClientOptions {
//!     server_addr: "file:///var/lib/projsync/store".into(),
//!     ..Default::default()
//! };
//! let service = argocd::new_project_service_client(&opts)?;
//! let external = External::<Project, _>::new(ProjectExternal::new(service));
//!
//! let mut record = Record::<Project>::new("team-a", ProjectParameters::default());
//! let observation = external.observe(&Context::background(), &mut record)?;
//! if !observation.resource_exists {
//!     external.create(&Context::background(), &mut record)?;
//! }
//! # Ok::<(), declarative::Error>(())
//! ```

pub mod backend;
pub mod client;
pub mod external;
pub mod project;
pub mod types;

pub use backend::local::LocalProjectService;
pub use client::{
    ClientOptions, ERROR_PROJECT_NOT_FOUND, ProjectServiceClient, is_project_not_found,
    new_project_service_client,
};
pub use external::ProjectExternal;
pub use project::Project;
pub use types::{
    AppProject, AppProjectSpec, ApplicationDestination, GroupKind, ObjectMeta,
    OrphanedResourcesMonitorSettings, ProjectCreateRequest, ProjectObservation, ProjectParameters,
    ProjectQuery, ProjectUpdateRequest, SignatureKey,
};
