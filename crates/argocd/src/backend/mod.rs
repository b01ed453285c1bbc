//! Project service transports.
//!
//! Each transport implements [`ProjectServiceClient`](crate::ProjectServiceClient)
//! and is picked by the scheme of the server address in
//! [`new_project_service_client`](crate::new_project_service_client).

pub mod local;
