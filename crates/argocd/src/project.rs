//! Field reconciler for Argo CD projects

use crate::types::{
    AppProject, AppProjectSpec, ObjectMeta, ProjectCreateRequest, ProjectObservation,
    ProjectParameters, ProjectUpdateRequest, fields,
};
use declarative::{
    FieldDiff, ResourceKind, diff_list, diff_option, diff_option_opt, late_initialize_from,
    late_initialize_option, late_initialize_vec,
};

/// The Argo CD `AppProject` resource kind
#[derive(Debug, Clone, Copy, Default)]
pub struct Project;

impl ResourceKind for Project {
    const KIND: &'static str = "Project";

    type Spec = ProjectParameters;
    type Remote = AppProject;
    type Observation = ProjectObservation;
    type CreateRequest = ProjectCreateRequest;
    type UpdateRequest = ProjectUpdateRequest;

    fn declared_name(spec: &ProjectParameters) -> Option<&str> {
        spec.name.as_deref().filter(|n| !n.is_empty())
    }

    fn late_initialize(spec: &mut ProjectParameters, remote: &AppProject) -> bool {
        let r = &remote.spec;
        let mut li = late_initialize_option(&mut spec.name, &remote.metadata.name);
        li |= late_initialize_option(&mut spec.description, &r.description);
        li |= late_initialize_vec(&mut spec.source_repos, &r.source_repos);
        li |= late_initialize_vec(&mut spec.source_namespaces, &r.source_namespaces);
        li |= late_initialize_vec(&mut spec.destinations, &r.destinations);
        li |= late_initialize_vec(
            &mut spec.cluster_resource_whitelist,
            &r.cluster_resource_whitelist,
        );
        li |= late_initialize_vec(
            &mut spec.namespace_resource_blacklist,
            &r.namespace_resource_blacklist,
        );
        li |= late_initialize_vec(
            &mut spec.namespace_resource_whitelist,
            &r.namespace_resource_whitelist,
        );
        li |= late_initialize_vec(&mut spec.signature_keys, &r.signature_keys);
        li |= late_initialize_from(&mut spec.orphaned_resources, r.orphaned_resources.as_ref());
        li
    }

    fn diff(spec: &ProjectParameters, remote: &AppProject) -> Vec<FieldDiff> {
        let r = &remote.spec;
        let mut diffs = Vec::new();
        diff_option(&mut diffs, fields::NAME, &spec.name, &remote.metadata.name);
        diff_option(&mut diffs, fields::DESCRIPTION, &spec.description, &r.description);
        diff_list(&mut diffs, fields::SOURCE_REPOS, &spec.source_repos, &r.source_repos);
        diff_list(
            &mut diffs,
            fields::SOURCE_NAMESPACES,
            &spec.source_namespaces,
            &r.source_namespaces,
        );
        diff_list(&mut diffs, fields::DESTINATIONS, &spec.destinations, &r.destinations);
        diff_list(
            &mut diffs,
            fields::CLUSTER_RESOURCE_WHITELIST,
            &spec.cluster_resource_whitelist,
            &r.cluster_resource_whitelist,
        );
        diff_list(
            &mut diffs,
            fields::NAMESPACE_RESOURCE_BLACKLIST,
            &spec.namespace_resource_blacklist,
            &r.namespace_resource_blacklist,
        );
        diff_list(
            &mut diffs,
            fields::NAMESPACE_RESOURCE_WHITELIST,
            &spec.namespace_resource_whitelist,
            &r.namespace_resource_whitelist,
        );
        diff_list(&mut diffs, fields::SIGNATURE_KEYS, &spec.signature_keys, &r.signature_keys);
        diff_option_opt(
            &mut diffs,
            fields::ORPHANED_RESOURCES,
            &spec.orphaned_resources,
            r.orphaned_resources.as_ref(),
        );
        diffs
    }

    fn observe(remote: &AppProject) -> ProjectObservation {
        ProjectObservation {
            resource_version: remote.metadata.resource_version.clone(),
            generation: remote.metadata.generation,
            creation_timestamp: remote.metadata.creation_timestamp,
        }
    }

    fn create_request(spec: &ProjectParameters, name: &str) -> ProjectCreateRequest {
        ProjectCreateRequest {
            project: AppProject {
                metadata: ObjectMeta {
                    name: name.to_string(),
                    ..Default::default()
                },
                spec: project_spec(spec),
            },
            upsert: false,
        }
    }

    fn update_request(spec: &ProjectParameters) -> ProjectUpdateRequest {
        ProjectUpdateRequest {
            project: AppProject {
                metadata: ObjectMeta {
                    name: spec.name.clone().unwrap_or_default(),
                    ..Default::default()
                },
                spec: project_spec(spec),
            },
            update_mask: update_mask(spec),
        }
    }
}

/// Map the set attributes onto a server-side spec; unset ones stay empty
fn project_spec(spec: &ProjectParameters) -> AppProjectSpec {
    AppProjectSpec {
        description: spec.description.clone().unwrap_or_default(),
        source_repos: spec.source_repos.clone().unwrap_or_default(),
        source_namespaces: spec.source_namespaces.clone().unwrap_or_default(),
        destinations: spec.destinations.clone().unwrap_or_default(),
        cluster_resource_whitelist: spec.cluster_resource_whitelist.clone().unwrap_or_default(),
        namespace_resource_blacklist: spec
            .namespace_resource_blacklist
            .clone()
            .unwrap_or_default(),
        namespace_resource_whitelist: spec
            .namespace_resource_whitelist
            .clone()
            .unwrap_or_default(),
        signature_keys: spec.signature_keys.clone().unwrap_or_default(),
        orphaned_resources: spec.orphaned_resources.clone(),
    }
}

/// Names of the set spec attributes, in declaration order
fn update_mask(spec: &ProjectParameters) -> Vec<String> {
    [
        (fields::DESCRIPTION, spec.description.is_some()),
        (fields::SOURCE_REPOS, spec.source_repos.is_some()),
        (fields::SOURCE_NAMESPACES, spec.source_namespaces.is_some()),
        (fields::DESTINATIONS, spec.destinations.is_some()),
        (
            fields::CLUSTER_RESOURCE_WHITELIST,
            spec.cluster_resource_whitelist.is_some(),
        ),
        (
            fields::NAMESPACE_RESOURCE_BLACKLIST,
            spec.namespace_resource_blacklist.is_some(),
        ),
        (
            fields::NAMESPACE_RESOURCE_WHITELIST,
            spec.namespace_resource_whitelist.is_some(),
        ),
        (fields::SIGNATURE_KEYS, spec.signature_keys.is_some()),
        (fields::ORPHANED_RESOURCES, spec.orphaned_resources.is_some()),
    ]
    .into_iter()
    .filter(|(_, set)| *set)
    .map(|(field, _)| field.to_string())
    .collect()
}
