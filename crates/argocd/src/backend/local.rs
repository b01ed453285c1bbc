//! File-backed project service.
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/token                 optional; when present, callers must present it
//! <root>/projects/<name>.json  one document per project
//! ```
//!
//! The service assigns the server-side metadata (resource version,
//! generation, creation timestamp) the way a real project service does.

use crate::client::ProjectServiceClient;
use crate::types::{
    AppProject, AppProjectSpec, ProjectCreateRequest, ProjectQuery, ProjectUpdateRequest, fields,
};
use chrono::Utc;
use declarative::{Code, Context, Error, Result};
use log::debug;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

const TOKEN_FILE: &str = "token";
const PROJECTS_DIR: &str = "projects";
const MAX_NAME_LEN: usize = 253;

/// Project service storing one JSON document per project.
#[derive(Debug)]
pub struct LocalProjectService {
    root: PathBuf,
    auth_token: Option<String>,
    // Shared by every service opened on the same root in this process
    lock: Arc<Mutex<()>>,
}

impl LocalProjectService {
    /// Open the store at `root`, creating it if it does not exist.
    pub fn open(root: PathBuf, auth_token: Option<String>) -> Result<Self> {
        let projects = root.join(PROJECTS_DIR);
        fs::create_dir_all(&projects).map_err(|e| Error::Connect {
            message: format!("cannot open store {}: {e}", root.display()),
        })?;
        debug!("opened project store at {}", root.display());

        Ok(Self {
            lock: store_lock(&root),
            root,
            auth_token,
        })
    }

    fn project_path(&self, name: &str) -> PathBuf {
        self.root.join(PROJECTS_DIR).join(format!("{name}.json"))
    }

    /// Common checks before every call.
    fn begin(&self, ctx: &Context) -> Result<std::sync::MutexGuard<'_, ()>> {
        ctx.check()?;
        self.authorize()?;
        self.lock
            .lock()
            .map_err(|_| Error::rpc(Code::Internal, "project store lock poisoned"))
    }

    fn authorize(&self) -> Result<()> {
        let path = self.root.join(TOKEN_FILE);
        if !path.exists() {
            return Ok(());
        }
        let expected = fs::read_to_string(&path).map_err(|e| internal(&path, &e))?;
        let expected = expected.trim();
        if expected.is_empty() {
            return Ok(());
        }

        match self.auth_token.as_deref() {
            Some(token) if token == expected => Ok(()),
            Some(_) => Err(Error::rpc(Code::Unauthenticated, "invalid session token")),
            None => Err(Error::rpc(Code::Unauthenticated, "no session information")),
        }
    }

    fn load(&self, name: &str) -> Result<Option<AppProject>> {
        let path = self.project_path(name);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|e| internal(&path, &e))?;
        let project = serde_json::from_str(&content).map_err(|e| {
            Error::rpc(Code::Internal, format!("corrupt project {}: {e}", path.display()))
        })?;
        Ok(Some(project))
    }

    fn store(&self, project: &AppProject) -> Result<()> {
        let path = self.project_path(&project.metadata.name);
        let content = serde_json::to_string_pretty(project)
            .map_err(|e| Error::rpc(Code::Internal, format!("cannot encode project: {e}")))?;

        // Write then rename so a reader never sees a partial document
        let dir = self.root.join(PROJECTS_DIR);
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| internal(&dir, &e))?;
        tmp.write_all(content.as_bytes())
            .map_err(|e| internal(tmp.path(), &e))?;
        tmp.persist(&path).map_err(|e| internal(&path, &e.error))?;
        debug!(
            "stored project {} at version {}",
            project.metadata.name, project.metadata.resource_version
        );
        Ok(())
    }

    fn require(&self, name: &str) -> Result<AppProject> {
        validate_name(name)?;
        self.load(name)?.ok_or_else(|| not_found(name))
    }
}

impl ProjectServiceClient for LocalProjectService {
    fn get(&self, ctx: &Context, query: &ProjectQuery) -> Result<AppProject> {
        let _guard = self.begin(ctx)?;
        self.require(&query.name)
    }

    fn list(&self, ctx: &Context) -> Result<Vec<AppProject>> {
        let _guard = self.begin(ctx)?;
        let dir = self.root.join(PROJECTS_DIR);
        let entries = fs::read_dir(&dir).map_err(|e| internal(&dir, &e))?;

        let mut projects = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| internal(&dir, &e))?.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Some(project) = self.load(name)? {
                projects.push(project);
            }
        }
        projects.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));
        Ok(projects)
    }

    fn create(&self, ctx: &Context, request: &ProjectCreateRequest) -> Result<AppProject> {
        let _guard = self.begin(ctx)?;
        let name = &request.project.metadata.name;
        validate_name(name)?;

        let project = match self.load(name)? {
            Some(_) if !request.upsert => {
                return Err(Error::rpc(
                    Code::AlreadyExists,
                    format!("project \"{name}\" already exists"),
                ));
            }
            Some(mut existing) => {
                if existing.spec != request.project.spec {
                    existing.spec = request.project.spec.clone();
                    existing.metadata.generation += 1;
                }
                existing.metadata.resource_version = next_version(&existing.metadata.resource_version);
                existing
            }
            None => {
                let mut project = request.project.clone();
                project.metadata.resource_version = "1".to_string();
                project.metadata.generation = 1;
                project.metadata.creation_timestamp = Some(Utc::now());
                project
            }
        };

        self.store(&project)?;
        Ok(project)
    }

    fn update(&self, ctx: &Context, request: &ProjectUpdateRequest) -> Result<AppProject> {
        let _guard = self.begin(ctx)?;
        let mut project = self.require(&request.project.metadata.name)?;

        let before = project.spec.clone();
        for field in &request.update_mask {
            apply_field(&mut project.spec, &request.project.spec, field)?;
        }
        if project.spec != before {
            project.metadata.generation += 1;
        }
        project.metadata.resource_version = next_version(&project.metadata.resource_version);

        self.store(&project)?;
        Ok(project)
    }

    fn delete(&self, ctx: &Context, query: &ProjectQuery) -> Result<()> {
        let _guard = self.begin(ctx)?;
        self.require(&query.name)?;

        let path = self.project_path(&query.name);
        fs::remove_file(&path).map_err(|e| internal(&path, &e))?;
        debug!("deleted project {}", query.name);
        Ok(())
    }
}

/// Copy one masked field from `from` into `to`.
fn apply_field(to: &mut AppProjectSpec, from: &AppProjectSpec, field: &str) -> Result<()> {
    match field {
        fields::DESCRIPTION => to.description.clone_from(&from.description),
        fields::SOURCE_REPOS => to.source_repos.clone_from(&from.source_repos),
        fields::SOURCE_NAMESPACES => to.source_namespaces.clone_from(&from.source_namespaces),
        fields::DESTINATIONS => to.destinations.clone_from(&from.destinations),
        fields::CLUSTER_RESOURCE_WHITELIST => to
            .cluster_resource_whitelist
            .clone_from(&from.cluster_resource_whitelist),
        fields::NAMESPACE_RESOURCE_BLACKLIST => to
            .namespace_resource_blacklist
            .clone_from(&from.namespace_resource_blacklist),
        fields::NAMESPACE_RESOURCE_WHITELIST => to
            .namespace_resource_whitelist
            .clone_from(&from.namespace_resource_whitelist),
        fields::SIGNATURE_KEYS => to.signature_keys.clone_from(&from.signature_keys),
        fields::ORPHANED_RESOURCES => to.orphaned_resources.clone_from(&from.orphaned_resources),
        other => {
            return Err(Error::rpc(
                Code::InvalidArgument,
                format!("unknown field in update mask: {other}"),
            ));
        }
    }
    Ok(())
}

/// Project names follow DNS subdomain rules.
fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
        && name.starts_with(|c: char| c.is_ascii_alphanumeric())
        && name.ends_with(|c: char| c.is_ascii_alphanumeric());

    if valid {
        Ok(())
    } else {
        Err(Error::rpc(
            Code::InvalidArgument,
            format!("invalid project name \"{name}\""),
        ))
    }
}

fn next_version(current: &str) -> String {
    (current.parse::<u64>().unwrap_or(0) + 1).to_string()
}

fn not_found(name: &str) -> Error {
    Error::not_found(format!("project \"{name}\" not found"))
}

/// Lock for the store at `root`, one per canonical path in the process.
fn store_lock(root: &Path) -> Arc<Mutex<()>> {
    static LOCKS: LazyLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
        LazyLock::new(Mutex::default);

    let key = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    let mut locks = LOCKS.lock().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(locks.entry(key).or_default())
}

fn internal(path: &Path, err: &std::io::Error) -> Error {
    Error::rpc(Code::Internal, format!("{}: {err}", path.display()))
}
