//! In-memory resource kind and server for unit tests

use crate::context::Context;
use crate::diff::{FieldDiff, diff_option};
use crate::error::{Code, Error, Result};
use crate::lateinit::late_initialize_option;
use crate::record::Record;
use crate::resource::{Connector, ExternalClient, ResourceKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
pub struct Widget;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WidgetSpec {
    pub name: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteWidget {
    pub name: String,
    pub color: String,
    pub version: u64,
}

impl RemoteWidget {
    pub fn new(name: &str, color: &str) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            version: 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WidgetObservation {
    pub version: u64,
}

#[derive(Debug, Serialize)]
pub struct CreateWidget {
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateWidget {
    pub color: Option<String>,
}

impl ResourceKind for Widget {
    const KIND: &'static str = "Widget";
    type Spec = WidgetSpec;
    type Remote = RemoteWidget;
    type Observation = WidgetObservation;
    type CreateRequest = CreateWidget;
    type UpdateRequest = UpdateWidget;

    fn declared_name(spec: &WidgetSpec) -> Option<&str> {
        spec.name.as_deref()
    }

    fn late_initialize(spec: &mut WidgetSpec, remote: &RemoteWidget) -> bool {
        let mut changed = late_initialize_option(&mut spec.name, &remote.name);
        changed |= late_initialize_option(&mut spec.color, &remote.color);
        changed
    }

    fn diff(spec: &WidgetSpec, remote: &RemoteWidget) -> Vec<FieldDiff> {
        let mut diffs = Vec::new();
        diff_option(&mut diffs, "name", &spec.name, &remote.name);
        diff_option(&mut diffs, "color", &spec.color, &remote.color);
        diffs
    }

    fn observe(remote: &RemoteWidget) -> WidgetObservation {
        WidgetObservation {
            version: remote.version,
        }
    }

    fn create_request(spec: &WidgetSpec, name: &str) -> CreateWidget {
        CreateWidget {
            name: name.to_string(),
            color: spec.color.clone(),
        }
    }

    fn update_request(spec: &WidgetSpec) -> UpdateWidget {
        UpdateWidget {
            color: spec.color.clone(),
        }
    }
}

#[derive(Debug, Clone)]
enum Failure {
    Code(Code),
    Text(String),
}

#[derive(Debug, Default)]
struct State {
    widgets: BTreeMap<String, RemoteWidget>,
    calls: Vec<String>,
    failures: HashMap<&'static str, Failure>,
    connect_failure: Option<String>,
}

/// Shared in-memory widget server; clones talk to the same state
#[derive(Debug, Clone, Default)]
pub struct FakeServer {
    state: Arc<Mutex<State>>,
}

impl FakeServer {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn insert(&self, widget: RemoteWidget) {
        self.lock().widgets.insert(widget.name.clone(), widget);
    }

    pub fn get_widget(&self, name: &str) -> Option<RemoteWidget> {
        self.lock().widgets.get(name).cloned()
    }

    pub fn fail(&self, op: &'static str, code: Code) {
        self.lock().failures.insert(op, Failure::Code(code));
    }

    pub fn fail_with_text(&self, op: &'static str, text: &str) {
        self.lock().failures.insert(op, Failure::Text(text.into()));
    }

    pub fn fail_connect(&self, message: &str) {
        self.lock().connect_failure = Some(message.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    fn begin(&self, ctx: &Context, op: &'static str, id: &str) -> Result<MutexGuard<'_, State>> {
        let mut state = self.lock();
        state.calls.push(format!("{op} {id}"));
        ctx.check()?;
        let failure = state.failures.get(op).cloned();
        match failure {
            Some(Failure::Code(code)) => Err(Error::rpc(code, format!("{op} {id} failed"))),
            Some(Failure::Text(text)) => Err(Error::from_message(text)),
            None => Ok(state),
        }
    }
}

impl ExternalClient<Widget> for FakeServer {
    fn get(&self, ctx: &Context, id: &str) -> Result<RemoteWidget> {
        let state = self.begin(ctx, "get", id)?;
        state
            .widgets
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("widget {id} not found")))
    }

    fn create(&self, ctx: &Context, request: &CreateWidget) -> Result<String> {
        let mut state = self.begin(ctx, "create", &request.name)?;
        let color = request.color.clone().unwrap_or_else(|| "grey".into());
        state
            .widgets
            .insert(request.name.clone(), RemoteWidget::new(&request.name, &color));
        Ok(request.name.clone())
    }

    fn update(&self, ctx: &Context, id: &str, request: &UpdateWidget) -> Result<()> {
        let mut state = self.begin(ctx, "update", id)?;
        let widget = state
            .widgets
            .get_mut(id)
            .ok_or_else(|| Error::not_found(format!("widget {id} not found")))?;
        if let Some(color) = &request.color {
            widget.color = color.clone();
        }
        widget.version += 1;
        Ok(())
    }

    fn delete(&self, ctx: &Context, id: &str) -> Result<()> {
        let mut state = self.begin(ctx, "delete", id)?;
        state
            .widgets
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("widget {id} not found")))
    }
}

impl Connector<Widget> for FakeServer {
    type Client = FakeServer;

    fn connect(&self, _ctx: &Context, _record: &Record<Widget>) -> Result<FakeServer> {
        match &self.lock().connect_failure {
            Some(message) => Err(Error::Connect {
                message: message.clone(),
            }),
            None => Ok(self.clone()),
        }
    }
}
