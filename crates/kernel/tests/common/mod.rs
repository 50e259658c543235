use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use railyard_api::{Family, ResultCode, ScopePath, ScopePriority, WorkspaceLayout};
use railyard_plugin::{Command, Handler, PluginResult};

pub fn layout() -> WorkspaceLayout {
    WorkspaceLayout::new("/sdk", "/project")
}

/// Handler that records invocations; optionally attaches sub-operation
/// codes, requests flow exit, or declines the command.
pub struct RecordingHandler {
    family: Family,
    scope: ScopePath,
    priority: ScopePriority,
    enabled: AtomicBool,
    hits: AtomicUsize,
    attach_codes: Vec<i32>,
    attach_panic: bool,
    exit_on_process: bool,
    accept: bool,
}

impl RecordingHandler {
    pub fn scoped(family: Family, scope: &str, layout: &WorkspaceLayout) -> Arc<Self> {
        let scope = ScopePath::new(scope);
        Arc::new(Self {
            family,
            priority: ScopePriority::for_scope(&scope, layout),
            scope,
            enabled: AtomicBool::new(true),
            hits: AtomicUsize::new(0),
            attach_codes: Vec::new(),
            attach_panic: false,
            exit_on_process: false,
            accept: true,
        })
    }

    #[allow(dead_code)]
    pub fn with_attach_codes(mut self: Arc<Self>, codes: Vec<i32>) -> Arc<Self> {
        Arc::get_mut(&mut self).unwrap().attach_codes = codes;
        self
    }

    #[allow(dead_code)]
    pub fn with_attach_panic(mut self: Arc<Self>) -> Arc<Self> {
        Arc::get_mut(&mut self).unwrap().attach_panic = true;
        self
    }

    #[allow(dead_code)]
    pub fn exiting(mut self: Arc<Self>) -> Arc<Self> {
        Arc::get_mut(&mut self).unwrap().exit_on_process = true;
        self
    }

    #[allow(dead_code)]
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Handler for RecordingHandler {
    fn family(&self) -> Family {
        self.family
    }

    fn scope(&self) -> &ScopePath {
        &self.scope
    }

    fn enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn priority(&self) -> ScopePriority {
        self.priority
    }

    fn process(&self, command: &Command) -> PluginResult<bool> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        for code in &self.attach_codes {
            let code = *code;
            command.attach(tokio::spawn(async move { ResultCode(code) }));
        }
        if self.attach_panic {
            command.attach(tokio::spawn(async { panic!("simulated tool crash") }));
        }
        if self.exit_on_process {
            command.request_exit();
        }
        Ok(self.accept)
    }
}
