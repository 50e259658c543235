use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use railyard_api::{CommandId, Family, Stage};
use railyard_plugin::Command;
use tracing::warn;

use crate::extension::ExtensionDispatcher;
use crate::group::HandlerGroup;

/// One routing surface: handler groups and extension dispatchers subscribed
/// by family. A bus routes a command to the group and dispatcher registered
/// for the command's routing key, if any.
#[derive(Default)]
pub struct Bus {
    groups: RwLock<HashMap<Family, Arc<HandlerGroup>>>,
    extensions: RwLock<HashMap<Family, Arc<ExtensionDispatcher>>>,
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a (shared) handler group under its family. Re-subscribing
    /// the same family replaces the entry; groups are shared `Arc`s, so the
    /// members stay consistent across every bus the group is subscribed on.
    pub fn subscribe_group(&self, group: Arc<HandlerGroup>) {
        let Ok(mut groups) = self.groups.write() else {
            warn!("bus group map poisoned; subscription dropped");
            return;
        };
        groups.insert(group.family(), group);
    }

    pub fn group(&self, family: Family) -> Option<Arc<HandlerGroup>> {
        self.groups.read().ok()?.get(&family).cloned()
    }

    /// Extension dispatcher for a family, created lazily: shared-read fast
    /// path first, then the exclusive-write double-check.
    pub fn extension_dispatcher(&self, family: Family) -> Arc<ExtensionDispatcher> {
        if let Some(dispatcher) = self.extensions.read().ok().and_then(|e| e.get(&family).cloned())
        {
            return dispatcher;
        }
        let mut extensions = match self.extensions.write() {
            Ok(extensions) => extensions,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(
            extensions
                .entry(family)
                .or_insert_with(|| Arc::new(ExtensionDispatcher::new(family))),
        )
    }

    pub fn extensions(&self, family: Family) -> Option<Arc<ExtensionDispatcher>> {
        self.extensions.read().ok()?.get(&family).cloned()
    }

    /// Route the command to this bus's subscribers for its family.
    pub fn dispatch(&self, command: &Command) -> bool {
        let family = command.family();
        let mut accepted = false;

        if let Some(group) = self.group(family) {
            accepted |= group.dispatch(command);
        }
        if let Some(dispatcher) = self.extensions(family) {
            accepted |= dispatcher.dispatch(command);
        }

        accepted
    }

    /// Clear every subscribed extension dispatcher (shutdown path).
    pub fn clear_extensions(&self) {
        let dispatchers: Vec<Arc<ExtensionDispatcher>> = match self.extensions.read() {
            Ok(extensions) => extensions.values().cloned().collect(),
            Err(_) => return,
        };
        for dispatcher in dispatchers {
            dispatcher.clear();
        }
    }
}

/// One of the three top-level stage buses. Owns the root bus plus the
/// concurrent map of per-command-id nested buses, created lazily on first
/// subscription and consulted before the root on every dispatch.
pub struct StageBus {
    stage: Stage,
    root: Arc<Bus>,
    nested: DashMap<CommandId, Arc<Bus>>,
}

impl StageBus {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            root: Arc::new(Bus::new()),
            nested: DashMap::new(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn root(&self) -> &Arc<Bus> {
        &self.root
    }

    /// Nested bus for one exact command id, created lazily under the map's
    /// exclusive entry access. A freshly created nested bus inherits the
    /// family's handler group subscription from the root, so exclusive
    /// routing is preserved for commands whose id the nested bus shadows.
    pub fn nested_bus(&self, id: CommandId) -> Arc<Bus> {
        Arc::clone(&self.nested.entry(id).or_insert_with(|| {
            let bus = Bus::new();
            if let Some(group) = self.root.group(id.family()) {
                bus.subscribe_group(group);
            }
            Arc::new(bus)
        }))
    }

    /// Shared-access lookup used by routing; no bus is created here.
    pub fn try_nested(&self, id: CommandId) -> Option<Arc<Bus>> {
        self.nested.get(&id).map(|bus| Arc::clone(&bus))
    }

    /// The bus a command routes through on this stage: its exact-id nested
    /// bus when one exists, otherwise the root.
    pub fn bus_for(&self, command: &Command) -> Arc<Bus> {
        self.try_nested(command.id())
            .unwrap_or_else(|| Arc::clone(&self.root))
    }

    pub fn dispatch(&self, command: &Command) -> bool {
        self.bus_for(command).dispatch(command)
    }

    /// Keep nested buses that shadow this family in sync when its group
    /// gains a root subscription after the nested bus was created.
    pub fn subscribe_group(&self, group: Arc<HandlerGroup>) {
        self.root.subscribe_group(Arc::clone(&group));
        for entry in self.nested.iter() {
            if entry.key().family() == group.family() {
                entry.value().subscribe_group(Arc::clone(&group));
            }
        }
    }

    pub fn clear_extensions(&self) {
        self.root.clear_extensions();
        for entry in self.nested.iter() {
            entry.value().clear_extensions();
        }
    }
}
