use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use railyard_api::{CommandId, Family, Stage};
use railyard_plugin::{Command, Extension, Handler};
use tracing::{debug, trace};

use crate::bus::StageBus;
use crate::error::{KernelError, Result};
use crate::group::HandlerGroup;

/// Registration options for an exclusive handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Stage the handler's group is subscribed on. Most handlers ride the
    /// main stage; set-up and tear-down work goes to pre/post.
    pub stage: Stage,
}

impl LoadOptions {
    pub fn at(stage: Stage) -> Self {
        Self { stage }
    }
}

/// Result of one top-level dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Whether any stage accepted the command.
    pub accepted: bool,
    /// Whether the flow was cancelled mid-dispatch; remaining stages were
    /// skipped and the caller should unwind.
    pub exit: bool,
}

impl DispatchOutcome {
    const ABORTED: DispatchOutcome = DispatchOutcome {
        accepted: false,
        exit: true,
    };
}

/// Progress of one dispatch call. `Completed` and `Aborted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPhase {
    NotStarted,
    Pre,
    Main,
    Post,
    Completed,
    Aborted,
}

impl DispatchPhase {
    fn for_stage(stage: Stage) -> Self {
        match stage {
            Stage::Pre => DispatchPhase::Pre,
            Stage::Main => DispatchPhase::Main,
            Stage::Post => DispatchPhase::Post,
        }
    }
}

impl fmt::Display for DispatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DispatchPhase::NotStarted => "not-started",
            DispatchPhase::Pre => "pre",
            DispatchPhase::Main => "main",
            DispatchPhase::Post => "post",
            DispatchPhase::Completed => "completed",
            DispatchPhase::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Kernel façade: handler/extension registration, three-stage dispatch, and
/// cooperative flow cancellation.
///
/// A pipeline is an explicit value owned by the embedding application; tests
/// construct a fresh one instead of sharing process-wide state. All shared
/// registries sit behind reader/writer locks, so concurrent dispatches only
/// contend with registration, not with each other.
pub struct Pipeline {
    groups: RwLock<HashMap<Family, Arc<HandlerGroup>>>,
    stages: [StageBus; 3],
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            groups: RwLock::new(HashMap::new()),
            stages: [
                StageBus::new(Stage::Pre),
                StageBus::new(Stage::Main),
                StageBus::new(Stage::Post),
            ],
        }
    }

    pub fn stage(&self, stage: Stage) -> &StageBus {
        match stage {
            Stage::Pre => &self.stages[0],
            Stage::Main => &self.stages[1],
            Stage::Post => &self.stages[2],
        }
    }

    /// The family's handler group, created lazily: shared-read fast path,
    /// then the exclusive-write double-check before creating.
    pub fn handler_group(&self, family: Family) -> Result<Arc<HandlerGroup>> {
        if let Some(group) = self
            .groups
            .read()
            .map_err(|_| KernelError::Poisoned("pipeline registry"))?
            .get(&family)
        {
            return Ok(Arc::clone(group));
        }

        let mut groups = self
            .groups
            .write()
            .map_err(|_| KernelError::Poisoned("pipeline registry"))?;
        Ok(Arc::clone(
            groups
                .entry(family)
                .or_insert_with(|| Arc::new(HandlerGroup::new(family))),
        ))
    }

    /// Register an exclusive handler: insert into (creating if necessary) its
    /// family's group and subscribe that group on the chosen stage.
    pub fn load(&self, handler: Arc<dyn Handler>, options: LoadOptions) -> Result<()> {
        let group = self.handler_group(handler.family())?;
        group.add(handler)?;
        self.stage(options.stage).subscribe_group(group);
        Ok(())
    }

    /// Register a non-exclusive extension into the main stage's dispatcher
    /// for its family, reached through the nested bus keyed by the family id.
    pub fn load_extension(&self, extension: Arc<dyn Extension>) {
        let family = extension.family();
        self.intercept(Stage::Main, CommandId::from_family(family), extension);
    }

    /// Subscribe an extension on exactly one concrete command id, to
    /// intercept a single build step without affecting siblings of the family.
    pub fn intercept(&self, stage: Stage, id: CommandId, extension: Arc<dyn Extension>) {
        let bus = self.stage(stage).nested_bus(id);
        bus.extension_dispatcher(extension.family()).register(extension);
    }

    /// Remove a handler from its family's group. Extensions remove
    /// themselves through their dispatcher.
    pub fn release(&self, handler: &Arc<dyn Handler>) -> Result<bool> {
        let group = self.handler_group(handler.family())?;
        group.remove(handler)
    }

    /// Route one command through the pre, main, and post stages in order.
    ///
    /// The command's flow flag is reset first, then each stage dispatches on
    /// the nested bus for the command's exact id when one exists, the stage
    /// root otherwise. The instant the flow flag is observed set the dispatch
    /// aborts with `(accepted: false, exit: true)`; otherwise stage
    /// acceptances are OR-ed into the final outcome.
    pub fn dispatch(&self, command: &Command) -> DispatchOutcome {
        command.flow().reset();

        let mut phase = DispatchPhase::NotStarted;
        let mut accepted = false;
        trace!(command = %command.id(), %phase, "dispatch starting");

        for stage in Stage::ALL {
            phase = DispatchPhase::for_stage(stage);
            trace!(command = %command.id(), %phase, "dispatching stage");

            let stage_accepted = self.stage(stage).dispatch(command);

            if command.flow().is_tripped() {
                phase = DispatchPhase::Aborted;
                debug!(command = %command.id(), %phase, "dispatch aborted by flow exit");
                return DispatchOutcome::ABORTED;
            }
            accepted |= stage_accepted;
        }

        phase = DispatchPhase::Completed;
        if !accepted {
            debug!(command = %command.id(), %phase, "no stage accepted the command");
        }
        DispatchOutcome {
            accepted,
            exit: false,
        }
    }

    /// Mark the command's flow for cooperative exit. Effective only within
    /// the same in-progress dispatch of that flow; the flag emits one
    /// cancellation diagnostic per dispatch.
    pub fn exit(&self, command: &Command) {
        command.request_exit();
    }

    /// Notify and detach every registered extension. Handler groups stay in
    /// place; registration is process-lifetime.
    pub fn shutdown(&self) {
        for stage in Stage::ALL {
            self.stage(stage).clear_extensions();
        }
    }
}
