use crate::command::Command;
use crate::error::PluginResult;
use railyard_api::{Family, ScopePath, ScopePriority};

/// Exclusive unit of work bound to a family, a filesystem scope, and a scope
/// priority. At most one handler of a family runs per dispatched command; the
/// kernel picks it by locality resolution over the group's priorities.
pub trait Handler: Send + Sync {
    /// Routing key this handler subscribes to.
    fn family(&self) -> Family;

    /// The filesystem subtree this handler claims ownership over.
    fn scope(&self) -> &ScopePath;

    /// Dynamic enablement, typically supplied by the settings mapper.
    /// A disabled handler is skipped by selection without being removed.
    fn enabled(&self) -> bool {
        true
    }

    /// Rank used by locality resolution. Construct with
    /// [`ScopePriority::for_scope`] so project-local handlers supersede
    /// SDK-wide defaults of the same family.
    fn priority(&self) -> ScopePriority {
        ScopePriority::default()
    }

    /// Synchronous decision on the command. Return quickly; represent long
    /// work by attaching sub-operations to the command. An `Err` is caught at
    /// the dispatch boundary, logged, and counts as not-accepted.
    fn process(&self, command: &Command) -> PluginResult<bool>;
}

/// Secondary, non-exclusive handler. Many extensions of a family may observe
/// the same command, but only within a single priority tier per dispatch.
pub trait Extension: Send + Sync {
    /// Routing key this extension subscribes to.
    fn family(&self) -> Family;

    /// Plain integer rank, independent of scope priorities. Higher tiers are
    /// offered the command first.
    fn priority(&self) -> i32 {
        0
    }

    /// Called when the extension is adopted by a dispatcher.
    fn attach(&self, _family: Family) {}

    /// Called when the extension is removed from its dispatcher.
    fn detach(&self, _family: Family) {}

    /// Observe a command. Returning `Ok(true)` locks the dispatch to this
    /// extension's priority tier.
    fn on_next(&self, command: &Command) -> PluginResult<bool>;

    /// Notified with this extension's own dispatch error, best effort.
    /// Returning `true` marks the error as handled.
    fn on_error(&self, _error: &crate::error::PluginError) -> bool {
        false
    }

    /// Notified once when the owning dispatcher shuts down.
    fn on_completed(&self) {}
}
