use std::sync::{Arc, RwLock};

use railyard_api::{Family, ScopePath};
use railyard_plugin::{Command, Handler};
use tracing::{debug, warn};

use crate::error::{KernelError, Result};

/// Exclusive-routing container: all handlers of one family, kept sorted
/// ascending by scope priority. At most one member executes per dispatched
/// command.
pub struct HandlerGroup {
    family: Family,
    handlers: RwLock<Vec<Arc<dyn Handler>>>,
}

impl HandlerGroup {
    pub fn new(family: Family) -> Self {
        Self {
            family,
            handlers: RwLock::new(Vec::new()),
        }
    }

    pub fn family(&self) -> Family {
        self.family
    }

    /// Insert and re-sort. The sort is stable, so among equal priorities the
    /// earliest registration stays in the catch-all slot.
    pub fn add(&self, handler: Arc<dyn Handler>) -> Result<()> {
        if handler.family() != self.family {
            return Err(KernelError::FamilyMismatch {
                handler: handler.family(),
                group: self.family,
            });
        }
        let mut handlers = self
            .handlers
            .write()
            .map_err(|_| KernelError::Poisoned("handler group"))?;
        handlers.push(handler);
        handlers.sort_by_key(|h| h.priority());
        Ok(())
    }

    /// Remove by identity. Re-sorting is unnecessary: removal preserves order.
    pub fn remove(&self, handler: &Arc<dyn Handler>) -> Result<bool> {
        let mut handlers = self
            .handlers
            .write()
            .map_err(|_| KernelError::Poisoned("handler group"))?;
        let before = handlers.len();
        handlers.retain(|h| !Arc::ptr_eq(h, handler));
        Ok(handlers.len() != before)
    }

    pub fn len(&self) -> usize {
        self.handlers.read().map(|h| h.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Locality resolution: scan from the most-specific end down to (not
    /// including) the lowest-priority element, accepting the first enabled
    /// handler that either is not a local override or whose scope is an
    /// ancestor-or-equal of the target. The lowest-priority element is the
    /// catch-all fallback, eligible only when enabled and not itself an
    /// override.
    pub fn select(&self, target: &ScopePath) -> Option<Arc<dyn Handler>> {
        let handlers = match self.handlers.read() {
            Ok(handlers) => handlers,
            Err(_) => {
                warn!(family = %self.family, "handler group lock poisoned");
                return None;
            }
        };

        for handler in handlers.iter().skip(1).rev() {
            if !handler.enabled() {
                continue;
            }
            if !handler.priority().is_local_override() || handler.scope().contains(target) {
                return Some(Arc::clone(handler));
            }
        }

        let fallback = handlers.first()?;
        if fallback.enabled() && !fallback.priority().is_local_override() {
            return Some(Arc::clone(fallback));
        }
        None
    }

    /// Resolve one handler for the command's target and run it. A selection
    /// miss and a handler error both count as not-accepted; errors never
    /// propagate to siblings.
    pub fn dispatch(&self, command: &Command) -> bool {
        let Some(handler) = self.select(command.target()) else {
            debug!(family = %self.family, path = %command.target(), "no eligible handler");
            return false;
        };

        // The selected handler must carry the command's exact routing key.
        if handler.family() != command.family() {
            debug!(
                family = %handler.family(),
                command = %command.id(),
                "selected handler family does not match routing key"
            );
            return false;
        }

        match handler.process(command) {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(family = %self.family, %err, "handler failed during process");
                false
            }
        }
    }
}
