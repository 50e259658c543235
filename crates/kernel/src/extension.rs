use std::cmp::Reverse;
use std::sync::{Arc, RwLock};

use railyard_api::Family;
use railyard_plugin::{Command, Extension};
use tracing::warn;

/// Non-exclusive routing: the ranked registry of extensions for one family.
///
/// Extensions are kept sorted descending by priority. Per dispatch, the first
/// acceptance locks its priority tier; the remaining siblings at exactly that
/// tier are still offered the command, everything below never is.
pub struct ExtensionDispatcher {
    family: Family,
    extensions: RwLock<Vec<Arc<dyn Extension>>>,
}

impl ExtensionDispatcher {
    pub fn new(family: Family) -> Self {
        Self {
            family,
            extensions: RwLock::new(Vec::new()),
        }
    }

    pub fn family(&self) -> Family {
        self.family
    }

    /// Insert, re-sort, and fire the attach hook. The sort is stable, so ties
    /// keep registration order.
    pub fn register(&self, extension: Arc<dyn Extension>) {
        {
            let Ok(mut extensions) = self.extensions.write() else {
                warn!(family = %self.family, "extension registry poisoned; registration dropped");
                return;
            };
            extensions.push(Arc::clone(&extension));
            extensions.sort_by_key(|e| Reverse(e.priority()));
        }
        extension.attach(self.family);
    }

    /// Remove by identity and fire the detach hook.
    pub fn remove(&self, extension: &Arc<dyn Extension>) -> bool {
        let removed = {
            let Ok(mut extensions) = self.extensions.write() else {
                return false;
            };
            let before = extensions.len();
            extensions.retain(|e| !Arc::ptr_eq(e, extension));
            extensions.len() != before
        };
        if removed {
            extension.detach(self.family);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.extensions.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tiered fan-out over a snapshot of the registry.
    ///
    /// While no extension has accepted, every extension is tried in order.
    /// The first acceptance locks the tier; iteration then continues only
    /// while the next extension's priority equals the locked tier. An error
    /// from one extension is logged, routed to its own `on_error`, and does
    /// not abort the loop.
    pub fn dispatch(&self, command: &Command) -> bool {
        let snapshot: Vec<Arc<dyn Extension>> = match self.extensions.read() {
            Ok(extensions) => extensions.clone(),
            Err(_) => {
                warn!(family = %self.family, "extension registry poisoned");
                return false;
            }
        };

        let mut locked_tier: Option<i32> = None;
        let mut accepted = false;

        for extension in snapshot {
            if let Some(tier) = locked_tier {
                if extension.priority() != tier {
                    break;
                }
            }
            match extension.on_next(command) {
                Ok(true) => {
                    accepted = true;
                    if locked_tier.is_none() {
                        locked_tier = Some(extension.priority());
                    }
                }
                Ok(false) => {}
                Err(err) => {
                    warn!(family = %self.family, %err, "extension failed during on_next");
                    let _ = extension.on_error(&err);
                }
            }
        }

        accepted
    }

    /// Notify and detach every extension; used at pipeline shutdown.
    pub fn clear(&self) {
        let drained = {
            let Ok(mut extensions) = self.extensions.write() else {
                return;
            };
            std::mem::take(&mut *extensions)
        };
        for extension in drained {
            extension.on_completed();
            extension.detach(self.family);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use railyard_plugin::{PluginError, PluginResult};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct CountingExtension {
        priority: i32,
        accepts: bool,
        fails: bool,
        seen: AtomicUsize,
        errors: AtomicUsize,
        attached: AtomicBool,
        completed: AtomicBool,
    }

    impl CountingExtension {
        fn new(priority: i32, accepts: bool) -> Arc<Self> {
            Arc::new(Self {
                priority,
                accepts,
                fails: false,
                seen: AtomicUsize::new(0),
                errors: AtomicUsize::new(0),
                attached: AtomicBool::new(false),
                completed: AtomicBool::new(false),
            })
        }

        fn failing(priority: i32) -> Arc<Self> {
            Arc::new(Self {
                priority,
                accepts: false,
                fails: true,
                seen: AtomicUsize::new(0),
                errors: AtomicUsize::new(0),
                attached: AtomicBool::new(false),
                completed: AtomicBool::new(false),
            })
        }

        fn seen(&self) -> usize {
            self.seen.load(Ordering::SeqCst)
        }
    }

    impl Extension for CountingExtension {
        fn family(&self) -> Family {
            Family::PACKAGE
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn attach(&self, _family: Family) {
            self.attached.store(true, Ordering::SeqCst);
        }

        fn detach(&self, _family: Family) {
            self.attached.store(false, Ordering::SeqCst);
        }

        fn on_next(&self, _command: &Command) -> PluginResult<bool> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            if self.fails {
                return Err(PluginError::Tool("simulated tool failure".into()));
            }
            Ok(self.accepts)
        }

        fn on_error(&self, _error: &PluginError) -> bool {
            self.errors.fetch_add(1, Ordering::SeqCst);
            true
        }

        fn on_completed(&self) {
            self.completed.store(true, Ordering::SeqCst);
        }
    }

    fn command() -> Command {
        Command::new(Family::PACKAGE, "/project/out")
    }

    #[test]
    fn acceptance_locks_the_tier_and_starves_lower_tiers() {
        let x1 = CountingExtension::new(5, true);
        let x2 = CountingExtension::new(5, true);
        let x3 = CountingExtension::new(1, true);

        let dispatcher = ExtensionDispatcher::new(Family::PACKAGE);
        dispatcher.register(x1.clone());
        dispatcher.register(x2.clone());
        dispatcher.register(x3.clone());

        assert!(dispatcher.dispatch(&command()));
        assert_eq!(x1.seen(), 1);
        assert_eq!(x2.seen(), 1);
        assert_eq!(x3.seen(), 0);
    }

    #[test]
    fn no_acceptance_tries_every_extension() {
        let x1 = CountingExtension::new(5, false);
        let x2 = CountingExtension::new(3, false);
        let x3 = CountingExtension::new(1, false);

        let dispatcher = ExtensionDispatcher::new(Family::PACKAGE);
        dispatcher.register(x1.clone());
        dispatcher.register(x2.clone());
        dispatcher.register(x3.clone());

        assert!(!dispatcher.dispatch(&command()));
        assert_eq!(x1.seen(), 1);
        assert_eq!(x2.seen(), 1);
        assert_eq!(x3.seen(), 1);
    }

    #[test]
    fn error_is_routed_to_on_error_and_does_not_abort_siblings() {
        let failing = CountingExtension::failing(5);
        let sibling = CountingExtension::new(5, true);

        let dispatcher = ExtensionDispatcher::new(Family::PACKAGE);
        dispatcher.register(failing.clone());
        dispatcher.register(sibling.clone());

        assert!(dispatcher.dispatch(&command()));
        assert_eq!(failing.errors.load(Ordering::SeqCst), 1);
        assert_eq!(sibling.seen(), 1);
    }

    #[test]
    fn register_and_remove_fire_lifecycle_hooks() {
        let ext = CountingExtension::new(0, false);
        let dispatcher = ExtensionDispatcher::new(Family::PACKAGE);

        let as_dyn: Arc<dyn Extension> = ext.clone();
        dispatcher.register(as_dyn.clone());
        assert!(ext.attached.load(Ordering::SeqCst));

        assert!(dispatcher.remove(&as_dyn));
        assert!(!ext.attached.load(Ordering::SeqCst));
        assert!(dispatcher.is_empty());
    }

    #[test]
    fn clear_notifies_completion() {
        let ext = CountingExtension::new(0, false);
        let dispatcher = ExtensionDispatcher::new(Family::PACKAGE);
        dispatcher.register(ext.clone());

        dispatcher.clear();
        assert!(ext.completed.load(Ordering::SeqCst));
        assert!(dispatcher.is_empty());
    }
}
