// SPDX-License-Identifier: GPL-3.0-only

//! Tracks which input-method service the panel is bound to.
//!
//! The panel binds to whichever unique bus name last sent
//! `RegisterProperties`, and watches that name so it can drop all state when
//! the service leaves the bus. Exactly one watch is active while bound.

/// Opaque handle for an installed name watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchHandle(pub u64);

/// Installs and removes watches on bus names.
///
/// Implementations report a vanished name back to the panel as
/// `PanelEvent::ServiceVanished`.
pub trait NameWatcher {
    fn watch(&mut self, name: &str) -> WatchHandle;
    fn unwatch(&mut self, handle: WatchHandle);
}

/// Current service binding and its watch.
pub struct ServiceTracker {
    watcher: Box<dyn NameWatcher>,
    current: Option<String>,
    watch: Option<WatchHandle>,
}

impl std::fmt::Debug for ServiceTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceTracker")
            .field("current", &self.current)
            .field("watch", &self.watch)
            .finish_non_exhaustive()
    }
}

impl ServiceTracker {
    pub fn new(watcher: Box<dyn NameWatcher>) -> Self {
        Self {
            watcher,
            current: None,
            watch: None,
        }
    }

    /// Unique name of the bound service, if any.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Binds to `sender` unless already bound to it.
    ///
    /// The previous watch is removed before the new one is installed.
    /// Returns `true` when the binding changed.
    pub fn register(&mut self, sender: &str) -> bool {
        if self.current.as_deref() == Some(sender) {
            return false;
        }

        self.release_watch();
        tracing::info!("Binding to input method service {}", sender);
        self.current = Some(sender.to_owned());
        self.watch = Some(self.watcher.watch(sender));
        true
    }

    /// Handles a name leaving the bus.
    ///
    /// Returns `true` when it was the bound service; names that are no longer
    /// bound are ignored.
    pub fn on_name_vanished(&mut self, name: &str) -> bool {
        if self.current.as_deref() != Some(name) {
            tracing::debug!("Ignoring exit of unbound service {}", name);
            return false;
        }

        tracing::info!("Input method service {} exited", name);
        self.current = None;
        self.release_watch();
        true
    }

    /// Drops the binding and any watch.
    pub fn teardown(&mut self) {
        self.current = None;
        self.release_watch();
    }

    fn release_watch(&mut self) {
        if let Some(handle) = self.watch.take() {
            self.watcher.unwatch(handle);
        }
    }
}

impl Drop for ServiceTracker {
    fn drop(&mut self) {
        self.release_watch();
    }
}

// ============================================================================
// Tests
// ============================================================================
