// SPDX-License-Identifier: GPL-3.0-only

//! Helper task handles and bus name watches.

use crate::panel::PanelEvent;
use crate::service::{NameWatcher, WatchHandle};
use futures::channel::mpsc;
use futures::StreamExt;
use std::collections::HashMap;
use std::future::Future;
use tokio::task::JoinHandle;
use zbus::fdo::DBusProxy;
use zbus::names::BusName;

/// A spawned helper task. Dropping the handle cancels the task.
#[derive(Debug)]
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(future),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Watches bus names for their owner leaving, reporting
/// [`PanelEvent::ServiceVanished`].
pub struct DbusNameWatcher {
    connection: zbus::Connection,
    events: mpsc::Sender<PanelEvent>,
    next: u64,
    watches: HashMap<WatchHandle, Subscription>,
}

impl std::fmt::Debug for DbusNameWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbusNameWatcher")
            .field("watches", &self.watches.len())
            .finish_non_exhaustive()
    }
}

impl DbusNameWatcher {
    pub fn new(connection: zbus::Connection, events: mpsc::Sender<PanelEvent>) -> Self {
        Self {
            connection,
            events,
            next: 0,
            watches: HashMap::new(),
        }
    }
}

impl NameWatcher for DbusNameWatcher {
    fn watch(&mut self, name: &str) -> WatchHandle {
        self.next += 1;
        let handle = WatchHandle(self.next);

        let connection = self.connection.clone();
        let events = self.events.clone();
        let name = name.to_owned();
        let subscription = Subscription::spawn(async move {
            if let Err(e) = watch_name(connection, &name, events).await {
                tracing::warn!("Watch on {} failed: {}", name, e);
            }
        });

        tracing::debug!("Watching bus name {:?}", handle);
        self.watches.insert(handle, subscription);
        handle
    }

    fn unwatch(&mut self, handle: WatchHandle) {
        if self.watches.remove(&handle).is_some() {
            tracing::debug!("Released watch {:?}", handle);
        }
    }
}

/// Waits for `name` to lose its owner, then reports it once.
async fn watch_name(
    connection: zbus::Connection,
    name: &str,
    mut events: mpsc::Sender<PanelEvent>,
) -> zbus::Result<()> {
    let dbus = DBusProxy::new(&connection).await?;
    let mut changes = dbus
        .receive_name_owner_changed_with_args(&[(0, name)])
        .await?;

    // The owner may have left before the match rule was installed.
    let owned = dbus.name_has_owner(BusName::try_from(name)?).await?;

    let vanished = if owned {
        let mut vanished = false;
        while let Some(signal) = changes.next().await {
            if signal.args()?.new_owner().is_none() {
                vanished = true;
                break;
            }
        }
        vanished
    } else {
        true
    };

    if vanished {
        report_vanished(&mut events, name).await;
    }
    Ok(())
}

async fn report_vanished(events: &mut mpsc::Sender<PanelEvent>, name: &str) {
    tracing::debug!("Bus name {} lost its owner", name);
    super::forward(events, PanelEvent::ServiceVanished(name.to_owned())).await;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: Dropping a subscription cancels its task.
    #[tokio::test]
    async fn test_subscription_aborts_on_drop() {
        let (tx, mut rx) = mpsc::channel::<()>(1);
        let subscription = Subscription::spawn(async move {
            let _tx = tx;
            std::future::pending::<()>().await;
        });

        drop(subscription);

        // The sender is dropped with the aborted task, closing the channel.
        assert_eq!(rx.next().await, None);
    }

    /// Test: A vanished name is delivered to the dispatch loop.
    #[tokio::test]
    async fn test_report_vanished_delivers_event() {
        let (mut tx, mut rx) = mpsc::channel::<PanelEvent>(1);

        report_vanished(&mut tx, ":1.10").await;
        assert_eq!(
            rx.next().await,
            Some(PanelEvent::ServiceVanished(":1.10".to_string()))
        );
    }

    /// Test: Reporting into a closed dispatch loop is logged, not a panic.
    #[tokio::test]
    async fn test_report_vanished_closed_channel() {
        let (mut tx, rx) = mpsc::channel::<PanelEvent>(1);
        drop(rx);

        report_vanished(&mut tx, ":1.10").await;
        assert!(tx.is_closed());
    }
}
