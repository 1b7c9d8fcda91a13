//! Network reachability reporting.
//!
//! The crate does not probe the network itself. Hosts feed the current state
//! into a [`ConnectivityMonitor`] (or implement [`ConnectivityService`] over a
//! platform API); [`NetworkClient::wait_for_connection`](super::NetworkClient::wait_for_connection)
//! suspends requests until the service reports a reachable state.

use async_trait::async_trait;
use tokio::sync::watch;

/// Current network path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    /// No usable route.
    Unavailable,
    /// Reachable over Wi-Fi.
    Wifi,
    /// Reachable over a cellular link.
    Cellular,
    /// Reachable over a wired link.
    Wired,
}

impl Connectivity {
    /// Whether requests can be sent.
    pub fn is_reachable(self) -> bool {
        self != Connectivity::Unavailable
    }
}

/// Reports and awaits connectivity changes.
#[async_trait]
pub trait ConnectivityService: Send + Sync + 'static {
    /// State right now.
    fn state(&self) -> Connectivity;

    /// Suspend until `predicate` holds for the current state.
    async fn wait_until(&self, predicate: &(dyn Fn(Connectivity) -> bool + Send + Sync));

    /// Whether the network is reachable right now.
    fn is_reachable(&self) -> bool {
        self.state().is_reachable()
    }

    /// Suspend until the network is reachable.
    async fn wait_reachable(&self) {
        self.wait_until(&|state: Connectivity| state.is_reachable()).await
    }
}

/// Connectivity state pushed by the host.
///
/// # Examples
///
/// ```
/// use netclient::{Connectivity, ConnectivityMonitor, ConnectivityService};
///
/// let monitor = ConnectivityMonitor::new(Connectivity::Unavailable);
/// assert!(!monitor.is_reachable());
/// monitor.set_state(Connectivity::Wifi);
/// assert!(monitor.is_reachable());
/// ```
#[derive(Debug)]
pub struct ConnectivityMonitor {
    state: watch::Sender<Connectivity>,
}

impl ConnectivityMonitor {
    /// Monitor starting in `initial`.
    pub fn new(initial: Connectivity) -> Self {
        ConnectivityMonitor {
            state: watch::Sender::new(initial),
        }
    }

    /// Publish a new state, waking waiters whose predicate now holds.
    pub fn set_state(&self, state: Connectivity) {
        self.state.send_replace(state);
    }
}

#[async_trait]
impl ConnectivityService for ConnectivityMonitor {
    fn state(&self) -> Connectivity {
        *self.state.borrow()
    }

    async fn wait_until(&self, predicate: &(dyn Fn(Connectivity) -> bool + Send + Sync)) {
        let mut receiver = self.state.subscribe();
        // The sender lives as long as `self`, so this only ends once the predicate holds.
        let _ = receiver.wait_for(|state| predicate(*state)).await;
    }
}

/// Always reports a wired connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReachable;

#[async_trait]
impl ConnectivityService for AlwaysReachable {
    fn state(&self) -> Connectivity {
        Connectivity::Wired
    }

    async fn wait_until(&self, predicate: &(dyn Fn(Connectivity) -> bool + Send + Sync)) {
        if !predicate(Connectivity::Wired) {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_reachable_wakes_on_change() {
        let monitor = Arc::new(ConnectivityMonitor::new(Connectivity::Unavailable));
        let waiter = {
            let monitor = monitor.clone();
            tokio::spawn(async move { monitor.wait_reachable().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        monitor.set_state(Connectivity::Cellular);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_always_reachable() {
        AlwaysReachable.wait_reachable().await;
        assert_eq!(AlwaysReachable.state(), Connectivity::Wired);
    }
}
