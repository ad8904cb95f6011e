//! Client-side order state kept fresh by polling.
//!
//! [`OrderStore`] holds the orders visible to the session (and dashboard stats
//! for admins). [`OrderStore::start`] spawns a [`Poller`] that refreshes every
//! [`POLL_INTERVAL`] until it is stopped or dropped. Every poller owns its own
//! running flag, so stopping an old poller never affects a newer one. A fetch
//! still in flight when its poller stops, or when the store is reset, is
//! discarded instead of overwriting newer state.
//!
//! Mutations are not optimistic: local state changes only after the server
//! has accepted the request.

use super::toast::Toasts;
use crate::{
    core::{
        order::{CheckoutInput, OrderWithItems},
        stats::DashboardStats,
    },
    entities::order::OrderStatus,
    errors::Result,
};
use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::{
    sync::{RwLock, watch},
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, warn};

/// Delay between two refreshes.
pub const POLL_INTERVAL: Duration = Duration::from_secs(8);

/// Order endpoints the store depends on.
pub trait OrderFeed: Send + Sync + 'static {
    /// Orders visible to the session.
    fn fetch_orders(&self) -> impl Future<Output = Result<Vec<OrderWithItems>>> + Send;
    /// Admin dashboard statistics.
    fn fetch_stats(&self) -> impl Future<Output = Result<DashboardStats>> + Send;
    /// Places an order.
    fn create_order(
        &self,
        input: &CheckoutInput,
    ) -> impl Future<Output = Result<OrderWithItems>> + Send;
    /// Sets an order's status (admin).
    fn update_order_status(
        &self,
        order_id: i64,
        status: OrderStatus,
    ) -> impl Future<Output = Result<OrderWithItems>> + Send;
    /// Cancels a pending order.
    fn cancel_order(&self, order_id: i64) -> impl Future<Output = Result<OrderWithItems>> + Send;
}

/// Snapshot of what the store currently knows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderState {
    /// Newest first, as returned by the server
    pub orders: Vec<OrderWithItems>,
    /// Only fetched for admins
    pub stats: Option<DashboardStats>,
    /// Whether at least one refresh has completed
    pub loaded: bool,
}

impl OrderState {
    fn replace(&mut self, updated: OrderWithItems) {
        if let Some(existing) = self
            .orders
            .iter_mut()
            .find(|o| o.order.id == updated.order.id)
        {
            *existing = updated;
        }
    }
}

/// Polled order list shared by every clone.
pub struct OrderStore<F> {
    feed: Arc<F>,
    state: Arc<RwLock<OrderState>>,
    /// Bumped by [`OrderStore::reset`]; refreshes started before a reset are dropped
    epoch: Arc<AtomicU64>,
    changes: Arc<watch::Sender<u64>>,
    toasts: Toasts,
    is_admin: bool,
}

impl<F> Clone for OrderStore<F> {
    fn clone(&self) -> Self {
        Self {
            feed: Arc::clone(&self.feed),
            state: Arc::clone(&self.state),
            epoch: Arc::clone(&self.epoch),
            changes: Arc::clone(&self.changes),
            toasts: self.toasts.clone(),
            is_admin: self.is_admin,
        }
    }
}

impl<F: OrderFeed> OrderStore<F> {
    /// `is_admin` decides whether dashboard stats are fetched alongside orders.
    pub fn new(feed: Arc<F>, toasts: Toasts, is_admin: bool) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            feed,
            state: Arc::new(RwLock::new(OrderState::default())),
            epoch: Arc::new(AtomicU64::new(0)),
            changes: Arc::new(changes),
            toasts,
            is_admin,
        }
    }

    /// Current state.
    pub async fn snapshot(&self) -> OrderState {
        self.state.read().await.clone()
    }

    /// Receives a new version number after every applied change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    fn notify(&self) {
        self.changes.send_modify(|version| *version += 1);
    }

    /// Fetches and applies the latest orders (and stats for admins).
    ///
    /// On failure an error toast is pushed and the previous state is kept.
    pub async fn refresh(&self) {
        self.refresh_as(None).await;
    }

    /// One refresh, applied only if the store was not reset meanwhile and
    /// `running` (the calling poller's flag, if any) is still set.
    async fn refresh_as(&self, running: Option<&AtomicBool>) {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let orders = match self.feed.fetch_orders().await {
            Ok(orders) => orders,
            Err(e) => {
                warn!("Order refresh failed: {e}");
                self.toasts.error(format!("Could not load orders: {e}"));
                return;
            }
        };
        let stats = if self.is_admin {
            match self.feed.fetch_stats().await {
                Ok(stats) => Some(stats),
                Err(e) => {
                    warn!("Stats refresh failed: {e}");
                    self.toasts.error(format!("Could not load statistics: {e}"));
                    None
                }
            }
        } else {
            None
        };

        let mut state = self.state.write().await;
        let stopped = running.is_some_and(|flag| !flag.load(Ordering::SeqCst));
        if stopped || self.epoch.load(Ordering::SeqCst) != epoch {
            debug!("Discarding outdated refresh");
            return;
        }
        state.orders = orders;
        if stats.is_some() {
            state.stats = stats;
        }
        state.loaded = true;
        drop(state);
        self.notify();
    }

    /// Starts polling: one refresh now, then one every [`POLL_INTERVAL`].
    #[must_use]
    pub fn start(&self) -> Poller {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let store = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval(POLL_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                store.refresh_as(Some(&flag)).await;
            }
        });
        Poller {
            handle: Some(handle),
            running,
        }
    }

    /// Forgets everything, e.g. on logout. In-flight refreshes are discarded.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        *state = OrderState::default();
        drop(state);
        self.notify();
    }

    /// Places an order and prepends it once the server has created it.
    pub async fn create_order(&self, input: &CheckoutInput) -> Result<OrderWithItems> {
        match self.feed.create_order(input).await {
            Ok(created) => {
                self.state.write().await.orders.insert(0, created.clone());
                self.notify();
                self.toasts.success("Order placed");
                Ok(created)
            }
            Err(e) => {
                self.toasts.error(format!("Could not place order: {e}"));
                Err(e)
            }
        }
    }

    /// Admin status change, applied locally after the server accepts it.
    pub async fn update_status(&self, order_id: i64, status: OrderStatus) -> Result<OrderWithItems> {
        match self.feed.update_order_status(order_id, status).await {
            Ok(updated) => {
                self.state.write().await.replace(updated.clone());
                self.notify();
                self.toasts.success(format!("Order marked {status}"));
                Ok(updated)
            }
            Err(e) => {
                self.toasts.error(format!("Could not update order: {e}"));
                Err(e)
            }
        }
    }

    /// Cancels a pending order, applied locally after the server accepts it.
    pub async fn cancel(&self, order_id: i64) -> Result<OrderWithItems> {
        match self.feed.cancel_order(order_id).await {
            Ok(cancelled) => {
                self.state.write().await.replace(cancelled.clone());
                self.notify();
                self.toasts.success("Order cancelled");
                Ok(cancelled)
            }
            Err(e) => {
                self.toasts.error(format!("Could not cancel order: {e}"));
                Err(e)
            }
        }
    }
}

/// Handle of a running polling task. Dropping it stops the polling.
#[derive(Debug)]
pub struct Poller {
    handle: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl Poller {
    /// Stops polling. Results of a fetch already in flight are discarded.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.running.store(false, Ordering::SeqCst);
            handle.abort();
        }
    }

    /// Whether the polling task is still alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}
