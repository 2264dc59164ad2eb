//! Publication point for the current table

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::info;

use crate::table::Table;

/// Trait for components that need to respond to a newly published table
pub trait TableSubscriber: Send + Sync {
    fn on_table_published(&self, table: &Table);
}

/// Holds the current table snapshot
///
/// Readers clone the handle and keep working on that snapshot; a publish
/// swaps the handle atomically, so a reader sees either the old or the new
/// table, never a mix.
#[derive(Clone)]
pub struct SharedTable {
    current: Arc<RwLock<Table>>,
    subscribers: Arc<RwLock<Vec<Weak<dyn TableSubscriber>>>>,
}

impl SharedTable {
    pub fn new(table: Table) -> Self {
        Self {
            current: Arc::new(RwLock::new(table)),
            subscribers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Table {
        self.current.read().clone()
    }

    /// Replace the current table and notify subscribers
    ///
    /// Returns the previous snapshot.
    pub fn publish(&self, table: Table) -> Table {
        let previous = std::mem::replace(&mut *self.current.write(), table.clone());
        info!(
            "Published table ({}) with {} rows",
            table.operation(),
            table.num_rows()
        );
        self.notify_subscribers(&table);
        previous
    }

    /// Add a subscriber
    pub fn add_subscriber(&self, subscriber: Arc<dyn TableSubscriber>) {
        let mut subscribers = self.subscribers.write();
        subscribers.push(Arc::downgrade(&subscriber));
    }

    fn notify_subscribers(&self, table: &Table) {
        let mut subscribers = self.subscribers.write();

        // Remove any dead weak references
        subscribers.retain(|weak| weak.strong_count() > 0);

        for weak in subscribers.iter() {
            if let Some(subscriber) = weak.upgrade() {
                subscriber.on_table_published(table);
            }
        }
    }
}
