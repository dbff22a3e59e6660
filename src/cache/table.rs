//! Cache Table Module
//!
//! Named table of cache items with lazy loading, removal callbacks and
//! sliding-window expiration.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::cache::item::ExpiryCallback;
use crate::cache::{CacheItem, CacheStats};
use crate::config::Config;
use crate::error::{CacheError, Result};

/// Callback invoked with an item that was just added or is about to be deleted.
pub type ItemCallback<K, V> = Arc<dyn Fn(&Arc<CacheItem<K, V>>) + Send + Sync>;

/// Produces an item for a key that is missing from the table.
pub type DataLoader<K, V> = Arc<dyn Fn(&K) -> Option<CacheItem<K, V>> + Send + Sync>;

// == Table Callbacks ==
struct TableCallbacks<K, V> {
    added_item: Vec<ItemCallback<K, V>>,
    about_to_delete_item: Vec<ItemCallback<K, V>>,
    data_loader: Option<DataLoader<K, V>>,
}

impl<K, V> Default for TableCallbacks<K, V> {
    fn default() -> Self {
        Self {
            added_item: Vec::new(),
            about_to_delete_item: Vec::new(),
            data_loader: None,
        }
    }
}

/// An item taken out of the map together with the callbacks to fire for it.
struct Removal<K, V> {
    item: Arc<CacheItem<K, V>>,
    about_to_delete_item: Vec<ItemCallback<K, V>>,
    about_to_expire: Vec<ExpiryCallback<K>>,
}

impl<K, V> Removal<K, V> {
    fn fire(&self) {
        for callback in &self.about_to_delete_item {
            callback(&self.item);
        }
        for callback in &self.about_to_expire {
            callback(self.item.key());
        }
    }
}

// == Expiration Report ==
/// Outcome of a single [`CacheTable::expiration_check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpirationReport {
    /// Items removed by this check
    pub removed: usize,
    /// Time until the next remaining item expires, `None` if none can
    pub next_due: Option<Duration>,
}

// == Cache Table ==
/// Thread-safe map of keys to shared [`CacheItem`]s.
///
/// Lookups keep items alive; [`expiration_check`](Self::expiration_check)
/// removes items that went unaccessed for their whole life span. Removal
/// callbacks are snapshotted under the table lock and invoked after it is
/// released, so callbacks may call back into the table.
pub struct CacheTable<K, V> {
    name: String,
    items: RwLock<HashMap<K, Arc<CacheItem<K, V>>>>,
    callbacks: RwLock<TableCallbacks<K, V>>,
    stats: Mutex<CacheStats>,
}

impl<K, V> CacheTable<K, V>
where
    K: Eq + Hash + Clone + Debug,
{
    // == Constructor ==
    /// Creates an empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: RwLock::new(HashMap::new()),
            callbacks: RwLock::new(TableCallbacks::default()),
            stats: Mutex::new(CacheStats::new()),
        }
    }

    /// Creates an empty table named after the configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.table_name.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // == Add ==
    /// Stores `data` under `key`, replacing any existing item.
    ///
    /// A replaced item is dropped silently; its removal callbacks do not fire.
    pub fn add(&self, key: K, life_span: Duration, data: V) -> Arc<CacheItem<K, V>> {
        debug!(
            "Adding item with key {:?} and life span of {:?} to table {}",
            key, life_span, self.name
        );

        let item = Arc::new(CacheItem::new(key.clone(), life_span, data));
        self.items.write().insert(key, item.clone());
        self.notify_added(&item);
        item
    }

    // == Not Found Add ==
    /// Stores `data` under `key` only if the key is absent.
    ///
    /// Returns true if the item was inserted.
    pub fn not_found_add(&self, key: K, life_span: Duration, data: V) -> bool {
        let item = {
            let mut items = self.items.write();
            match items.entry(key) {
                Entry::Occupied(_) => return false,
                Entry::Vacant(slot) => {
                    let item = Arc::new(CacheItem::new(slot.key().clone(), life_span, data));
                    slot.insert(item.clone());
                    item
                }
            }
        };

        debug!(
            "Adding absent item with key {:?} and life span of {:?} to table {}",
            item.key(),
            life_span,
            self.name
        );
        self.notify_added(&item);
        true
    }

    // == Value ==
    /// Returns the item stored under `key` and keeps it alive.
    ///
    /// On a miss the data loader, if any, is asked for the item. A loaded item
    /// is added to the table and returned without being kept alive.
    ///
    /// # Errors
    /// - [`CacheError::KeyNotFound`] if the key is absent and no loader is set
    /// - [`CacheError::KeyNotFoundOrLoadable`] if the loader produced nothing
    pub fn value(&self, key: &K) -> Result<Arc<CacheItem<K, V>>> {
        let found = self.items.read().get(key).cloned();
        if let Some(item) = found {
            item.keep_alive();
            self.stats.lock().record_hit();
            return Ok(item);
        }

        self.stats.lock().record_miss();

        let loader = self.callbacks.read().data_loader.clone();
        let Some(loader) = loader else {
            return Err(CacheError::not_found(key));
        };

        let loaded = match loader(key) {
            Some(item) if item.key() == key => Arc::new(item),
            Some(item) => {
                warn!(
                    "Data loader for table {} returned key {:?} when asked for {:?}",
                    self.name,
                    item.key(),
                    key
                );
                return Err(CacheError::not_loadable(key));
            }
            None => return Err(CacheError::not_loadable(key)),
        };

        let (item, inserted) = {
            let mut items = self.items.write();
            match items.entry(key.clone()) {
                Entry::Occupied(existing) => (existing.get().clone(), false),
                Entry::Vacant(slot) => {
                    slot.insert(loaded.clone());
                    (loaded, true)
                }
            }
        };

        if inserted {
            debug!("Loaded item with key {:?} into table {}", key, self.name);
            self.stats.lock().record_load();
            self.notify_added(&item);
        }
        Ok(item)
    }

    // == Delete ==
    /// Removes the item stored under `key`.
    ///
    /// The table's about-to-delete callbacks fire with the item, then the
    /// item's own expiry callbacks fire with its key.
    ///
    /// # Errors
    /// - [`CacheError::KeyNotFound`] if the key is absent
    pub fn delete(&self, key: &K) -> Result<Arc<CacheItem<K, V>>> {
        let removal = {
            let mut items = self.items.write();
            self.take(&mut items, key)
        };

        let removal = removal.ok_or_else(|| CacheError::not_found(key))?;
        removal.fire();
        Ok(removal.item)
    }

    /// Returns true if `key` is present. Does not keep the item alive.
    pub fn exists(&self, key: &K) -> bool {
        self.items.read().contains_key(key)
    }

    pub fn count(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    // == Foreach ==
    /// Calls `f` for every item present when the call starts.
    ///
    /// Iterates a snapshot, so `f` may modify the table.
    pub fn foreach<F>(&self, mut f: F)
    where
        F: FnMut(&K, &Arc<CacheItem<K, V>>),
    {
        let snapshot: Vec<Arc<CacheItem<K, V>>> = self.items.read().values().cloned().collect();
        for item in &snapshot {
            f(item.key(), item);
        }
    }

    // == Flush ==
    /// Drops every item without firing removal callbacks.
    pub fn flush(&self) {
        let mut items = self.items.write();
        info!("Flushing {} items from table {}", items.len(), self.name);
        items.clear();
    }

    // == Most Accessed ==
    /// Returns up to `count` items ordered by descending access count.
    pub fn most_accessed(&self, count: usize) -> Vec<Arc<CacheItem<K, V>>> {
        // Counts move under concurrent keep-alives; rank on one reading each.
        let mut ranked: Vec<(u64, Arc<CacheItem<K, V>>)> = self
            .items
            .read()
            .values()
            .map(|item| (item.access_count(), item.clone()))
            .collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0));
        ranked.truncate(count);
        ranked.into_iter().map(|(_, item)| item).collect()
    }

    // == Expiration Check ==
    /// Removes every item that has gone unaccessed for its whole life span.
    ///
    /// Removal callbacks fire exactly as for [`delete`](Self::delete).
    ///
    /// Returns how many items were removed and how long until the next
    /// remaining item is due (`None` if no remaining item can expire).
    pub fn expiration_check(&self) -> ExpirationReport {
        let now = Instant::now();
        let mut next_due: Option<Duration> = None;

        let removals: Vec<Removal<K, V>> = {
            let mut items = self.items.write();
            let expired: Vec<K> = items
                .iter()
                .filter_map(|(key, item)| match item.remaining_at(now) {
                    Some(remaining) if remaining.is_zero() => Some(key.clone()),
                    Some(remaining) => {
                        next_due = Some(next_due.map_or(remaining, |due| due.min(remaining)));
                        None
                    }
                    None => None,
                })
                .collect();

            expired
                .iter()
                .filter_map(|key| self.take(&mut items, key))
                .collect()
        };

        if !removals.is_empty() {
            self.stats.lock().record_expirations(removals.len());
        }
        debug!(
            "Expiration check on table {} removed {} items, next due in {:?}",
            self.name,
            removals.len(),
            next_due
        );

        for removal in &removals {
            removal.fire();
        }
        ExpirationReport {
            removed: removals.len(),
            next_due,
        }
    }

    // == Stats ==
    /// Returns current table statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.lock().clone();
        stats.set_total_entries(self.count());
        stats
    }

    // == Table Callbacks ==
    /// Replaces every added-item callback with `f`.
    pub fn set_added_item_callback<F>(&self, f: F)
    where
        F: Fn(&Arc<CacheItem<K, V>>) + Send + Sync + 'static,
    {
        let mut callbacks = self.callbacks.write();
        callbacks.added_item.clear();
        callbacks.added_item.push(Arc::new(f));
    }

    /// Appends an added-item callback.
    pub fn add_added_item_callback<F>(&self, f: F)
    where
        F: Fn(&Arc<CacheItem<K, V>>) + Send + Sync + 'static,
    {
        self.callbacks.write().added_item.push(Arc::new(f));
    }

    pub fn remove_added_item_callbacks(&self) {
        self.callbacks.write().added_item.clear();
    }

    /// Replaces every about-to-delete callback with `f`.
    pub fn set_about_to_delete_item_callback<F>(&self, f: F)
    where
        F: Fn(&Arc<CacheItem<K, V>>) + Send + Sync + 'static,
    {
        let mut callbacks = self.callbacks.write();
        callbacks.about_to_delete_item.clear();
        callbacks.about_to_delete_item.push(Arc::new(f));
    }

    /// Appends an about-to-delete callback.
    pub fn add_about_to_delete_item_callback<F>(&self, f: F)
    where
        F: Fn(&Arc<CacheItem<K, V>>) + Send + Sync + 'static,
    {
        self.callbacks.write().about_to_delete_item.push(Arc::new(f));
    }

    pub fn remove_about_to_delete_item_callbacks(&self) {
        self.callbacks.write().about_to_delete_item.clear();
    }

    /// Configures the loader consulted by [`value`](Self::value) on a miss.
    ///
    /// The loader must return an item whose key equals the requested key.
    pub fn set_data_loader<F>(&self, f: F)
    where
        F: Fn(&K) -> Option<CacheItem<K, V>> + Send + Sync + 'static,
    {
        self.callbacks.write().data_loader = Some(Arc::new(f));
    }

    // == Internal Helpers ==
    /// Removes `key` from a locked map and snapshots the callbacks to fire.
    fn take(&self, items: &mut HashMap<K, Arc<CacheItem<K, V>>>, key: &K) -> Option<Removal<K, V>> {
        let item = items.remove(key)?;

        debug!(
            "Deleting item with key {:?} created {:?} ago and hit {} times from table {}",
            key,
            item.created_on().elapsed(),
            item.access_count(),
            self.name
        );

        Some(Removal {
            about_to_delete_item: self.callbacks.read().about_to_delete_item.clone(),
            about_to_expire: item.about_to_expire_callbacks(),
            item,
        })
    }

    fn notify_added(&self, item: &Arc<CacheItem<K, V>>) {
        let added = self.callbacks.read().added_item.clone();
        for callback in &added {
            callback(item);
        }
    }
}

impl<K, V> Debug for CacheTable<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheTable")
            .field("name", &self.name)
            .field("items", &self.items.read().len())
            .finish()
    }
}
