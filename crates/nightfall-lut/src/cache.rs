//! Shared cache of loaded lattices.
//!
//! Maps a LUT name to a lazily loaded, shared [`Lattice`]. Every name has
//! its own slot lock, so concurrent first callers for the same name block
//! on that slot and the loader runs once; other names proceed in parallel.
//! A failed load drops the slot and the next caller retries.
//!
//! The map lock is never held while waiting on a slot.
//!
//! # Example
//!
//! ```rust,ignore
//! use nightfall_lut::LutCache;
//!
//! let cache = LutCache::from_dir("assets/luts");
//! let sunset = cache.get("sunset")?;   // loads assets/luts/sunset.cube
//! let again = cache.get("sunset")?;    // same Arc, no reload
//! ```

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::{
    FixedLayout, LayoutParser, Lattice, LutError, LutFormat, LutResult, read_lookup_table_with,
};

/// Loader invoked on a cache miss.
pub type LoadFn = dyn Fn(&str) -> LutResult<Lattice> + Send + Sync;

type Slot = Mutex<Option<Arc<Lattice>>>;

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from a loaded slot.
    pub hits: u64,
    /// Lookups that had to call the loader.
    pub misses: u64,
    /// Successful loads.
    pub loads: u64,
    /// Failed loads.
    pub failures: u64,
}

impl CacheStats {
    /// Fraction of lookups served without loading.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    failures: AtomicU64,
}

/// Name -> lattice cache with single-flight loading.
pub struct LutCache {
    loader: Box<LoadFn>,
    slots: RwLock<HashMap<String, Arc<Slot>>>,
    counters: Counters,
}

impl fmt::Debug for LutCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LutCache")
            .field("loaded", &self.len())
            .field("stats", &self.stats())
            .finish()
    }
}

impl LutCache {
    /// Creates a cache with a custom loader.
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn(&str) -> LutResult<Lattice> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            slots: RwLock::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    /// Creates a cache that reads `<dir>/<name>` with the fixed layout.
    ///
    /// Names without an extension try `.cube`, then `.3dl`.
    pub fn from_dir<P: Into<PathBuf>>(dir: P) -> Self {
        Self::from_dir_with(dir, FixedLayout)
    }

    /// Like [`from_dir`](Self::from_dir) with an explicit layout parser.
    pub fn from_dir_with<P, L>(dir: P, parser: L) -> Self
    where
        P: Into<PathBuf>,
        L: LayoutParser + 'static,
    {
        let dir = dir.into();
        Self::new(move |name| {
            let path = resolve(&dir, name)?;
            read_lookup_table_with(path, &parser)
        })
    }

    fn slot(&self, name: &str) -> Arc<Slot> {
        if let Some(slot) = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(name.to_string()).or_default())
    }

    /// Returns the lattice for `name`, loading it on first use.
    pub fn get(&self, name: &str) -> LutResult<Arc<Lattice>> {
        loop {
            let slot = self.slot(name);
            let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);

            if let Some(lattice) = guard.as_ref() {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Arc::clone(lattice));
            }

            // Dropped by a failed load or `remove` while we waited.
            if !self.is_current(name, &slot) {
                continue;
            }

            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            return match (self.loader)(name) {
                Ok(lattice) => {
                    self.counters.loads.fetch_add(1, Ordering::Relaxed);
                    debug!(name, format = %lattice.format(), size = lattice.size(), "cached LUT");
                    let lattice = Arc::new(lattice);
                    *guard = Some(Arc::clone(&lattice));
                    Ok(lattice)
                }
                Err(e) => {
                    self.counters.failures.fetch_add(1, Ordering::Relaxed);
                    warn!(name, error = %e, "failed to load LUT");
                    let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
                    if slots.get(name).is_some_and(|s| Arc::ptr_eq(s, &slot)) {
                        slots.remove(name);
                    }
                    Err(e)
                }
            };
        }
    }

    fn is_current(&self, name: &str, slot: &Arc<Slot>) -> bool {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .is_some_and(|s| Arc::ptr_eq(s, slot))
    }

    /// Slots currently in the map, copied out so no map lock is held.
    fn snapshot(&self) -> Vec<Arc<Slot>> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Stores an already loaded lattice, replacing any previous one.
    pub fn insert(&self, name: &str, lattice: Lattice) -> Arc<Lattice> {
        let lattice = Arc::new(lattice);
        let slot = self.slot(name);
        *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&lattice));
        lattice
    }

    /// Drops the cached entry. Outstanding `Arc`s stay valid.
    pub fn remove(&self, name: &str) -> bool {
        let removed = self
            .slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
        removed.is_some_and(|slot| is_loaded(&slot))
    }

    /// True if `name` is loaded.
    ///
    /// Waits for an in-flight load of `name` to finish.
    pub fn contains(&self, name: &str) -> bool {
        let slot = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned();
        slot.is_some_and(|slot| is_loaded(&slot))
    }

    /// Number of loaded lattices.
    pub fn len(&self) -> usize {
        self.snapshot().iter().filter(|slot| is_loaded(slot)).count()
    }

    /// True if nothing is loaded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.slots.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            loads: self.counters.loads.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }
}

fn is_loaded(slot: &Slot) -> bool {
    slot.lock().unwrap_or_else(PoisonError::into_inner).is_some()
}

/// Finds the file backing `name` inside `dir`.
fn resolve(dir: &Path, name: &str) -> LutResult<PathBuf> {
    let direct = dir.join(name);
    if direct.extension().is_some() {
        LutFormat::from_path(&direct)?;
        return Ok(direct);
    }
    [LutFormat::Cube, LutFormat::ThreeDl]
        .iter()
        .map(|format| direct.with_extension(format.extension()))
        .find(|path| path.is_file())
        .ok_or_else(|| {
            LutError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no .cube or .3dl named {:?} in {}", name, dir.display()),
            ))
        })
}
