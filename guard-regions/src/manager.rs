//! Snapshotting region manager
//!
//! Readers take an `Arc<RegionIndex>` snapshot and query it without holding
//! any lock. Writers are serialised, mutate a private copy of the index and
//! publish it with a pointer swap.

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use tracing::debug;

use crate::error::RegionResult;
use crate::index::{RegionIndex, RegionLookup};
use crate::region::Region;
use crate::shape::BlockVector;

/// The regions of one world, shared between many readers and one writer.
///
/// # Examples
///
/// ```
/// use guard_regions::{BlockVector, Region, RegionManager, Shape};
///
/// let manager = RegionManager::new();
/// let before = manager.snapshot();
///
/// manager
///     .update(|index| {
///         index.add(Region::new(
///             "spawn",
///             Shape::cuboid(BlockVector::new(0, 0, 0), BlockVector::new(9, 9, 9)),
///         )?);
///         Ok(())
///     })
///     .unwrap();
///
/// assert_eq!(before.count(), 0);
/// assert_eq!(manager.snapshot().count(), 1);
/// assert_eq!(manager.query(BlockVector::new(1, 1, 1)).ids(), ["spawn"]);
/// ```
#[derive(Debug)]
pub struct RegionManager {
    current: ArcSwap<RegionIndex>,
    writer: Mutex<()>,
}

impl Default for RegionManager {
    fn default() -> Self {
        Self::with_index(RegionIndex::new())
    }
}

impl RegionManager {
    /// Create a manager with an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager over an existing index, such as one just loaded from storage.
    pub fn with_index(index: RegionIndex) -> Self {
        Self {
            current: ArcSwap::from_pointee(index),
            writer: Mutex::new(()),
        }
    }

    /// The current index.
    ///
    /// Later updates do not affect a snapshot already taken.
    pub fn snapshot(&self) -> Arc<RegionIndex> {
        self.current.load_full()
    }

    /// Apply a change and publish the result.
    ///
    /// The closure works on a copy; if it fails, nothing is published and
    /// readers keep seeing the previous index.
    pub fn update<F, T>(&self, change: F) -> RegionResult<T>
    where
        F: FnOnce(&mut RegionIndex) -> RegionResult<T>,
    {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let mut next = RegionIndex::clone(&self.snapshot());
        let result = change(&mut next)?;

        let count = next.count();
        self.current.store(Arc::new(next));
        debug!(regions = count, "Published region index");
        Ok(result)
    }

    /// Replace the whole index.
    pub fn replace(&self, index: RegionIndex) -> Arc<RegionIndex> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.current.swap(Arc::new(index))
    }

    /// Regions applicable to a block, taken from the current snapshot.
    pub fn query(&self, point: BlockVector) -> QueryView {
        QueryView::at(self.snapshot(), point)
    }
}

/// The regions containing a block, together with the snapshot they came from.
///
/// Owns its data, so it can be moved across threads or kept while the manager
/// publishes new snapshots.
#[derive(Debug, Clone)]
pub struct QueryView {
    index: Arc<RegionIndex>,
    ids: Vec<String>,
}

impl QueryView {
    /// Collect the regions of a snapshot that contain a block.
    pub fn at(index: Arc<RegionIndex>, point: BlockVector) -> Self {
        let ids = index
            .regions_applicable_to(point)
            .iter()
            .map(|r| r.key())
            .collect();
        Self { index, ids }
    }

    /// The snapshot.
    pub fn index(&self) -> &RegionIndex {
        &self.index
    }

    /// Lowercase ids of the regions containing the block.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// The regions containing the block, not counting the global region.
    pub fn regions(&self) -> Vec<&Region> {
        self.ids.iter().filter_map(|id| self.index.get(id)).collect()
    }

    /// The global region of the snapshot.
    pub fn global(&self) -> Option<&Region> {
        self.index.global()
    }
}

impl RegionLookup for QueryView {
    fn get(&self, id: &str) -> Option<&Region> {
        self.index.get(id)
    }
}
