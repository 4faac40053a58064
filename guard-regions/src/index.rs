//! In-memory region index
//!
//! The index owns every region of one world, keyed by lowercase id. Parents are
//! stored as ids, so the region graph is an arena rather than a web of
//! references. Regions are held as `Arc<Region>` so that cloning the whole
//! index is cheap and mutation is copy-on-write.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::Subject;
use crate::error::{RegionError, RegionResult};
use crate::region::{Region, GLOBAL_REGION};
use crate::shape::{BlockVector, Shape};

/// Look up regions by id.
///
/// Flag resolution only needs this to walk parent chains.
pub trait RegionLookup: Send + Sync {
    /// Get a region by id, ignoring case.
    fn get(&self, id: &str) -> Option<&Region>;

    /// Get the parent of a region, if it has one and it exists.
    fn parent_of(&self, region: &Region) -> Option<&Region> {
        region.parent().and_then(|p| self.get(p))
    }
}

/// What happens to the children of a removed region.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum RemovalStrategy {
    /// Refuse the removal if the region has children.
    #[default]
    KeepChildren,

    /// Remove every descendant as well.
    RemoveChildren,

    /// Detach the direct children and keep them.
    UnsetParentInChildren,
}

/// Filter for [`RegionIndex::list`].
#[derive(Default, Clone, Copy)]
pub struct RegionFilter<'a> {
    /// Only regions this subject owns (or is a member of, with `include_members`).
    pub owner: Option<&'a dyn Subject>,

    /// Also match regions where the subject is only a member.
    pub include_members: bool,

    /// Only regions whose id contains this text, ignoring case.
    pub id_contains: Option<&'a str>,
}

impl<'a> RegionFilter<'a> {
    /// Match everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to regions owned by a subject.
    pub fn owned_by(mut self, subject: &'a dyn Subject) -> Self {
        self.owner = Some(subject);
        self
    }

    /// Count membership as well as ownership.
    pub fn with_members(mut self) -> Self {
        self.include_members = true;
        self
    }

    /// Restrict to ids containing some text.
    pub fn id_contains(mut self, text: &'a str) -> Self {
        self.id_contains = Some(text);
        self
    }

    fn matches(&self, region: &Region) -> bool {
        if let Some(subject) = self.owner {
            let related = region.owners().contains(subject)
                || (self.include_members && region.members().contains(subject));
            if !related {
                return false;
            }
        }
        match self.id_contains {
            Some(text) => region.key().contains(&text.to_lowercase()),
            None => true,
        }
    }
}

/// All regions of one world.
///
/// # Examples
///
/// ```
/// use guard_regions::{BlockVector, Region, RegionIndex, Shape};
///
/// let mut index = RegionIndex::new();
/// index.add(Region::new(
///     "Town",
///     Shape::cuboid(BlockVector::new(0, 0, 0), BlockVector::new(99, 255, 99)),
/// ).unwrap());
/// index.add(Region::new(
///     "shop",
///     Shape::cuboid(BlockVector::new(10, 0, 10), BlockVector::new(19, 20, 19)),
/// ).unwrap());
/// index.set_parent("shop", Some("town")).unwrap();
///
/// let here = index.regions_applicable_to(BlockVector::new(15, 5, 15));
/// assert_eq!(here.len(), 2);
/// assert!(index.set_parent("town", Some("SHOP")).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RegionIndex {
    regions: BTreeMap<String, Arc<Region>>,
}

impl RegionIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a region, replacing any region with the same id.
    ///
    /// Returns the replaced region.
    pub fn add(&mut self, region: Region) -> Option<Arc<Region>> {
        let key = region.key();
        debug!(region = %key, priority = region.priority(), "Adding region");
        self.regions.insert(key, Arc::new(region))
    }

    /// Get a region by id, ignoring case.
    pub fn get(&self, id: &str) -> Option<&Region> {
        self.regions.get(&id.to_lowercase()).map(Arc::as_ref)
    }

    /// Get a shared handle to a region.
    pub fn get_shared(&self, id: &str) -> Option<Arc<Region>> {
        self.regions.get(&id.to_lowercase()).cloned()
    }

    /// Get a region for editing.
    ///
    /// The region is cloned first if an older snapshot still shares it.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Region> {
        self.regions.get_mut(&id.to_lowercase()).map(Arc::make_mut)
    }

    /// Check if a region exists.
    pub fn contains(&self, id: &str) -> bool {
        self.regions.contains_key(&id.to_lowercase())
    }

    /// The global region, if one was added.
    pub fn global(&self) -> Option<&Region> {
        self.get(GLOBAL_REGION)
    }

    /// The global region, adding an empty one first if needed.
    pub fn global_mut(&mut self) -> &mut Region {
        let entry = self
            .regions
            .entry(GLOBAL_REGION.to_string())
            .or_insert_with(|| Arc::new(Region::global()));
        Arc::make_mut(entry)
    }

    /// Remove a region.
    ///
    /// # Arguments
    ///
    /// * `id` - The region to remove
    /// * `strategy` - What to do with its children
    ///
    /// # Returns
    ///
    /// Every removed region, the requested one first.
    ///
    /// # Errors
    ///
    /// - `RegionError::NotFound` if the region does not exist
    /// - `RegionError::HasChildren` with `KeepChildren` when children exist
    pub fn remove(&mut self, id: &str, strategy: RemovalStrategy) -> RegionResult<Vec<Region>> {
        let key = id.to_lowercase();
        if !self.regions.contains_key(&key) {
            return Err(RegionError::NotFound(id.to_string()));
        }

        let children = self.child_keys(&key);
        let doomed = match strategy {
            RemovalStrategy::KeepChildren if !children.is_empty() => {
                return Err(RegionError::HasChildren {
                    id: id.to_string(),
                    children,
                });
            }
            RemovalStrategy::RemoveChildren => self.descendant_keys(&key),
            RemovalStrategy::UnsetParentInChildren => {
                for child in &children {
                    if let Some(region) = self.regions.get_mut(child) {
                        Arc::make_mut(region).set_parent_unchecked(None);
                    }
                }
                vec![key.clone()]
            }
            RemovalStrategy::KeepChildren => vec![key.clone()],
        };

        let removed: Vec<Region> = doomed
            .iter()
            .filter_map(|k| self.regions.remove(k))
            .map(|r| Arc::try_unwrap(r).unwrap_or_else(|shared| (*shared).clone()))
            .collect();

        info!(region = %key, removed = removed.len(), strategy = ?strategy, "Removed region");
        Ok(removed)
    }

    /// Rename a region, keeping its data and re-pointing its children.
    ///
    /// Changing only the case of the id is allowed.
    ///
    /// # Errors
    ///
    /// - `RegionError::NotFound` if the region does not exist
    /// - `RegionError::InvalidId` if the new id is not valid
    /// - `RegionError::AlreadyExists` if another region has the new id
    /// - `RegionError::GlobalRegion` when renaming the global region
    pub fn rename(&mut self, id: &str, new_id: &str) -> RegionResult<()> {
        let key = id.to_lowercase();
        let new_key = new_id.to_lowercase();

        let current = self
            .regions
            .get(&key)
            .cloned()
            .ok_or_else(|| RegionError::NotFound(id.to_string()))?;
        if current.is_global() || new_key == GLOBAL_REGION {
            return Err(RegionError::GlobalRegion("renamed"));
        }
        if new_key != key && self.regions.contains_key(&new_key) {
            return Err(RegionError::AlreadyExists(new_id.to_string()));
        }

        let renamed = current.with_identity(new_id.to_string(), current.shape().clone())?;

        for child in self.child_keys(&key) {
            if let Some(region) = self.regions.get_mut(&child) {
                Arc::make_mut(region).set_parent_unchecked(Some(new_key.clone()));
            }
        }
        self.regions.remove(&key);
        self.regions.insert(new_key.clone(), Arc::new(renamed));

        info!(from = %key, to = %new_key, "Renamed region");
        Ok(())
    }

    /// Set or clear the parent of a region.
    ///
    /// Only the child's parent field changes.
    ///
    /// # Errors
    ///
    /// - `RegionError::NotFound` if either region does not exist
    /// - `RegionError::CircularInheritance` if the parent is the region itself
    ///   or one of its descendants
    /// - `RegionError::GlobalRegion` when giving the global region a parent
    pub fn set_parent(&mut self, id: &str, parent: Option<&str>) -> RegionResult<()> {
        let key = id.to_lowercase();
        let child = self
            .get(&key)
            .ok_or_else(|| RegionError::NotFound(id.to_string()))?;

        let parent_key = match parent {
            Some(parent) => {
                if child.is_global() {
                    return Err(RegionError::GlobalRegion("given a parent"));
                }
                let parent_key = parent.to_lowercase();
                let candidate = self
                    .get(&parent_key)
                    .ok_or_else(|| RegionError::NotFound(parent.to_string()))?;
                if self.has_ancestor(candidate, &key) {
                    return Err(RegionError::CircularInheritance {
                        child: id.to_string(),
                        parent: parent.to_string(),
                    });
                }
                Some(parent_key)
            }
            None => None,
        };

        if let Some(region) = self.get_mut(&key) {
            region.set_parent_unchecked(parent_key.clone());
        }
        debug!(region = %key, parent = ?parent_key, "Set parent");
        Ok(())
    }

    /// The chain of parents above a region, nearest first.
    ///
    /// Stops at a missing parent or a repeated region.
    pub fn ancestors(&self, id: &str) -> Vec<&Region> {
        let mut chain = Vec::new();
        let mut seen = BTreeSet::new();
        let mut current = self.get(id);
        if let Some(region) = current {
            seen.insert(region.key());
        }
        while let Some(parent) = current.and_then(|r| self.parent_of(r)) {
            if !seen.insert(parent.key()) {
                break;
            }
            chain.push(parent);
            current = Some(parent);
        }
        chain
    }

    /// Direct children of a region.
    pub fn children_of(&self, id: &str) -> Vec<&Region> {
        let key = id.to_lowercase();
        self.regions
            .values()
            .filter(|r| r.parent() == Some(key.as_str()))
            .map(Arc::as_ref)
            .collect()
    }

    /// Number of regions, including the global region.
    pub fn count(&self) -> usize {
        self.regions.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Every region, by lowercase id.
    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.values().map(Arc::as_ref)
    }

    /// Non-global regions that contain a block.
    ///
    /// Parents are not added unless they contain the block themselves.
    pub fn regions_applicable_to(&self, point: BlockVector) -> Vec<&Region> {
        self.iter()
            .filter(|r| !r.is_global() && r.contains(point))
            .collect()
    }

    /// Non-global regions that overlap a shape.
    pub fn regions_overlapping(&self, shape: &Shape) -> Vec<&Region> {
        self.iter()
            .filter(|r| !r.is_global() && r.intersects(shape))
            .collect()
    }

    /// Number of regions the subject owns.
    pub fn count_owned_by<S: Subject + ?Sized>(&self, subject: &S) -> usize {
        self.iter().filter(|r| r.is_owner(subject)).count()
    }

    /// Regions matching a filter, by lowercase id.
    pub fn list(&self, filter: &RegionFilter<'_>) -> Vec<&Region> {
        self.iter().filter(|r| filter.matches(r)).collect()
    }

    /// Ids of regions changed since the last [`RegionIndex::mark_clean`].
    pub fn dirty_ids(&self) -> Vec<String> {
        self.regions
            .iter()
            .filter(|(_, r)| r.is_dirty())
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Mark every region as saved.
    pub fn mark_clean(&mut self) {
        for region in self.regions.values_mut() {
            if region.is_dirty() {
                Arc::make_mut(region).mark_clean();
            }
        }
    }

    fn has_ancestor(&self, region: &Region, key: &str) -> bool {
        if region.key() == key {
            return true;
        }
        self.ancestors(region.id()).iter().any(|r| r.key() == key)
    }

    fn child_keys(&self, key: &str) -> Vec<String> {
        self.regions
            .iter()
            .filter(|(_, r)| r.parent() == Some(key))
            .map(|(k, _)| k.clone())
            .collect()
    }

    fn descendant_keys(&self, key: &str) -> Vec<String> {
        let mut found = vec![key.to_string()];
        let mut seen: BTreeSet<String> = found.iter().cloned().collect();
        let mut queue: VecDeque<String> = VecDeque::from([key.to_string()]);

        while let Some(next) = queue.pop_front() {
            for child in self.child_keys(&next) {
                if seen.insert(child.clone()) {
                    found.push(child.clone());
                    queue.push_back(child);
                }
            }
        }
        found
    }
}

impl RegionLookup for RegionIndex {
    fn get(&self, id: &str) -> Option<&Region> {
        RegionIndex::get(self, id)
    }
}

impl FromIterator<Region> for RegionIndex {
    fn from_iter<I: IntoIterator<Item = Region>>(iter: I) -> Self {
        let mut index = RegionIndex::new();
        for region in iter {
            index.add(region);
        }
        index
    }
}
