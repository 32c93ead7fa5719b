// ── Map marker reconciliation ──
//
// Markers are keyed by device id and diffed by id-set difference: new ids
// are added, surviving ids are updated in place (their tier may have
// moved even if the position did not), vanished ids are removed. A marker
// is never recreated just because some other field changed.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::classify::FillTier;
use crate::model::{Device, EntityId};

/// Minimal edit set between two device lists.
///
/// `to_add` and `to_update` follow the order of the new device list;
/// `to_remove` follows the order of the previous id set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerDiff {
    pub to_add: Vec<Arc<Device>>,
    pub to_update: Vec<Arc<Device>>,
    pub to_remove: Vec<EntityId>,
}

impl MarkerDiff {
    /// No additions or removals. Updates alone do not change the marker set.
    pub fn is_membership_unchanged(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.is_membership_unchanged() && self.to_update.is_empty()
    }
}

/// Diff `previous` marker ids against `devices`.
///
/// Duplicate ids on either side are collapsed to their first occurrence.
pub fn reconcile<'a, I>(previous: I, devices: &[Arc<Device>]) -> MarkerDiff
where
    I: IntoIterator<Item = &'a EntityId>,
{
    let mut previous_set: HashSet<&EntityId> = HashSet::new();
    let previous: Vec<&EntityId> = previous
        .into_iter()
        .filter(|id| previous_set.insert(*id))
        .collect();

    let mut seen: HashSet<&EntityId> = HashSet::with_capacity(devices.len());
    let mut diff = MarkerDiff::default();

    for device in devices {
        if !seen.insert(&device.id) {
            continue;
        }
        if previous_set.contains(&device.id) {
            diff.to_update.push(Arc::clone(device));
        } else {
            diff.to_add.push(Arc::clone(device));
        }
    }

    diff.to_remove = previous
        .into_iter()
        .filter(|id| !seen.contains(id))
        .cloned()
        .collect();

    diff
}

// ── Stateful reconciler ──────────────────────────────────────────────

/// A drawing surface that owns visual marker handles.
pub trait MarkerSurface {
    type Handle;

    fn add_marker(&mut self, device: &Device, tier: FillTier) -> Self::Handle;

    fn update_marker(&mut self, handle: &mut Self::Handle, device: &Device, tier: FillTier);

    fn remove_marker(&mut self, handle: Self::Handle);
}

/// What the reconciler remembers about one live marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerRecord<H> {
    pub handle: H,
    pub last_tier: FillTier,
}

/// Sole owner of the marker handles on a [`MarkerSurface`].
///
/// Holds no selection state; callers map a marker back to its device via
/// [`record`](Self::record) and the id.
pub struct MarkerReconciler<S: MarkerSurface> {
    surface: S,
    markers: IndexMap<EntityId, MarkerRecord<S::Handle>>,
}

impl<S: MarkerSurface> MarkerReconciler<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            markers: IndexMap::new(),
        }
    }

    /// Bring the surface in line with `devices` and return the edits made.
    pub fn sync(&mut self, devices: &[Arc<Device>]) -> MarkerDiff {
        let diff = reconcile(self.markers.keys(), devices);
        self.apply(&diff);
        diff
    }

    /// Apply a diff computed elsewhere (e.g. one broadcast by the monitor).
    ///
    /// Updates for unknown ids are treated as additions and removals of
    /// unknown ids are ignored, so a reconciler that joins late converges.
    pub fn apply(&mut self, diff: &MarkerDiff) {
        for id in &diff.to_remove {
            if let Some(record) = self.markers.shift_remove(id) {
                self.surface.remove_marker(record.handle);
            }
        }
        for device in &diff.to_update {
            let tier = device.fill_tier();
            match self.markers.get_mut(&device.id) {
                Some(record) => {
                    self.surface.update_marker(&mut record.handle, device, tier);
                    record.last_tier = tier;
                }
                None => self.insert(device, tier),
            }
        }
        for device in &diff.to_add {
            let tier = device.fill_tier();
            match self.markers.get_mut(&device.id) {
                Some(record) => {
                    self.surface.update_marker(&mut record.handle, device, tier);
                    record.last_tier = tier;
                }
                None => self.insert(device, tier),
            }
        }
    }

    fn insert(&mut self, device: &Device, tier: FillTier) {
        let handle = self.surface.add_marker(device, tier);
        self.markers.insert(
            device.id.clone(),
            MarkerRecord {
                handle,
                last_tier: tier,
            },
        );
    }

    /// Remove every marker from the surface.
    pub fn clear(&mut self) {
        for (_, record) in self.markers.drain(..) {
            self.surface.remove_marker(record.handle);
        }
    }

    pub fn record(&self, id: &EntityId) -> Option<&MarkerRecord<S::Handle>> {
        self.markers.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.markers.keys()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}
