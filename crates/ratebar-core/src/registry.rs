// ── Live link registry ──
//
// Tracks the set of network attachments currently reported live by the
// platform notifier. Owned by the monitor task; every mutation arrives
// through the serialized event queue, so no interior locking is needed.
//
// The changed latch is the discontinuity guard: any structural change
// to the link set makes the next raw counter delta meaningless (the
// baseline jumped), and the sampler reads-and-clears the latch exactly
// once per tick to force a single zero-rate interval.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::model::{Link, LinkId};

/// The set of live links, keyed by attachment handle.
#[derive(Debug)]
pub struct LinkRegistry {
    links: HashMap<LinkId, Link>,
    changed: bool,
}

impl LinkRegistry {
    /// A fresh registry starts with the latch set: the first delta a
    /// sampler computes against zeroed baselines is as discontinuous as
    /// any topology change.
    pub fn new() -> Self {
        Self {
            links: HashMap::new(),
            changed: true,
        }
    }

    /// Insert or replace the entry for `id`.
    pub fn add_or_update(&mut self, id: LinkId, interface: Option<String>) {
        debug!(%id, interface = interface.as_deref(), "link updated");
        self.links.insert(id, Link { id, interface });
        self.changed = true;
    }

    /// Delete the entry for `id` if present.
    ///
    /// The latch is set even when the handle is unknown: link events may
    /// race, and a removal for a handle whose add was dropped still
    /// means the contributing set is not what the last baseline saw.
    pub fn remove(&mut self, id: LinkId) {
        let known = self.links.remove(&id).is_some();
        debug!(%id, known, "link lost");
        self.changed = true;
    }

    /// Distinct non-null interface names currently registered.
    ///
    /// Multiple links may share an interface name; each name is read
    /// from the counter source once, so duplicates collapse here.
    pub fn interface_names(&self) -> BTreeSet<&str> {
        self.links
            .values()
            .filter_map(|link| link.interface.as_deref())
            .collect()
    }

    /// Return and clear the changed latch.
    ///
    /// Exactly one consumer (the sampling path) may call this per tick.
    pub fn consume_changed(&mut self) -> bool {
        std::mem::replace(&mut self.changed, false)
    }

    pub fn get(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl Default for LinkRegistry {
    fn default() -> Self {
        Self::new()
    }
}
