//! Node identities and the identity -> location table.

use std::fmt;

use rowan::TextRange;
use rustc_hash::FxHashMap;
use serde::Serialize;

/// A globally unique identity for a HIR node.
///
/// Ids are handed out by [`Mappings::next_hir_id`] in increasing order, so
/// sorting by id gives allocation order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct HirId(pub u32);

impl fmt::Display for HirId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity allocator and location table for one compilation unit.
///
/// Name resolution populates this while lowering to HIR; the type checker
/// uses it to allocate ids for nodes it synthesizes and to recover a source
/// location for an id when reporting diagnostics.
#[derive(Clone, Debug, Default)]
pub struct Mappings {
    next_id: u32,
    locations: FxHashMap<HirId, TextRange>,
}

impl Mappings {
    /// Create an empty table. The first id handed out is `HirId(0)`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh id and record its source location.
    pub fn next_hir_id(&mut self, span: TextRange) -> HirId {
        let id = HirId(self.next_id);
        self.next_id += 1;
        self.locations.insert(id, span);
        id
    }

    /// The source location recorded for `id`, if any.
    pub fn lookup_location(&self, id: HirId) -> Option<TextRange> {
        self.locations.get(&id).copied()
    }

    /// Number of ids allocated so far.
    pub fn len(&self) -> usize {
        self.next_id as usize
    }

    pub fn is_empty(&self) -> bool {
        self.next_id == 0
    }
}
