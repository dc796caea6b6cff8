use std::collections::BTreeMap;
use std::fmt;

use super::util;
use super::{Treemap, ViewDeserializer};
use crate::bitmap::BitmapView;
use crate::serialization::DeserializeError;

/// A read-only treemap borrowing a serialized buffer.
///
/// The outer key directory is materialized; every inner container body
/// stays in the backing buffer, which must outlive the view.
///
/// # Examples
///
/// ```
/// use oxroaring::{Frozen, Treemap, TreemapView};
///
/// let treemap = Treemap::of(&[1, u64::MAX]);
/// let mut buf = Vec::new();
/// let data: &[u8] = treemap.serialize_into_vec::<Frozen>(&mut buf);
/// let view = TreemapView::deserialize::<Frozen>(data).unwrap();
/// assert!(view.contains(u64::MAX));
/// assert_eq!(view, treemap);
/// ```
pub struct TreemapView<'a> {
    pub(crate) map: BTreeMap<u32, BitmapView<'a>>,
}

impl<'a> TreemapView<'a> {
    pub(crate) fn empty() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    /// Builds a read-only view of a treemap serialized in the given
    /// format. Only the frozen format supports views; the buffer must be
    /// 32-byte aligned.
    pub fn deserialize<V: ViewDeserializer>(data: &'a [u8]) -> Result<Self, DeserializeError> {
        V::deserialize_view(data)
    }

    pub fn cardinality(&self) -> u64 {
        self.map.values().map(BitmapView::cardinality).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.map.values().all(BitmapView::is_empty)
    }

    pub fn contains(&self, value: u64) -> bool {
        let (hi, lo) = util::split(value);
        self.map.get(&hi).map_or(false, |view| view.contains(lo))
    }

    pub fn minimum(&self) -> Option<u64> {
        self.map
            .iter()
            .filter_map(|(&key, view)| view.minimum().map(|low| util::join(key, low)))
            .next()
    }

    pub fn maximum(&self) -> Option<u64> {
        self.map
            .iter()
            .rev()
            .filter_map(|(&key, view)| view.maximum().map(|low| util::join(key, low)))
            .next()
    }

    /// Deep-copies the view into an owned [`Treemap`].
    pub fn to_treemap(&self) -> Treemap {
        let mut treemap = Treemap::new();
        for (&key, view) in &self.map {
            let bitmap = view.to_bitmap();
            if !bitmap.is_empty() {
                treemap.map.insert(key, bitmap);
            }
        }
        treemap
    }
}

impl PartialEq<Treemap> for TreemapView<'_> {
    fn eq(&self, other: &Treemap) -> bool {
        let mut own = self.map.iter().filter(|(_, view)| !view.is_empty());
        let mut others = other.map.iter().filter(|(_, bitmap)| !bitmap.is_empty());
        loop {
            match (own.next(), others.next()) {
                (None, None) => return true,
                (Some((own_key, view)), Some((other_key, bitmap))) => {
                    if own_key != other_key || view != bitmap {
                        return false;
                    }
                }
                _ => return false,
            }
        }
    }
}

impl PartialEq<TreemapView<'_>> for Treemap {
    fn eq(&self, other: &TreemapView<'_>) -> bool {
        other == self
    }
}

impl fmt::Debug for TreemapView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TreemapView<{:?} values>", self.cardinality())
    }
}
