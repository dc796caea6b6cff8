use std::collections::btree_map;
use std::iter::{self, FromIterator};

use super::util;
use super::Treemap;
use crate::bitmap::BitmapIterator;
use crate::Bitmap;

struct To64Iter<'a> {
    key: u32,
    iterator: BitmapIterator<'a>,
}

impl Iterator for To64Iter<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        self.iterator.next().map(|low| util::join(self.key, low))
    }
}

fn to64iter<'a>(entry: (&'a u32, &'a Bitmap)) -> To64Iter<'a> {
    To64Iter {
        key: *entry.0,
        iterator: entry.1.iter(),
    }
}

type InnerIter<'a> = iter::FlatMap<
    btree_map::Iter<'a, u32, Bitmap>,
    To64Iter<'a>,
    fn((&'a u32, &'a Bitmap)) -> To64Iter<'a>,
>;

/// Iterator over the values of a treemap, in ascending order.
pub struct TreemapIterator<'a> {
    iter: InnerIter<'a>,
}

impl<'a> TreemapIterator<'a> {
    fn new(treemap: &'a Treemap) -> Self {
        let iter = treemap.map.iter().flat_map(to64iter as _);

        TreemapIterator { iter }
    }
}

impl Iterator for TreemapIterator<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        self.iter.next()
    }
}

impl Treemap {
    /// Returns an iterator over each value stored in the treemap.
    /// Returned values are ordered in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let treemap = Treemap::of(&[4, 3, 2, u64::MAX]);
    /// let mut iterator = treemap.iter();
    ///
    /// assert_eq!(iterator.next(), Some(2));
    /// assert_eq!(iterator.next(), Some(3));
    /// assert_eq!(iterator.next(), Some(4));
    /// assert_eq!(iterator.next(), Some(u64::MAX));
    /// assert_eq!(iterator.next(), None);
    /// ```
    pub fn iter(&self) -> TreemapIterator<'_> {
        TreemapIterator::new(self)
    }

    /// Returns a cursor positioned at the first value of the treemap.
    ///
    /// See [`TreemapCursor`].
    pub fn cursor(&self) -> TreemapCursor<'_> {
        TreemapCursor {
            treemap: self,
            pos: match self.minimum() {
                Some(min) => CursorPosition::At(min),
                None => CursorPosition::AfterEnd,
            },
        }
    }

    /// Returns a cursor positioned at the last value of the treemap.
    ///
    /// See [`TreemapCursor`].
    pub fn cursor_to_last(&self) -> TreemapCursor<'_> {
        TreemapCursor {
            treemap: self,
            pos: match self.maximum() {
                Some(max) => CursorPosition::At(max),
                None => CursorPosition::BeforeStart,
            },
        }
    }
}

#[derive(Clone, Copy)]
enum CursorPosition {
    BeforeStart,
    At(u64),
    AfterEnd,
}

/// A cursor over the values of a treemap that can move in both directions.
///
/// Decrement steps the underlying forward machinery backwards directly
/// (per-container predecessor scans and one outer-map walk) instead of
/// layering a reverse adaptor over the forward iterator, which would walk
/// the outer map nodes twice per step.
///
/// # Examples
///
/// ```
/// use oxroaring::Treemap;
///
/// let treemap = Treemap::of(&[1, u64::MAX]);
/// let mut cursor = treemap.cursor_to_last();
/// assert_eq!(cursor.current(), Some(u64::MAX));
/// assert_eq!(cursor.prev(), Some(1));
/// assert_eq!(cursor.prev(), None);
/// assert_eq!(cursor.next(), Some(1));
/// ```
pub struct TreemapCursor<'a> {
    treemap: &'a Treemap,
    pos: CursorPosition,
}

impl TreemapCursor<'_> {
    /// Returns true if the cursor is currently positioned on a value.
    pub fn has_value(&self) -> bool {
        matches!(self.pos, CursorPosition::At(_))
    }

    /// The value under the cursor, if any.
    pub fn current(&self) -> Option<u64> {
        match self.pos {
            CursorPosition::At(value) => Some(value),
            _ => None,
        }
    }

    /// Moves to the next value and returns it, or `None` if the cursor
    /// moved past the end.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<u64> {
        self.pos = match self.pos {
            CursorPosition::BeforeStart => match self.treemap.minimum() {
                Some(min) => CursorPosition::At(min),
                None => CursorPosition::AfterEnd,
            },
            CursorPosition::At(value) => match self.treemap.successor(value) {
                Some(next) => CursorPosition::At(next),
                None => CursorPosition::AfterEnd,
            },
            CursorPosition::AfterEnd => CursorPosition::AfterEnd,
        };
        self.current()
    }

    /// Moves to the previous value and returns it, or `None` if the cursor
    /// moved before the start.
    pub fn prev(&mut self) -> Option<u64> {
        self.pos = match self.pos {
            CursorPosition::AfterEnd => match self.treemap.maximum() {
                Some(max) => CursorPosition::At(max),
                None => CursorPosition::BeforeStart,
            },
            CursorPosition::At(value) => match self.treemap.predecessor(value) {
                Some(prev) => CursorPosition::At(prev),
                None => CursorPosition::BeforeStart,
            },
            CursorPosition::BeforeStart => CursorPosition::BeforeStart,
        };
        self.current()
    }
}

impl FromIterator<u64> for Treemap {
    /// Convenience method for creating a treemap from an iterator.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let treemap: Treemap = (1..3)
    ///     .chain(u64::from(u32::MAX) + 1..u64::from(u32::MAX) + 10)
    ///     .collect();
    ///
    /// assert!(treemap.contains(1));
    /// assert!(treemap.contains(u64::from(u32::MAX) + 5));
    /// assert_eq!(treemap.cardinality(), 11);
    /// ```
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        let mut result = Self::new();
        result.extend(iter);
        result
    }
}

impl Extend<u64> for Treemap {
    fn extend<T: IntoIterator<Item = u64>>(&mut self, iter: T) {
        for item in iter {
            self.add(item);
        }
    }
}

impl<'a> IntoIterator for &'a Treemap {
    type Item = u64;
    type IntoIter = TreemapIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
