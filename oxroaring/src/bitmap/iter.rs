use std::iter::FromIterator;

use super::imp::join;
use super::Bitmap;
use crate::container::ContainerIter;

/// Iterator over the values of a bitmap, in ascending order.
#[derive(Clone)]
pub struct BitmapIterator<'a> {
    bitmap: &'a Bitmap,
    container_idx: usize,
    inner: Option<ContainerIter<'a>>,
}

impl<'a> BitmapIterator<'a> {
    fn new(bitmap: &'a Bitmap) -> Self {
        BitmapIterator {
            bitmap,
            container_idx: 0,
            inner: bitmap.containers.first().map(|c| c.iter()),
        }
    }

    /// Attempt to read many values from the iterator into `dst`
    ///
    /// Returns the number of items read from the iterator, may be
    /// `< dst.len()` iff the iterator is exhausted.
    ///
    /// This can be more efficient than repeated iteration.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let bitmap: Bitmap = (0..100).collect();
    /// let mut buf = [0; 64];
    /// let mut iter = bitmap.iter();
    /// assert_eq!(iter.next_many(&mut buf), 64);
    /// assert_eq!(buf[0], 0);
    /// assert_eq!(buf[63], 63);
    /// assert_eq!(iter.next_many(&mut buf), 36);
    /// assert_eq!(iter.next_many(&mut buf), 0);
    /// ```
    pub fn next_many(&mut self, dst: &mut [u32]) -> usize {
        let mut count = 0;
        while count < dst.len() {
            match self.next() {
                Some(value) => {
                    dst[count] = value;
                    count += 1;
                }
                None => break,
            }
        }
        count
    }
}

impl Iterator for BitmapIterator<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        loop {
            let inner = self.inner.as_mut()?;
            if let Some(low) = inner.next() {
                return Some(join(self.bitmap.keys[self.container_idx], low));
            }
            self.container_idx += 1;
            self.inner = self
                .bitmap
                .containers
                .get(self.container_idx)
                .map(|c| c.iter());
        }
    }
}

impl Bitmap {
    /// Returns an iterator over each value stored in the bitmap.
    /// Returned values are ordered in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let bitmap = Bitmap::of(&[4, 3, 2]);
    /// let mut iterator = bitmap.iter();
    ///
    /// assert_eq!(iterator.next(), Some(2));
    /// assert_eq!(iterator.next(), Some(3));
    /// assert_eq!(iterator.next(), Some(4));
    /// assert_eq!(iterator.next(), None);
    /// ```
    pub fn iter(&self) -> BitmapIterator<'_> {
        BitmapIterator::new(self)
    }

    /// Returns a cursor positioned at the first value of the bitmap.
    ///
    /// See [`BitmapCursor`].
    pub fn cursor(&self) -> BitmapCursor<'_> {
        BitmapCursor {
            bitmap: self,
            pos: match self.minimum() {
                Some(min) => CursorPosition::At(min),
                None => CursorPosition::AfterEnd,
            },
        }
    }

    /// Returns a cursor positioned at the last value of the bitmap.
    ///
    /// See [`BitmapCursor`].
    pub fn cursor_to_last(&self) -> BitmapCursor<'_> {
        BitmapCursor {
            bitmap: self,
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
    At(u32),
    AfterEnd,
}

/// A cursor over the values of a bitmap that can move in both directions.
///
/// Unlike an [`Iterator`], a cursor can step backwards: decrement is a
/// direct predecessor scan of the underlying containers rather than a
/// reverse adaptor over a forward iterator. A cursor past either edge of
/// the bitmap can return: stepping back from past-the-end yields the last
/// value again.
///
/// # Examples
///
/// ```
/// use oxroaring::Bitmap;
///
/// let bitmap = Bitmap::of(&[1, 5, 9]);
/// let mut cursor = bitmap.cursor();
/// assert_eq!(cursor.current(), Some(1));
/// assert_eq!(cursor.next(), Some(5));
/// assert_eq!(cursor.next(), Some(9));
/// assert_eq!(cursor.next(), None);
/// assert_eq!(cursor.prev(), Some(9));
/// assert_eq!(cursor.prev(), Some(5));
/// ```
#[derive(Clone)]
pub struct BitmapCursor<'a> {
    bitmap: &'a Bitmap,
    pos: CursorPosition,
}

impl BitmapCursor<'_> {
    /// Returns true if the cursor is currently positioned on a value.
    pub fn has_value(&self) -> bool {
        matches!(self.pos, CursorPosition::At(_))
    }

    /// The value under the cursor, if any.
    pub fn current(&self) -> Option<u32> {
        match self.pos {
            CursorPosition::At(value) => Some(value),
            _ => None,
        }
    }

    /// Moves to the next value and returns it, or `None` if the cursor
    /// moved past the end.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<u32> {
        self.pos = match self.pos {
            CursorPosition::BeforeStart => match self.bitmap.minimum() {
                Some(min) => CursorPosition::At(min),
                None => CursorPosition::AfterEnd,
            },
            CursorPosition::At(value) => match self.bitmap.successor(value) {
                Some(next) => CursorPosition::At(next),
                None => CursorPosition::AfterEnd,
            },
            CursorPosition::AfterEnd => CursorPosition::AfterEnd,
        };
        self.current()
    }

    /// Moves to the previous value and returns it, or `None` if the cursor
    /// moved before the start.
    pub fn prev(&mut self) -> Option<u32> {
        self.pos = match self.pos {
            CursorPosition::AfterEnd => match self.bitmap.maximum() {
                Some(max) => CursorPosition::At(max),
                None => CursorPosition::BeforeStart,
            },
            CursorPosition::At(value) => match self.bitmap.predecessor(value) {
                Some(prev) => CursorPosition::At(prev),
                None => CursorPosition::BeforeStart,
            },
            CursorPosition::BeforeStart => CursorPosition::BeforeStart,
        };
        self.current()
    }

    /// Repositions the cursor at the smallest value.
    pub fn reset_to_first(&mut self) -> Option<u32> {
        self.pos = match self.bitmap.minimum() {
            Some(min) => CursorPosition::At(min),
            None => CursorPosition::AfterEnd,
        };
        self.current()
    }

    /// Repositions the cursor at the largest value.
    pub fn reset_to_last(&mut self) -> Option<u32> {
        self.pos = match self.bitmap.maximum() {
            Some(max) => CursorPosition::At(max),
            None => CursorPosition::BeforeStart,
        };
        self.current()
    }
}

impl FromIterator<u32> for Bitmap {
    /// Convenience method for creating a bitmap from an iterator.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let bitmap: Bitmap = (1..3).collect();
    ///
    /// assert!(!bitmap.is_empty());
    /// assert!(bitmap.contains(1));
    /// assert!(bitmap.contains(2));
    /// assert_eq!(bitmap.cardinality(), 2);
    /// ```
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut bitmap = Bitmap::new();
        bitmap.extend(iter);
        bitmap
    }
}

impl Extend<u32> for Bitmap {
    fn extend<T: IntoIterator<Item = u32>>(&mut self, iter: T) {
        for value in iter {
            self.add(value);
        }
    }
}

impl<'a> IntoIterator for &'a Bitmap {
    type Item = u32;
    type IntoIter = BitmapIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
