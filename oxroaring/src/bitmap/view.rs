use std::fmt;

use byteorder::{ByteOrder, LittleEndian};

use super::imp::join;
use super::{Bitmap, ViewDeserializer};
use crate::serialization::DeserializeError;

/// A read-only bitmap borrowing a serialized buffer.
///
/// Container bodies stay in the backing buffer; only the key directory is
/// materialized. The buffer must outlive the view, which the lifetime
/// enforces.
///
/// # Examples
///
/// ```
/// use oxroaring::{Bitmap, BitmapView, Frozen};
///
/// let orig_bitmap = Bitmap::of(&[1, 2, 3, 4]);
/// let mut buf = Vec::new();
/// let data: &[u8] = orig_bitmap.serialize_into_vec::<Frozen>(&mut buf);
/// let view = BitmapView::deserialize::<Frozen>(data).unwrap();
/// assert!(view.contains(3));
/// assert_eq!(view, orig_bitmap);
/// ```
pub struct BitmapView<'a> {
    entries: Vec<(u16, ContainerView<'a>)>,
}

/// A borrowed container body.
#[derive(Clone, Copy)]
pub(crate) enum ContainerView<'a> {
    /// Little-endian `u16` values, strictly increasing.
    Array(&'a [u8]),
    /// 1024 little-endian `u64` words plus the verified cardinality.
    Bitset { words: &'a [u8], cardinality: u32 },
    /// Little-endian `(value, length)` pairs, sorted and non-adjacent.
    Run(&'a [u8]),
}

impl<'a> ContainerView<'a> {
    pub(crate) fn parse_array(body: &'a [u8]) -> Result<Self, DeserializeError> {
        let mut prev: Option<u16> = None;
        for chunk in body.chunks_exact(2) {
            let value = LittleEndian::read_u16(chunk);
            if prev.map_or(false, |prev| prev >= value) {
                return Err(DeserializeError::CorruptContainer);
            }
            prev = Some(value);
        }
        Ok(ContainerView::Array(body))
    }

    pub(crate) fn parse_bitset(body: &'a [u8], cardinality: u32) -> Result<Self, DeserializeError> {
        let popcount: u32 = body
            .chunks_exact(8)
            .map(|chunk| LittleEndian::read_u64(chunk).count_ones())
            .sum();
        if popcount != cardinality {
            return Err(DeserializeError::CorruptContainer);
        }
        Ok(ContainerView::Bitset {
            words: body,
            cardinality,
        })
    }

    pub(crate) fn parse_runs(body: &'a [u8]) -> Result<Self, DeserializeError> {
        let mut prev_end: Option<u16> = None;
        for chunk in body.chunks_exact(4) {
            let value = LittleEndian::read_u16(&chunk[..2]);
            let length = LittleEndian::read_u16(&chunk[2..]);
            if u32::from(value) + u32::from(length) > u32::from(u16::MAX) {
                return Err(DeserializeError::CorruptContainer);
            }
            if prev_end.map_or(false, |end| u32::from(end) + 1 >= u32::from(value)) {
                return Err(DeserializeError::CorruptContainer);
            }
            prev_end = Some(value + length);
        }
        Ok(ContainerView::Run(body))
    }

    fn cardinality_usize(&self) -> usize {
        match self {
            ContainerView::Array(body) => body.len() / 2,
            ContainerView::Bitset { cardinality, .. } => *cardinality as usize,
            ContainerView::Run(body) => body
                .chunks_exact(4)
                .map(|chunk| usize::from(LittleEndian::read_u16(&chunk[2..])) + 1)
                .sum(),
        }
    }

    pub(crate) fn cardinality(&self) -> u64 {
        self.cardinality_usize() as u64
    }

    fn contains(&self, value: u16) -> bool {
        match self {
            ContainerView::Array(body) => {
                let mut lo = 0usize;
                let mut hi = body.len() / 2;
                while lo < hi {
                    let mid = (lo + hi) / 2;
                    match LittleEndian::read_u16(&body[2 * mid..]).cmp(&value) {
                        std::cmp::Ordering::Less => lo = mid + 1,
                        std::cmp::Ordering::Greater => hi = mid,
                        std::cmp::Ordering::Equal => return true,
                    }
                }
                false
            }
            ContainerView::Bitset { words, .. } => {
                let word = LittleEndian::read_u64(&words[8 * usize::from(value >> 6)..]);
                word >> (value & 63) & 1 != 0
            }
            ContainerView::Run(body) => {
                let runs = body.len() / 4;
                let mut lo = 0usize;
                let mut hi = runs;
                // Find the last run starting at or before `value`.
                while lo < hi {
                    let mid = (lo + hi) / 2;
                    if LittleEndian::read_u16(&body[4 * mid..]) <= value {
                        lo = mid + 1;
                    } else {
                        hi = mid;
                    }
                }
                if lo == 0 {
                    return false;
                }
                let start = LittleEndian::read_u16(&body[4 * (lo - 1)..]);
                let length = LittleEndian::read_u16(&body[4 * (lo - 1) + 2..]);
                value - start <= length
            }
        }
    }

    fn minimum(&self) -> Option<u16> {
        match self {
            ContainerView::Array(body) => body
                .chunks_exact(2)
                .next()
                .map(LittleEndian::read_u16),
            ContainerView::Bitset { words, .. } => words
                .chunks_exact(8)
                .map(LittleEndian::read_u64)
                .enumerate()
                .find(|(_, w)| *w != 0)
                .map(|(i, w)| (i as u16) << 6 | w.trailing_zeros() as u16),
            ContainerView::Run(body) => body
                .chunks_exact(4)
                .next()
                .map(|chunk| LittleEndian::read_u16(&chunk[..2])),
        }
    }

    fn maximum(&self) -> Option<u16> {
        match self {
            ContainerView::Array(body) => body
                .chunks_exact(2)
                .last()
                .map(LittleEndian::read_u16),
            ContainerView::Bitset { words, .. } => words
                .chunks_exact(8)
                .map(LittleEndian::read_u64)
                .enumerate()
                .rev()
                .find(|(_, w)| *w != 0)
                .map(|(i, w)| (i as u16) << 6 | (63 - w.leading_zeros()) as u16),
            ContainerView::Run(body) => body.chunks_exact(4).last().map(|chunk| {
                LittleEndian::read_u16(&chunk[..2]) + LittleEndian::read_u16(&chunk[2..])
            }),
        }
    }

    fn iter(&self) -> ContainerViewIter<'a> {
        match *self {
            ContainerView::Array(body) => ContainerViewIter::Array { body, pos: 0 },
            ContainerView::Bitset { words, .. } => ContainerViewIter::Bitset {
                words,
                word_idx: 0,
                current: LittleEndian::read_u64(&words[..8]),
            },
            ContainerView::Run(body) => ContainerViewIter::Run {
                body,
                run_idx: 0,
                offset: 0,
            },
        }
    }
}

enum ContainerViewIter<'a> {
    Array {
        body: &'a [u8],
        pos: usize,
    },
    Bitset {
        words: &'a [u8],
        word_idx: usize,
        current: u64,
    },
    Run {
        body: &'a [u8],
        run_idx: usize,
        offset: u32,
    },
}

impl Iterator for ContainerViewIter<'_> {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        match self {
            ContainerViewIter::Array { body, pos } => {
                if *pos >= body.len() {
                    return None;
                }
                let value = LittleEndian::read_u16(&body[*pos..]);
                *pos += 2;
                Some(value)
            }
            ContainerViewIter::Bitset {
                words,
                word_idx,
                current,
            } => {
                while *current == 0 {
                    *word_idx += 1;
                    if *word_idx * 8 >= words.len() {
                        return None;
                    }
                    *current = LittleEndian::read_u64(&words[*word_idx * 8..]);
                }
                let bit = current.trailing_zeros() as u16;
                *current &= *current - 1;
                Some((*word_idx as u16) << 6 | bit)
            }
            ContainerViewIter::Run {
                body,
                run_idx,
                offset,
            } => {
                if *run_idx * 4 >= body.len() {
                    return None;
                }
                let start = LittleEndian::read_u16(&body[*run_idx * 4..]);
                let length = LittleEndian::read_u16(&body[*run_idx * 4 + 2..]);
                let value = start + *offset as u16;
                if *offset == u32::from(length) {
                    *run_idx += 1;
                    *offset = 0;
                } else {
                    *offset += 1;
                }
                Some(value)
            }
        }
    }
}

/// Iterator over the values of a [`BitmapView`], in ascending order.
pub struct BitmapViewIterator<'a> {
    view: &'a BitmapView<'a>,
    entry_idx: usize,
    inner: Option<ContainerViewIter<'a>>,
}

impl Iterator for BitmapViewIterator<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        loop {
            let inner = self.inner.as_mut()?;
            if let Some(low) = inner.next() {
                return Some(join(self.view.entries[self.entry_idx].0, low));
            }
            self.entry_idx += 1;
            self.inner = self
                .view
                .entries
                .get(self.entry_idx)
                .map(|(_, view)| view.iter());
        }
    }
}

impl<'a> BitmapView<'a> {
    pub(crate) fn from_entries(entries: Vec<(u16, ContainerView<'a>)>) -> Self {
        Self { entries }
    }

    /// Builds a read-only view of a bitmap serialized in the given format.
    ///
    /// Available for [`Frozen`][crate::Frozen] (which additionally requires
    /// a 32-byte-aligned buffer) and [`Portable`][crate::Portable].
    pub fn deserialize<V: ViewDeserializer>(data: &'a [u8]) -> Result<Self, DeserializeError> {
        V::deserialize_view(data)
    }

    pub fn cardinality(&self) -> u64 {
        self.entries.iter().map(|(_, view)| view.cardinality()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, value: u32) -> bool {
        let key = (value >> 16) as u16;
        match self.entries.binary_search_by_key(&key, |&(k, _)| k) {
            Ok(idx) => self.entries[idx].1.contains(value as u16),
            Err(_) => false,
        }
    }

    pub fn minimum(&self) -> Option<u32> {
        let (key, view) = self.entries.first()?;
        Some(join(*key, view.minimum()?))
    }

    pub fn maximum(&self) -> Option<u32> {
        let (key, view) = self.entries.last()?;
        Some(join(*key, view.maximum()?))
    }

    /// Returns an iterator over the values in the view, in ascending
    /// order.
    pub fn iter(&self) -> BitmapViewIterator<'_> {
        BitmapViewIterator {
            view: self,
            entry_idx: 0,
            inner: self.entries.first().map(|(_, view)| view.iter()),
        }
    }

    /// Deep-copies the view into an owned [`Bitmap`].
    pub fn to_bitmap(&self) -> Bitmap {
        let mut bitmap = Bitmap::new();
        for (key, view) in &self.entries {
            let mut values = Vec::with_capacity(view.cardinality_usize());
            values.extend(view.iter().map(|low| join(*key, low)));
            bitmap.add_many(&values);
        }
        bitmap
    }
}

impl PartialEq<Bitmap> for BitmapView<'_> {
    fn eq(&self, other: &Bitmap) -> bool {
        self.cardinality() == other.cardinality() && self.iter().eq(other.iter())
    }
}

impl PartialEq<BitmapView<'_>> for Bitmap {
    fn eq(&self, other: &BitmapView<'_>) -> bool {
        other == self
    }
}

impl PartialEq for BitmapView<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cardinality() == other.cardinality() && self.iter().eq(other.iter())
    }
}

impl fmt::Debug for BitmapView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BitmapView<{:?} values>", self.cardinality())
    }
}
