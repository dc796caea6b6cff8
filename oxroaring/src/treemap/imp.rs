use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::mem;
use std::ops::{Bound, RangeBounds};

use super::util;
use super::{CardinalityOverflowError, Treemap};
use crate::Bitmap;

impl Treemap {
    /// Creates an empty `Treemap`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use oxroaring::Treemap;
    /// let treemap = Treemap::new();
    /// assert!(treemap.is_empty());
    /// ```
    pub fn new() -> Self {
        Treemap {
            map: BTreeMap::new(),
            copy_on_write: false,
        }
    }

    /// Creates a `Treemap` with the contents of a `Bitmap`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use oxroaring::{Bitmap, Treemap};
    ///
    /// let bitmap = Bitmap::of(&[1, 2, 3]);
    /// let treemap = Treemap::from_bitmap(bitmap);
    /// assert_eq!(treemap.cardinality(), 3);
    /// ```
    pub fn from_bitmap(bitmap: Bitmap) -> Self {
        let mut treemap = Treemap::new();
        if !bitmap.is_empty() {
            treemap.map.insert(0, bitmap);
        }
        treemap
    }

    /// Creates a new treemap from a slice of u64 integers
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let treemap = Treemap::of(&[1, 2, u64::MAX]);
    ///
    /// assert!(treemap.contains(1));
    /// assert!(treemap.contains(u64::MAX));
    /// assert!(!treemap.contains(3));
    /// ```
    pub fn of(elements: &[u64]) -> Self {
        let mut treemap = Treemap::new();
        treemap.add_many(elements);
        treemap
    }

    /// Add the integer element to the bitmap
    ///
    /// # Examples
    ///
    /// ```rust
    /// use oxroaring::Treemap;
    ///
    /// let mut treemap = Treemap::new();
    /// treemap.add(3);
    /// assert!(treemap.contains(3));
    /// treemap.add(u64::from(u32::MAX) + 1);
    /// assert!(treemap.contains(u64::from(u32::MAX) + 1));
    /// ```
    pub fn add(&mut self, value: u64) {
        let (hi, lo) = util::split(value);
        self.get_or_create(hi).add(lo);
    }

    /// Add the integer element to the bitmap. Returns true if the value was
    /// added, false if the value was already in the bitmap.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let mut bitmap = Treemap::new();
    /// assert!(bitmap.add_checked(1));
    /// assert!(!bitmap.add_checked(1));
    /// ```
    pub fn add_checked(&mut self, value: u64) -> bool {
        let (hi, lo) = util::split(value);
        self.get_or_create(hi).add_checked(lo)
    }

    /// Add all the integer elements to the treemap
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let mut treemap = Treemap::new();
    /// treemap.add_many(&[1, 2, u64::MAX]);
    /// assert_eq!(treemap.cardinality(), 3);
    /// ```
    pub fn add_many(&mut self, elements: &[u64]) {
        for &element in elements {
            self.add(element);
        }
    }

    /// Remove element from the Treemap
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let mut treemap = Treemap::new();
    /// treemap.add(u64::MAX);
    /// treemap.remove(u64::MAX);
    ///
    /// assert!(treemap.is_empty());
    /// ```
    pub fn remove(&mut self, element: u64) {
        let (hi, lo) = util::split(element);
        match self.map.entry(hi) {
            Entry::Vacant(_) => (),
            Entry::Occupied(mut bitmap) => {
                bitmap.get_mut().remove(lo);
                if bitmap.get().is_empty() {
                    bitmap.remove();
                }
            }
        }
    }

    /// Remove element from the Treemap, returning whether a value was
    /// removed
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let mut treemap = Treemap::new();
    /// treemap.add(u64::MAX);
    /// assert!(treemap.remove_checked(u64::MAX));
    /// assert!(!treemap.remove_checked(u64::MAX));
    /// ```
    pub fn remove_checked(&mut self, element: u64) -> bool {
        let (hi, lo) = util::split(element);
        match self.map.entry(hi) {
            Entry::Vacant(_) => false,
            Entry::Occupied(mut bitmap) => {
                let removed = bitmap.get_mut().remove_checked(lo);
                if bitmap.get().is_empty() {
                    bitmap.remove();
                }
                removed
            }
        }
    }

    /// ```rust
    /// use oxroaring::Treemap;
    ///
    /// let mut treemap = Treemap::new();
    /// treemap.add(5);
    /// assert!(treemap.contains(5));
    /// assert!(!treemap.contains(6));
    /// ```
    pub fn contains(&self, value: u64) -> bool {
        let (hi, lo) = util::split(value);
        match self.map.get(&hi) {
            None => false,
            Some(bitmap) => bitmap.contains(lo),
        }
    }

    /// Add all values in range
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let mut treemap1 = Treemap::new();
    /// treemap1.add_range(1..3);
    ///
    /// assert!(treemap1.contains(1));
    /// assert!(treemap1.contains(2));
    /// assert!(!treemap1.contains(3));
    ///
    /// let mut treemap2 = Treemap::new();
    /// treemap2.add_range(3..1);
    /// assert!(treemap2.is_empty());
    ///
    /// let mut treemap3 = Treemap::new();
    /// treemap3.add_range(..=2);
    /// treemap3.add_range(u64::MAX..=u64::MAX);
    /// assert_eq!(treemap3.cardinality(), 4);
    /// ```
    pub fn add_range<R: RangeBounds<u64>>(&mut self, range: R) {
        let (start, end) = range_to_inclusive(range);
        self.add_range_inclusive(start, end);
    }

    fn add_range_inclusive(&mut self, start: u64, end: u64) {
        if start > end {
            return;
        }
        let (start_high, start_low) = util::split(start);
        let (end_high, end_low) = util::split(end);
        if start_high == end_high {
            self.get_or_create(start_high).add_range(start_low..=end_low);
            return;
        }

        // Start and end land in different inner bitmaps: partially fill the
        // first, fill the intermediate keys completely, partially fill the
        // last.
        self.get_or_create(start_high).add_range(start_low..=u32::MAX);
        for key in start_high + 1..end_high {
            self.map.insert(key, Bitmap::from_range(..));
        }
        self.get_or_create(end_high).add_range(0..=end_low);
    }

    /// Remove all values in range
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let mut treemap = Treemap::new();
    /// treemap.add_range(0..=10);
    /// treemap.remove_range(5..=15);
    /// assert_eq!(treemap.cardinality(), 5);
    /// ```
    pub fn remove_range<R: RangeBounds<u64>>(&mut self, range: R) {
        let (start, end) = range_to_inclusive(range);
        self.remove_range_inclusive(start, end);
    }

    fn remove_range_inclusive(&mut self, start: u64, end: u64) {
        if start > end {
            return;
        }
        let (start_high, start_low) = util::split(start);
        let (end_high, end_low) = util::split(end);

        if start_high == end_high {
            if let Entry::Occupied(mut entry) = self.map.entry(start_high) {
                entry.get_mut().remove_range(start_low..=end_low);
                if entry.get().is_empty() {
                    entry.remove();
                }
            }
            return;
        }

        let mut keys_to_remove = Vec::new();
        for (&key, bitmap) in self.map.range_mut(start_high..=end_high) {
            if key == start_high && start_low != 0 {
                bitmap.remove_range(start_low..=u32::MAX);
            } else if key == end_high && end_low != u32::MAX {
                bitmap.remove_range(0..=end_low);
            } else {
                keys_to_remove.push(key);
                continue;
            }
            if bitmap.is_empty() {
                keys_to_remove.push(key);
            }
        }
        for key in keys_to_remove {
            self.map.remove(&key);
        }
    }

    /// Negate the bits in the given range; any bit set in the range is
    /// cleared, and any bit cleared is set.
    ///
    /// Areas outside the interval are unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let mut treemap = Treemap::new();
    /// treemap.add_range(1..5);
    /// treemap.flip(2..10);
    /// assert_eq!(treemap.iter().collect::<Vec<_>>(), vec![1, 5, 6, 7, 8, 9]);
    /// ```
    pub fn flip<R: RangeBounds<u64>>(&mut self, range: R) {
        let (start, end) = range_to_inclusive(range);
        self.flip_inclusive(start, end);
    }

    fn flip_inclusive(&mut self, start: u64, end: u64) {
        if start > end {
            return;
        }
        let (start_high, start_low) = util::split(start);
        let (end_high, end_low) = util::split(end);

        if start_high == end_high {
            self.flip_key_range(start_high, start_low, end_low);
            return;
        }
        self.flip_key_range(start_high, start_low, u32::MAX);
        for key in start_high + 1..end_high {
            self.flip_key_range(key, 0, u32::MAX);
        }
        self.flip_key_range(end_high, 0, end_low);
    }

    fn flip_key_range(&mut self, key: u32, lo: u32, hi: u32) {
        match self.map.entry(key) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().flip_inplace(lo..=hi);
                if entry.get().is_empty() {
                    entry.remove();
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(Bitmap::from_range(lo..=hi));
            }
        }
    }

    /// Returns true if the Treemap is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let mut treemap = Treemap::new();
    /// assert!(treemap.is_empty());
    ///
    /// treemap.add(u64::MAX);
    /// assert!(!treemap.is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.map.values().all(Bitmap::is_empty)
    }

    /// Returns true if the Treemap holds every possible `u64` value.
    pub fn is_full(&self) -> bool {
        self.overflowing_cardinality().1
    }

    /// Empties the Treemap
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let mut treemap = Treemap::of(&[1, u64::MAX]);
    /// treemap.clear();
    /// assert!(treemap.is_empty());
    /// ```
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Exchanges the contents of two treemaps.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Returns the number of elements contained in the Treemap
    ///
    /// If the treemap is completely full, the count 2^64 wraps to 0; use
    /// [`try_cardinality`][Self::try_cardinality] or
    /// [`overflowing_cardinality`][Self::overflowing_cardinality] when that
    /// case matters.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let mut treemap = Treemap::new();
    /// treemap.add(1);
    /// treemap.add(u64::MAX);
    ///
    /// assert_eq!(treemap.cardinality(), 2);
    /// ```
    pub fn cardinality(&self) -> u64 {
        self.overflowing_cardinality().0
    }

    /// Returns the number of elements in the Treemap, failing explicitly
    /// when the count is 2^64 and does not fit in a `u64`.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let treemap = Treemap::of(&[1, 2, 3]);
    /// assert_eq!(treemap.try_cardinality(), Ok(3));
    /// ```
    pub fn try_cardinality(&self) -> Result<u64, CardinalityOverflowError> {
        match self.overflowing_cardinality() {
            (_, true) => Err(CardinalityOverflowError),
            (cardinality, false) => Ok(cardinality),
        }
    }

    /// Returns the number of elements in the Treemap along with a flag
    /// telling whether the count overflowed.
    ///
    /// The only possible overflow is the completely full treemap, whose
    /// 2^64 elements wrap to a count of 0 with the flag set.
    pub fn overflowing_cardinality(&self) -> (u64, bool) {
        let total: u128 = self
            .map
            .values()
            .map(|bitmap| u128::from(bitmap.cardinality()))
            .sum();
        (total as u64, total == 1 << 64)
    }

    /// Returns the smallest value in the set, or `None` if the set is
    /// empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let treemap = Treemap::of(&[120, 1000]);
    /// assert_eq!(treemap.minimum(), Some(120));
    /// assert_eq!(Treemap::new().minimum(), None);
    /// ```
    pub fn minimum(&self) -> Option<u64> {
        // Inner bitmaps can transiently be empty; skip them rather than
        // stopping at the first key.
        self.map
            .iter()
            .filter_map(|(&key, bitmap)| bitmap.minimum().map(|low| util::join(key, low)))
            .next()
    }

    /// Returns the greatest value in the set, or `None` if the set is
    /// empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let treemap = Treemap::of(&[120, 1000]);
    /// assert_eq!(treemap.maximum(), Some(1000));
    /// assert_eq!(Treemap::new().maximum(), None);
    /// ```
    pub fn maximum(&self) -> Option<u64> {
        self.map
            .iter()
            .rev()
            .filter_map(|(&key, bitmap)| bitmap.maximum().map(|low| util::join(key, low)))
            .next()
    }

    /// Returns the number of elements that are smaller or equal to `value`
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let treemap = Treemap::of(&[3, 10, u64::MAX]);
    /// assert_eq!(treemap.rank(2), 0);
    /// assert_eq!(treemap.rank(10), 2);
    /// assert_eq!(treemap.rank(u64::MAX), 3);
    /// ```
    pub fn rank(&self, value: u64) -> u64 {
        let (hi, lo) = util::split(value);
        let mut rank = 0;
        let mut range = self.map.range(..=hi);
        if let Some((&key, bitmap)) = range.next_back() {
            rank += if key == hi {
                bitmap.rank(lo)
            } else {
                bitmap.cardinality()
            };
        }
        for (_, bitmap) in range {
            rank += bitmap.cardinality();
        }
        rank
    }

    /// Returns the index of `value` in the set (zero based index)
    ///
    /// If the set doesn't contain `value`, returns `None`.
    ///
    /// The difference with the [rank][Self::rank] method is that this
    /// method will return `None` if the value is not in the set, whereas
    /// `rank` always returns a count.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let treemap = Treemap::of(&[3, 10]);
    /// assert_eq!(treemap.position(10), Some(1));
    /// assert_eq!(treemap.position(11), None);
    /// ```
    pub fn position(&self, value: u64) -> Option<u64> {
        let (hi, lo) = util::split(value);
        let mut range = self.map.range(..=hi);
        let mut index = range
            .next_back()
            .filter(|(&key, _)| key == hi)
            .and_then(|(_, bitmap)| bitmap.position(lo))?;
        for (_, bitmap) in range {
            index += bitmap.cardinality();
        }
        Some(index)
    }

    /// Selects the value at index `rank` in the treemap
    ///
    /// The smallest value is at index 0. If `rank < cardinality()`,
    /// returns `Some`, otherwise, returns `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let mut treemap = Treemap::new();
    /// treemap.add_range(10..=20);
    /// assert_eq!(treemap.select(0), Some(10));
    /// assert_eq!(treemap.select(10), Some(20));
    /// assert_eq!(treemap.select(11), None);
    /// ```
    pub fn select(&self, mut rank: u64) -> Option<u64> {
        for (&key, bitmap) in &self.map {
            let sub_cardinality = bitmap.cardinality();
            if rank < sub_cardinality {
                // rank < sub_cardinality <= 2^32, so the cast holds
                let rank = u32::try_from(rank).expect("rank below a u32 count");
                let low = bitmap
                    .select(rank)
                    .expect("select failed despite rank < cardinality()");
                return Some(util::join(key, low));
            }
            rank -= sub_cardinality;
        }
        None
    }

    /// Return true if all the elements of Self are in &other.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let bitmap1: Treemap = (5..10).collect();
    /// let bitmap2: Treemap = (5..8).collect();
    /// let bitmap3: Treemap = (9..11).collect();
    ///
    /// assert!(bitmap2.is_subset(&bitmap1));
    /// assert!(!bitmap3.is_subset(&bitmap1));
    /// ```
    pub fn is_subset(&self, other: &Treemap) -> bool {
        self.map.iter().all(|(key, inner)| {
            inner.is_empty()
                || other
                    .map
                    .get(key)
                    .map_or(false, |other_inner| inner.is_subset(other_inner))
        })
    }

    /// Returns true if this treemap is a strict subset of `other`
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let bitmap1: Treemap = (5..10).collect();
    /// let bitmap2: Treemap = (5..8).collect();
    ///
    /// assert!(bitmap2.is_strict_subset(&bitmap1));
    /// assert!(!bitmap1.is_strict_subset(&bitmap1));
    /// ```
    pub fn is_strict_subset(&self, other: &Treemap) -> bool {
        self.is_subset(other)
            && self.overflowing_cardinality() != other.overflowing_cardinality()
    }

    /// And computes the intersection between two treemaps and returns the
    /// result as a new treemap
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let treemap1 = Treemap::of(&[u64::MAX]);
    /// let treemap2 = Treemap::of(&[2, u64::MAX]);
    ///
    /// let treemap3 = treemap1.and(&treemap2);
    ///
    /// assert!(treemap3.contains(u64::MAX));
    /// assert!(!treemap3.contains(2));
    /// ```
    pub fn and(&self, other: &Self) -> Self {
        let mut treemap = Treemap::new();
        for (key, bitmap) in &self.map {
            if let Some(other_bitmap) = other.map.get(key) {
                let result = bitmap.and(other_bitmap);
                if !result.is_empty() {
                    treemap.map.insert(*key, result);
                }
            }
        }
        treemap
    }

    /// Computes the intersection between two treemaps and stores the result
    /// in the current treemap
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let mut treemap1 = Treemap::of(&[u64::MAX]);
    /// treemap1.and_inplace(&Treemap::of(&[25]));
    /// assert_eq!(treemap1.cardinality(), 0);
    ///
    /// let mut treemap2 = Treemap::of(&[25, u64::MAX]);
    /// treemap2.and_inplace(&Treemap::of(&[u64::MAX]));
    /// assert_eq!(treemap2.to_vec(), [u64::MAX]);
    /// ```
    pub fn and_inplace(&mut self, other: &Self) {
        let mut keys_to_remove: Vec<u32> = Vec::new();

        for (key, bitmap) in &mut self.map {
            match other.map.get(key) {
                None => {
                    keys_to_remove.push(*key);
                }
                Some(other_bitmap) => {
                    bitmap.and_inplace(other_bitmap);
                    if bitmap.is_empty() {
                        keys_to_remove.push(*key);
                    }
                }
            }
        }

        for key in keys_to_remove {
            self.map.remove(&key);
        }
    }

    /// Or computes the union between two treemaps and returns the result
    /// as a new treemap
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let treemap1 = Treemap::of(&[u64::MAX]);
    /// let treemap2 = Treemap::of(&[25]);
    ///
    /// let treemap3 = treemap1.or(&treemap2);
    ///
    /// assert_eq!(treemap3.to_vec(), [25, u64::MAX]);
    /// ```
    pub fn or(&self, other: &Self) -> Self {
        let mut treemap = self.clone();
        treemap.or_inplace(other);
        treemap
    }

    /// Computes the union between two treemaps and stores the result in
    /// the current treemap
    pub fn or_inplace(&mut self, other: &Self) {
        for (key, other_bitmap) in &other.map {
            match self.map.entry(*key) {
                Entry::Vacant(entry) => {
                    entry.insert(other_bitmap.clone());
                }
                Entry::Occupied(mut entry) => {
                    entry.get_mut().or_inplace(other_bitmap);
                }
            };
        }
    }

    /// Computes the symmetric difference (xor) between two treemaps and
    /// returns a new treemap.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let treemap1 = Treemap::of(&[15, u64::MAX]);
    /// let treemap2 = Treemap::of(&[u64::MAX, 35]);
    ///
    /// let treemap3 = treemap1.xor(&treemap2);
    ///
    /// assert_eq!(treemap3.to_vec(), [15, 35]);
    /// ```
    pub fn xor(&self, other: &Self) -> Self {
        let mut treemap = self.clone();
        treemap.xor_inplace(other);
        treemap
    }

    /// Inplace version of xor, stores the result in the current treemap.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let mut treemap1 = Treemap::of(&[15, 25]);
    /// treemap1.xor_inplace(&Treemap::of(&[25, 35]));
    /// assert_eq!(treemap1.to_vec(), [15, 35]);
    /// ```
    pub fn xor_inplace(&mut self, other: &Self) {
        let mut keys_to_remove: Vec<u32> = Vec::new();

        for (key, other_bitmap) in &other.map {
            match self.map.entry(*key) {
                Entry::Vacant(entry) => {
                    entry.insert(other_bitmap.clone());
                }
                Entry::Occupied(mut entry) => {
                    entry.get_mut().xor_inplace(other_bitmap);
                    if entry.get().is_empty() {
                        keys_to_remove.push(*key);
                    }
                }
            };
        }

        for key in keys_to_remove {
            self.map.remove(&key);
        }
    }

    /// Computes the difference between two treemaps and returns the
    /// result.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let treemap1 = Treemap::of(&[15, u64::MAX]);
    /// let treemap2 = Treemap::of(&[u64::MAX, 35]);
    ///
    /// let treemap3 = treemap1.andnot(&treemap2);
    ///
    /// assert_eq!(treemap3.to_vec(), [15]);
    /// ```
    pub fn andnot(&self, other: &Self) -> Self {
        let mut treemap = Treemap::new();
        for (key, bitmap) in &self.map {
            let result = match other.map.get(key) {
                Some(other_bitmap) => bitmap.andnot(other_bitmap),
                None => bitmap.clone(),
            };
            if !result.is_empty() {
                treemap.map.insert(*key, result);
            }
        }
        treemap
    }

    /// Computes the difference between two treemaps and stores the result
    /// in the current treemap.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let mut treemap = Treemap::of(&[15, 25, u64::MAX - 10]);
    /// treemap.andnot_inplace(&Treemap::of(&[25, 35]));
    /// assert_eq!(treemap.to_vec(), [15, u64::MAX - 10]);
    /// ```
    pub fn andnot_inplace(&mut self, other: &Self) {
        let mut keys_to_remove: Vec<u32> = Vec::new();
        for (key, bitmap) in &mut self.map {
            if let Some(other_bitmap) = other.map.get(key) {
                bitmap.andnot_inplace(other_bitmap);
                if bitmap.is_empty() {
                    keys_to_remove.push(*key);
                }
            }
        }
        for key in keys_to_remove {
            self.map.remove(&key);
        }
    }

    /// Returns a vector containing all of the integers stored in the
    /// Treemap in sorted order.
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let treemap = Treemap::of(&[25, 15, u64::MAX]);
    /// assert_eq!(treemap.to_vec(), [15, 25, u64::MAX]);
    /// ```
    pub fn to_vec(&self) -> Vec<u64> {
        let mut result = Vec::with_capacity(self.cardinality() as usize);
        let mut buffer = [0; 1024];

        for (&key, bitmap) in &self.map {
            let mut iter = bitmap.iter();
            loop {
                let n = iter.next_many(&mut buffer);
                if n == 0 {
                    break;
                }
                result.extend(buffer[..n].iter().map(|&low| util::join(key, low)));
            }
        }

        result
    }

    /// Compresses the treemap's bitmaps. Returns true if the result has at
    /// least one run container.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let mut treemap: Treemap = (100..1000).collect();
    /// assert_eq!(treemap.cardinality(), 900);
    /// assert!(treemap.run_optimize());
    /// ```
    pub fn run_optimize(&mut self) -> bool {
        self.map
            .iter_mut()
            .fold(false, |result, (_, bitmap)| bitmap.run_optimize() || result)
    }

    /// Removes run-length encoding from the treemap's bitmaps. Returns
    /// true if a change was made to any of the bitmaps.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let mut treemap: Treemap = (100..1000).collect();
    /// assert!(treemap.run_optimize());
    /// assert!(treemap.remove_run_compression());
    /// ```
    pub fn remove_run_compression(&mut self) -> bool {
        self.map.iter_mut().fold(false, |result, (_, bitmap)| {
            bitmap.remove_run_compression() || result
        })
    }

    /// Reallocates memory to shrink the usage to the minimum required.
    /// Returns the number of bytes saved.
    pub fn shrink_to_fit(&mut self) -> u64 {
        self.map.values_mut().map(Bitmap::shrink_to_fit).sum()
    }

    /// Computes the union of `treemaps`.
    ///
    /// Advances one outer-key iterator per input through a priority queue;
    /// every input sitting at the frontier key has its inner bitmap folded
    /// into a single many-way 32-bit union.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Treemap;
    ///
    /// let a = Treemap::of(&[1, u64::MAX]);
    /// let b = Treemap::of(&[2]);
    /// let c = Treemap::of(&[1, 3]);
    /// assert_eq!(
    ///     Treemap::fast_or(&[&a, &b, &c]).to_vec(),
    ///     [1, 2, 3, u64::MAX],
    /// );
    /// ```
    pub fn fast_or(treemaps: &[&Treemap]) -> Self {
        use std::cmp::Reverse;
        use std::collections::BinaryHeap;

        let mut iters: Vec<_> = treemaps
            .iter()
            .map(|treemap| treemap.map.iter().peekable())
            .collect();
        let mut heap: BinaryHeap<Reverse<(u32, usize)>> = BinaryHeap::with_capacity(iters.len());
        for (idx, iter) in iters.iter_mut().enumerate() {
            if let Some((&key, _)) = iter.peek() {
                heap.push(Reverse((key, idx)));
            }
        }

        let mut result = Treemap::new();
        let mut frontier = Vec::new();
        while let Some(Reverse((key, idx))) = heap.pop() {
            // Gather every input currently positioned at the frontier key.
            frontier.clear();
            frontier.push(idx);
            while let Some(&Reverse((next_key, next_idx))) = heap.peek() {
                if next_key != key {
                    break;
                }
                heap.pop();
                frontier.push(next_idx);
            }

            let inner: Vec<&Bitmap> = frontier
                .iter()
                .map(|&idx| iters[idx].peek().expect("gathered at frontier").1)
                .collect();
            let merged = match inner.as_slice() {
                [single] => (*single).clone(),
                many => Bitmap::fast_or(many),
            };
            if !merged.is_empty() {
                result.map.insert(key, merged);
            }

            for &idx in &frontier {
                iters[idx].next();
                if let Some((&next_key, _)) = iters[idx].peek() {
                    heap.push(Reverse((next_key, idx)));
                }
            }
        }
        result
    }

    /// Sets the copy-on-write policy flag.
    ///
    /// This implementation always performs deep copies, so the flag is a
    /// recorded policy with no behavioral effect; it exists so callers can
    /// carry the setting through code written against copy-on-write
    /// builds. It is ignored by equality and not serialized.
    pub fn set_copy_on_write(&mut self, enabled: bool) {
        self.copy_on_write = enabled;
    }

    /// Returns the copy-on-write policy flag.
    pub fn get_copy_on_write(&self) -> bool {
        self.copy_on_write
    }

    /// Smallest stored value strictly greater than `value`.
    pub(crate) fn successor(&self, value: u64) -> Option<u64> {
        let (hi, lo) = util::split(value);
        if let Some(bitmap) = self.map.get(&hi) {
            if let Some(next) = bitmap.successor(lo) {
                return Some(util::join(hi, next));
            }
        }
        self.map
            .range((Bound::Excluded(hi), Bound::Unbounded))
            .find_map(|(&key, bitmap)| bitmap.minimum().map(|low| util::join(key, low)))
    }

    /// Largest stored value strictly less than `value`.
    pub(crate) fn predecessor(&self, value: u64) -> Option<u64> {
        let (hi, lo) = util::split(value);
        if let Some(bitmap) = self.map.get(&hi) {
            if let Some(prev) = bitmap.predecessor(lo) {
                return Some(util::join(hi, prev));
            }
        }
        self.map
            .range(..hi)
            .rev()
            .find_map(|(&key, bitmap)| bitmap.maximum().map(|low| util::join(key, low)))
    }

    pub(super) fn get_or_create(&mut self, bucket: u32) -> &mut Bitmap {
        self.map.entry(bucket).or_default()
    }
}

fn range_to_inclusive<R: RangeBounds<u64>>(range: R) -> (u64, u64) {
    let start = match range.start_bound() {
        Bound::Included(&i) => i,
        Bound::Excluded(&i) => match i.checked_add(1) {
            Some(i) => i,
            None => return (1, 0),
        },
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&i) => i,
        Bound::Excluded(&i) => match i.checked_sub(1) {
            Some(i) => i,
            None => return (1, 0),
        },
        Bound::Unbounded => u64::MAX,
    };
    (start, end)
}
