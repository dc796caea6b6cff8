use std::mem;
use std::ops::{Bound, RangeBounds};

use super::{Bitmap, Statistics};
use crate::container::{self, Container};

impl Bitmap {
    /// Creates a new bitmap (initially empty)
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let bitmap = Bitmap::new();
    ///
    /// assert!(bitmap.is_empty());
    /// ```
    #[inline]
    pub fn new() -> Self {
        Bitmap {
            keys: Vec::new(),
            containers: Vec::new(),
        }
    }

    /// Creates a new bitmap (initially empty) with a provided
    /// container-storage capacity (it is a performance hint).
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let bitmap = Bitmap::with_container_capacity(16);
    ///
    /// assert!(bitmap.is_empty());
    /// ```
    #[inline]
    pub fn with_container_capacity(capacity: u32) -> Self {
        Bitmap {
            keys: Vec::with_capacity(capacity as usize),
            containers: Vec::with_capacity(capacity as usize),
        }
    }

    /// Creates a new bitmap from a slice of u32 values
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let elements = vec![1, 2, u32::MAX];
    ///
    /// let bitmap = Bitmap::of(&elements);
    ///
    /// assert!(bitmap.contains(1));
    /// assert!(bitmap.contains(u32::MAX));
    /// assert!(!bitmap.contains(3));
    /// ```
    pub fn of(elements: &[u32]) -> Self {
        let mut bitmap = Bitmap::new();
        bitmap.add_many(elements);
        bitmap
    }

    /// Creates a new bitmap containing every value in `range`.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let bitmap = Bitmap::from_range(1..=3);
    ///
    /// assert_eq!(bitmap.to_vec(), [1, 2, 3]);
    /// ```
    pub fn from_range<R: RangeBounds<u32>>(range: R) -> Self {
        let mut bitmap = Bitmap::new();
        bitmap.add_range(range);
        bitmap
    }

    /// Add the integer element to the bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// assert!(bitmap.is_empty());
    /// bitmap.add(1);
    /// assert!(!bitmap.is_empty());
    /// ```
    #[inline]
    pub fn add(&mut self, element: u32) {
        let (key, low) = split(element);
        self.get_or_insert(key).add(low);
    }

    /// Add the integer element to the bitmap. Returns true if the value was
    /// added, false if the value was already in the bitmap.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// assert!(bitmap.add_checked(1));
    /// assert!(!bitmap.add_checked(1));
    /// ```
    #[inline]
    pub fn add_checked(&mut self, element: u32) -> bool {
        let (key, low) = split(element);
        self.get_or_insert(key).add(low)
    }

    /// Add all the integer elements to the bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// bitmap.add_many(&[1, 2, 3]);
    ///
    /// assert!(bitmap.contains(1));
    /// assert!(bitmap.contains(2));
    /// assert!(bitmap.contains(3));
    /// ```
    pub fn add_many(&mut self, elements: &[u32]) {
        // Consecutive values usually share a key; reuse the last container
        // index instead of searching every time.
        let mut cached: Option<(u16, usize)> = None;
        for &element in elements {
            let (key, low) = split(element);
            let idx = match cached {
                Some((k, idx)) if k == key => idx,
                _ => {
                    let idx = match self.keys.binary_search(&key) {
                        Ok(idx) => idx,
                        Err(idx) => {
                            self.keys.insert(idx, key);
                            self.containers.insert(idx, Container::new());
                            idx
                        }
                    };
                    cached = Some((key, idx));
                    idx
                }
            };
            self.containers[idx].add(low);
        }
    }

    /// Remove the integer element from the bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let mut bitmap = Bitmap::of(&[1]);
    /// bitmap.remove(1);
    ///
    /// assert!(bitmap.is_empty());
    /// ```
    pub fn remove(&mut self, element: u32) {
        self.remove_checked(element);
    }

    /// Remove the integer element from the bitmap. Returns true if a change
    /// was made, false if the value was not present.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let mut bitmap = Bitmap::of(&[1]);
    /// assert!(bitmap.remove_checked(1));
    /// assert!(!bitmap.remove_checked(1));
    /// ```
    pub fn remove_checked(&mut self, element: u32) -> bool {
        let (key, low) = split(element);
        match self.keys.binary_search(&key) {
            Ok(idx) => {
                let removed = self.containers[idx].remove(low);
                self.remove_if_empty(idx);
                removed
            }
            Err(_) => false,
        }
    }

    /// Contains returns true if the integer element is contained in the
    /// bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// bitmap.add(1);
    ///
    /// assert!(bitmap.contains(1));
    /// assert!(!bitmap.contains(2));
    /// ```
    #[inline]
    pub fn contains(&self, element: u32) -> bool {
        let (key, low) = split(element);
        match self.keys.binary_search(&key) {
            Ok(idx) => self.containers[idx].contains(low),
            Err(_) => false,
        }
    }

    /// Add all values in range
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let mut bitmap1 = Bitmap::new();
    /// bitmap1.add_range(1..3);
    ///
    /// assert!(!bitmap1.is_empty());
    /// assert!(bitmap1.contains(1));
    /// assert!(bitmap1.contains(2));
    /// assert!(!bitmap1.contains(3));
    ///
    /// let mut bitmap2 = Bitmap::new();
    /// bitmap2.add_range(3..1);
    /// assert!(bitmap2.is_empty());
    ///
    /// let mut bitmap3 = Bitmap::new();
    /// bitmap3.add_range(..=2);
    /// bitmap3.add_range(u32::MAX..=u32::MAX);
    /// assert_eq!(bitmap3.cardinality(), 4);
    /// ```
    pub fn add_range<R: RangeBounds<u32>>(&mut self, range: R) {
        let (start, end) = range_to_inclusive(range);
        self.add_range_inclusive(start, end);
    }

    fn add_range_inclusive(&mut self, start: u32, end: u32) {
        if start > end {
            return;
        }
        let (start_high, start_low) = split(start);
        let (end_high, end_low) = split(end);
        if start_high == end_high {
            if (start_low, end_low) == (0, u16::MAX) {
                self.set_full(start_high);
            } else {
                self.get_or_insert(start_high).add_range(start_low, end_low);
            }
            return;
        }
        // Split on key boundaries: a partial head, completely filled middle
        // keys, and a partial tail.
        if start_low == 0 {
            self.set_full(start_high);
        } else {
            self.get_or_insert(start_high).add_range(start_low, u16::MAX);
        }
        for key in start_high + 1..end_high {
            self.set_full(key);
        }
        if end_low == u16::MAX {
            self.set_full(end_high);
        } else {
            self.get_or_insert(end_high).add_range(0, end_low);
        }
    }

    /// Remove all values in range
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let mut bitmap = Bitmap::from_range(0..=10);
    /// bitmap.remove_range(5..=15);
    /// assert_eq!(bitmap.to_vec(), [0, 1, 2, 3, 4]);
    /// ```
    pub fn remove_range<R: RangeBounds<u32>>(&mut self, range: R) {
        let (start, end) = range_to_inclusive(range);
        self.remove_range_inclusive(start, end);
    }

    fn remove_range_inclusive(&mut self, start: u32, end: u32) {
        if start > end {
            return;
        }
        let (start_high, start_low) = split(start);
        let (end_high, end_low) = split(end);
        if start_high == end_high {
            if let Ok(idx) = self.keys.binary_search(&start_high) {
                self.containers[idx].remove_range(start_low, end_low);
                self.remove_if_empty(idx);
            }
            return;
        }
        if start_low != 0 {
            if let Ok(idx) = self.keys.binary_search(&start_high) {
                self.containers[idx].remove_range(start_low, u16::MAX);
                self.remove_if_empty(idx);
            }
        }
        if end_low != u16::MAX {
            if let Ok(idx) = self.keys.binary_search(&end_high) {
                self.containers[idx].remove_range(0, end_low);
                self.remove_if_empty(idx);
            }
        }
        // Whole keys covered by the range are dropped in one splice.
        let lo_key = if start_low == 0 { start_high } else { start_high + 1 };
        let hi_key = if end_low == u16::MAX { end_high } else { end_high - 1 };
        let lo_idx = self.keys.partition_point(|&k| k < lo_key);
        let hi_idx = self.keys.partition_point(|&k| k <= hi_key);
        self.keys.drain(lo_idx..hi_idx);
        self.containers.drain(lo_idx..hi_idx);
    }

    /// Check whether a range of values of range are ALL present
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let bitmap = Bitmap::of(&[1, 2, 4]);
    /// assert!(bitmap.contains_range(1..=2));
    /// assert!(!bitmap.contains_range(1..=4));
    /// // An empty range is always contained
    /// assert!(bitmap.contains_range(10..0));
    /// ```
    pub fn contains_range<R: RangeBounds<u32>>(&self, range: R) -> bool {
        let (start, end) = range_to_inclusive(range);
        if start > end {
            return true;
        }
        let (start_high, start_low) = split(start);
        let (end_high, end_low) = split(end);
        if start_high == end_high {
            return match self.keys.binary_search(&start_high) {
                Ok(idx) => self.containers[idx].contains_range(start_low, end_low),
                Err(_) => false,
            };
        }
        let Ok(first) = self.keys.binary_search(&start_high) else {
            return false;
        };
        // The keys between head and tail must be physically consecutive and
        // completely full.
        let last = first + usize::from(end_high - start_high);
        if self.keys.get(last) != Some(&end_high) {
            return false;
        }
        self.containers[first].contains_range(start_low, u16::MAX)
            && self.containers[first + 1..last].iter().all(Container::is_full)
            && self.containers[last].contains_range(0, end_low)
    }

    /// Returns the number of values in the given range of the bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let bitmap = Bitmap::of(&[1, 3, 4, u32::MAX]);
    /// assert_eq!(bitmap.range_cardinality(..1), 0);
    /// assert_eq!(bitmap.range_cardinality(..4), 2);
    /// assert_eq!(bitmap.range_cardinality(1..=4), 3);
    /// assert_eq!(bitmap.range_cardinality(..), 4);
    /// ```
    pub fn range_cardinality<R: RangeBounds<u32>>(&self, range: R) -> u64 {
        let (start, end) = range_to_inclusive(range);
        if start > end {
            return 0;
        }
        let below_start = if start == 0 { 0 } else { self.rank(start - 1) };
        self.rank(end) - below_start
    }

    /// Returns the number of values contained in the bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// assert_eq!(bitmap.cardinality(), 0);
    ///
    /// bitmap.add(1);
    /// assert_eq!(bitmap.cardinality(), 1);
    /// ```
    pub fn cardinality(&self) -> u64 {
        self.containers
            .iter()
            .map(|c| c.cardinality() as u64)
            .sum()
    }

    /// Returns true if the bitmap contains no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns true if the bitmap contains every possible `u32` value.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let mut bitmap = Bitmap::new();
    /// assert!(!bitmap.is_full());
    /// bitmap.add_range(..);
    /// assert!(bitmap.is_full());
    /// ```
    pub fn is_full(&self) -> bool {
        self.keys.len() == 1 << 16 && self.containers.iter().all(Container::is_full)
    }

    /// Empties the bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let mut bitmap = Bitmap::of(&[1, u32::MAX]);
    /// bitmap.clear();
    /// assert!(bitmap.is_empty());
    /// ```
    pub fn clear(&mut self) {
        self.keys.clear();
        self.containers.clear();
    }

    /// Exchanges the contents of two bitmaps.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// And computes the intersection between two bitmaps and returns the
    /// result as a new bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let bitmap1 = Bitmap::of(&[u32::MAX]);
    /// let bitmap2 = Bitmap::of(&[2, u32::MAX]);
    ///
    /// let bitmap3 = bitmap1.and(&bitmap2);
    ///
    /// assert!(bitmap3.contains(u32::MAX));
    /// assert!(!bitmap3.contains(2));
    /// ```
    pub fn and(&self, other: &Self) -> Self {
        let mut out = Bitmap::new();
        for (idx, &key) in self.keys.iter().enumerate() {
            if let Ok(other_idx) = other.keys.binary_search(&key) {
                let container = self.containers[idx].and(&other.containers[other_idx]);
                out.push_container(key, container);
            }
        }
        out
    }

    /// Computes the intersection between two bitmaps and stores the result
    /// in the current bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let mut bitmap1 = Bitmap::of(&[15]);
    /// let bitmap2 = Bitmap::of(&[15, 25]);
    ///
    /// bitmap1.and_inplace(&bitmap2);
    ///
    /// assert_eq!(bitmap1.to_vec(), [15]);
    /// ```
    pub fn and_inplace(&mut self, other: &Self) {
        let keys = mem::take(&mut self.keys);
        let containers = mem::take(&mut self.containers);
        for (key, mut container) in keys.into_iter().zip(containers) {
            if let Ok(other_idx) = other.keys.binary_search(&key) {
                container.and_inplace(&other.containers[other_idx]);
                self.push_container(key, container);
            }
        }
    }

    /// Or computes the union between two bitmaps and returns the result
    /// as a new bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let bitmap1 = Bitmap::of(&[15]);
    /// let bitmap2 = Bitmap::of(&[25]);
    ///
    /// let bitmap3 = bitmap1.or(&bitmap2);
    ///
    /// assert_eq!(bitmap3.to_vec(), [15, 25]);
    /// ```
    pub fn or(&self, other: &Self) -> Self {
        self.merge_with(other, Container::or, true)
    }

    /// Computes the union between two bitmaps and stores the result in the
    /// current bitmap
    pub fn or_inplace(&mut self, other: &Self) {
        self.merge_inplace(other, Container::or_inplace, true);
    }

    /// Computes the symmetric difference (xor) between two bitmaps and
    /// returns a new bitmap
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let bitmap1 = Bitmap::of(&[15, 25]);
    /// let bitmap2 = Bitmap::of(&[25, 35]);
    ///
    /// let bitmap3 = bitmap1.xor(&bitmap2);
    ///
    /// assert_eq!(bitmap3.to_vec(), [15, 35]);
    /// ```
    pub fn xor(&self, other: &Self) -> Self {
        self.merge_with(other, Container::xor, true)
    }

    /// Inplace version of xor, stores the result in the current bitmap.
    pub fn xor_inplace(&mut self, other: &Self) {
        self.merge_inplace(other, Container::xor_inplace, true);
    }

    /// Computes the difference between two bitmaps and returns the result.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let bitmap1 = Bitmap::of(&[15, 25]);
    /// let bitmap2 = Bitmap::of(&[25, 35]);
    ///
    /// let bitmap3 = bitmap1.andnot(&bitmap2);
    ///
    /// assert_eq!(bitmap3.to_vec(), [15]);
    /// ```
    pub fn andnot(&self, other: &Self) -> Self {
        self.merge_with(other, Container::andnot, false)
    }

    /// Computes the difference between two bitmaps and stores the result
    /// in the current bitmap.
    pub fn andnot_inplace(&mut self, other: &Self) {
        self.merge_inplace(other, Container::andnot_inplace, false);
    }

    /// Merges the key streams of `self` and `other`; `op` runs on shared
    /// keys, `keep_other` controls whether keys unique to `other` survive.
    fn merge_with(
        &self,
        other: &Self,
        op: impl Fn(&Container, &Container) -> Container,
        keep_other: bool,
    ) -> Self {
        let mut out = Bitmap::with_container_capacity((self.keys.len() + other.keys.len()) as u32);
        let (mut i, mut j) = (0, 0);
        while i < self.keys.len() && j < other.keys.len() {
            match self.keys[i].cmp(&other.keys[j]) {
                std::cmp::Ordering::Less => {
                    out.push_container(self.keys[i], self.containers[i].clone());
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    if keep_other {
                        out.push_container(other.keys[j], other.containers[j].clone());
                    }
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    out.push_container(self.keys[i], op(&self.containers[i], &other.containers[j]));
                    i += 1;
                    j += 1;
                }
            }
        }
        for idx in i..self.keys.len() {
            out.push_container(self.keys[idx], self.containers[idx].clone());
        }
        if keep_other {
            for idx in j..other.keys.len() {
                out.push_container(other.keys[idx], other.containers[idx].clone());
            }
        }
        out
    }

    fn merge_inplace(
        &mut self,
        other: &Self,
        op: impl Fn(&mut Container, &Container),
        keep_other: bool,
    ) {
        let keys = mem::take(&mut self.keys);
        let containers = mem::take(&mut self.containers);
        self.keys.reserve(keys.len() + other.keys.len());
        self.containers.reserve(keys.len() + other.keys.len());
        let mut own = keys.into_iter().zip(containers).peekable();
        let mut j = 0;
        loop {
            let own_key = own.peek().map(|(k, _)| *k);
            match (own_key, other.keys.get(j)) {
                (Some(key), Some(&other_key)) => match key.cmp(&other_key) {
                    std::cmp::Ordering::Less => {
                        let (key, container) = own.next().expect("peeked");
                        self.push_container(key, container);
                    }
                    std::cmp::Ordering::Greater => {
                        if keep_other {
                            self.push_container(other_key, other.containers[j].clone());
                        }
                        j += 1;
                    }
                    std::cmp::Ordering::Equal => {
                        let (key, mut container) = own.next().expect("peeked");
                        op(&mut container, &other.containers[j]);
                        self.push_container(key, container);
                        j += 1;
                    }
                },
                (Some(_), None) => {
                    for (key, container) in own {
                        self.push_container(key, container);
                    }
                    break;
                }
                (None, Some(_)) => {
                    if keep_other {
                        for idx in j..other.keys.len() {
                            self.push_container(other.keys[idx], other.containers[idx].clone());
                        }
                    }
                    break;
                }
                (None, None) => break,
            }
        }
    }

    /// Returns true if the two bitmaps share at least one value.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let bitmap1 = Bitmap::of(&[1, 2]);
    /// assert!(bitmap1.intersect(&Bitmap::of(&[2, 3])));
    /// assert!(!bitmap1.intersect(&Bitmap::of(&[3, 4])));
    /// ```
    pub fn intersect(&self, other: &Self) -> bool {
        let (mut i, mut j) = (0, 0);
        while i < self.keys.len() && j < other.keys.len() {
            match self.keys[i].cmp(&other.keys[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    if self.containers[i].intersects(&other.containers[j]) {
                        return true;
                    }
                    i += 1;
                    j += 1;
                }
            }
        }
        false
    }

    /// Return true if all the elements of Self are in &other.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let bitmap1: Bitmap = (5..10).collect();
    /// let bitmap2: Bitmap = (5..8).collect();
    /// let bitmap3: Bitmap = (9..11).collect();
    ///
    /// assert!(bitmap2.is_subset(&bitmap1));
    /// assert!(bitmap1.is_subset(&bitmap1));
    /// assert!(!bitmap3.is_subset(&bitmap1));
    /// ```
    pub fn is_subset(&self, other: &Self) -> bool {
        self.keys.iter().enumerate().all(|(idx, key)| {
            other
                .keys
                .binary_search(key)
                .map_or(false, |other_idx| {
                    self.containers[idx].is_subset(&other.containers[other_idx])
                })
        })
    }

    /// Returns true if this bitmap is a strict subset of `other`
    pub fn is_strict_subset(&self, other: &Self) -> bool {
        self.is_subset(other) && self.cardinality() != other.cardinality()
    }

    /// Negates the bits in the given range, returning the result as a new
    /// bitmap. Areas outside the interval are unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let bitmap = Bitmap::of(&[4]);
    /// let flipped = bitmap.flip(1..3);
    /// assert_eq!(flipped.to_vec(), [1, 2, 4]);
    /// ```
    pub fn flip<R: RangeBounds<u32>>(&self, range: R) -> Self {
        let mut out = self.clone();
        out.flip_inplace(range);
        out
    }

    /// Negates the bits in the given range in place; any bit set in the
    /// range is cleared, and any bit cleared is set.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let mut bitmap = Bitmap::of(&[4]);
    /// bitmap.flip_inplace(1..3);
    /// assert_eq!(bitmap.to_vec(), [1, 2, 4]);
    /// bitmap.flip_inplace(1..3);
    /// assert_eq!(bitmap.to_vec(), [4]);
    /// ```
    pub fn flip_inplace<R: RangeBounds<u32>>(&mut self, range: R) {
        let (start, end) = range_to_inclusive(range);
        self.flip_inclusive(start, end);
    }

    fn flip_inclusive(&mut self, start: u32, end: u32) {
        if start > end {
            return;
        }
        let (start_high, start_low) = split(start);
        let (end_high, end_low) = split(end);
        if start_high == end_high {
            self.flip_key_range(start_high, start_low, end_low);
            return;
        }
        self.flip_key_range(start_high, start_low, u16::MAX);
        for key in start_high + 1..end_high {
            self.flip_key_range(key, 0, u16::MAX);
        }
        self.flip_key_range(end_high, 0, end_low);
    }

    fn flip_key_range(&mut self, key: u16, lo: u16, hi: u16) {
        match self.keys.binary_search(&key) {
            Ok(idx) => {
                self.containers[idx].flip_range(lo, hi);
                self.remove_if_empty(idx);
            }
            Err(idx) => {
                self.keys.insert(idx, key);
                self.containers.insert(idx, Container::from_range(lo, hi));
            }
        }
    }

    /// Returns a vector containing all of the integers stored in the bitmap
    /// in sorted order.
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let bitmap = Bitmap::of(&[25, 15, u32::MAX]);
    /// assert_eq!(bitmap.to_vec(), [15, 25, u32::MAX]);
    /// ```
    pub fn to_vec(&self) -> Vec<u32> {
        let mut result = Vec::with_capacity(self.cardinality() as usize);
        for (idx, &key) in self.keys.iter().enumerate() {
            result.extend(self.containers[idx].iter().map(|low| join(key, low)));
        }
        result
    }

    /// Returns the smallest value in the set, or `None` if the set is
    /// empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let bitmap = Bitmap::of(&[120, 1000]);
    /// assert_eq!(bitmap.minimum(), Some(120));
    /// assert_eq!(Bitmap::new().minimum(), None);
    /// ```
    pub fn minimum(&self) -> Option<u32> {
        let low = self.containers.first()?.minimum()?;
        Some(join(self.keys[0], low))
    }

    /// Returns the greatest value in the set, or `None` if the set is
    /// empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let bitmap = Bitmap::of(&[120, 1000]);
    /// assert_eq!(bitmap.maximum(), Some(1000));
    /// assert_eq!(Bitmap::new().maximum(), None);
    /// ```
    pub fn maximum(&self) -> Option<u32> {
        let low = self.containers.last()?.maximum()?;
        Some(join(*self.keys.last().expect("parallel vectors"), low))
    }

    /// Returns the number of values that are smaller or equal to `x`.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let bitmap = Bitmap::of(&[3, 10, 20]);
    /// assert_eq!(bitmap.rank(2), 0);
    /// assert_eq!(bitmap.rank(10), 2);
    /// assert_eq!(bitmap.rank(100), 3);
    /// ```
    pub fn rank(&self, x: u32) -> u64 {
        let (key, low) = split(x);
        let idx = self.keys.partition_point(|&k| k < key);
        let mut rank: u64 = self.containers[..idx]
            .iter()
            .map(|c| c.cardinality() as u64)
            .sum();
        if self.keys.get(idx) == Some(&key) {
            rank += self.containers[idx].rank(low) as u64;
        }
        rank
    }

    /// Returns the index of `x` in the set (zero based index)
    ///
    /// The difference with the [rank][Self::rank] method is that this
    /// method returns `None` when `x` is not in the set.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let bitmap = Bitmap::of(&[3, 10, 20]);
    /// assert_eq!(bitmap.position(10), Some(1));
    /// assert_eq!(bitmap.position(11), None);
    /// ```
    pub fn position(&self, x: u32) -> Option<u64> {
        if !self.contains(x) {
            return None;
        }
        Some(self.rank(x) - 1)
    }

    /// Selects the value at index `rank` in the bitmap.
    ///
    /// The smallest value is at index 0. If `rank < cardinality()`, returns
    /// `Some`, otherwise returns `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let bitmap = Bitmap::from_range(10..=20);
    /// assert_eq!(bitmap.select(0), Some(10));
    /// assert_eq!(bitmap.select(10), Some(20));
    /// assert_eq!(bitmap.select(11), None);
    /// ```
    pub fn select(&self, rank: u32) -> Option<u32> {
        let mut remaining = rank as usize;
        for (idx, container) in self.containers.iter().enumerate() {
            let cardinality = container.cardinality();
            if remaining < cardinality {
                let low = container
                    .select(remaining)
                    .expect("select failed despite rank < cardinality()");
                return Some(join(self.keys[idx], low));
            }
            remaining -= cardinality;
        }
        None
    }

    /// Compresses the bitmap, converting containers to run-length encoding
    /// where that is strictly smaller. Returns true if the result has at
    /// least one run container.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let mut bitmap: Bitmap = (100..1000).collect();
    /// assert_eq!(bitmap.cardinality(), 900);
    /// assert!(bitmap.run_optimize());
    /// ```
    pub fn run_optimize(&mut self) -> bool {
        let mut has_run = false;
        for container in &mut self.containers {
            has_run |= container.run_optimize();
        }
        has_run
    }

    /// Removes run-length encoding from the bitmap. Returns true if a
    /// change was made.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let mut bitmap: Bitmap = (100..1000).collect();
    /// assert!(bitmap.run_optimize());
    /// assert!(bitmap.remove_run_compression());
    /// assert!(!bitmap.remove_run_compression());
    /// ```
    pub fn remove_run_compression(&mut self) -> bool {
        let mut changed = false;
        for container in &mut self.containers {
            changed |= container.remove_run_compression();
        }
        changed
    }

    /// Reallocates memory to shrink the usage to the minimum required.
    /// Returns the number of bytes saved.
    pub fn shrink_to_fit(&mut self) -> u64 {
        let mut saved: u64 = self
            .containers
            .iter_mut()
            .map(Container::shrink_to_fit)
            .sum();
        saved += ((self.keys.capacity() - self.keys.len()) * mem::size_of::<u16>()) as u64;
        saved += ((self.containers.capacity() - self.containers.len())
            * mem::size_of::<Container>()) as u64;
        self.keys.shrink_to_fit();
        self.containers.shrink_to_fit();
        saved
    }

    /// Gathers detailed statistics about the composition of the bitmap.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let mut bitmap: Bitmap = (1..100).collect();
    /// let stats = bitmap.statistics();
    /// assert_eq!(stats.n_containers, 1);
    /// assert_eq!(stats.n_array_containers, 1);
    /// assert_eq!(stats.cardinality, 99);
    ///
    /// bitmap.run_optimize();
    /// let stats = bitmap.statistics();
    /// assert_eq!(stats.n_array_containers, 0);
    /// assert_eq!(stats.n_run_containers, 1);
    /// ```
    pub fn statistics(&self) -> Statistics {
        let mut stats = Statistics::default();
        stats.n_containers = self.containers.len() as u32;
        for container in &self.containers {
            let cardinality = container.cardinality() as u32;
            match container {
                Container::Array(_) => {
                    stats.n_array_containers += 1;
                    stats.n_values_array_containers += cardinality;
                    stats.n_bytes_array_containers += 2 * cardinality;
                }
                Container::Bitset(_) => {
                    stats.n_bitset_containers += 1;
                    stats.n_values_bitset_containers += cardinality;
                    stats.n_bytes_bitset_containers += container::BITSET_BYTES as u32;
                }
                Container::Run(r) => {
                    stats.n_run_containers += 1;
                    stats.n_values_run_containers += cardinality;
                    stats.n_bytes_run_containers += 4 * r.num_runs() as u32 + 2;
                }
            }
            stats.cardinality += u64::from(cardinality);
        }
        stats.min_value = self.minimum().unwrap_or(0);
        stats.max_value = self.maximum().unwrap_or(0);
        stats
    }

    /// Smallest stored value strictly greater than `value`.
    pub(crate) fn successor(&self, value: u32) -> Option<u32> {
        let (key, low) = split(value);
        let idx = match self.keys.binary_search(&key) {
            Ok(idx) => {
                if let Some(next_low) = self.containers[idx].successor(low) {
                    return Some(join(key, next_low));
                }
                idx + 1
            }
            Err(idx) => idx,
        };
        let container = self.containers.get(idx)?;
        Some(join(self.keys[idx], container.minimum()?))
    }

    /// Largest stored value strictly less than `value`.
    pub(crate) fn predecessor(&self, value: u32) -> Option<u32> {
        let (key, low) = split(value);
        let idx = match self.keys.binary_search(&key) {
            Ok(idx) => {
                if let Some(prev_low) = self.containers[idx].predecessor(low) {
                    return Some(join(key, prev_low));
                }
                idx
            }
            Err(idx) => idx,
        };
        let prev = idx.checked_sub(1)?;
        Some(join(self.keys[prev], self.containers[prev].maximum()?))
    }

    fn get_or_insert(&mut self, key: u16) -> &mut Container {
        let idx = match self.keys.binary_search(&key) {
            Ok(idx) => idx,
            Err(idx) => {
                self.keys.insert(idx, key);
                self.containers.insert(idx, Container::new());
                idx
            }
        };
        &mut self.containers[idx]
    }

    fn set_full(&mut self, key: u16) {
        match self.keys.binary_search(&key) {
            Ok(idx) => self.containers[idx] = Container::full(),
            Err(idx) => {
                self.keys.insert(idx, key);
                self.containers.insert(idx, Container::full());
            }
        }
    }

    fn remove_if_empty(&mut self, idx: usize) {
        if self.containers[idx].is_empty() {
            self.keys.remove(idx);
            self.containers.remove(idx);
        }
    }

    /// Appends a container at a key greater than all current keys, dropping
    /// empties.
    pub(crate) fn push_container(&mut self, key: u16, container: Container) {
        debug_assert!(self.keys.last().map_or(true, |&last| last < key));
        if !container.is_empty() {
            self.keys.push(key);
            self.containers.push(container);
        }
    }
}

#[inline]
pub(super) fn split(value: u32) -> (u16, u16) {
    ((value >> 16) as u16, value as u16)
}

#[inline]
pub(super) fn join(key: u16, low: u16) -> u32 {
    u32::from(key) << 16 | u32::from(low)
}

pub(super) fn range_to_inclusive<R: RangeBounds<u32>>(range: R) -> (u32, u32) {
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
        Bound::Unbounded => u32::MAX,
    };
    (start, end)
}
