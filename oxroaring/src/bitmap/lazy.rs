use super::Bitmap;
use crate::container::Container;

/// Handle for performing a batch of bitwise operations with reduced
/// bookkeeping.
///
/// Unions and symmetric differences through this handle skip cardinality
/// maintenance on bitset containers and widen arrays eagerly; the owning
/// [`Bitmap::lazy_batch`] call repairs everything before returning.
pub struct LazyBitmap<'a> {
    bitmap: &'a mut Bitmap,
}

impl LazyBitmap<'_> {
    /// Modifies the bitmap this lazy bitmap is associated with to be the
    /// union of the two bitmaps.
    ///
    /// # Arguments
    /// * `other` - The other bitmap to union with.
    /// * `force_bitsets` - Whether to force conversions to bitsets when
    ///   modifying array containers
    #[inline]
    pub fn or_inplace(&mut self, other: &Bitmap, force_bitsets: bool) -> &mut Self {
        self.bitmap.lazy_or_inplace(other, force_bitsets);
        self
    }

    /// Modifies the bitmap this lazy bitmap is associated with to be the
    /// xor of the two bitmaps.
    #[inline]
    pub fn xor_inplace(&mut self, other: &Bitmap) -> &mut Self {
        self.bitmap.lazy_xor_inplace(other);
        self
    }
}

impl std::ops::BitOrAssign<&Bitmap> for LazyBitmap<'_> {
    #[inline]
    fn bitor_assign(&mut self, other: &Bitmap) {
        self.or_inplace(other, false);
    }
}

impl std::ops::BitXorAssign<&Bitmap> for LazyBitmap<'_> {
    #[inline]
    fn bitxor_assign(&mut self, other: &Bitmap) {
        self.xor_inplace(other);
    }
}

impl Bitmap {
    /// Perform multiple bitwise operations on a bitmap.
    ///
    /// The passed closure will be passed a handle which can be used to
    /// perform bitwise operations on the bitmap lazily.
    ///
    /// The result will be equivalent to doing the same operations on this
    /// bitmap directly, but because of reduced bookkeeping in between
    /// operations, it should be faster.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let mut bitmap = Bitmap::of(&[99]);
    /// let bitmaps_to_or = [Bitmap::of(&[1, 2, 5, 10]), Bitmap::of(&[1, 30, 100])];
    /// let bitmaps_to_xor = [Bitmap::of(&[5]), Bitmap::of(&[1, 1000, 1001])];
    ///
    /// bitmap.lazy_batch(|lazy| {
    ///     for b in &bitmaps_to_or {
    ///         *lazy |= b;
    ///     }
    ///     for b in &bitmaps_to_xor {
    ///         *lazy ^= b;
    ///     }
    /// });
    /// let mut bitmap2 = Bitmap::of(&[99]);
    /// for b in &bitmaps_to_or {
    ///     bitmap2.or_inplace(b);
    /// }
    /// for b in &bitmaps_to_xor {
    ///     bitmap2.xor_inplace(b);
    /// }
    /// assert_eq!(bitmap, bitmap2);
    /// assert_eq!(bitmap.to_vec(), [2, 10, 30, 99, 100, 1000, 1001]);
    /// ```
    ///
    /// The result of the passed closure is returned from `lazy_batch`.
    pub fn lazy_batch<F, O>(&mut self, f: F) -> O
    where
        F: FnOnce(&mut LazyBitmap<'_>) -> O,
    {
        let mut lazy_bitmap = LazyBitmap { bitmap: self };
        let result = f(&mut lazy_bitmap);
        self.repair_after_lazy();
        result
    }

    pub(crate) fn lazy_or_inplace(&mut self, other: &Self, force_bitsets: bool) {
        self.lazy_merge(other, |a, b| a.lazy_or(b, force_bitsets));
    }

    pub(crate) fn lazy_xor_inplace(&mut self, other: &Self) {
        self.lazy_merge(other, Container::lazy_xor);
    }

    /// Key-stream merge for the lazy paths. Containers may be left with
    /// sentinel cardinalities and, for xor, transiently empty; both are
    /// resolved by [`repair_after_lazy`].
    ///
    /// [`repair_after_lazy`]: Bitmap::repair_after_lazy
    fn lazy_merge(&mut self, other: &Self, op: impl Fn(&Container, &Container) -> Container) {
        let keys = std::mem::take(&mut self.keys);
        let containers = std::mem::take(&mut self.containers);
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
                        self.push_lazy(key, container);
                    }
                    std::cmp::Ordering::Greater => {
                        self.push_lazy(other_key, other.containers[j].clone());
                        j += 1;
                    }
                    std::cmp::Ordering::Equal => {
                        let (key, container) = own.next().expect("peeked");
                        self.push_lazy(key, op(&container, &other.containers[j]));
                        j += 1;
                    }
                },
                (Some(_), None) => {
                    for (key, container) in own {
                        self.push_lazy(key, container);
                    }
                    break;
                }
                (None, Some(_)) => {
                    for idx in j..other.keys.len() {
                        self.push_lazy(other.keys[idx], other.containers[idx].clone());
                    }
                    break;
                }
                (None, None) => break,
            }
        }
    }

    /// Appends without the emptiness check; lazy containers may not know
    /// their cardinality yet.
    fn push_lazy(&mut self, key: u16, container: Container) {
        debug_assert!(self.keys.last().map_or(true, |&last| last < key));
        self.keys.push(key);
        self.containers.push(container);
    }

    /// Resolves sentinel cardinalities, reapplies the container kind rule,
    /// and drops containers a lazy xor emptied.
    pub(crate) fn repair_after_lazy(&mut self) {
        let mut idx = 0;
        while idx < self.containers.len() {
            self.containers[idx].repair();
            if self.containers[idx].is_empty() {
                self.keys.remove(idx);
                self.containers.remove(idx);
            } else {
                idx += 1;
            }
        }
    }

    /// Or computes the union of `bitmaps` using the lazy path internally.
    ///
    /// See also the heap-based [`fast_or_heap`][Self::fast_or_heap].
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let a = Bitmap::of(&[1, 2]);
    /// let b = Bitmap::of(&[2, 3]);
    /// let c = Bitmap::of(&[100000]);
    /// assert_eq!(Bitmap::fast_or(&[&a, &b, &c]).to_vec(), [1, 2, 3, 100000]);
    /// ```
    pub fn fast_or(bitmaps: &[&Bitmap]) -> Self {
        match bitmaps {
            [] => Bitmap::new(),
            [single] => (*single).clone(),
            [first, rest @ ..] => {
                let mut result = (*first).clone();
                for bitmap in rest {
                    result.lazy_or_inplace(bitmap, false);
                }
                result.repair_after_lazy();
                result
            }
        }
    }

    /// Computes the union of `bitmaps`, merging smallest inputs first
    /// through a priority queue.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let a = Bitmap::of(&[1, 2]);
    /// let b = Bitmap::of(&[2, 3]);
    /// assert_eq!(
    ///     Bitmap::fast_or_heap(&[&a, &b]),
    ///     Bitmap::fast_or(&[&a, &b]),
    /// );
    /// ```
    pub fn fast_or_heap(bitmaps: &[&Bitmap]) -> Self {
        use std::cmp::Reverse;
        use std::collections::BinaryHeap;

        match bitmaps {
            [] => Bitmap::new(),
            [single] => (*single).clone(),
            _ => {
                let mut slots: Vec<Option<Bitmap>> = Vec::with_capacity(bitmaps.len());
                let mut heap: BinaryHeap<(Reverse<u64>, usize)> = BinaryHeap::new();
                for &bitmap in bitmaps {
                    heap.push((Reverse(bitmap.cardinality()), slots.len()));
                    slots.push(Some(bitmap.clone()));
                }
                while heap.len() > 1 {
                    let (_, a) = heap.pop().expect("heap len checked");
                    let (_, b) = heap.pop().expect("heap len checked");
                    let other = slots[b].take().expect("slot filled by push");
                    let mut merged = slots[a].take().expect("slot filled by push");
                    merged.lazy_or_inplace(&other, false);
                    heap.push((Reverse(merged.cardinality_upper_bound()), slots.len()));
                    slots.push(Some(merged));
                }
                let (_, last) = heap.pop().expect("non-empty input");
                let mut result = slots[last].take().expect("slot filled by push");
                result.repair_after_lazy();
                result
            }
        }
    }

    /// Computes the symmetric difference of `bitmaps` using the lazy path.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::Bitmap;
    ///
    /// let a = Bitmap::of(&[1, 2]);
    /// let b = Bitmap::of(&[2, 3]);
    /// let c = Bitmap::of(&[3]);
    /// assert_eq!(Bitmap::fast_xor(&[&a, &b, &c]).to_vec(), [1]);
    /// ```
    pub fn fast_xor(bitmaps: &[&Bitmap]) -> Self {
        match bitmaps {
            [] => Bitmap::new(),
            [single] => (*single).clone(),
            [first, rest @ ..] => {
                let mut result = (*first).clone();
                for bitmap in rest {
                    result.lazy_xor_inplace(bitmap);
                }
                result.repair_after_lazy();
                result
            }
        }
    }

    /// Upper bound usable while containers still carry the lazy sentinel.
    fn cardinality_upper_bound(&self) -> u64 {
        self.containers.len() as u64 * (1 << 16)
    }
}
