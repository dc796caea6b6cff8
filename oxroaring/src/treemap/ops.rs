use std::collections::BTreeMap;
use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Sub, SubAssign};

use super::Treemap;
use crate::Bitmap;

impl fmt::Debug for Treemap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.cardinality() < 32 {
            write!(f, "Treemap<{:?}>", self.to_vec())
        } else {
            write!(
                f,
                "Treemap<{} values between {:?} and {:?}>",
                self.cardinality(),
                self.minimum().expect("non-empty"),
                self.maximum().expect("non-empty")
            )
        }
    }
}

impl Default for Treemap {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Bitmap> for Treemap {
    fn from(bitmap: Bitmap) -> Self {
        Treemap::from_bitmap(bitmap)
    }
}

impl From<BTreeMap<u32, Bitmap>> for Treemap {
    /// Wraps an already-sharded map of bitmaps.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::BTreeMap;
    /// use oxroaring::{Bitmap, Treemap};
    ///
    /// let map = BTreeMap::from([(0, Bitmap::of(&[1])), (1, Bitmap::of(&[2]))]);
    /// let treemap = Treemap::from(map);
    /// assert_eq!(treemap.to_vec(), [1, (1 << 32) + 2]);
    /// ```
    fn from(map: BTreeMap<u32, Bitmap>) -> Self {
        Treemap {
            map,
            copy_on_write: false,
        }
    }
}

/// Treemaps compare as sets: inner bitmaps that happen to be empty are
/// skipped, and the copy-on-write policy flag is ignored.
impl PartialEq for Treemap {
    fn eq(&self, other: &Self) -> bool {
        let mut own = self.map.iter().filter(|(_, bitmap)| !bitmap.is_empty());
        let mut others = other.map.iter().filter(|(_, bitmap)| !bitmap.is_empty());
        loop {
            match (own.next(), others.next()) {
                (None, None) => return true,
                (Some((own_key, own_bitmap)), Some((other_key, other_bitmap))) => {
                    if own_key != other_key || own_bitmap != other_bitmap {
                        return false;
                    }
                }
                _ => return false,
            }
        }
    }
}

impl Eq for Treemap {}

macro_rules! impl_binop {
    ($trait_name:ident, $fn_name:ident, $op:ident, $doc_op:literal) => {
        impl $trait_name for Treemap {
            type Output = Treemap;

            #[doc = concat!("Syntactic sugar for `.", stringify!($op), "`")]
            #[doc = ""]
            #[doc = concat!("Computes the ", $doc_op, " of the two treemaps.")]
            #[inline]
            fn $fn_name(self, other: Treemap) -> Treemap {
                self.$op(&other)
            }
        }

        impl $trait_name<&Treemap> for Treemap {
            type Output = Treemap;

            #[inline]
            fn $fn_name(self, other: &Treemap) -> Treemap {
                self.$op(other)
            }
        }

        impl $trait_name<Treemap> for &Treemap {
            type Output = Treemap;

            #[inline]
            fn $fn_name(self, other: Treemap) -> Treemap {
                self.$op(&other)
            }
        }

        impl $trait_name<&Treemap> for &Treemap {
            type Output = Treemap;

            #[inline]
            fn $fn_name(self, other: &Treemap) -> Treemap {
                self.$op(other)
            }
        }
    };
}

macro_rules! impl_binop_assign {
    ($trait_name:ident, $fn_name:ident, $op:ident) => {
        impl $trait_name for Treemap {
            #[doc = concat!("Syntactic sugar for `.", stringify!($op), "`")]
            #[inline]
            fn $fn_name(&mut self, other: Treemap) {
                self.$op(&other);
            }
        }

        impl $trait_name<&Treemap> for Treemap {
            #[inline]
            fn $fn_name(&mut self, other: &Treemap) {
                self.$op(other);
            }
        }
    };
}

impl_binop!(BitAnd, bitand, and, "intersection");
impl_binop!(BitOr, bitor, or, "union");
impl_binop!(BitXor, bitxor, xor, "symmetric difference");
impl_binop!(Sub, sub, andnot, "difference");

impl_binop_assign!(BitAndAssign, bitand_assign, and_inplace);
impl_binop_assign!(BitOrAssign, bitor_assign, or_inplace);
impl_binop_assign!(BitXorAssign, bitxor_assign, xor_inplace);
impl_binop_assign!(SubAssign, sub_assign, andnot_inplace);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_skips_empty_inner_bitmaps() {
        let plain = Treemap::of(&[1, 2]);
        let mut with_hole = Treemap::from(BTreeMap::from([
            (0, Bitmap::of(&[1, 2])),
            (7, Bitmap::new()),
        ]));
        assert_eq!(plain, with_hole);
        with_hole.set_copy_on_write(true);
        assert_eq!(plain, with_hole);
        with_hole.add(3);
        assert_ne!(plain, with_hole);
    }

    #[test]
    fn operator_sugar_matches_methods() {
        let a = Treemap::of(&[1, 2, u64::MAX]);
        let b = Treemap::of(&[2, 3]);
        assert_eq!(&a | &b, a.or(&b));
        assert_eq!(&a & &b, a.and(&b));
        assert_eq!(&a ^ &b, a.xor(&b));
        assert_eq!(&a - &b, a.andnot(&b));
    }
}
