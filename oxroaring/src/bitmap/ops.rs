use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Sub, SubAssign};

use super::Bitmap;

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.cardinality() < 32 {
            write!(f, "Bitmap<{:?}>", self.to_vec())
        } else {
            write!(
                f,
                "Bitmap<{:?} values between {:?} and {:?}>",
                self.cardinality(),
                self.minimum().expect("non-empty"),
                self.maximum().expect("non-empty")
            )
        }
    }
}

impl Default for Bitmap {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a new bitmap from a slice of u32 values
///
/// # Examples
///
/// ```
/// use oxroaring::Bitmap;
///
/// let data: &[u32] = &[1, 2, 3];
///
/// let bitmap1 = Bitmap::from(data);
/// let bitmap2 = Bitmap::from_range(1..=3);
/// assert_eq!(bitmap1, bitmap2);
/// ```
impl From<&'_ [u32]> for Bitmap {
    #[inline]
    fn from(values: &'_ [u32]) -> Self {
        Self::of(values)
    }
}

/// Create a new bitmap from an array of u32 values
///
/// # Examples
///
/// ```
/// use oxroaring::Bitmap;
///
/// let bitmap1 = Bitmap::from([1, 2, 3]);
/// let bitmap2 = Bitmap::from_range(1..=3);
/// assert_eq!(bitmap1, bitmap2);
/// ```
impl<const N: usize> From<[u32; N]> for Bitmap {
    #[inline]
    fn from(values: [u32; N]) -> Self {
        Self::of(&values)
    }
}

impl PartialEq for Bitmap {
    fn eq(&self, other: &Self) -> bool {
        self.keys == other.keys && self.containers == other.containers
    }
}

impl Eq for Bitmap {}

macro_rules! impl_binop {
    ($trait_name:ident, $fn_name:ident, $op:ident, $doc_op:literal) => {
        impl $trait_name for Bitmap {
            type Output = Bitmap;

            #[doc = concat!("Syntactic sugar for `.", stringify!($op), "`")]
            #[doc = ""]
            #[doc = concat!("Computes the ", $doc_op, " of the two bitmaps.")]
            #[inline]
            fn $fn_name(self, other: Bitmap) -> Bitmap {
                self.$op(&other)
            }
        }

        impl $trait_name<&Bitmap> for Bitmap {
            type Output = Bitmap;

            #[inline]
            fn $fn_name(self, other: &Bitmap) -> Bitmap {
                self.$op(other)
            }
        }

        impl $trait_name<Bitmap> for &Bitmap {
            type Output = Bitmap;

            #[inline]
            fn $fn_name(self, other: Bitmap) -> Bitmap {
                self.$op(&other)
            }
        }

        impl $trait_name<&Bitmap> for &Bitmap {
            type Output = Bitmap;

            #[inline]
            fn $fn_name(self, other: &Bitmap) -> Bitmap {
                self.$op(other)
            }
        }
    };
}

macro_rules! impl_binop_assign {
    ($trait_name:ident, $fn_name:ident, $op:ident) => {
        impl $trait_name for Bitmap {
            #[doc = concat!("Syntactic sugar for `.", stringify!($op), "`")]
            #[inline]
            fn $fn_name(&mut self, other: Bitmap) {
                self.$op(&other);
            }
        }

        impl $trait_name<&Bitmap> for Bitmap {
            #[inline]
            fn $fn_name(&mut self, other: &Bitmap) {
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
    fn operator_sugar_matches_methods() {
        let a = Bitmap::of(&[1, 2, 3]);
        let b = Bitmap::of(&[3, 4]);
        assert_eq!(&a | &b, a.or(&b));
        assert_eq!(&a & &b, a.and(&b));
        assert_eq!(&a ^ &b, a.xor(&b));
        assert_eq!(&a - &b, a.andnot(&b));

        let mut c = a.clone();
        c |= &b;
        assert_eq!(c, a.or(&b));
        let mut c = a.clone();
        c &= &b;
        assert_eq!(c, a.and(&b));
        let mut c = a.clone();
        c ^= &b;
        assert_eq!(c, a.xor(&b));
        let mut c = a;
        c -= &b;
        assert_eq!(c, Bitmap::of(&[1, 2]));
    }
}
