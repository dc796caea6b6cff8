//! Pure-Rust compressed bitmaps in the Roaring style.
//!
//! A [`Bitmap`] holds a set of `u32` values as a sorted sequence of 16-bit
//! keyed containers (sorted array, 8 KiB bitset, or run-length encoded),
//! picking the most compact representation as the data changes. A
//! [`Treemap`] extends the same machinery to the full `u64` domain by
//! sharding on the upper 32 bits.
//!
//! # Example
//!
//! ```rust
//! use oxroaring::Bitmap;
//!
//! let mut rb1 = Bitmap::new();
//! rb1.add(1);
//! rb1.add(2);
//! rb1.add(3);
//! rb1.add(4);
//! rb1.add(5);
//! rb1.add(100);
//! rb1.add(1000);
//! rb1.run_optimize();
//!
//! let mut rb2 = Bitmap::new();
//! rb2.add(3);
//! rb2.add(4);
//! rb2.add(1000);
//! rb2.run_optimize();
//!
//! let mut rb3 = Bitmap::new();
//!
//! assert_eq!(rb1.cardinality(), 7);
//! assert!(rb1.contains(3));
//!
//! rb1.and_inplace(&rb2);
//! rb3.add(5);
//! rb3.or_inplace(&rb1);
//!
//! let rb4 = Bitmap::fast_or(&[&rb1, &rb2, &rb3]);
//! assert!(rb4.contains(1000));
//! ```

mod container;
mod serialization;

pub mod bitmap;
pub mod treemap;

pub use bitmap::{Bitmap, BitmapCursor, BitmapIterator, BitmapView, LazyBitmap, Statistics};
pub use serialization::{DeserializeError, Frozen, JvmLegacy, Native, Portable};
pub use treemap::{CardinalityOverflowError, Treemap, TreemapCursor, TreemapIterator, TreemapView};

mod sealed {
    pub trait Sealed {}
    impl Sealed for crate::Portable {}
    impl Sealed for crate::Native {}
    impl Sealed for crate::Frozen {}
    impl Sealed for crate::JvmLegacy {}
}
