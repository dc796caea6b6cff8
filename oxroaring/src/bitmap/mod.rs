//! A compressed bitmap over 32-bit unsigned integers.
//!
//! The body is an ordered association from the high 16 bits of each stored
//! value to a [container](crate::container) holding the low 16 bits.
//!
//! # Example
//!
//! ```rust
//! use oxroaring::Bitmap;
//!
//! let mut bitmap = Bitmap::new();
//! bitmap.add(1);
//! bitmap.add(2);
//! bitmap.add_range(100..1000);
//! assert_eq!(bitmap.cardinality(), 902);
//! assert!(bitmap.contains(500));
//! ```

use crate::container::Container;

/// A compressed bitmap of `u32` values.
#[derive(Clone)]
pub struct Bitmap {
    // Parallel vectors sorted by key; `containers[i]` holds the values
    // whose high 16 bits equal `keys[i]`. No empty container survives a
    // public call.
    pub(crate) keys: Vec<u16>,
    pub(crate) containers: Vec<Container>,
}

/// Detailed statistics on the composition of a bitmap
///
/// See [`Bitmap::statistics`] for more information
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Statistics {
    /// Number of containers in the bitmap
    pub n_containers: u32,
    /// Number of array containers in the bitmap
    pub n_array_containers: u32,
    /// Number of run containers in the bitmap
    pub n_run_containers: u32,
    /// Number of bitset containers in the bitmap
    pub n_bitset_containers: u32,
    /// Number of values stored in array containers
    pub n_values_array_containers: u32,
    /// Number of values stored in run containers
    pub n_values_run_containers: u32,
    /// Number of values stored in bitset containers
    pub n_values_bitset_containers: u32,
    /// Number of bytes used by array containers
    pub n_bytes_array_containers: u32,
    /// Number of bytes used by run containers
    pub n_bytes_run_containers: u32,
    /// Number of bytes used by bitset containers
    pub n_bytes_bitset_containers: u32,
    /// Maximum value stored in the bitmap, 0 if empty
    pub max_value: u32,
    /// Minimum value stored in the bitmap, 0 if empty
    pub min_value: u32,
    /// Number of values stored in the bitmap
    pub cardinality: u64,
}

mod imp;
mod iter;
mod lazy;
mod ops;
pub(crate) mod serialization;
mod view;

pub use self::iter::{BitmapCursor, BitmapIterator};
pub use self::lazy::LazyBitmap;
pub use self::serialization::{Deserializer, Serializer, ViewDeserializer};
pub use self::view::BitmapView;
