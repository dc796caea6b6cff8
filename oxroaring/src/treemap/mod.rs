//! Treemap is a compressed-bitmap structure that supports 64-bit unsigned
//! integer values, implemented as a [`BTreeMap`] of 32-bit [`Bitmap`]s
//! keyed by the upper 32 bits.
//!
//! # Example
//!
//! ```rust
//! use oxroaring::Treemap;
//!
//! let mut treemap = Treemap::new();
//! treemap.add(3);
//! assert!(treemap.contains(3));
//! treemap.add(u64::from(u32::MAX) + 1);
//! assert!(treemap.contains(u64::from(u32::MAX) + 1));
//! assert_eq!(treemap.cardinality(), 2);
//! ```

use std::collections::BTreeMap;

use thiserror::Error;

use crate::Bitmap;

mod imp;
mod iter;
mod ops;
mod serialization;
mod util;
mod view;

pub use iter::{TreemapCursor, TreemapIterator};
pub use serialization::{Deserializer, Serializer, ViewDeserializer};
pub use view::TreemapView;

/// A compressed bitmap of `u64` values, sharded over 32-bit [`Bitmap`]s.
#[derive(Clone)]
pub struct Treemap {
    /// The underlying map of bitmaps
    pub map: BTreeMap<u32, Bitmap>,
    pub(crate) copy_on_write: bool,
}

/// The completely full treemap holds 2^64 values, which does not fit in a
/// `u64` count.
///
/// Returned by [`Treemap::try_cardinality`];
/// [`Treemap::overflowing_cardinality`] reports the same condition without
/// failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("treemap is full; the cardinality 2^64 does not fit in a u64")]
pub struct CardinalityOverflowError;
