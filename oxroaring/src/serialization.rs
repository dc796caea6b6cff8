use thiserror::Error;

/// The `Portable` format is meant to be compatible with other roaring bitmap
/// libraries, such as Go or Java.
///
/// It's defined here: <https://github.com/RoaringBitmap/RoaringFormatSpec>
pub enum Portable {}

/// The `Native` format can sometimes be more space efficient than
/// [`Portable`], e.g. when the data is sparse. It's not compatible with the
/// Java and Go implementations. Use [`Portable`] for that purpose.
pub enum Native {}

/// The `Frozen` format lays out a bitmap so it can be read in place from a
/// 32-byte-aligned buffer with no per-container allocation or copying.
///
/// It is not an interchange format; the layout may change between versions
/// of this crate.
pub enum Frozen {}

impl Frozen {
    /// The frozen format requires buffers aligned to 32 bytes.
    pub const REQUIRED_ALIGNMENT: usize = 32;
}

/// The `JvmLegacy` format is meant to be compatible with the original Java
/// implementation of `Roaring64NavigableMap`.
///
/// It is used only for [Treemap][crate::Treemap]s, not bitmaps.
///
/// See <https://github.com/RoaringBitmap/RoaringBitmap/blob/master/RoaringBitmap/src/main/java/org/roaringbitmap/longlong/Roaring64NavigableMap.java>
pub enum JvmLegacy {}

/// Reasons a serialized bitmap can fail to deserialize.
///
/// Every reader in this crate checks the remaining input before reading:
/// a truncated prefix of a valid stream fails with [`UnexpectedEnd`]
/// rather than reading out of bounds, and no partially-built bitmap is
/// returned.
///
/// [`UnexpectedEnd`]: DeserializeError::UnexpectedEnd
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeserializeError {
    /// The buffer ended before the serialized bitmap did.
    #[error("unexpected end of serialized bitmap")]
    UnexpectedEnd,
    /// The stream does not start with a recognized cookie.
    #[error("unrecognized serialization cookie: {0}")]
    InvalidCookie(u32),
    /// A container body violates its invariants (out-of-order values,
    /// overlapping runs, or a descriptor that contradicts the body).
    #[error("corrupt container data")]
    CorruptContainer,
    /// The keys of the serialized containers are not strictly increasing.
    #[error("container keys out of order")]
    KeysOutOfOrder,
    /// A frozen buffer was not aligned to [`Frozen::REQUIRED_ALIGNMENT`].
    #[error("frozen buffer must be aligned to 32 bytes")]
    Unaligned,
}
