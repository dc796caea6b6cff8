use byteorder::{BigEndian, ByteOrder, LittleEndian};

use super::view::TreemapView;
use super::Treemap;
use crate::bitmap::serialization::write_frozen;
use crate::bitmap::BitmapView;
use crate::serialization::DeserializeError;
use crate::{Bitmap, Frozen, JvmLegacy, Portable};

pub trait Serializer: crate::sealed::Sealed {
    /// Serializes the treemap, appending to `dst` and returning the
    /// serialized region.
    fn serialize_into<'a>(treemap: &Treemap, dst: &'a mut Vec<u8>) -> &'a [u8];

    /// Exact number of bytes the serialized treemap occupies.
    fn get_serialized_size_in_bytes(treemap: &Treemap) -> usize;
}

pub trait Deserializer: crate::sealed::Sealed {
    /// Rebuilds a treemap from `buffer`, refusing truncated or corrupt
    /// input without reading past the end.
    fn try_deserialize(buffer: &[u8]) -> Result<Treemap, DeserializeError>;
}

pub trait ViewDeserializer: crate::sealed::Sealed {
    /// Builds a read-only view borrowing `data`.
    fn deserialize_view(data: &[u8]) -> Result<TreemapView<'_>, DeserializeError>;
}

impl Treemap {
    /// Serializes the treemap to a buffer in the given format.
    ///
    /// Inner bitmaps that happen to be empty are not written.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::{Portable, Treemap};
    ///
    /// let treemap = Treemap::of(&[100, u64::MAX]);
    /// let serialized = treemap.serialize::<Portable>();
    /// assert_eq!(Treemap::deserialize::<Portable>(&serialized), treemap);
    /// ```
    pub fn serialize<S: Serializer>(&self) -> Vec<u8> {
        let mut dst = Vec::new();
        S::serialize_into(self, &mut dst);
        dst
    }

    /// Serializes the treemap, appending to an existing vec.
    ///
    /// The frozen format pads the vec so that the returned region is
    /// 32-byte aligned; the region is returned in every case.
    pub fn serialize_into_vec<'a, S: Serializer>(&self, dst: &'a mut Vec<u8>) -> &'a [u8] {
        S::serialize_into(self, dst)
    }

    /// Number of bytes [`serialize`][Self::serialize] would produce.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::{JvmLegacy, Portable, Treemap};
    ///
    /// let treemap = Treemap::of(&[1, 2, 3]);
    /// assert_eq!(
    ///     treemap.serialize::<Portable>().len(),
    ///     treemap.get_serialized_size_in_bytes::<Portable>(),
    /// );
    /// assert_eq!(
    ///     treemap.serialize::<JvmLegacy>().len(),
    ///     treemap.get_serialized_size_in_bytes::<JvmLegacy>(),
    /// );
    /// ```
    pub fn get_serialized_size_in_bytes<S: Serializer>(&self) -> usize {
        S::get_serialized_size_in_bytes(self)
    }

    /// Given a serialized treemap, returns a `Treemap` instance.
    ///
    /// Malformed input fails with a [`DeserializeError`]; a truncated
    /// prefix of a valid stream is always refused.
    pub fn try_deserialize<D: Deserializer>(buffer: &[u8]) -> Result<Self, DeserializeError> {
        D::try_deserialize(buffer)
    }

    /// Given a serialized treemap, returns a `Treemap` instance.
    ///
    /// # Panics
    ///
    /// If the input is malformed; use
    /// [`try_deserialize`][Self::try_deserialize] to handle untrusted
    /// buffers.
    pub fn deserialize<D: Deserializer>(buffer: &[u8]) -> Self {
        Self::try_deserialize::<D>(buffer).expect("failed to deserialize treemap")
    }

    fn non_empty(&self) -> impl Iterator<Item = (&u32, &Bitmap)> {
        self.map.iter().filter(|(_, bitmap)| !bitmap.is_empty())
    }
}

/// Format used by the C++ `Roaring64Map`: a `u64` map size, then for each
/// entry a `u32` key followed by the portable 32-bit body.
impl Serializer for Portable {
    fn serialize_into<'a>(treemap: &Treemap, dst: &'a mut Vec<u8>) -> &'a [u8] {
        let start = dst.len();
        dst.reserve(Self::get_serialized_size_in_bytes(treemap));
        let count = treemap.non_empty().count() as u64;
        dst.extend_from_slice(&count.to_le_bytes());
        for (&key, bitmap) in treemap.non_empty() {
            dst.extend_from_slice(&key.to_le_bytes());
            bitmap.serialize_into_vec::<Portable>(dst);
        }
        &dst[start..]
    }

    fn get_serialized_size_in_bytes(treemap: &Treemap) -> usize {
        treemap.non_empty().fold(8, |total, (_, bitmap)| {
            total + 4 + bitmap.get_serialized_size_in_bytes::<Portable>()
        })
    }
}

impl Deserializer for Portable {
    fn try_deserialize(buffer: &[u8]) -> Result<Treemap, DeserializeError> {
        if buffer.len() < 8 {
            return Err(DeserializeError::UnexpectedEnd);
        }
        let count = LittleEndian::read_u64(buffer);
        // Each entry takes at least a key and a bitmap header.
        if count > buffer.len() as u64 {
            return Err(DeserializeError::UnexpectedEnd);
        }
        let mut pos = 8;
        let mut treemap = Treemap::new();
        for _ in 0..count {
            let key_bytes = buffer
                .get(pos..pos + 4)
                .ok_or(DeserializeError::UnexpectedEnd)?;
            let key = LittleEndian::read_u32(key_bytes);
            pos += 4;
            let bitmap = Bitmap::try_deserialize::<Portable>(&buffer[pos..])?;
            pos += bitmap.get_serialized_size_in_bytes::<Portable>();
            if !bitmap.is_empty() {
                treemap.map.insert(key, bitmap);
            }
        }
        Ok(treemap)
    }
}

/// Format used by the Java `Roaring64NavigableMap`: a signedness byte, a
/// big-endian `u32` map size, then big-endian keys with portable bodies.
impl Serializer for JvmLegacy {
    fn serialize_into<'a>(treemap: &Treemap, dst: &'a mut Vec<u8>) -> &'a [u8] {
        let start = dst.len();
        dst.reserve(Self::get_serialized_size_in_bytes(treemap));
        // The boolean "signed longs" indicator; always unsigned here.
        dst.push(0);
        let count = treemap.non_empty().count() as u32;
        let mut buf = [0u8; 4];
        BigEndian::write_u32(&mut buf, count);
        dst.extend_from_slice(&buf);
        for (&key, bitmap) in treemap.non_empty() {
            BigEndian::write_u32(&mut buf, key);
            dst.extend_from_slice(&buf);
            bitmap.serialize_into_vec::<Portable>(dst);
        }
        &dst[start..]
    }

    fn get_serialized_size_in_bytes(treemap: &Treemap) -> usize {
        treemap.non_empty().fold(1 + 4, |total, (_, bitmap)| {
            total + 4 + bitmap.get_serialized_size_in_bytes::<Portable>()
        })
    }
}

impl Deserializer for JvmLegacy {
    fn try_deserialize(buffer: &[u8]) -> Result<Treemap, DeserializeError> {
        // Skip the signedness indicator.
        if buffer.len() < 5 {
            return Err(DeserializeError::UnexpectedEnd);
        }
        let count = BigEndian::read_u32(&buffer[1..5]);
        let mut pos = 5;
        let mut treemap = Treemap::new();
        for _ in 0..count {
            let key_bytes = buffer
                .get(pos..pos + 4)
                .ok_or(DeserializeError::UnexpectedEnd)?;
            let key = BigEndian::read_u32(key_bytes);
            pos += 4;
            let bitmap = Bitmap::try_deserialize::<Portable>(&buffer[pos..])?;
            pos += bitmap.get_serialized_size_in_bytes::<Portable>();
            if !bitmap.is_empty() {
                treemap.map.insert(key, bitmap);
            }
        }
        Ok(treemap)
    }
}

/// Zero padding inserted before an entry so that its frozen body (12 bytes
/// further on) lands on a 32-byte boundary.
fn frozen_entry_padding(pos: usize) -> usize {
    match (pos + 12) % Frozen::REQUIRED_ALIGNMENT {
        0 => 0,
        r => Frozen::REQUIRED_ALIGNMENT - r,
    }
}

/// Frozen 64-bit layout: a `u64` map size, then for each entry padding per
/// [`frozen_entry_padding`], a `u64` frozen body size, a `u32` key, and the
/// 32-byte-aligned frozen 32-bit body.
impl Serializer for Frozen {
    fn serialize_into<'a>(treemap: &Treemap, dst: &'a mut Vec<u8>) -> &'a [u8] {
        let len = Self::get_serialized_size_in_bytes(treemap);
        dst.reserve(len + Frozen::REQUIRED_ALIGNMENT - 1);
        let extra_offset = match (dst.as_ptr() as usize + dst.len()) % Frozen::REQUIRED_ALIGNMENT {
            0 => 0,
            r => Frozen::REQUIRED_ALIGNMENT - r,
        };
        let region_start = dst.len() + extra_offset;
        dst.resize(region_start, 0);

        let count = treemap.non_empty().count() as u64;
        dst.extend_from_slice(&count.to_le_bytes());
        for (&key, bitmap) in treemap.non_empty() {
            let pos = dst.len() - region_start;
            dst.resize(dst.len() + frozen_entry_padding(pos), 0);
            let body_size = bitmap.get_serialized_size_in_bytes::<Frozen>() as u64;
            dst.extend_from_slice(&body_size.to_le_bytes());
            dst.extend_from_slice(&key.to_le_bytes());
            let body_start = dst.len();
            write_frozen(bitmap, dst, body_start);
        }
        &dst[region_start..]
    }

    fn get_serialized_size_in_bytes(treemap: &Treemap) -> usize {
        treemap.non_empty().fold(8, |pos, (_, bitmap)| {
            pos + frozen_entry_padding(pos)
                + 12
                + bitmap.get_serialized_size_in_bytes::<Frozen>()
        })
    }
}

impl ViewDeserializer for Frozen {
    fn deserialize_view(data: &[u8]) -> Result<TreemapView<'_>, DeserializeError> {
        if data.as_ptr() as usize % Frozen::REQUIRED_ALIGNMENT != 0 {
            return Err(DeserializeError::Unaligned);
        }
        if data.len() < 8 {
            return Err(DeserializeError::UnexpectedEnd);
        }
        let count = LittleEndian::read_u64(data);
        if count > data.len() as u64 {
            return Err(DeserializeError::UnexpectedEnd);
        }
        let mut pos = 8;
        let mut view = TreemapView::empty();
        for _ in 0..count {
            pos += frozen_entry_padding(pos);
            let header = data
                .get(pos..pos + 12)
                .ok_or(DeserializeError::UnexpectedEnd)?;
            let body_size = LittleEndian::read_u64(&header[..8]) as usize;
            let key = LittleEndian::read_u32(&header[8..]);
            pos += 12;
            let body = data
                .get(pos..pos + body_size)
                .ok_or(DeserializeError::UnexpectedEnd)?;
            let bitmap_view = BitmapView::deserialize::<Frozen>(body)?;
            view.map.insert(key, bitmap_view);
            pos += body_size;
        }
        Ok(view)
    }
}
