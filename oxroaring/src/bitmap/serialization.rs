use byteorder::{ByteOrder, LittleEndian};

use super::view::{BitmapView, ContainerView};
use super::Bitmap;
use crate::container::{ArrayContainer, BitsetContainer, Container, Rle16, RunContainer};
use crate::serialization::DeserializeError;
use crate::{Frozen, Native, Portable};

/// Cookie of the interchange format when no run containers are present.
const SERIAL_COOKIE_NO_RUNCONTAINER: u32 = 12346;
/// Cookie of the interchange format when run containers are present.
const SERIAL_COOKIE: u16 = 12347;
/// With run containers, the offset table is only written at this many
/// containers or more.
const NO_OFFSET_THRESHOLD: usize = 4;

/// Leading byte of the native format: a raw sorted `u32` list follows.
const SERIALIZATION_ARRAY_UINT32: u8 = 1;
/// Leading byte of the native format: a portable bitmap body follows.
const SERIALIZATION_CONTAINER: u8 = 2;

/// Typecodes of the frozen layout.
const FROZEN_ARRAY: u8 = 1;
const FROZEN_BITSET: u8 = 2;
const FROZEN_RUN: u8 = 3;

pub trait Serializer: crate::sealed::Sealed {
    /// Serializes the bitmap, appending to `dst` and returning the
    /// serialized region.
    fn serialize_into<'a>(bitmap: &Bitmap, dst: &'a mut Vec<u8>) -> &'a [u8];

    /// Serializes the bitmap into an existing slice if it is suitable,
    /// returning the serialized region.
    fn try_serialize_into_slice<'a>(bitmap: &Bitmap, dst: &'a mut [u8]) -> Option<&'a [u8]>;

    /// Exact number of bytes the serialized bitmap occupies.
    fn get_serialized_size_in_bytes(bitmap: &Bitmap) -> usize;
}

pub trait Deserializer: crate::sealed::Sealed {
    /// Rebuilds a bitmap from `buffer`, refusing truncated or corrupt
    /// input without reading past the end.
    fn try_deserialize(buffer: &[u8]) -> Result<Bitmap, DeserializeError>;
}

pub trait ViewDeserializer: crate::sealed::Sealed {
    /// Builds a read-only view borrowing `data`.
    fn deserialize_view(data: &[u8]) -> Result<BitmapView<'_>, DeserializeError>;
}

impl Bitmap {
    /// Serializes a bitmap to a buffer in the given format.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::{Bitmap, Portable};
    ///
    /// let bitmap: Bitmap = (100..1000).collect();
    /// let serialized = bitmap.serialize::<Portable>();
    /// assert_eq!(Bitmap::deserialize::<Portable>(&serialized), bitmap);
    /// ```
    pub fn serialize<S: Serializer>(&self) -> Vec<u8> {
        let mut dst = Vec::new();
        S::serialize_into(self, &mut dst);
        dst
    }

    /// Serializes a bitmap, appending to an existing vec.
    ///
    /// The frozen format pads the vec so that the returned region is
    /// 32-byte aligned; the region is returned in every case.
    pub fn serialize_into_vec<'a, S: Serializer>(&self, dst: &'a mut Vec<u8>) -> &'a [u8] {
        S::serialize_into(self, dst)
    }

    /// Serializes into an existing slice, if there is room (and, for the
    /// frozen format, if the slice is properly aligned).
    pub fn try_serialize_into<'a, S: Serializer>(&self, dst: &'a mut [u8]) -> Option<&'a [u8]> {
        S::try_serialize_into_slice(self, dst)
    }

    /// Number of bytes [`serialize`][Self::serialize] would produce.
    pub fn get_serialized_size_in_bytes<S: Serializer>(&self) -> usize {
        S::get_serialized_size_in_bytes(self)
    }

    /// Given a serialized bitmap, returns a `Bitmap` instance.
    ///
    /// Malformed input fails with a [`DeserializeError`]; a truncated
    /// prefix of a valid stream is always refused.
    ///
    /// # Examples
    ///
    /// ```
    /// use oxroaring::{Bitmap, DeserializeError, Portable};
    ///
    /// let bitmap = Bitmap::of(&[1, 2, 5]);
    /// let serialized = bitmap.serialize::<Portable>();
    /// assert_eq!(Bitmap::try_deserialize::<Portable>(&serialized), Ok(bitmap));
    /// assert_eq!(
    ///     Bitmap::try_deserialize::<Portable>(&serialized[..serialized.len() - 1]),
    ///     Err(DeserializeError::UnexpectedEnd),
    /// );
    /// ```
    pub fn try_deserialize<D: Deserializer>(buffer: &[u8]) -> Result<Self, DeserializeError> {
        D::try_deserialize(buffer)
    }

    /// Given a serialized bitmap, returns a `Bitmap` instance.
    ///
    /// # Panics
    ///
    /// If the input is malformed; use
    /// [`try_deserialize`][Self::try_deserialize] to handle untrusted
    /// buffers.
    pub fn deserialize<D: Deserializer>(buffer: &[u8]) -> Self {
        Self::try_deserialize::<D>(buffer).expect("failed to deserialize bitmap")
    }
}

struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DeserializeError> {
        if self.buf.len() < n {
            return Err(DeserializeError::UnexpectedEnd);
        }
        let (head, rest) = self.buf.split_at(n);
        self.buf = rest;
        Ok(head)
    }

    fn u16(&mut self) -> Result<u16, DeserializeError> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    fn u32(&mut self) -> Result<u32, DeserializeError> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    fn u64(&mut self) -> Result<u64, DeserializeError> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }
}

fn portable_body_size(container: &Container) -> usize {
    match container {
        Container::Array(a) => 2 * a.cardinality(),
        Container::Bitset(_) => crate::container::BITSET_BYTES,
        Container::Run(r) => 2 + 4 * r.num_runs(),
    }
}

fn portable_header_size(bitmap: &Bitmap, has_runs: bool) -> usize {
    let n = bitmap.containers.len();
    if has_runs {
        let offsets = if n >= NO_OFFSET_THRESHOLD { 4 * n } else { 0 };
        4 + (n + 7) / 8 + 4 * n + offsets
    } else {
        8 + 4 * n + 4 * n
    }
}

fn write_container_body(container: &Container, dst: &mut Vec<u8>) {
    match container {
        Container::Array(a) => {
            for &value in a.iter() {
                dst.extend_from_slice(&value.to_le_bytes());
            }
        }
        Container::Bitset(b) => {
            for &word in b.words().iter() {
                dst.extend_from_slice(&word.to_le_bytes());
            }
        }
        Container::Run(r) => {
            dst.extend_from_slice(&(r.num_runs() as u16).to_le_bytes());
            for run in r.runs() {
                dst.extend_from_slice(&run.value.to_le_bytes());
                dst.extend_from_slice(&run.length.to_le_bytes());
            }
        }
    }
}

fn write_portable(bitmap: &Bitmap, dst: &mut Vec<u8>) {
    let has_runs = bitmap
        .containers
        .iter()
        .any(|c| matches!(c, Container::Run(_)));
    let n = bitmap.containers.len();
    if has_runs {
        dst.extend_from_slice(&SERIAL_COOKIE.to_le_bytes());
        dst.extend_from_slice(&((n - 1) as u16).to_le_bytes());
        let mut flags = vec![0u8; (n + 7) / 8];
        for (idx, container) in bitmap.containers.iter().enumerate() {
            if matches!(container, Container::Run(_)) {
                flags[idx / 8] |= 1 << (idx % 8);
            }
        }
        dst.extend_from_slice(&flags);
    } else {
        dst.extend_from_slice(&SERIAL_COOKIE_NO_RUNCONTAINER.to_le_bytes());
        dst.extend_from_slice(&(n as u32).to_le_bytes());
    }
    for (idx, container) in bitmap.containers.iter().enumerate() {
        dst.extend_from_slice(&bitmap.keys[idx].to_le_bytes());
        dst.extend_from_slice(&((container.cardinality() - 1) as u16).to_le_bytes());
    }
    if !has_runs || n >= NO_OFFSET_THRESHOLD {
        let mut offset = portable_header_size(bitmap, has_runs);
        for container in &bitmap.containers {
            dst.extend_from_slice(&(offset as u32).to_le_bytes());
            offset += portable_body_size(container);
        }
    }
    for container in &bitmap.containers {
        write_container_body(container, dst);
    }
}

/// Parses the portable header: returns (key, cardinality, is_run) per
/// container, with the reader left at the first body.
fn read_portable_header(reader: &mut Reader<'_>) -> Result<Vec<(u16, u32, bool)>, DeserializeError> {
    let cookie = reader.u32()?;
    let (n, run_flags) = if cookie & 0xFFFF == u32::from(SERIAL_COOKIE) {
        let n = (cookie >> 16) as usize + 1;
        (n, Some(reader.take((n + 7) / 8)?))
    } else if cookie == SERIAL_COOKIE_NO_RUNCONTAINER {
        (reader.u32()? as usize, None)
    } else {
        return Err(DeserializeError::InvalidCookie(cookie));
    };
    if n > 1 << 16 {
        return Err(DeserializeError::CorruptContainer);
    }
    let mut descriptors = Vec::with_capacity(n);
    let mut prev_key: Option<u16> = None;
    for idx in 0..n {
        let key = reader.u16()?;
        let cardinality = u32::from(reader.u16()?) + 1;
        if prev_key.map_or(false, |prev| prev >= key) {
            return Err(DeserializeError::KeysOutOfOrder);
        }
        prev_key = Some(key);
        let is_run = run_flags.map_or(false, |flags| flags[idx / 8] & (1 << (idx % 8)) != 0);
        descriptors.push((key, cardinality, is_run));
    }
    if run_flags.is_none() || n >= NO_OFFSET_THRESHOLD {
        reader.take(4 * n)?;
    }
    Ok(descriptors)
}

fn read_array_body(
    reader: &mut Reader<'_>,
    cardinality: u32,
) -> Result<ArrayContainer, DeserializeError> {
    let body = reader.take(2 * cardinality as usize)?;
    let mut values = Vec::with_capacity(cardinality as usize);
    for chunk in body.chunks_exact(2) {
        let value = LittleEndian::read_u16(chunk);
        if values.last().map_or(false, |&prev| prev >= value) {
            return Err(DeserializeError::CorruptContainer);
        }
        values.push(value);
    }
    Ok(ArrayContainer::from_sorted(values))
}

fn read_bitset_body(
    reader: &mut Reader<'_>,
    cardinality: u32,
) -> Result<BitsetContainer, DeserializeError> {
    let body = reader.take(crate::container::BITSET_BYTES)?;
    let bitset = BitsetContainer::from_le_bytes(body);
    if bitset.cardinality() != cardinality as usize {
        return Err(DeserializeError::CorruptContainer);
    }
    Ok(bitset)
}

fn read_run_body(
    reader: &mut Reader<'_>,
    cardinality: u32,
) -> Result<RunContainer, DeserializeError> {
    let num_runs = reader.u16()? as usize;
    let body = reader.take(4 * num_runs)?;
    let mut runs = Vec::with_capacity(num_runs);
    let mut total = 0u32;
    for chunk in body.chunks_exact(4) {
        let value = LittleEndian::read_u16(&chunk[..2]);
        let length = LittleEndian::read_u16(&chunk[2..]);
        if u32::from(value) + u32::from(length) > u32::from(u16::MAX) {
            return Err(DeserializeError::CorruptContainer);
        }
        let run = Rle16::new(value, length);
        if runs
            .last()
            .map_or(false, |prev: &Rle16| u32::from(prev.end()) + 1 >= u32::from(value))
        {
            return Err(DeserializeError::CorruptContainer);
        }
        total += u32::from(length) + 1;
        runs.push(run);
    }
    if total != cardinality {
        return Err(DeserializeError::CorruptContainer);
    }
    Ok(RunContainer::from_runs(runs))
}

fn read_portable(buffer: &[u8]) -> Result<Bitmap, DeserializeError> {
    let mut reader = Reader::new(buffer);
    let descriptors = read_portable_header(&mut reader)?;
    let mut bitmap = Bitmap::with_container_capacity(descriptors.len() as u32);
    for (key, cardinality, is_run) in descriptors {
        let container = if is_run {
            Container::Run(read_run_body(&mut reader, cardinality)?)
        } else if cardinality > crate::container::ARRAY_MAX_SIZE as u32 {
            Container::Bitset(read_bitset_body(&mut reader, cardinality)?)
        } else {
            Container::Array(read_array_body(&mut reader, cardinality)?)
        };
        bitmap.push_container(key, container);
    }
    Ok(bitmap)
}

impl Serializer for Portable {
    fn serialize_into<'a>(bitmap: &Bitmap, dst: &'a mut Vec<u8>) -> &'a [u8] {
        let start = dst.len();
        dst.reserve(Self::get_serialized_size_in_bytes(bitmap));
        write_portable(bitmap, dst);
        &dst[start..]
    }

    fn try_serialize_into_slice<'a>(bitmap: &Bitmap, dst: &'a mut [u8]) -> Option<&'a [u8]> {
        let len = Self::get_serialized_size_in_bytes(bitmap);
        if dst.len() < len {
            return None;
        }
        let mut buf = Vec::with_capacity(len);
        write_portable(bitmap, &mut buf);
        dst[..len].copy_from_slice(&buf);
        Some(&dst[..len])
    }

    fn get_serialized_size_in_bytes(bitmap: &Bitmap) -> usize {
        let has_runs = bitmap
            .containers
            .iter()
            .any(|c| matches!(c, Container::Run(_)));
        portable_header_size(bitmap, has_runs)
            + bitmap
                .containers
                .iter()
                .map(portable_body_size)
                .sum::<usize>()
    }
}

impl Deserializer for Portable {
    fn try_deserialize(buffer: &[u8]) -> Result<Bitmap, DeserializeError> {
        read_portable(buffer)
    }
}

impl Serializer for Native {
    fn serialize_into<'a>(bitmap: &Bitmap, dst: &'a mut Vec<u8>) -> &'a [u8] {
        let start = dst.len();
        let cardinality = bitmap.cardinality() as usize;
        let size_as_array = 1 + 4 + 4 * cardinality;
        let size_as_container = 1 + Portable::get_serialized_size_in_bytes(bitmap);
        if size_as_container < size_as_array {
            dst.push(SERIALIZATION_CONTAINER);
            write_portable(bitmap, dst);
        } else {
            dst.push(SERIALIZATION_ARRAY_UINT32);
            dst.extend_from_slice(&(cardinality as u32).to_le_bytes());
            for value in bitmap.iter() {
                dst.extend_from_slice(&value.to_le_bytes());
            }
        }
        &dst[start..]
    }

    fn try_serialize_into_slice<'a>(bitmap: &Bitmap, dst: &'a mut [u8]) -> Option<&'a [u8]> {
        let len = Self::get_serialized_size_in_bytes(bitmap);
        if dst.len() < len {
            return None;
        }
        let mut buf = Vec::with_capacity(len);
        Self::serialize_into(bitmap, &mut buf);
        dst[..len].copy_from_slice(&buf);
        Some(&dst[..len])
    }

    fn get_serialized_size_in_bytes(bitmap: &Bitmap) -> usize {
        let size_as_array = 1 + 4 + 4 * bitmap.cardinality() as usize;
        let size_as_container = 1 + Portable::get_serialized_size_in_bytes(bitmap);
        size_as_array.min(size_as_container)
    }
}

impl Deserializer for Native {
    fn try_deserialize(buffer: &[u8]) -> Result<Bitmap, DeserializeError> {
        let mut reader = Reader::new(buffer);
        match reader.take(1)?[0] {
            SERIALIZATION_ARRAY_UINT32 => {
                let count = reader.u32()?;
                let body = reader.take(4 * count as usize)?;
                let mut bitmap = Bitmap::new();
                for chunk in body.chunks_exact(4) {
                    bitmap.add(LittleEndian::read_u32(chunk));
                }
                Ok(bitmap)
            }
            SERIALIZATION_CONTAINER => read_portable(reader.buf),
            other => Err(DeserializeError::InvalidCookie(u32::from(other))),
        }
    }
}

/// Frozen layout, all offsets relative to the (32-byte-aligned) region
/// start:
///
/// ```text
/// u64    container count
/// u16[n] keys
/// u8[n]  typecodes (1 = array, 2 = bitset, 3 = run)
/// u16[n] counts (cardinality - 1 for array/bitset, run count for run)
/// per container, in key order:
///   zero padding to the next 32-byte boundary
///   body (array: u16 values; bitset: 1024 u64 words; run: u16 pairs)
/// ```
fn frozen_body_size(container: &Container) -> usize {
    match container {
        Container::Array(a) => 2 * a.cardinality(),
        Container::Bitset(_) => crate::container::BITSET_BYTES,
        Container::Run(r) => 4 * r.num_runs(),
    }
}

fn align_up(offset: usize, align: usize) -> usize {
    (offset + align - 1) / align * align
}

pub(crate) fn write_frozen(bitmap: &Bitmap, dst: &mut Vec<u8>, region_start: usize) {
    dst.extend_from_slice(&(bitmap.containers.len() as u64).to_le_bytes());
    for &key in &bitmap.keys {
        dst.extend_from_slice(&key.to_le_bytes());
    }
    for container in &bitmap.containers {
        dst.push(match container {
            Container::Array(_) => FROZEN_ARRAY,
            Container::Bitset(_) => FROZEN_BITSET,
            Container::Run(_) => FROZEN_RUN,
        });
    }
    for container in &bitmap.containers {
        let count = match container {
            Container::Run(r) => r.num_runs() as u16,
            _ => (container.cardinality() - 1) as u16,
        };
        dst.extend_from_slice(&count.to_le_bytes());
    }
    for container in &bitmap.containers {
        let aligned = align_up(dst.len() - region_start, Frozen::REQUIRED_ALIGNMENT);
        dst.resize(region_start + aligned, 0);
        match container {
            Container::Array(a) => {
                for &value in a.iter() {
                    dst.extend_from_slice(&value.to_le_bytes());
                }
            }
            Container::Bitset(b) => {
                for &word in b.words().iter() {
                    dst.extend_from_slice(&word.to_le_bytes());
                }
            }
            Container::Run(r) => {
                for run in r.runs() {
                    dst.extend_from_slice(&run.value.to_le_bytes());
                    dst.extend_from_slice(&run.length.to_le_bytes());
                }
            }
        }
    }
}

impl Serializer for Frozen {
    /// Serializes a bitmap to a slice of bytes in "frozen" format.
    ///
    /// This has an odd API because it always returns a slice which is
    /// aligned to 32 bytes: the returned slice may not start exactly at
    /// the beginning of the passed `Vec`.
    fn serialize_into<'a>(bitmap: &Bitmap, dst: &'a mut Vec<u8>) -> &'a [u8] {
        let len = Self::get_serialized_size_in_bytes(bitmap);
        dst.reserve(len + Frozen::REQUIRED_ALIGNMENT - 1);
        let extra_offset = match (dst.as_ptr() as usize + dst.len()) % Frozen::REQUIRED_ALIGNMENT {
            0 => 0,
            r => Frozen::REQUIRED_ALIGNMENT - r,
        };
        let offset = dst.len() + extra_offset;
        // we must initialize up to offset
        dst.resize(offset, 0);
        write_frozen(bitmap, dst, offset);
        &dst[offset..]
    }

    fn try_serialize_into_slice<'a>(bitmap: &Bitmap, dst: &'a mut [u8]) -> Option<&'a [u8]> {
        if dst.as_ptr() as usize % Frozen::REQUIRED_ALIGNMENT != 0 {
            return None;
        }
        let len = Self::get_serialized_size_in_bytes(bitmap);
        if dst.len() < len {
            return None;
        }
        let mut buf = Vec::with_capacity(len);
        write_frozen(bitmap, &mut buf, 0);
        dst[..len].copy_from_slice(&buf);
        Some(&dst[..len])
    }

    fn get_serialized_size_in_bytes(bitmap: &Bitmap) -> usize {
        let n = bitmap.containers.len();
        let mut size = 8 + 5 * n;
        for container in &bitmap.containers {
            size = align_up(size, Frozen::REQUIRED_ALIGNMENT);
            size += frozen_body_size(container);
        }
        size
    }
}

impl ViewDeserializer for Frozen {
    fn deserialize_view(data: &[u8]) -> Result<BitmapView<'_>, DeserializeError> {
        if data.as_ptr() as usize % Frozen::REQUIRED_ALIGNMENT != 0 {
            return Err(DeserializeError::Unaligned);
        }
        let mut reader = Reader::new(data);
        let n = reader.u64()?;
        if n > 1 << 16 {
            return Err(DeserializeError::CorruptContainer);
        }
        let n = n as usize;
        let keys = reader.take(2 * n)?;
        let typecodes = reader.take(n)?;
        let counts = reader.take(2 * n)?;
        let mut entries = Vec::with_capacity(n);
        let mut consumed = 8 + 5 * n;
        let mut prev_key: Option<u16> = None;
        for idx in 0..n {
            let key = LittleEndian::read_u16(&keys[2 * idx..]);
            if prev_key.map_or(false, |prev| prev >= key) {
                return Err(DeserializeError::KeysOutOfOrder);
            }
            prev_key = Some(key);
            let count = LittleEndian::read_u16(&counts[2 * idx..]);
            let padding = align_up(consumed, Frozen::REQUIRED_ALIGNMENT) - consumed;
            reader.take(padding)?;
            consumed += padding;
            let view = match typecodes[idx] {
                FROZEN_ARRAY => {
                    let body = reader.take(2 * (usize::from(count) + 1))?;
                    ContainerView::parse_array(body)?
                }
                FROZEN_BITSET => {
                    let body = reader.take(crate::container::BITSET_BYTES)?;
                    ContainerView::parse_bitset(body, u32::from(count) + 1)?
                }
                FROZEN_RUN => {
                    let body = reader.take(4 * usize::from(count))?;
                    ContainerView::parse_runs(body)?
                }
                _ => return Err(DeserializeError::CorruptContainer),
            };
            consumed += frozen_view_body_size(typecodes[idx], count);
            entries.push((key, view));
        }
        Ok(BitmapView::from_entries(entries))
    }
}

fn frozen_view_body_size(typecode: u8, count: u16) -> usize {
    match typecode {
        FROZEN_ARRAY => 2 * (usize::from(count) + 1),
        FROZEN_BITSET => crate::container::BITSET_BYTES,
        _ => 4 * usize::from(count),
    }
}

impl ViewDeserializer for Portable {
    /// Read-only view over a bitmap serialized in portable format.
    ///
    /// Container bodies are borrowed from `data` rather than copied.
    fn deserialize_view(data: &[u8]) -> Result<BitmapView<'_>, DeserializeError> {
        let mut reader = Reader::new(data);
        let descriptors = read_portable_header(&mut reader)?;
        let mut entries = Vec::with_capacity(descriptors.len());
        for (key, cardinality, is_run) in descriptors {
            let view = if is_run {
                let num_runs = reader.u16()? as usize;
                let body = reader.take(4 * num_runs)?;
                let view = ContainerView::parse_runs(body)?;
                if view.cardinality() != u64::from(cardinality) {
                    return Err(DeserializeError::CorruptContainer);
                }
                view
            } else if cardinality > crate::container::ARRAY_MAX_SIZE as u32 {
                let body = reader.take(crate::container::BITSET_BYTES)?;
                ContainerView::parse_bitset(body, cardinality)?
            } else {
                let body = reader.take(2 * cardinality as usize)?;
                ContainerView::parse_array(body)?
            };
            entries.push((key, view));
        }
        Ok(BitmapView::from_entries(entries))
    }
}
