//! Serialization for fixed-width typed arrays and the on-disk layout of the
//! memory-mapped backend.
//!
//! Two related but distinct formats live here:
//!
//! - **Wire stream**: `magic(4) | version(2) | typeCode(1) | length(4) |
//!   bytes…` — produced by [`write_fixed_width`] / consumed by
//!   [`read_fixed_width`]. This is what `TypedArray::write`/`TypedArray::read`
//!   use; it has no notion of capacity or default value, only the live
//!   elements.
//! - **Mapped-backend header**: `{magic, version, TypeCode, length,
//!   capacity, defaultValue}`, big-endian, followed by `capacity * WIDTH`
//!   bytes of slot data. This is the persisted layout backing
//!   [`crate::array::Backend::Mapped`].
//!
//! Both formats use `byteorder` for the big-endian encoding throughout.

use std::io::{self, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::array::element::{ArrayElement, FixedWidth};
use crate::error::Result;
use crate::frame::{Frame, Key};
use crate::types::TypeCode;

/// Magic bytes opening both the wire stream and the mapped-backend header:
/// ASCII `TBLN`.
const MAGIC: u32 = 0x54_42_4C_4E;

/// Format version written after [`MAGIC`]; bumped on any incompatible layout
/// change.
const VERSION: u16 = 1;

/// Maps a `TypeCode` to its on-disk tag byte. Stable across versions --
/// never renumber an existing variant, only append.
fn type_code_tag(type_code: TypeCode) -> u8 {
    match type_code {
        TypeCode::Bool => 0,
        TypeCode::Int32 => 1,
        TypeCode::Int64 => 2,
        TypeCode::Float64 => 3,
        TypeCode::Str => 4,
        TypeCode::Enum => 5,
        TypeCode::Date => 6,
        TypeCode::DateTimeLocal => 7,
        TypeCode::DateTimeZoned => 8,
        TypeCode::TimeLocal => 9,
        TypeCode::Currency => 10,
        TypeCode::Year => 11,
        TypeCode::Instant => 12,
        TypeCode::Object => 13,
    }
}

/// The inverse of [`type_code_tag`]. Fails on a tag this build doesn't
/// recognize (e.g. a file written by a newer version).
fn tag_to_type_code(tag: u8) -> io::Result<TypeCode> {
    Ok(match tag {
        0 => TypeCode::Bool,
        1 => TypeCode::Int32,
        2 => TypeCode::Int64,
        3 => TypeCode::Float64,
        4 => TypeCode::Str,
        5 => TypeCode::Enum,
        6 => TypeCode::Date,
        7 => TypeCode::DateTimeLocal,
        8 => TypeCode::DateTimeZoned,
        9 => TypeCode::TimeLocal,
        10 => TypeCode::Currency,
        11 => TypeCode::Year,
        12 => TypeCode::Instant,
        13 => TypeCode::Object,
        other => return Err(io::Error::new(io::ErrorKind::InvalidData, format!("unknown type code tag {other}"))),
    })
}

/// Writes the self-describing wire stream for a fixed-width element slice:
/// `magic | version | type_code | length | values...`.
pub fn write_fixed_width<T: FixedWidth + ArrayElement, W: Write>(sink: &mut W, values: &[T]) -> io::Result<()> {
    sink.write_u32::<BigEndian>(MAGIC)?;
    sink.write_u16::<BigEndian>(VERSION)?;
    sink.write_u8(type_code_tag(T::TYPE_CODE))?;
    sink.write_u32::<BigEndian>(values.len() as u32)?;
    let mut buf = vec![0_u8; T::WIDTH];
    for value in values {
        value.write_be(&mut buf);
        sink.write_all(&buf)?;
    }
    Ok(())
}

/// Reads back a stream produced by [`write_fixed_width`]. Fails if the
/// encoded `TypeCode` doesn't match `T`.
pub fn read_fixed_width<T: FixedWidth + ArrayElement, R: Read>(source: &mut R) -> io::Result<Vec<T>> {
    let magic = source.read_u32::<BigEndian>()?;
    if magic != MAGIC {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "bad magic"));
    }
    let _version = source.read_u16::<BigEndian>()?;
    let tag = source.read_u8()?;
    let type_code = tag_to_type_code(tag)?;
    if type_code != T::TYPE_CODE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("stream holds {type_code}, expected {}", T::TYPE_CODE),
        ));
    }
    let length = source.read_u32::<BigEndian>()? as usize;
    let mut buf = vec![0_u8; T::WIDTH];
    let mut values = Vec::with_capacity(length);
    for _ in 0..length {
        source.read_exact(&mut buf)?;
        values.push(T::read_be(&buf));
    }
    Ok(values)
}

/// The zone names a `DATETIME-ZONED` mapped array's `zoneId` field indexes
/// into, embedded in the header so a persisted zone id stays meaningful
/// across a process restart.
pub type ZoneDictionary = Vec<String>;

fn zone_dictionary_encoded_len(zones: &[String]) -> usize {
    2 + zones.iter().map(|z| 2 + z.len()).sum::<usize>()
}

fn write_zone_dictionary(buf: &mut [u8], zones: &[String]) {
    let mut cursor = buf;
    cursor
        .write_u16::<BigEndian>(zones.len() as u16)
        .expect("zone dictionary buffer sized");
    for zone in zones {
        let bytes = zone.as_bytes();
        cursor
            .write_u16::<BigEndian>(bytes.len() as u16)
            .expect("zone dictionary buffer sized");
        cursor.write_all(bytes).expect("zone dictionary buffer sized");
    }
}

fn read_zone_dictionary(buf: &[u8]) -> io::Result<ZoneDictionary> {
    let mut cursor = buf;
    let count = cursor.read_u16::<BigEndian>()?;
    let mut zones = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let len = cursor.read_u16::<BigEndian>()? as usize;
        let mut bytes = vec![0_u8; len];
        cursor.read_exact(&mut bytes)?;
        zones.push(String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?);
    }
    Ok(zones)
}

/// Header written ahead of a mapped backend's slot data.
///
/// `Self::FIXED_SIZE` covers `magic`/`version`/`type_code`/`length`/
/// `capacity`; a length-prefixed `default_value`.
#[derive(Debug, Clone)]
pub struct MappedHeader {
    /// The array's `TypeCode`.
    pub type_code: TypeCode,
    /// Live element count at the time the header was written.
    pub length: u32,
    /// Total slot count backing the region.
    pub capacity: u32,
    /// The fill value's `FixedWidth` big-endian encoding.
    pub default_value: Vec<u8>,
    /// Present only for `TypeCode::DateTimeZoned`; the zone names `zoneId`
    /// indexes into.
    pub zone_dictionary: Option<ZoneDictionary>,
}

impl MappedHeader {
    /// `magic(4) + version(2) + type_code(1) + length(4) + capacity(4)`.
    pub const FIXED_SIZE: usize = 4 + 2 + 1 + 4 + 4;

    /// Total header length, including `default_value` and (when present)
    /// the zone dictionary.
    pub fn total_len(&self) -> usize {
        Self::FIXED_SIZE
            + 2
            + self.default_value.len()
            + self
                .zone_dictionary
                .as_ref()
                .map_or(0, |zones| zone_dictionary_encoded_len(zones))
    }

    /// Serializes the header, big-endian, into `buf[..self.total_len()]`.
    pub fn write(&self, buf: &mut [u8]) {
        let (fixed, rest) = buf.split_at_mut(Self::FIXED_SIZE);
        let mut cursor = fixed;
        cursor.write_u32::<BigEndian>(MAGIC).expect("header buffer sized");
        cursor.write_u16::<BigEndian>(VERSION).expect("header buffer sized");
        cursor
            .write_u8(type_code_tag(self.type_code))
            .expect("header buffer sized");
        cursor
            .write_u32::<BigEndian>(self.length)
            .expect("header buffer sized");
        cursor
            .write_u32::<BigEndian>(self.capacity)
            .expect("header buffer sized");
        let (mut default_len_buf, rest) = rest.split_at_mut(2);
        default_len_buf
            .write_u16::<BigEndian>(self.default_value.len() as u16)
            .expect("header buffer sized");
        let (default_buf, rest) = rest.split_at_mut(self.default_value.len());
        default_buf.copy_from_slice(&self.default_value);
        if let Some(zones) = &self.zone_dictionary {
            write_zone_dictionary(rest, zones);
        }
    }

    /// Deserializes a header from `buf`, reading `default_value` and (for
    /// `TypeCode::DateTimeZoned`) the trailing zone dictionary back out.
    pub fn read(buf: &[u8]) -> io::Result<Self> {
        let mut cursor = buf;
        let magic = cursor.read_u32::<BigEndian>()?;
        if magic != MAGIC {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "bad magic"));
        }
        let _version = cursor.read_u16::<BigEndian>()?;
        let tag = cursor.read_u8()?;
        let type_code = tag_to_type_code(tag)?;
        let length = cursor.read_u32::<BigEndian>()?;
        let capacity = cursor.read_u32::<BigEndian>()?;
        let default_len = cursor.read_u16::<BigEndian>()? as usize;
        let mut default_value = vec![0_u8; default_len];
        cursor.read_exact(&mut default_value)?;
        let zone_dictionary = if type_code == TypeCode::DateTimeZoned {
            Some(read_zone_dictionary(cursor)?)
        } else {
            None
        };
        Ok(Self {
            type_code,
            length,
            capacity,
            default_value,
            zone_dictionary,
        })
    }
}

/// Generic over a configurator type `O` (e.g. CSV dialect options, a SQL
/// connection string) rather than carrying an associated type, so a single
/// adapter crate can implement `Source` for more than one `O` without a
/// newtype wrapper. This crate ships no concrete implementation -- CSV,
/// JSON and SQL adapters are external collaborators.
pub trait Source<R: Key, C: Key, O> {
    /// Reads a complete frame, consuming `configurator` for any
    /// adapter-specific options.
    fn read(&self, configurator: O) -> Result<Frame<R, C>>;
}

/// The write-side counterpart of [`Source`].
pub trait Sink<R: Key, C: Key, O> {
    /// Writes `frame` out, consuming `configurator` for any adapter-specific
    /// options.
    fn write(&self, frame: &Frame<R, C>, configurator: O) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_round_trips_i64() {
        let values: Vec<i64> = vec![1, -2, 3, i64::MAX, i64::MIN];
        let mut buf = Vec::new();
        write_fixed_width(&mut buf, &values).unwrap();
        let decoded: Vec<i64> = read_fixed_width(&mut &buf[..]).unwrap();
        assert_eq!(values, decoded);
    }

    #[test]
    fn stream_rejects_type_mismatch() {
        let values: Vec<i32> = vec![1, 2, 3];
        let mut buf = Vec::new();
        write_fixed_width(&mut buf, &values).unwrap();
        let decoded: io::Result<Vec<f64>> = read_fixed_width(&mut &buf[..]);
        assert!(decoded.is_err());
    }

    #[test]
    fn frame_round_trips_through_fixed_width_per_numeric_column() {
        use crate::frame::Frame;

        let mut frame = Frame::<&str, &str>::from_uniform(["r0", "r1", "r2"], ["c0", "c1"], TypeCode::Float64).unwrap();
        for (row, c0, c1) in [("r0", 1.5, -2.0), ("r1", 2.5, 0.0), ("r2", 3.5, 9.25)] {
            frame.set_f64(&row, &"c0", c0).unwrap();
            frame.set_f64(&row, &"c1", c1).unwrap();
        }

        for col in ["c0", "c1"] {
            let values = frame.numeric_column(&col).unwrap();
            let mut buf = Vec::new();
            write_fixed_width(&mut buf, &values).unwrap();
            let decoded: Vec<f64> = read_fixed_width(&mut &buf[..]).unwrap();
            assert_eq!(values, decoded);
        }
    }

    #[test]
    fn header_round_trips() {
        let header = MappedHeader {
            type_code: TypeCode::Float64,
            length: 7,
            capacity: 100,
            default_value: 0.0_f64.to_be_bytes().to_vec(),
            zone_dictionary: None,
        };
        let mut buf = vec![0_u8; header.total_len()];
        header.write(&mut buf);
        let decoded = MappedHeader::read(&buf).unwrap();
        assert_eq!(decoded.type_code, TypeCode::Float64);
        assert_eq!(decoded.length, 7);
        assert_eq!(decoded.capacity, 100);
        assert_eq!(decoded.default_value, header.default_value);
        assert!(decoded.zone_dictionary.is_none());
    }

    #[test]
    fn header_round_trips_zone_dictionary() {
        let header = MappedHeader {
            type_code: TypeCode::DateTimeZoned,
            length: 3,
            capacity: 16,
            default_value: vec![0_u8; 10],
            zone_dictionary: Some(vec!["UTC".to_string(), "America/New_York".to_string()]),
        };
        let mut buf = vec![0_u8; header.total_len()];
        header.write(&mut buf);
        let decoded = MappedHeader::read(&buf).unwrap();
        assert_eq!(decoded.default_value, header.default_value);
        assert_eq!(decoded.zone_dictionary, header.zone_dictionary);
        assert_eq!(decoded.total_len(), header.total_len());
    }
}
