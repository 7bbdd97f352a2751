//! Fixed-width trace header codec.
//!
//! Every trace on disk starts with a [`HEADER_BYTES`]-byte preamble whose
//! size never varies with the payload kind.  Fields are written one by one
//! with declared widths in little-endian order — the layout below is the
//! wire format, independent of host memory layout or struct packing.
//!
//! ```text
//! [0-3]    tracl   i32   trace sequence number within line
//! [4-7]    tracr   i32   trace sequence number within file
//! [8-11]   fldr    i32   field record number
//! [12-15]  tracf   i32   trace number within field record
//! [16-19]  cdp     i32   common depth point ensemble number
//! [20-21]  trid    i16   trace identification / payload format tag
//! [22-25]  offset  i32   source-receiver distance
//! [26-29]  sx      i32   source x coordinate
//! [30-33]  sy      i32   source y coordinate
//! [34-37]  gx      i32   group x coordinate
//! [38-41]  gy      i32   group y coordinate
//! [42-43]  scalco  i16   coordinate scalar
//! [44-45]  delrt   i16   delay recording time (ms)
//! [46-47]  ns      u16   number of samples in this trace
//! [48-49]  dt      u16   sample interval (microseconds)
//! [50-51]  year    i16
//! [52-53]  day     i16
//! [54-55]  hour    i16
//! [56-57]  minute  i16
//! [58-59]  sec     i16
//! [60-63]  reserved, written as zero
//! ```

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};

/// Size of the header preamble, constant for every payload kind.
pub const HEADER_BYTES: usize = 64;

/// Trace identification tag: 1-byte packed payload.
pub const TRID_CHARPACK: i16 = 101;
/// Trace identification tag: 2-byte packed payload.
pub const TRID_SHORTPACK: i16 = 102;
/// Trace identification tag: ordinary seismic data, portable float payload.
pub const TRID_SEISMIC: i16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceHeader {
    pub tracl: i32,
    pub tracr: i32,
    pub fldr: i32,
    pub tracf: i32,
    pub cdp: i32,
    pub trid: i16,
    pub offset: i32,
    pub sx: i32,
    pub sy: i32,
    pub gx: i32,
    pub gy: i32,
    pub scalco: i16,
    pub delrt: i16,
    pub ns: u16,
    pub dt: u16,
    pub year: i16,
    pub day: i16,
    pub hour: i16,
    pub minute: i16,
    pub sec: i16,
}

impl Default for TraceHeader {
    fn default() -> Self {
        Self {
            tracl: 0,
            tracr: 0,
            fldr: 0,
            tracf: 0,
            cdp: 0,
            trid: TRID_SEISMIC,
            offset: 0,
            sx: 0,
            sy: 0,
            gx: 0,
            gy: 0,
            scalco: 0,
            delrt: 0,
            ns: 0,
            dt: 0,
            year: 0,
            day: 0,
            hour: 0,
            minute: 0,
            sec: 0,
        }
    }
}

impl TraceHeader {
    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_i32::<LittleEndian>(self.tracl)?;
        writer.write_i32::<LittleEndian>(self.tracr)?;
        writer.write_i32::<LittleEndian>(self.fldr)?;
        writer.write_i32::<LittleEndian>(self.tracf)?;
        writer.write_i32::<LittleEndian>(self.cdp)?;
        writer.write_i16::<LittleEndian>(self.trid)?;
        writer.write_i32::<LittleEndian>(self.offset)?;
        writer.write_i32::<LittleEndian>(self.sx)?;
        writer.write_i32::<LittleEndian>(self.sy)?;
        writer.write_i32::<LittleEndian>(self.gx)?;
        writer.write_i32::<LittleEndian>(self.gy)?;
        writer.write_i16::<LittleEndian>(self.scalco)?;
        writer.write_i16::<LittleEndian>(self.delrt)?;
        writer.write_u16::<LittleEndian>(self.ns)?;
        writer.write_u16::<LittleEndian>(self.dt)?;
        writer.write_i16::<LittleEndian>(self.year)?;
        writer.write_i16::<LittleEndian>(self.day)?;
        writer.write_i16::<LittleEndian>(self.hour)?;
        writer.write_i16::<LittleEndian>(self.minute)?;
        writer.write_i16::<LittleEndian>(self.sec)?;
        writer.write_all(&[0u8; 4])?;
        Ok(())
    }

    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        let header = Self {
            tracl: reader.read_i32::<LittleEndian>()?,
            tracr: reader.read_i32::<LittleEndian>()?,
            fldr: reader.read_i32::<LittleEndian>()?,
            tracf: reader.read_i32::<LittleEndian>()?,
            cdp: reader.read_i32::<LittleEndian>()?,
            trid: reader.read_i16::<LittleEndian>()?,
            offset: reader.read_i32::<LittleEndian>()?,
            sx: reader.read_i32::<LittleEndian>()?,
            sy: reader.read_i32::<LittleEndian>()?,
            gx: reader.read_i32::<LittleEndian>()?,
            gy: reader.read_i32::<LittleEndian>()?,
            scalco: reader.read_i16::<LittleEndian>()?,
            delrt: reader.read_i16::<LittleEndian>()?,
            ns: reader.read_u16::<LittleEndian>()?,
            dt: reader.read_u16::<LittleEndian>()?,
            year: reader.read_i16::<LittleEndian>()?,
            day: reader.read_i16::<LittleEndian>()?,
            hour: reader.read_i16::<LittleEndian>()?,
            minute: reader.read_i16::<LittleEndian>()?,
            sec: reader.read_i16::<LittleEndian>()?,
        };
        let mut reserved = [0u8; 4];
        reader.read_exact(&mut reserved)?;
        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_size_is_constant() {
        let mut buf = Vec::new();
        TraceHeader::default().write(&mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_BYTES);
    }

    #[test]
    fn roundtrip_preserves_fields() {
        let hdr = TraceHeader {
            tracl: 7,
            fldr: -3,
            cdp: 1200,
            trid: TRID_SHORTPACK,
            offset: -450,
            scalco: -100,
            ns: 1500,
            dt: 4000,
            year: 2024,
            ..TraceHeader::default()
        };
        let mut buf = Vec::new();
        hdr.write(&mut buf).unwrap();
        let back = TraceHeader::read(&buf[..]).unwrap();
        assert_eq!(back, hdr);
    }

    #[test]
    fn layout_is_little_endian() {
        let hdr = TraceHeader {
            ns: 0x0102,
            dt: 0x0304,
            ..TraceHeader::default()
        };
        let mut buf = Vec::new();
        hdr.write(&mut buf).unwrap();
        assert_eq!(&buf[46..48], &[0x02, 0x01]);
        assert_eq!(&buf[48..50], &[0x04, 0x03]);
    }
}
