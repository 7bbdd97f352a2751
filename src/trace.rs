//! Trace records: one time-series of sensor samples plus header metadata.

use std::io::{self, Read};

use crate::codec::{decode_samples, PayloadKind};
use crate::header::{TraceHeader, HEADER_BYTES};

/// Global ceiling on samples per trace, first or subsequent, either length
/// mode.
pub const MAX_SAMPLES_PER_TRACE: usize = 32768;

/// One trace: header metadata plus `ns` numeric samples.
///
/// Owned by the caller; the writer only reads it during a write call and
/// never retains a reference beyond that call.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceRecord {
    pub header: TraceHeader,
    pub data: Vec<f32>,
}

impl TraceRecord {
    /// A float-payload trace with `ns` taken from the sample count.
    pub fn new(data: Vec<f32>) -> Self {
        Self::with_trid(crate::header::TRID_SEISMIC, data)
    }

    pub fn with_trid(trid: i16, data: Vec<f32>) -> Self {
        debug_assert!(data.len() <= u16::MAX as usize);
        let header = TraceHeader {
            trid,
            ns: data.len().min(u16::MAX as usize) as u16,
            ..TraceHeader::default()
        };
        Self { header, data }
    }

    /// Declared sample count from the header.
    #[inline]
    pub fn ns(&self) -> usize {
        self.header.ns as usize
    }

    /// Read back one trace: header preamble, then `ns` samples decoded by
    /// this trace's own `trid`.  Returns `Ok(None)` at a clean end of
    /// stream; a partial header or payload is an `UnexpectedEof` error.
    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Option<Self>> {
        let mut buf = [0u8; HEADER_BYTES];
        let mut filled = 0;
        while filled < HEADER_BYTES {
            match reader.read(&mut buf[filled..])? {
                0 if filled == 0 => return Ok(None),
                0 => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "truncated trace header",
                    ))
                }
                n => filled += n,
            }
        }
        let header = TraceHeader::read(&buf[..])?;
        let kind = PayloadKind::from_trid(header.trid);
        let mut payload = vec![0u8; header.ns as usize * kind.bytes_per_sample()];
        reader.read_exact(&mut payload)?;
        Ok(Some(Self {
            header,
            data: decode_samples(kind, &payload),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sets_ns_from_payload() {
        let tr = TraceRecord::new(vec![0.0; 250]);
        assert_eq!(tr.ns(), 250);
        assert_eq!(tr.data.len(), 250);
    }

    #[test]
    fn read_from_empty_stream_is_none() {
        let empty: &[u8] = &[];
        assert!(TraceRecord::read_from(&mut &*empty).unwrap().is_none());
    }

    #[test]
    fn read_from_partial_header_is_eof_error() {
        let partial = vec![0u8; HEADER_BYTES / 2];
        let err = TraceRecord::read_from(&mut &partial[..]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
