//! Optional one-time stream preamble.
//!
//! An external decision may prepend this block to a destination before its
//! first trace: a 3200-byte card-image text header (40 lines of 80
//! characters, no terminators) followed by a 400-byte binary block.  The
//! trace stream begins immediately after it.  Nothing on the read side
//! validates the block — it exists for downstream consumers that expect a
//! reel-style header.
//!
//! Binary block layout (little-endian, remainder written as zero):
//!
//! ```text
//! [0-1]   format  i16   payload format tag of the stream
//! [2-3]   hns     u16   samples per trace
//! [4-5]   hdt     u16   sample interval (microseconds)
//! [6-399] reserved
//! ```

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{self, Write};

pub const TEXT_PREAMBLE_BYTES: usize = 3200;
pub const BINARY_PREAMBLE_BYTES: usize = 400;
/// Total bytes a preamble occupies ahead of the first trace.
pub const PREAMBLE_BYTES: usize = TEXT_PREAMBLE_BYTES + BINARY_PREAMBLE_BYTES;

const CARD_BYTES: usize = 80;
const CARD_COUNT: usize = TEXT_PREAMBLE_BYTES / CARD_BYTES;

#[derive(Debug, Clone)]
pub struct StreamPreamble {
    text: [u8; TEXT_PREAMBLE_BYTES],
    pub format: i16,
    pub hns: u16,
    pub hdt: u16,
}

impl StreamPreamble {
    /// Preamble with the default card image: a client line followed by
    /// blank comment cards.
    pub fn new(format: i16, hns: u16, hdt: u16) -> Self {
        let mut preamble = Self {
            text: [b' '; TEXT_PREAMBLE_BYTES],
            format,
            hns,
            hdt,
        };
        preamble.set_card(0, "C 1 CLIENT seistream default text header");
        for line in 1..CARD_COUNT {
            preamble.set_card(line, "C");
        }
        preamble
    }

    /// Overwrite one 80-character card.  Content is space-padded or
    /// truncated to the card width; lines past the 40th are ignored.
    pub fn set_card(&mut self, line: usize, content: &str) {
        if line >= CARD_COUNT {
            return;
        }
        let start = line * CARD_BYTES;
        let card = &mut self.text[start..start + CARD_BYTES];
        card.fill(b' ');
        let bytes = content.as_bytes();
        let n = bytes.len().min(CARD_BYTES);
        card[..n].copy_from_slice(&bytes[..n]);
    }

    pub fn text(&self) -> &[u8; TEXT_PREAMBLE_BYTES] {
        &self.text
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&self.text)?;
        writer.write_i16::<LittleEndian>(self.format)?;
        writer.write_u16::<LittleEndian>(self.hns)?;
        writer.write_u16::<LittleEndian>(self.hdt)?;
        writer.write_all(&[0u8; BINARY_PREAMBLE_BYTES - 6])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_size_is_constant() {
        let mut buf = Vec::new();
        StreamPreamble::new(1, 1000, 4000).write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), PREAMBLE_BYTES);
    }

    #[test]
    fn cards_are_fixed_width_without_terminators() {
        let preamble = StreamPreamble::new(1, 0, 0);
        let text = preamble.text();
        assert!(text.starts_with(b"C 1 CLIENT"));
        assert_eq!(text[CARD_BYTES], b'C');
        assert!(!text.contains(&b'\n'));
    }

    #[test]
    fn binary_block_follows_text() {
        let mut buf = Vec::new();
        StreamPreamble::new(5, 0x0102, 0x0304).write_to(&mut buf).unwrap();
        assert_eq!(&buf[TEXT_PREAMBLE_BYTES..TEXT_PREAMBLE_BYTES + 6],
                   &[0x05, 0x00, 0x02, 0x01, 0x04, 0x03]);
    }
}
