// Binary automaton header: magic, version and layout bytes.

use std::io::{self, Write};

use crate::FsaError;

/// Magic bytes opening every automaton image: `\fsa`.
pub const FSA_MAGIC: [u8; 4] = [0x5C, 0x66, 0x73, 0x61];

/// Size of the fixed header preamble in bytes.
pub const HEADER_SIZE: usize = 8;

/// Upper bound on the bytes a dispatcher may examine before committing to a
/// decoder.
pub const MAX_HEADER_LENGTH: usize = 12;

/// Default filler byte.
pub const DEFAULT_FILLER: u8 = b'_';

/// Default annotation-separator byte.
pub const DEFAULT_ANNOTATION: u8 = b'+';

/// Fixed header preamble shared by every automaton version.
///
/// The trailing `gtl` byte is version-specific: version 5 packs the
/// node-data width and the goto-field width into its two nibbles, version
/// 0xC6 writes it as zero and stores its parameters after the preamble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    pub filler: u8,
    pub annotation: u8,
    pub gtl: u8,
}

/// Parse the fixed preamble from the start of `data`.
pub fn parse_header(data: &[u8]) -> Result<Header, FsaError> {
    if data.len() < HEADER_SIZE {
        return Err(FsaError::TooShort {
            expected: HEADER_SIZE,
            actual: data.len(),
        });
    }
    if data[0..4] != FSA_MAGIC {
        return Err(FsaError::InvalidMagic);
    }
    Ok(Header {
        version: data[4],
        filler: data[5],
        annotation: data[6],
        gtl: data[7],
    })
}

/// Write the fixed preamble.
pub fn write_header<W: Write>(header: &Header, out: &mut W) -> io::Result<()> {
    out.write_all(&FSA_MAGIC)?;
    out.write_all(&[header.version, header.filler, header.annotation, header.gtl])
}
