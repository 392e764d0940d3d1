// Version-byte dispatch: selecting a decoder from the fixed preamble.

use std::io::Read;

use crate::cfsa2::{self, Cfsa2};
use crate::flags::FsaFlags;
use crate::format::{self, HEADER_SIZE};
use crate::fsa5::{self, Fsa5};
use crate::{Fsa, FsaError};

/// An automaton in any supported binary version.
///
/// The supported set is closed: the version byte selects a variant here or
/// loading fails with [`FsaError::UnsupportedVersion`]. The enum implements
/// [`Fsa`] by delegation, so analyses never need to know which version they
/// were handed.
pub enum AnyFsa {
    /// Version 5, byte-addressed.
    Fsa5(Fsa5),
    /// Version 0xC6, compressed.
    Cfsa2(Cfsa2),
}

impl AnyFsa {
    /// Decode an automaton image, selecting the decoder by version byte.
    ///
    /// The complete image, preamble included, is handed to the selected
    /// decoder. The same bytes always produce the same variant or fail with
    /// the same error, and a failed dispatch constructs nothing.
    pub fn from_bytes(data: &[u8]) -> Result<AnyFsa, FsaError> {
        let header = format::parse_header(data)?;
        match header.version {
            fsa5::VERSION => Ok(AnyFsa::Fsa5(Fsa5::from_bytes(data)?)),
            cfsa2::VERSION => Ok(AnyFsa::Cfsa2(Cfsa2::from_bytes(data)?)),
            version => Err(FsaError::UnsupportedVersion { version }),
        }
    }

    /// Read an automaton from a stream.
    ///
    /// The fixed preamble is read and validated first, so an unsupported
    /// input fails before the rest of the stream is consumed. I/O errors
    /// propagate unchanged.
    pub fn read<R: Read>(mut reader: R) -> Result<AnyFsa, FsaError> {
        let mut data = vec![0u8; HEADER_SIZE];
        reader.read_exact(&mut data)?;
        let header = format::parse_header(&data)?;
        if header.version != fsa5::VERSION && header.version != cfsa2::VERSION {
            return Err(FsaError::UnsupportedVersion {
                version: header.version,
            });
        }
        reader.read_to_end(&mut data)?;
        AnyFsa::from_bytes(&data)
    }

    /// Version byte of the loaded automaton.
    pub fn version(&self) -> u8 {
        match self {
            AnyFsa::Fsa5(_) => fsa5::VERSION,
            AnyFsa::Cfsa2(_) => cfsa2::VERSION,
        }
    }
}

impl Fsa for AnyFsa {
    fn flags(&self) -> FsaFlags {
        match self {
            AnyFsa::Fsa5(fsa) => fsa.flags(),
            AnyFsa::Cfsa2(fsa) => fsa.flags(),
        }
    }

    fn root_node(&self) -> u32 {
        match self {
            AnyFsa::Fsa5(fsa) => fsa.root_node(),
            AnyFsa::Cfsa2(fsa) => fsa.root_node(),
        }
    }

    fn first_arc(&self, node: u32) -> u32 {
        match self {
            AnyFsa::Fsa5(fsa) => fsa.first_arc(node),
            AnyFsa::Cfsa2(fsa) => fsa.first_arc(node),
        }
    }

    fn next_arc(&self, arc: u32) -> u32 {
        match self {
            AnyFsa::Fsa5(fsa) => fsa.next_arc(arc),
            AnyFsa::Cfsa2(fsa) => fsa.next_arc(arc),
        }
    }

    fn arc_label(&self, arc: u32) -> u8 {
        match self {
            AnyFsa::Fsa5(fsa) => fsa.arc_label(arc),
            AnyFsa::Cfsa2(fsa) => fsa.arc_label(arc),
        }
    }

    fn is_arc_final(&self, arc: u32) -> bool {
        match self {
            AnyFsa::Fsa5(fsa) => fsa.is_arc_final(arc),
            AnyFsa::Cfsa2(fsa) => fsa.is_arc_final(arc),
        }
    }

    fn is_arc_terminal(&self, arc: u32) -> bool {
        match self {
            AnyFsa::Fsa5(fsa) => fsa.is_arc_terminal(arc),
            AnyFsa::Cfsa2(fsa) => fsa.is_arc_terminal(arc),
        }
    }

    fn end_node(&self, arc: u32) -> u32 {
        match self {
            AnyFsa::Fsa5(fsa) => fsa.end_node(arc),
            AnyFsa::Cfsa2(fsa) => fsa.end_node(arc),
        }
    }

    fn right_language_count(&self, node: u32) -> u32 {
        match self {
            AnyFsa::Fsa5(fsa) => fsa.right_language_count(node),
            AnyFsa::Cfsa2(fsa) => fsa.right_language_count(node),
        }
    }
}
