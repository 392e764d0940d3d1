// Version 5 decoder: byte-addressed automata with explicit goto fields.
//
// The arcs region opens with a dummy node (one terminal arc, label 0) and an
// epsilon node whose single arc points at the root, so the root address is
// derived from the layout instead of being stored.

use crate::flags::FsaFlags;
use crate::format;
use crate::{Fsa, FsaError};

/// Version byte identifying this format.
pub const VERSION: u8 = 5;

/// Goto-field bit: the sequence spelled up to this arc is accepted.
pub const BIT_FINAL_ARC: u8 = 1 << 0;

/// Goto-field bit: this arc is the last one of its node.
pub const BIT_LAST_ARC: u8 = 1 << 1;

/// Goto-field bit: the target node follows this arc, which then stores no
/// address.
pub const BIT_TARGET_NEXT: u8 = 1 << 2;

/// Bits the target address is shifted past inside the goto field.
pub const ADDRESS_OFFSET: u32 = 3;

/// A version 5 automaton.
///
/// Node and arc handles are byte offsets into the arcs region. An arc is a
/// label byte followed by a little-endian goto field of `gtl` bytes whose
/// low three bits are flags; NEXT arcs drop the address and occupy two
/// bytes. When counts are stored, every node is prefixed by
/// `node_data_length` bytes of little-endian right-language count.
pub struct Fsa5 {
    arcs: Vec<u8>,
    filler: u8,
    annotation: u8,
    node_data_length: usize,
    gtl: usize,
    flags: FsaFlags,
}

impl Fsa5 {
    /// Decode a complete version 5 image, preamble included.
    pub fn from_bytes(data: &[u8]) -> Result<Fsa5, FsaError> {
        let header = format::parse_header(data)?;
        if header.version != VERSION {
            return Err(FsaError::UnsupportedVersion {
                version: header.version,
            });
        }
        let node_data_length = usize::from(header.gtl >> 4);
        let gtl = usize::from(header.gtl & 0x0F);
        // the region must hold at least the dummy and epsilon nodes
        let minimum = 2 * (node_data_length + 1 + gtl);
        if data.len() < format::HEADER_SIZE + minimum {
            return Err(FsaError::TooShort {
                expected: format::HEADER_SIZE + minimum,
                actual: data.len(),
            });
        }
        let mut flags =
            FsaFlags::FLEXIBLE | FsaFlags::STOPBIT | FsaFlags::NEXTBIT | FsaFlags::SEPARATORS;
        if node_data_length > 0 {
            flags |= FsaFlags::NUMBERS;
        }
        Ok(Fsa5 {
            arcs: data[format::HEADER_SIZE..].to_vec(),
            filler: header.filler,
            annotation: header.annotation,
            node_data_length,
            gtl,
            flags,
        })
    }

    /// Filler byte from the header.
    #[inline]
    pub fn filler(&self) -> u8 {
        self.filler
    }

    /// Annotation-separator byte from the header.
    #[inline]
    pub fn annotation(&self) -> u8 {
        self.annotation
    }

    /// True if the target of `arc` is laid out directly behind it.
    #[inline]
    pub fn is_next_set(&self, arc: u32) -> bool {
        self.arcs[arc as usize + 1] & BIT_TARGET_NEXT != 0
    }

    /// True if `arc` is the last outgoing arc of its node.
    #[inline]
    pub fn is_arc_last(&self, arc: u32) -> bool {
        self.arcs[arc as usize + 1] & BIT_LAST_ARC != 0
    }

    /// Little-endian goto field of a non-NEXT arc.
    #[inline]
    fn goto_field(&self, arc: u32) -> u64 {
        let start = arc as usize + 1;
        let mut field = 0u64;
        for (i, &byte) in self.arcs[start..start + self.gtl].iter().enumerate() {
            field |= u64::from(byte) << (8 * i);
        }
        field
    }

    /// Offset just past `arc`.
    #[inline]
    fn skip_arc(&self, arc: u32) -> u32 {
        if self.is_next_set(arc) {
            arc + 2
        } else {
            arc + 1 + self.gtl as u32
        }
    }

    #[inline]
    fn destination(&self, arc: u32) -> u32 {
        if self.is_next_set(arc) {
            self.skip_arc(arc)
        } else {
            (self.goto_field(arc) >> ADDRESS_OFFSET) as u32
        }
    }
}

impl Fsa for Fsa5 {
    fn flags(&self) -> FsaFlags {
        self.flags
    }

    fn root_node(&self) -> u32 {
        let epsilon = self.skip_arc(self.first_arc(0));
        self.destination(self.first_arc(epsilon))
    }

    fn first_arc(&self, node: u32) -> u32 {
        node + self.node_data_length as u32
    }

    fn next_arc(&self, arc: u32) -> u32 {
        if self.is_arc_last(arc) {
            0
        } else {
            self.skip_arc(arc)
        }
    }

    fn arc_label(&self, arc: u32) -> u8 {
        self.arcs[arc as usize]
    }

    fn is_arc_final(&self, arc: u32) -> bool {
        self.arcs[arc as usize + 1] & BIT_FINAL_ARC != 0
    }

    fn is_arc_terminal(&self, arc: u32) -> bool {
        !self.is_next_set(arc) && self.goto_field(arc) >> ADDRESS_OFFSET == 0
    }

    fn end_node(&self, arc: u32) -> u32 {
        self.destination(arc)
    }

    fn right_language_count(&self, node: u32) -> u32 {
        let start = node as usize;
        let mut count = 0u32;
        for (i, &byte) in self.arcs[start..start + self.node_data_length]
            .iter()
            .enumerate()
        {
            count |= u32::from(byte) << (8 * i);
        }
        count
    }
}
