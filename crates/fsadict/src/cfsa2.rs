// Version 0xC6 decoder: compressed automata with v-int addresses and a
// label mapping for the most frequent labels.

use crate::flags::FsaFlags;
use crate::format;
use crate::{Fsa, FsaError};

/// Version byte identifying this format.
pub const VERSION: u8 = 0xC6;

/// Arc flag bit: the target node follows the last arc of this node.
pub const BIT_TARGET_NEXT: u8 = 1 << 7;

/// Arc flag bit: this arc is the last one of its node.
pub const BIT_LAST_ARC: u8 = 1 << 6;

/// Arc flag bit: the sequence spelled up to this arc is accepted.
pub const BIT_FINAL_ARC: u8 = 1 << 5;

/// Low bits of an arc's first byte indexing the label mapping; 0 means an
/// explicit label byte follows.
pub const LABEL_INDEX_MASK: u8 = 0x1F;

/// Usable label-mapping slots (index 0 is reserved).
pub const LABEL_INDEX_SIZE: usize = 31;

/// Read a little-endian base-128 integer at `offset`.
///
/// Every byte contributes seven payload bits; the high bit marks a
/// continuation. Returns the value and the offset just past it.
pub fn read_vint(data: &[u8], offset: usize) -> (u32, usize) {
    let mut pos = offset;
    let mut byte = data[pos];
    let mut value = u32::from(byte & 0x7F);
    let mut shift = 7;
    while byte & 0x80 != 0 {
        pos += 1;
        byte = data[pos];
        value |= u32::from(byte & 0x7F) << shift;
        shift += 7;
    }
    (value, pos + 1)
}

/// Append `value` in the encoding [`read_vint`] expects.
pub fn write_vint(out: &mut Vec<u8>, mut value: u32) {
    while value >= 0x80 {
        out.push((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Number of bytes [`write_vint`] emits for `value`.
pub fn vint_length(mut value: u32) -> usize {
    let mut length = 1;
    while value >= 0x80 {
        value >>= 7;
        length += 1;
    }
    length
}

/// A version 0xC6 automaton.
///
/// Node and arc handles are byte offsets into the arcs region, which starts
/// with the epsilon node whose single arc points at the root. An arc's first
/// byte packs three flag bits with a label-mapping index; non-NEXT arcs then
/// carry their target offset as a v-int, with offset 0 marking a terminal
/// arc. When counts are stored, every node is prefixed by a v-int
/// right-language count.
pub struct Cfsa2 {
    arcs: Vec<u8>,
    label_mapping: Vec<u8>,
    has_numbers: bool,
    flags: FsaFlags,
    filler: u8,
    annotation: u8,
}

impl Cfsa2 {
    /// Decode a complete version 0xC6 image, preamble included.
    pub fn from_bytes(data: &[u8]) -> Result<Cfsa2, FsaError> {
        let header = format::parse_header(data)?;
        if header.version != VERSION {
            return Err(FsaError::UnsupportedVersion {
                version: header.version,
            });
        }
        let mut pos = format::HEADER_SIZE;
        if data.len() < pos + 3 {
            return Err(FsaError::TooShort {
                expected: pos + 3,
                actual: data.len(),
            });
        }
        let bits = u16::from_be_bytes([data[pos], data[pos + 1]]);
        pos += 2;
        let flags = FsaFlags::from_bits(bits);
        if flags.unknown_bits() != 0 {
            return Err(FsaError::UnrecognizedFlags { flags: bits });
        }
        let mapping_length = usize::from(data[pos]);
        pos += 1;
        // mapping plus at least the epsilon node
        if data.len() < pos + mapping_length + 2 {
            return Err(FsaError::TooShort {
                expected: pos + mapping_length + 2,
                actual: data.len(),
            });
        }
        let label_mapping = data[pos..pos + mapping_length].to_vec();
        pos += mapping_length;
        Ok(Cfsa2 {
            arcs: data[pos..].to_vec(),
            label_mapping,
            has_numbers: flags.contains(FsaFlags::NUMBERS),
            flags,
            filler: header.filler,
            annotation: header.annotation,
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

    #[inline]
    fn arc_flag_byte(&self, arc: u32) -> u8 {
        self.arcs[arc as usize]
    }

    /// True if the target of `arc` is laid out after its node's last arc.
    #[inline]
    pub fn is_next_set(&self, arc: u32) -> bool {
        self.arc_flag_byte(arc) & BIT_TARGET_NEXT != 0
    }

    /// True if `arc` is the last outgoing arc of its node.
    #[inline]
    pub fn is_arc_last(&self, arc: u32) -> bool {
        self.arc_flag_byte(arc) & BIT_LAST_ARC != 0
    }

    /// Offset just past `arc`.
    fn skip_arc(&self, arc: u32) -> u32 {
        let mut pos = arc as usize;
        let flag_byte = self.arcs[pos];
        pos += 1;
        if flag_byte & LABEL_INDEX_MASK == 0 {
            pos += 1; // explicit label byte
        }
        if flag_byte & BIT_TARGET_NEXT == 0 {
            let (_, past) = read_vint(&self.arcs, pos);
            pos = past;
        }
        pos as u32
    }

    fn destination(&self, arc: u32) -> u32 {
        if self.is_next_set(arc) {
            // skip to just past the last arc of this node
            let mut current = arc;
            while !self.is_arc_last(current) {
                current = self.skip_arc(current);
            }
            self.skip_arc(current)
        } else {
            let mut pos = arc as usize + 1;
            if self.arc_flag_byte(arc) & LABEL_INDEX_MASK == 0 {
                pos += 1;
            }
            read_vint(&self.arcs, pos).0
        }
    }
}

impl Fsa for Cfsa2 {
    fn flags(&self) -> FsaFlags {
        self.flags
    }

    fn root_node(&self) -> u32 {
        self.destination(self.first_arc(0))
    }

    fn first_arc(&self, node: u32) -> u32 {
        if self.has_numbers {
            read_vint(&self.arcs, node as usize).1 as u32
        } else {
            node
        }
    }

    fn next_arc(&self, arc: u32) -> u32 {
        if self.is_arc_last(arc) {
            0
        } else {
            self.skip_arc(arc)
        }
    }

    fn arc_label(&self, arc: u32) -> u8 {
        let index = usize::from(self.arc_flag_byte(arc) & LABEL_INDEX_MASK);
        if index > 0 {
            self.label_mapping[index]
        } else {
            self.arcs[arc as usize + 1]
        }
    }

    fn is_arc_final(&self, arc: u32) -> bool {
        self.arc_flag_byte(arc) & BIT_FINAL_ARC != 0
    }

    fn is_arc_terminal(&self, arc: u32) -> bool {
        !self.is_next_set(arc) && self.destination(arc) == 0
    }

    fn end_node(&self, arc: u32) -> u32 {
        self.destination(arc)
    }

    fn right_language_count(&self, node: u32) -> u32 {
        if self.has_numbers {
            read_vint(&self.arcs, node as usize).0
        } else {
            0
        }
    }
}
