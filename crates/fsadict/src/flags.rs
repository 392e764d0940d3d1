// Capability flags carried by automaton images.

use std::ops::{BitOr, BitOrAssign};

/// Bit set describing what an automaton image supports.
///
/// Version 0xC6 stores the set verbatim as a big-endian 16-bit word;
/// version 5 derives it from the header layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FsaFlags(u16);

impl FsaFlags {
    /// Sequences of any length can be stored (no fixed record size).
    pub const FLEXIBLE: FsaFlags = FsaFlags(1 << 0);
    /// A node's last arc carries a stop bit instead of the node storing an
    /// arc count.
    pub const STOPBIT: FsaFlags = FsaFlags(1 << 1);
    /// Arcs may point at the node laid out directly behind them.
    pub const NEXTBIT: FsaFlags = FsaFlags(1 << 2);
    /// Nodes store the size of their right language.
    pub const NUMBERS: FsaFlags = FsaFlags(1 << 8);
    /// The header carries filler and annotation-separator bytes.
    pub const SEPARATORS: FsaFlags = FsaFlags(1 << 9);

    /// Every flag bit this implementation understands.
    pub const KNOWN: FsaFlags = FsaFlags(
        Self::FLEXIBLE.0
            | Self::STOPBIT.0
            | Self::NEXTBIT.0
            | Self::NUMBERS.0
            | Self::SEPARATORS.0,
    );

    /// The empty flag set.
    pub const fn empty() -> FsaFlags {
        FsaFlags(0)
    }

    /// Reinterpret a stored 16-bit flag word without validation.
    pub const fn from_bits(bits: u16) -> FsaFlags {
        FsaFlags(bits)
    }

    /// The raw 16-bit word.
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// True if every flag of `other` is set in `self`.
    pub const fn contains(self, other: FsaFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Bits of `self` outside the [`KNOWN`](Self::KNOWN) set.
    pub const fn unknown_bits(self) -> u16 {
        self.0 & !Self::KNOWN.0
    }
}

impl BitOr for FsaFlags {
    type Output = FsaFlags;

    fn bitor(self, rhs: FsaFlags) -> FsaFlags {
        FsaFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for FsaFlags {
    fn bitor_assign(&mut self, rhs: FsaFlags) {
        self.0 |= rhs.0;
    }
}
