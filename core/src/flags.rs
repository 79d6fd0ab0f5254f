//! Bitset of the guest-visible ARM status flags.

use std::ops::{BitAnd, BitOr, Not};

/// Set of ARM flags a micro-instruction reads or writes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ArmFlags(u8);

impl ArmFlags {
    pub const NONE: ArmFlags = ArmFlags(0);
    pub const N: ArmFlags = ArmFlags(1 << 0);
    pub const Z: ArmFlags = ArmFlags(1 << 1);
    pub const C: ArmFlags = ArmFlags(1 << 2);
    pub const V: ArmFlags = ArmFlags(1 << 3);
    pub const Q: ArmFlags = ArmFlags(1 << 4);
    pub const GE: ArmFlags = ArmFlags(1 << 5);

    pub const NZ: ArmFlags = ArmFlags(Self::N.0 | Self::Z.0);
    pub const NZC: ArmFlags = ArmFlags(Self::NZ.0 | Self::C.0);
    pub const NZCV: ArmFlags = ArmFlags(Self::NZC.0 | Self::V.0);
    pub const ANY: ArmFlags = ArmFlags(Self::NZCV.0 | Self::Q.0 | Self::GE.0);

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: ArmFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ArmFlags {
    type Output = ArmFlags;
    fn bitor(self, rhs: ArmFlags) -> ArmFlags {
        ArmFlags(self.0 | rhs.0)
    }
}

impl BitAnd for ArmFlags {
    type Output = ArmFlags;
    fn bitand(self, rhs: ArmFlags) -> ArmFlags {
        ArmFlags(self.0 & rhs.0)
    }
}

impl Not for ArmFlags {
    type Output = ArmFlags;
    fn not(self) -> ArmFlags {
        ArmFlags(!self.0 & Self::ANY.0)
    }
}

impl std::fmt::Debug for ArmFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "-");
        }
        for (bit, name) in [
            (Self::N, "N"),
            (Self::Z, "Z"),
            (Self::C, "C"),
            (Self::V, "V"),
            (Self::Q, "Q"),
            (Self::GE, "GE"),
        ] {
            if self.contains(bit) {
                write!(f, "{name}")?;
            }
        }
        Ok(())
    }
}
