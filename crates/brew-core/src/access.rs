//! Access flags for fields and methods
//!
//! Bit values follow the class-file format so flags read from a class file
//! and flags set by the builtin catalog compare equal.

use std::fmt;
use std::ops::BitOr;

/// Access flag set (bitflags)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AccessFlags(u16);

impl AccessFlags {
    /// No flags
    pub const NONE: Self = Self(0x0000);
    /// `public`
    pub const PUBLIC: Self = Self(0x0001);
    /// `private`
    pub const PRIVATE: Self = Self(0x0002);
    /// `protected`
    pub const PROTECTED: Self = Self(0x0004);
    /// `static`
    pub const STATIC: Self = Self(0x0008);
    /// `final`
    pub const FINAL: Self = Self(0x0010);
    /// `synchronized`
    pub const SYNCHRONIZED: Self = Self(0x0020);
    /// `native`
    pub const NATIVE: Self = Self(0x0100);

    /// PUBLIC | STATIC | FINAL
    pub const PUBLIC_STATIC_FINAL: Self = Self(0x0019);

    /// Create from raw bits
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Get raw bits
    pub const fn bits(&self) -> u16 {
        self.0
    }

    /// Check if all flags in `other` are set
    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Union of flags
    pub const fn union(&self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether `STATIC` is set
    pub const fn is_static(&self) -> bool {
        self.contains(Self::STATIC)
    }

    /// Whether `NATIVE` is set
    pub const fn is_native(&self) -> bool {
        self.contains(Self::NATIVE)
    }
}

impl BitOr for AccessFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl fmt::Debug for AccessFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(AccessFlags, &str); 7] = [
            (AccessFlags::PUBLIC, "public"),
            (AccessFlags::PRIVATE, "private"),
            (AccessFlags::PROTECTED, "protected"),
            (AccessFlags::STATIC, "static"),
            (AccessFlags::FINAL, "final"),
            (AccessFlags::SYNCHRONIZED, "synchronized"),
            (AccessFlags::NATIVE, "native"),
        ];

        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "AccessFlags({:#06x} {})", self.0, names.join(" "))
    }
}
