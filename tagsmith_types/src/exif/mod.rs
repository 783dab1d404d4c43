//! Exif types: IFD groups, the TIFF type table, and the known tags.

pub mod ifd;
pub mod primitives;
pub mod tags;

/// Each blob of Exif will start with a byte order marker - its endianness.
///
/// It's either `II` (Intel, for little-endian) or `MM` (Motorola, for
/// big-endian).
///
/// Keeping this info around is vital for correct parsing and maintaining the
/// many proprietary blocks.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub enum Endianness {
    /// `II` for Intel, little-endian.
    Little,

    /// `MM` for Motorola. Big-endian.
    #[default]
    Big,
}

impl Endianness {
    /// The two marker bytes that start a TIFF header in this byte order.
    pub const fn marker(&self) -> [u8; 2] {
        match self {
            Endianness::Little => *b"II",
            Endianness::Big => *b"MM",
        }
    }

    /// Reads a TIFF byte order marker.
    pub const fn from_marker(marker: [u8; 2]) -> Option<Self> {
        match &marker {
            b"II" => Some(Endianness::Little),
            b"MM" => Some(Endianness::Big),
            _ => None,
        }
    }
}
