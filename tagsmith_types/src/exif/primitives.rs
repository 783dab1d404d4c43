//! The TIFF type table.
//!
//! Every IFD entry says which primitive it stores and how many of them. This
//! module maps the numeric type IDs onto [`PrimitiveTy`].

/// An enumeration of the possible types of a primitive.
///
/// Used in each IFD entry.
#[repr(u16)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub enum PrimitiveTy {
    Byte = 1,
    Ascii = 2,
    Short = 3,
    Long = 4,
    Rational = 5,
    SByte = 6,
    Undefined = 7,
    SShort = 8,
    SLong = 9,
    SRational = 10,
    Float = 11,
    Double = 12,
}

impl PrimitiveTy {
    /// Grabs the primitive type's size in bytes.
    ///
    /// ```
    /// use tagsmith_types::exif::primitives::PrimitiveTy;
    ///
    /// let slong: PrimitiveTy = PrimitiveTy::SLong;
    /// assert_eq!(slong.size_bytes(), 4_u8);
    /// ```
    pub const fn size_bytes(&self) -> u8 {
        match self {
            PrimitiveTy::Byte | PrimitiveTy::Ascii | PrimitiveTy::SByte | PrimitiveTy::Undefined => {
                1_u8
            }
            PrimitiveTy::Short | PrimitiveTy::SShort => 2_u8,
            PrimitiveTy::Long | PrimitiveTy::SLong | PrimitiveTy::Float => 4_u8,
            PrimitiveTy::Rational | PrimitiveTy::SRational | PrimitiveTy::Double => 8_u8,
        }
    }

    /// The width of one byte-order-sensitive unit inside a primitive.
    ///
    /// Rationals are two longs, so they swap in 4-byte halves.
    pub const fn unit_bytes(&self) -> u8 {
        match self {
            PrimitiveTy::Rational | PrimitiveTy::SRational => 4_u8,
            other => other.size_bytes(),
        }
    }
}

impl TryFrom<u16> for PrimitiveTy {
    type Error = ();

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Byte),
            2 => Ok(Self::Ascii),
            3 => Ok(Self::Short),
            4 => Ok(Self::Long),
            5 => Ok(Self::Rational),
            6 => Ok(Self::SByte),
            7 => Ok(Self::Undefined),
            8 => Ok(Self::SShort),
            9 => Ok(Self::SLong),
            10 => Ok(Self::SRational),
            11 => Ok(Self::Float),
            12 => Ok(Self::Double),

            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PrimitiveTy;

    #[test]
    fn type_ids_round_trip_through_the_table() {
        for id in 1_u16..=12 {
            let ty = PrimitiveTy::try_from(id).unwrap();
            assert_eq!(ty as u16, id);
        }

        assert!(PrimitiveTy::try_from(0).is_err());
        assert!(PrimitiveTy::try_from(13).is_err());
        assert!(PrimitiveTy::try_from(129).is_err());
    }

    #[test]
    fn rationals_swap_in_halves() {
        assert_eq!(PrimitiveTy::Rational.size_bytes(), 8);
        assert_eq!(PrimitiveTy::Rational.unit_bytes(), 4);
        assert_eq!(PrimitiveTy::Double.unit_bytes(), 8);
    }
}
