//! Contains stuff related to IFDs.
//!
//! For more info, see the [`IfdGroup`] enumeration.

/// An IFD is a set of keys found within a media file's Exif metadata.
///
/// An IFD group is NOT an abstraction - they are _literally_ present in the
/// file. JPEG, for example, can embed a number of IFDs.
///
/// IFD 0 starts a chain of IFDs (IFD 1 is usually the thumbnail), and it
/// (optionally) contains pointer keys to the Exif and GPS sub-IFDs. The Exif
/// sub-IFD may then point at the interoperability IFD.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub enum IfdGroup {
    /// Refers to "IFD 0", the primary image.
    ///
    /// Keys are written as `Exif.Image.*`.
    #[doc(alias = "IFD0")]
    #[doc(alias = "TIFF")]
    _0,

    /// The "Exif" IFD provides camera-based metadata.
    ///
    /// Keys are written as `Exif.Photo.*`.
    #[doc(alias = "ExifIFD")]
    Exif,

    /// The GPS IFD contains location metadata.
    ///
    /// Keys are written as `Exif.GPSInfo.*`.
    #[doc(alias = "GPSIFD")]
    Gps,

    /// The interoperability IFD specifies info about what software was used to
    /// write the Exif metadata.
    ///
    /// Keys are written as `Exif.Iop.*`.
    #[doc(alias = "InteropIFD")]
    Interop,

    /// "IFD 1", which conventionally holds the embedded thumbnail.
    ///
    /// Keys are written as `Exif.Thumbnail.*`.
    #[doc(alias = "IFD1")]
    _1,

    /// An IFD further down the chain, after IFD 1.
    ///
    /// The number is the IFD's position in the chain (so, `Chained(2)` is
    /// "IFD 2"). Keys are written as `Exif.Image2.*`, `Exif.Image3.*`, and so
    /// on.
    Chained(u8),
}

impl IfdGroup {
    /// The group's name inside a key.
    ///
    /// ```
    /// use tagsmith_types::exif::ifd::IfdGroup;
    ///
    /// assert_eq!(IfdGroup::Gps.group_name(), "GPSInfo");
    /// assert_eq!(IfdGroup::Chained(2).group_name(), "Image2");
    /// ```
    pub fn group_name(&self) -> String {
        match self {
            IfdGroup::_0 => "Image".into(),
            IfdGroup::Exif => "Photo".into(),
            IfdGroup::Gps => "GPSInfo".into(),
            IfdGroup::Interop => "Iop".into(),
            IfdGroup::_1 => "Thumbnail".into(),
            IfdGroup::Chained(n) => format!("Image{n}"),
        }
    }

    /// Finds the group a key's group name refers to.
    ///
    /// ```
    /// use tagsmith_types::exif::ifd::IfdGroup;
    ///
    /// assert_eq!(IfdGroup::from_group_name("Photo"), Some(IfdGroup::Exif));
    /// assert_eq!(IfdGroup::from_group_name("Image3"), Some(IfdGroup::Chained(3)));
    /// assert_eq!(IfdGroup::from_group_name("Image1"), None);
    /// ```
    pub fn from_group_name(name: &str) -> Option<Self> {
        match name {
            "Image" => Some(IfdGroup::_0),
            "Photo" => Some(IfdGroup::Exif),
            "GPSInfo" => Some(IfdGroup::Gps),
            "Iop" => Some(IfdGroup::Interop),
            "Thumbnail" => Some(IfdGroup::_1),
            other => {
                let n: u8 = other.strip_prefix("Image")?.parse().ok()?;
                (n >= 2).then_some(IfdGroup::Chained(n))
            }
        }
    }

    /// The group for the IFD at `index` in the IFD 0 chain.
    pub const fn from_chain_index(index: u8) -> Self {
        match index {
            0 => IfdGroup::_0,
            1 => IfdGroup::_1,
            n => IfdGroup::Chained(n),
        }
    }

    /// Where this group sits in the IFD 0 chain, if it's part of it.
    ///
    /// Sub-IFDs (Exif, GPS, interop) aren't in the chain.
    pub const fn chain_index(&self) -> Option<u8> {
        match self {
            IfdGroup::_0 => Some(0),
            IfdGroup::_1 => Some(1),
            IfdGroup::Chained(n) => Some(*n),
            IfdGroup::Exif | IfdGroup::Gps | IfdGroup::Interop => None,
        }
    }
}

impl core::fmt::Display for IfdGroup {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.group_name())
    }
}

#[cfg(test)]
mod tests {
    use super::IfdGroup;

    #[test]
    fn group_names_round_trip() {
        for group in [
            IfdGroup::_0,
            IfdGroup::_1,
            IfdGroup::Exif,
            IfdGroup::Gps,
            IfdGroup::Interop,
            IfdGroup::Chained(2),
            IfdGroup::Chained(17),
        ] {
            assert_eq!(
                IfdGroup::from_group_name(&group.group_name()),
                Some(group),
                "{group:?}"
            );
        }
    }

    #[test]
    fn chain_positions() {
        assert_eq!(IfdGroup::from_chain_index(0), IfdGroup::_0);
        assert_eq!(IfdGroup::from_chain_index(1), IfdGroup::_1);
        assert_eq!(IfdGroup::from_chain_index(4), IfdGroup::Chained(4));
        assert_eq!(IfdGroup::Gps.chain_index(), None);
    }
}
