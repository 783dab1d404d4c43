//! Definitions for tags in an IFD group.
//!
//! # `tags`
//!
//! Contains the known tags stored in each [`IfdGroup`].
//!
//! Tags, which are within IFDs, have a tag ID and >=1 value(s). Each known tag
//! also carries its key name (the last part of `Exif.Photo.ExposureTime`) and
//! the primitive type used when a new value is created from text.
//!
//! IFD 1 and the IFDs chained after it reuse the IFD 0 table.
//!
//! ## For contributors
//!
//! ### Adding new tags
//!
//! Let's say we want to add a new tag to IFD 0. Let's call it `YourNewKey`;
//! please assume it has a tag ID of `0x1000` and is usually written as text.
//!
//! Under the `make_key_list_for_group` macro for `Ifd0Tag`, add a new listing:
//!
//! ```no_compile
//! make_key_list_for_group!(enum Ifd0Tag => IfdGroup::_0,
//!     // ...snip!
//!
//!     YourNewKey = 0x1000 => {
//!         ty: Pt::Ascii,
//!         description: "Your new key",
//!     },
//! );
//! ```
//!
//! The key name comes from the identifier, so spell it the way it should
//! appear in keys.

use std::sync::LazyLock;

use rustc_hash::FxHashMap;

use crate::exif::{ifd::IfdGroup, primitives::PrimitiveTy};

/// Creates a "key list" for an IFD group.
///
/// These may include duplicate tag IDs from other groups.
macro_rules! make_key_list_for_group {
    (enum $enum_name:ident => $ifd_group:expr,
        $( $key_ident:ident = $key_tag:expr => {
            ty: $ty:expr,
            description: $description:expr,
        },
    )+) => {
        #[doc = "A list of all keys present in the matching `IfdGroup` variant."]
        #[repr(u16)]
        #[non_exhaustive]
        #[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
        pub enum $enum_name {
            $(
              $key_ident = $key_tag,
            )+
        }

        impl $enum_name {
            /// Every tag in this table, in declaration order.
            pub const ALL: &'static [Self] = &[ $( Self::$key_ident, )+ ];

            /// Returns the `IfdGroup` that this enum represents.
            pub const fn ifd_group() -> IfdGroup {
                $ifd_group
            }

            /// Returns this key's tag ID.
            pub const fn tag_id(&self) -> u16 {
                *self as u16
            }

            /// The tag's name, as used in keys.
            pub const fn tag_name(&self) -> &'static str {
                match self {
                    $( Self::$key_ident => stringify!($key_ident), )+
                }
            }

            /// A short human-readable description.
            pub const fn description(&self) -> &'static str {
                match self {
                    $( Self::$key_ident => $description, )+
                }
            }

            /// The type used when a value for this tag is created from text.
            pub const fn default_type(&self) -> PrimitiveTy {
                match self {
                    $( Self::$key_ident => $ty, )+
                }
            }
        }

        impl core::convert::TryFrom<u16> for $enum_name {
            type Error = ();

            fn try_from(value: u16) -> Result<Self, Self::Error> {
                match value {
                    $( $key_tag => Ok($enum_name::$key_ident), )+
                    _ => Err(()),
                }
            }
        }
    }
}

use PrimitiveTy as Pt;

/// Points from IFD 0 to the Exif sub-IFD.
pub const EXIF_IFD_POINTER: u16 = 0x8769;

/// Points from IFD 0 to the GPS sub-IFD.
pub const GPS_IFD_POINTER: u16 = 0x8825;

/// Points from the Exif sub-IFD to the interoperability IFD.
pub const INTEROP_IFD_POINTER: u16 = 0xA005;

/// A list of TIFF-style sub-IFD offsets. Not followed.
pub const SUB_IFDS: u16 = 0x014A;

/// Offset of an embedded JPEG image, relative to the TIFF header.
pub const JPEG_INTERCHANGE_FORMAT: u16 = 0x0201;

/// Length of the embedded JPEG image.
pub const JPEG_INTERCHANGE_FORMAT_LENGTH: u16 = 0x0202;

/// A list of all the "pointer tags" used to indicate other IFDs.
///
/// These are regenerated when Exif is written, so they never appear as
/// entries.
pub const SUB_IFD_POINTER_TAGS: &[u16] = &[EXIF_IFD_POINTER, GPS_IFD_POINTER, INTEROP_IFD_POINTER];

/// The sub-IFD a pointer tag leads to.
pub const fn pointer_target(tag_id: u16) -> Option<IfdGroup> {
    match tag_id {
        EXIF_IFD_POINTER => Some(IfdGroup::Exif),
        GPS_IFD_POINTER => Some(IfdGroup::Gps),
        INTEROP_IFD_POINTER => Some(IfdGroup::Interop),
        _ => None,
    }
}

/// A set of all known tags and their IFD groups.
#[derive(Copy, Clone, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub enum KnownTag {
    Ifd0Tag(Ifd0Tag),
    ExifIfdTag(ExifIfdTag),
    GpsIfdTag(GpsIfdTag),
    InteropIfdTag(InteropIfdTag),
}

impl KnownTag {
    /// Returns this tag's tag ID.
    ///
    /// ```
    /// use tagsmith_types::exif::tags::{KnownTag, Ifd0Tag};
    ///
    /// let image_width: KnownTag = KnownTag::Ifd0Tag(Ifd0Tag::ImageWidth);
    /// assert_eq!(image_width.tag_id(), 256_u16);
    /// ```
    pub const fn tag_id(&self) -> u16 {
        match self {
            KnownTag::Ifd0Tag(k) => *k as u16,
            KnownTag::ExifIfdTag(k) => *k as u16,
            KnownTag::GpsIfdTag(k) => *k as u16,
            KnownTag::InteropIfdTag(k) => *k as u16,
        }
    }

    /// Grabs a tag's name, as used in keys.
    ///
    /// ```
    /// use tagsmith_types::exif::tags::{KnownTag, Ifd0Tag};
    ///
    /// let image_width: KnownTag = KnownTag::Ifd0Tag(Ifd0Tag::ImageWidth);
    /// assert_eq!(image_width.tag_name(), "ImageWidth");
    /// ```
    pub const fn tag_name(&self) -> &'static str {
        match self {
            KnownTag::Ifd0Tag(k) => k.tag_name(),
            KnownTag::ExifIfdTag(k) => k.tag_name(),
            KnownTag::GpsIfdTag(k) => k.tag_name(),
            KnownTag::InteropIfdTag(k) => k.tag_name(),
        }
    }

    /// A short human-readable description of the tag.
    pub const fn description(&self) -> &'static str {
        match self {
            KnownTag::Ifd0Tag(k) => k.description(),
            KnownTag::ExifIfdTag(k) => k.description(),
            KnownTag::GpsIfdTag(k) => k.description(),
            KnownTag::InteropIfdTag(k) => k.description(),
        }
    }

    /// Returns the type a new value for this tag should have.
    ///
    /// ```
    /// use tagsmith_types::exif::{
    ///     tags::{KnownTag, ExifIfdTag},
    ///     primitives::PrimitiveTy
    /// };
    ///
    /// let exposure: KnownTag = KnownTag::ExifIfdTag(ExifIfdTag::ExposureTime);
    /// assert_eq!(exposure.default_type(), PrimitiveTy::Rational);
    /// ```
    pub const fn default_type(&self) -> PrimitiveTy {
        match self {
            KnownTag::Ifd0Tag(k) => k.default_type(),
            KnownTag::ExifIfdTag(k) => k.default_type(),
            KnownTag::GpsIfdTag(k) => k.default_type(),
            KnownTag::InteropIfdTag(k) => k.default_type(),
        }
    }

    /// Finds a tag by its key name within a group.
    ///
    /// ```
    /// use tagsmith_types::exif::{ifd::IfdGroup, tags::KnownTag};
    ///
    /// let make = KnownTag::from_name(IfdGroup::_0, "Make").unwrap();
    /// assert_eq!(make.tag_id(), 0x010F);
    ///
    /// // thumbnails use the IFD 0 table
    /// let thumb_make = KnownTag::from_name(IfdGroup::_1, "Make").unwrap();
    /// assert_eq!(make, thumb_make);
    /// ```
    pub fn from_name(group: IfdGroup, name: &str) -> Option<Self> {
        NAME_MAP.get(&Table::of(group))?.get(name).copied()
    }
}

impl TryFrom<(IfdGroup, u16)> for KnownTag {
    type Error = ();

    fn try_from(value: (IfdGroup, u16)) -> Result<Self, Self::Error> {
        let (ifd_group, tag_id): (IfdGroup, u16) = value;

        match ifd_group {
            IfdGroup::_0 | IfdGroup::_1 | IfdGroup::Chained(_) => {
                Ifd0Tag::try_from(tag_id).map(KnownTag::Ifd0Tag)
            }
            IfdGroup::Exif => ExifIfdTag::try_from(tag_id).map(KnownTag::ExifIfdTag),
            IfdGroup::Gps => GpsIfdTag::try_from(tag_id).map(KnownTag::GpsIfdTag),
            IfdGroup::Interop => InteropIfdTag::try_from(tag_id).map(KnownTag::InteropIfdTag),
        }
    }
}

/// Which table a group's tags come from.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
enum Table {
    Image,
    Photo,
    Gps,
    Iop,
}

impl Table {
    const fn of(group: IfdGroup) -> Self {
        match group {
            IfdGroup::_0 | IfdGroup::_1 | IfdGroup::Chained(_) => Table::Image,
            IfdGroup::Exif => Table::Photo,
            IfdGroup::Gps => Table::Gps,
            IfdGroup::Interop => Table::Iop,
        }
    }
}

/// `table -> (name -> tag)`, used when resolving keys.
static NAME_MAP: LazyLock<FxHashMap<Table, FxHashMap<&'static str, KnownTag>>> =
    LazyLock::new(|| {
        let mut m: FxHashMap<Table, FxHashMap<&'static str, KnownTag>> = FxHashMap::default();

        m.insert(
            Table::Image,
            Ifd0Tag::ALL
                .iter()
                .map(|t| (t.tag_name(), KnownTag::Ifd0Tag(*t)))
                .collect(),
        );
        m.insert(
            Table::Photo,
            ExifIfdTag::ALL
                .iter()
                .map(|t| (t.tag_name(), KnownTag::ExifIfdTag(*t)))
                .collect(),
        );
        m.insert(
            Table::Gps,
            GpsIfdTag::ALL
                .iter()
                .map(|t| (t.tag_name(), KnownTag::GpsIfdTag(*t)))
                .collect(),
        );
        m.insert(
            Table::Iop,
            InteropIfdTag::ALL
                .iter()
                .map(|t| (t.tag_name(), KnownTag::InteropIfdTag(*t)))
                .collect(),
        );

        m
    });

/*
 *
 *
 *  TIFF Rev. 6.0 attributes (IFD 0, IFD 1, ...)
 *
 *
 */
make_key_list_for_group!(enum Ifd0Tag => IfdGroup::_0,
    ProcessingSoftware = 0x000B => {
        ty: Pt::Ascii,
        description: "Name and version of the processing software",
    },
    NewSubfileType = 0x00FE => {
        ty: Pt::Long,
        description: "Kind of data in this subfile",
    },
    SubfileType = 0x00FF => {
        ty: Pt::Short,
        description: "Kind of data in this subfile (deprecated)",
    },
    //
    // image data structure
    ImageWidth = 0x0100 => {
        ty: Pt::Long,
        description: "Image width",
    },
    ImageLength = 0x0101 => {
        ty: Pt::Long,
        description: "Image height",
    },
    BitsPerSample = 0x0102 => {
        ty: Pt::Short,
        description: "Number of bits per component",
    },
    Compression = 0x0103 => {
        ty: Pt::Short,
        description: "Compression scheme",
    },
    PhotometricInterpretation = 0x0106 => {
        ty: Pt::Short,
        description: "Pixel composition",
    },
    DocumentName = 0x010D => {
        ty: Pt::Ascii,
        description: "Name of the scanned document",
    },
    ImageDescription = 0x010E => {
        ty: Pt::Ascii,
        description: "Image title",
    },
    Make = 0x010F => {
        ty: Pt::Ascii,
        description: "Image input equipment manufacturer",
    },
    Model = 0x0110 => {
        ty: Pt::Ascii,
        description: "Image input equipment model",
    },
    StripOffsets = 0x0111 => {
        ty: Pt::Long,
        description: "Image data location",
    },
    Orientation = 0x0112 => {
        ty: Pt::Short,
        description: "Orientation of image",
    },
    SamplesPerPixel = 0x0115 => {
        ty: Pt::Short,
        description: "Number of components",
    },
    RowsPerStrip = 0x0116 => {
        ty: Pt::Long,
        description: "Number of rows per strip",
    },
    StripByteCounts = 0x0117 => {
        ty: Pt::Long,
        description: "Bytes per compressed strip",
    },
    XResolution = 0x011A => {
        ty: Pt::Rational,
        description: "Image resolution in width direction",
    },
    YResolution = 0x011B => {
        ty: Pt::Rational,
        description: "Image resolution in height direction",
    },
    PlanarConfiguration = 0x011C => {
        ty: Pt::Short,
        description: "Image data arrangement",
    },
    ResolutionUnit = 0x0128 => {
        ty: Pt::Short,
        description: "Unit of X and Y resolution",
    },
    TransferFunction = 0x012D => {
        ty: Pt::Short,
        description: "Transfer function",
    },
    Software = 0x0131 => {
        ty: Pt::Ascii,
        description: "Software used",
    },
    DateTime = 0x0132 => {
        ty: Pt::Ascii,
        description: "File change date and time",
    },
    Artist = 0x013B => {
        ty: Pt::Ascii,
        description: "Person who created the image",
    },
    HostComputer = 0x013C => {
        ty: Pt::Ascii,
        description: "Computer used to create the image",
    },
    WhitePoint = 0x013E => {
        ty: Pt::Rational,
        description: "White point chromaticity",
    },
    PrimaryChromaticities = 0x013F => {
        ty: Pt::Rational,
        description: "Chromaticities of primaries",
    },
    SubIFDs = 0x014A => {
        ty: Pt::Long,
        description: "Offsets to child IFDs",
    },
    JPEGInterchangeFormat = 0x0201 => {
        ty: Pt::Long,
        description: "Offset to JPEG SOI",
    },
    JPEGInterchangeFormatLength = 0x0202 => {
        ty: Pt::Long,
        description: "Bytes of JPEG data",
    },
    YCbCrCoefficients = 0x0211 => {
        ty: Pt::Rational,
        description: "Color space transformation matrix coefficients",
    },
    YCbCrSubSampling = 0x0212 => {
        ty: Pt::Short,
        description: "Subsampling ratio of Y to C",
    },
    YCbCrPositioning = 0x0213 => {
        ty: Pt::Short,
        description: "Y and C positioning",
    },
    ReferenceBlackWhite = 0x0214 => {
        ty: Pt::Rational,
        description: "Pair of black and white reference values",
    },
    XMLPacket = 0x02BC => {
        ty: Pt::Byte,
        description: "XMP metadata",
    },
    Rating = 0x4746 => {
        ty: Pt::Short,
        description: "Rating tag used by Windows",
    },
    RatingPercent = 0x4749 => {
        ty: Pt::Short,
        description: "Rating tag used by Windows, in percent",
    },
    Copyright = 0x8298 => {
        ty: Pt::Ascii,
        description: "Copyright holder",
    },
    IPTCNAA = 0x83BB => {
        ty: Pt::Long,
        description: "IPTC-NAA metadata",
    },
    ImageResources = 0x8649 => {
        ty: Pt::Undefined,
        description: "Photoshop image resources",
    },
    ExifTag = 0x8769 => {
        ty: Pt::Long,
        description: "Exif IFD pointer",
    },
    InterColorProfile = 0x8773 => {
        ty: Pt::Undefined,
        description: "ICC profile",
    },
    GPSTag = 0x8825 => {
        ty: Pt::Long,
        description: "GPS info IFD pointer",
    },
    XPTitle = 0x9C9B => {
        ty: Pt::Byte,
        description: "Title tag used by Windows, UCS2",
    },
    XPComment = 0x9C9C => {
        ty: Pt::Byte,
        description: "Comment tag used by Windows, UCS2",
    },
    XPAuthor = 0x9C9D => {
        ty: Pt::Byte,
        description: "Author tag used by Windows, UCS2",
    },
    XPKeywords = 0x9C9E => {
        ty: Pt::Byte,
        description: "Keywords tag used by Windows, UCS2",
    },
    XPSubject = 0x9C9F => {
        ty: Pt::Byte,
        description: "Subject tag used by Windows, UCS2",
    },
    PrintImageMatching = 0xC4A5 => {
        ty: Pt::Undefined,
        description: "Print Image Matching data",
    },
    DNGVersion = 0xC612 => {
        ty: Pt::Byte,
        description: "DNG specification version",
    },
);

/*
 *
 *
 *  Exif IFD attributes
 *
 *
 */
make_key_list_for_group!(enum ExifIfdTag => IfdGroup::Exif,
    ExposureTime = 0x829A => {
        ty: Pt::Rational,
        description: "Exposure time",
    },
    FNumber = 0x829D => {
        ty: Pt::Rational,
        description: "F number",
    },
    ExposureProgram = 0x8822 => {
        ty: Pt::Short,
        description: "Exposure program",
    },
    SpectralSensitivity = 0x8824 => {
        ty: Pt::Ascii,
        description: "Spectral sensitivity",
    },
    ISOSpeedRatings = 0x8827 => {
        ty: Pt::Short,
        description: "Photographic sensitivity",
    },
    OECF = 0x8828 => {
        ty: Pt::Undefined,
        description: "Optoelectric conversion factor",
    },
    SensitivityType = 0x8830 => {
        ty: Pt::Short,
        description: "Sensitivity type",
    },
    ExifVersion = 0x9000 => {
        ty: Pt::Undefined,
        description: "Exif version",
    },
    DateTimeOriginal = 0x9003 => {
        ty: Pt::Ascii,
        description: "Date and time of original data generation",
    },
    DateTimeDigitized = 0x9004 => {
        ty: Pt::Ascii,
        description: "Date and time of digital data generation",
    },
    OffsetTime = 0x9010 => {
        ty: Pt::Ascii,
        description: "Offset data of DateTime",
    },
    OffsetTimeOriginal = 0x9011 => {
        ty: Pt::Ascii,
        description: "Offset data of DateTimeOriginal",
    },
    OffsetTimeDigitized = 0x9012 => {
        ty: Pt::Ascii,
        description: "Offset data of DateTimeDigitized",
    },
    ComponentsConfiguration = 0x9101 => {
        ty: Pt::Undefined,
        description: "Meaning of each component",
    },
    CompressedBitsPerPixel = 0x9102 => {
        ty: Pt::Rational,
        description: "Image compression mode",
    },
    ShutterSpeedValue = 0x9201 => {
        ty: Pt::SRational,
        description: "Shutter speed",
    },
    ApertureValue = 0x9202 => {
        ty: Pt::Rational,
        description: "Aperture",
    },
    BrightnessValue = 0x9203 => {
        ty: Pt::SRational,
        description: "Brightness",
    },
    ExposureBiasValue = 0x9204 => {
        ty: Pt::SRational,
        description: "Exposure bias",
    },
    MaxApertureValue = 0x9205 => {
        ty: Pt::Rational,
        description: "Maximum lens aperture",
    },
    SubjectDistance = 0x9206 => {
        ty: Pt::Rational,
        description: "Subject distance",
    },
    MeteringMode = 0x9207 => {
        ty: Pt::Short,
        description: "Metering mode",
    },
    LightSource = 0x9208 => {
        ty: Pt::Short,
        description: "Light source",
    },
    Flash = 0x9209 => {
        ty: Pt::Short,
        description: "Flash",
    },
    FocalLength = 0x920A => {
        ty: Pt::Rational,
        description: "Lens focal length",
    },
    SubjectArea = 0x9214 => {
        ty: Pt::Short,
        description: "Subject area",
    },
    MakerNote = 0x927C => {
        ty: Pt::Undefined,
        description: "Manufacturer notes",
    },
    UserComment = 0x9286 => {
        ty: Pt::Undefined,
        description: "User comments",
    },
    SubSecTime = 0x9290 => {
        ty: Pt::Ascii,
        description: "DateTime subseconds",
    },
    SubSecTimeOriginal = 0x9291 => {
        ty: Pt::Ascii,
        description: "DateTimeOriginal subseconds",
    },
    SubSecTimeDigitized = 0x9292 => {
        ty: Pt::Ascii,
        description: "DateTimeDigitized subseconds",
    },
    FlashpixVersion = 0xA000 => {
        ty: Pt::Undefined,
        description: "Supported Flashpix version",
    },
    ColorSpace = 0xA001 => {
        ty: Pt::Short,
        description: "Color space information",
    },
    PixelXDimension = 0xA002 => {
        ty: Pt::Long,
        description: "Valid image width",
    },
    PixelYDimension = 0xA003 => {
        ty: Pt::Long,
        description: "Valid image height",
    },
    RelatedSoundFile = 0xA004 => {
        ty: Pt::Ascii,
        description: "Related audio file",
    },
    InteroperabilityTag = 0xA005 => {
        ty: Pt::Long,
        description: "Interoperability IFD pointer",
    },
    FlashEnergy = 0xA20B => {
        ty: Pt::Rational,
        description: "Flash energy",
    },
    FocalPlaneXResolution = 0xA20E => {
        ty: Pt::Rational,
        description: "Focal plane X resolution",
    },
    FocalPlaneYResolution = 0xA20F => {
        ty: Pt::Rational,
        description: "Focal plane Y resolution",
    },
    FocalPlaneResolutionUnit = 0xA210 => {
        ty: Pt::Short,
        description: "Focal plane resolution unit",
    },
    SubjectLocation = 0xA214 => {
        ty: Pt::Short,
        description: "Subject location",
    },
    ExposureIndex = 0xA215 => {
        ty: Pt::Rational,
        description: "Exposure index",
    },
    SensingMethod = 0xA217 => {
        ty: Pt::Short,
        description: "Sensing method",
    },
    FileSource = 0xA300 => {
        ty: Pt::Undefined,
        description: "File source",
    },
    SceneType = 0xA301 => {
        ty: Pt::Undefined,
        description: "Scene type",
    },
    CFAPattern = 0xA302 => {
        ty: Pt::Undefined,
        description: "CFA pattern",
    },
    CustomRendered = 0xA401 => {
        ty: Pt::Short,
        description: "Custom image processing",
    },
    ExposureMode = 0xA402 => {
        ty: Pt::Short,
        description: "Exposure mode",
    },
    WhiteBalance = 0xA403 => {
        ty: Pt::Short,
        description: "White balance",
    },
    DigitalZoomRatio = 0xA404 => {
        ty: Pt::Rational,
        description: "Digital zoom ratio",
    },
    FocalLengthIn35mmFilm = 0xA405 => {
        ty: Pt::Short,
        description: "Focal length in 35 mm film",
    },
    SceneCaptureType = 0xA406 => {
        ty: Pt::Short,
        description: "Scene capture type",
    },
    GainControl = 0xA407 => {
        ty: Pt::Short,
        description: "Gain control",
    },
    Contrast = 0xA408 => {
        ty: Pt::Short,
        description: "Contrast",
    },
    Saturation = 0xA409 => {
        ty: Pt::Short,
        description: "Saturation",
    },
    Sharpness = 0xA40A => {
        ty: Pt::Short,
        description: "Sharpness",
    },
    DeviceSettingDescription = 0xA40B => {
        ty: Pt::Undefined,
        description: "Device settings description",
    },
    SubjectDistanceRange = 0xA40C => {
        ty: Pt::Short,
        description: "Subject distance range",
    },
    ImageUniqueID = 0xA420 => {
        ty: Pt::Ascii,
        description: "Unique image ID",
    },
    CameraOwnerName = 0xA430 => {
        ty: Pt::Ascii,
        description: "Camera owner name",
    },
    BodySerialNumber = 0xA431 => {
        ty: Pt::Ascii,
        description: "Body serial number",
    },
    LensSpecification = 0xA432 => {
        ty: Pt::Rational,
        description: "Lens specification",
    },
    LensMake = 0xA433 => {
        ty: Pt::Ascii,
        description: "Lens make",
    },
    LensModel = 0xA434 => {
        ty: Pt::Ascii,
        description: "Lens model",
    },
    LensSerialNumber = 0xA435 => {
        ty: Pt::Ascii,
        description: "Lens serial number",
    },
    Gamma = 0xA500 => {
        ty: Pt::Rational,
        description: "Gamma",
    },
);

/*
 *
 *
 *  GPS IFD attributes
 *
 *
 */
make_key_list_for_group!(enum GpsIfdTag => IfdGroup::Gps,
    GPSVersionID = 0x0000 => {
        ty: Pt::Byte,
        description: "GPS tag version",
    },
    GPSLatitudeRef = 0x0001 => {
        ty: Pt::Ascii,
        description: "North or South latitude",
    },
    GPSLatitude = 0x0002 => {
        ty: Pt::Rational,
        description: "Latitude",
    },
    GPSLongitudeRef = 0x0003 => {
        ty: Pt::Ascii,
        description: "East or West longitude",
    },
    GPSLongitude = 0x0004 => {
        ty: Pt::Rational,
        description: "Longitude",
    },
    GPSAltitudeRef = 0x0005 => {
        ty: Pt::Byte,
        description: "Altitude reference",
    },
    GPSAltitude = 0x0006 => {
        ty: Pt::Rational,
        description: "Altitude",
    },
    GPSTimeStamp = 0x0007 => {
        ty: Pt::Rational,
        description: "GPS time (atomic clock)",
    },
    GPSSatellites = 0x0008 => {
        ty: Pt::Ascii,
        description: "GPS satellites used for measurement",
    },
    GPSStatus = 0x0009 => {
        ty: Pt::Ascii,
        description: "GPS receiver status",
    },
    GPSMeasureMode = 0x000A => {
        ty: Pt::Ascii,
        description: "GPS measurement mode",
    },
    GPSDOP = 0x000B => {
        ty: Pt::Rational,
        description: "Measurement precision",
    },
    GPSSpeedRef = 0x000C => {
        ty: Pt::Ascii,
        description: "Speed unit",
    },
    GPSSpeed = 0x000D => {
        ty: Pt::Rational,
        description: "Speed of GPS receiver",
    },
    GPSTrackRef = 0x000E => {
        ty: Pt::Ascii,
        description: "Reference for direction of movement",
    },
    GPSTrack = 0x000F => {
        ty: Pt::Rational,
        description: "Direction of movement",
    },
    GPSImgDirectionRef = 0x0010 => {
        ty: Pt::Ascii,
        description: "Reference for direction of image",
    },
    GPSImgDirection = 0x0011 => {
        ty: Pt::Rational,
        description: "Direction of image",
    },
    GPSMapDatum = 0x0012 => {
        ty: Pt::Ascii,
        description: "Geodetic survey data used",
    },
    GPSDestLatitudeRef = 0x0013 => {
        ty: Pt::Ascii,
        description: "Reference for latitude of destination",
    },
    GPSDestLatitude = 0x0014 => {
        ty: Pt::Rational,
        description: "Latitude of destination",
    },
    GPSDestLongitudeRef = 0x0015 => {
        ty: Pt::Ascii,
        description: "Reference for longitude of destination",
    },
    GPSDestLongitude = 0x0016 => {
        ty: Pt::Rational,
        description: "Longitude of destination",
    },
    GPSDestBearingRef = 0x0017 => {
        ty: Pt::Ascii,
        description: "Reference for bearing of destination",
    },
    GPSDestBearing = 0x0018 => {
        ty: Pt::Rational,
        description: "Bearing of destination",
    },
    GPSDestDistanceRef = 0x0019 => {
        ty: Pt::Ascii,
        description: "Reference for distance to destination",
    },
    GPSDestDistance = 0x001A => {
        ty: Pt::Rational,
        description: "Distance to destination",
    },
    GPSProcessingMethod = 0x001B => {
        ty: Pt::Undefined,
        description: "Name of GPS processing method",
    },
    GPSAreaInformation = 0x001C => {
        ty: Pt::Undefined,
        description: "Name of GPS area",
    },
    GPSDateStamp = 0x001D => {
        ty: Pt::Ascii,
        description: "GPS date",
    },
    GPSDifferential = 0x001E => {
        ty: Pt::Short,
        description: "GPS differential correction",
    },
    GPSHPositioningError = 0x001F => {
        ty: Pt::Rational,
        description: "Horizontal positioning error",
    },
);

/*
 *
 *
 *  Interoperability IFD attributes
 *
 *
 */
make_key_list_for_group!(enum InteropIfdTag => IfdGroup::Interop,
    InteroperabilityIndex = 0x0001 => {
        ty: Pt::Ascii,
        description: "Interoperability identification",
    },
    InteroperabilityVersion = 0x0002 => {
        ty: Pt::Undefined,
        description: "Interoperability version",
    },
    RelatedImageFileFormat = 0x1000 => {
        ty: Pt::Ascii,
        description: "File format of image file",
    },
    RelatedImageWidth = 0x1001 => {
        ty: Pt::Long,
        description: "Image width",
    },
    RelatedImageLength = 0x1002 => {
        ty: Pt::Long,
        description: "Image height",
    },
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve_per_group() {
        let exposure = KnownTag::from_name(IfdGroup::Exif, "ExposureTime").unwrap();
        assert_eq!(exposure.tag_id(), 0x829A);
        assert_eq!(exposure.default_type(), PrimitiveTy::Rational);

        // ExposureTime isn't an IFD 0 tag
        assert!(KnownTag::from_name(IfdGroup::_0, "ExposureTime").is_none());

        let version = KnownTag::from_name(IfdGroup::Gps, "GPSVersionID").unwrap();
        assert_eq!(version.tag_id(), 0x0000);

        let chained = KnownTag::from_name(IfdGroup::Chained(3), "ImageWidth").unwrap();
        assert_eq!(chained, KnownTag::Ifd0Tag(Ifd0Tag::ImageWidth));
    }

    #[test]
    fn ids_resolve_per_group() {
        // 0x0001 means different things in different groups
        assert_eq!(
            KnownTag::try_from((IfdGroup::Gps, 0x0001)),
            Ok(KnownTag::GpsIfdTag(GpsIfdTag::GPSLatitudeRef))
        );
        assert_eq!(
            KnownTag::try_from((IfdGroup::Interop, 0x0001)),
            Ok(KnownTag::InteropIfdTag(InteropIfdTag::InteroperabilityIndex))
        );
        assert!(KnownTag::try_from((IfdGroup::_0, 0x0001)).is_err());
    }

    #[test]
    fn every_table_entry_is_reachable_by_name() {
        for t in Ifd0Tag::ALL {
            assert_eq!(
                KnownTag::from_name(IfdGroup::_0, t.tag_name()),
                Some(KnownTag::Ifd0Tag(*t))
            );
        }
        for t in ExifIfdTag::ALL {
            assert_eq!(
                KnownTag::from_name(IfdGroup::Exif, t.tag_name()),
                Some(KnownTag::ExifIfdTag(*t))
            );
        }
    }

    #[test]
    fn pointer_tags_lead_to_sub_ifds() {
        assert_eq!(pointer_target(EXIF_IFD_POINTER), Some(IfdGroup::Exif));
        assert_eq!(pointer_target(GPS_IFD_POINTER), Some(IfdGroup::Gps));
        assert_eq!(pointer_target(INTEROP_IFD_POINTER), Some(IfdGroup::Interop));
        assert_eq!(pointer_target(0x010F), None);
        assert_eq!(Ifd0Tag::ExifTag.tag_id(), EXIF_IFD_POINTER);
        assert_eq!(ExifIfdTag::InteroperabilityTag.tag_id(), INTEROP_IFD_POINTER);
    }
}
