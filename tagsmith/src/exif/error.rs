use tagsmith_types::exif::ifd::IfdGroup;

/// This type describes the parsing result.
///
/// If it's the `Err` variant, the parsing failed completely, and you aren't
/// getting any Exif data at all.
pub type ExifFatalResult<T> = Result<T, ExifFatalError>;

/// The Exif header, or its first IFD, couldn't be read.
#[derive(Clone, Debug, PartialEq, PartialOrd, Hash)]
pub enum ExifFatalError {
    /// The input was too short to provide a byte order marker.
    NoByteOrderMarker { len: usize },

    /// The byte order marker was weird - it's not one of the two expected
    /// values (in ASCII, should be either `II` or `MM`).
    WeirdByteOrderMarker { found: [u8; 2] },

    /// Didn't find the TIFF magic number.
    NoTiffMagicNumber,

    /// The magic number indexes had a weird value. It's not TIFF's.
    MagicNumberWasntTiff { found: u16 },

    /// No TIFF header offset was found.
    NoTiffHeaderOffset,

    /// The header offset would place us before the header! That doesn't make
    /// any sense, so we can't keep parsing.
    HeaderOffsetBeforeHeader,

    /// Failed to skip to the offset - ran outta data.
    NotEnoughDataForHeaderOffset { offset: u32 },

    /// The first IFD couldn't be read.
    FirstIfd(IfdError),
}

impl core::fmt::Display for ExifFatalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoByteOrderMarker { len } => {
                write!(f, "No byte order marker was found. len: `{len}`")
            }
            Self::WeirdByteOrderMarker { found } => match core::str::from_utf8(found.as_slice()) {
                Ok(found_utf8_bom) => {
                    write!(f, "Got a weird byte-order marker: `{found_utf8_bom}`")
                }
                Err(_) => {
                    write!(f, "Got a weird byte-order marker - wasn't ASCII: {found:?}")
                }
            },

            Self::NoTiffMagicNumber => {
                f.write_str("No TIFF magic number found - the slice was likely cut short.")
            }
            Self::MagicNumberWasntTiff { found } => {
                write!(f, "Magic number was not TIFF! got: `{found}`")
            }
            Self::NoTiffHeaderOffset => f.write_str("No TIFF header offset was found."),
            Self::HeaderOffsetBeforeHeader => f.write_str(
                "TIFF header offset asked us to move before the header. Likely a \
                broken file - cannot continue parsing.",
            ),
            Self::NotEnoughDataForHeaderOffset { offset } => write!(
                f,
                "Not enough data to skip to TIFF header offset. offset: `{offset}`"
            ),
            Self::FirstIfd(e) => write!(f, "The first IFD couldn't be read. err: {e}"),
        }
    }
}

impl core::error::Error for ExifFatalError {}

/// One IFD couldn't be read.
///
/// For IFD 0, this is fatal. Other IFDs are just skipped.
#[derive(Clone, Debug, PartialEq, PartialOrd, Hash)]
pub enum IfdError {
    /// The IFD's offset points outside the Exif block.
    OutOfBounds { group: IfdGroup, offset: u32 },

    /// The IFD didn't say how many entries it has.
    NoEntryCount { group: IfdGroup },
}

impl core::fmt::Display for IfdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IfdError::OutOfBounds { group, offset } => write!(
                f,
                "IFD `{group}` starts outside the Exif block. offset: `{offset}`"
            ),
            IfdError::NoEntryCount { group } => {
                write!(f, "IFD `{group}` didn't say how many entries it has.")
            }
        }
    }
}

impl core::error::Error for IfdError {}

/// A single IFD entry couldn't be read.
///
/// These are skipped and reported as warnings.
#[derive(Clone, Debug, PartialEq, PartialOrd, Hash)]
pub enum ExifFieldError {
    /// The IFD ended in the middle of this entry.
    Truncated,

    /// Encountered an unknown type while parsing a field.
    FieldUnknownType { tag: u16, got: u16 },

    /// The entry's data is bigger than anything Exif could hold.
    TooLarge { tag: u16, count: u32 },

    /// The entry's data lies outside the Exif block.
    OffsetTooFar { tag: u16, offset: u32, len: u64 },
}

impl core::fmt::Display for ExifFieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExifFieldError::Truncated => f.write_str("The IFD ended in the middle of an entry."),
            ExifFieldError::FieldUnknownType { tag, got } => write!(
                f,
                "Encountered an unknown type while parsing a field! \
                tag: `{tag:#06x}`, got: `{got}`"
            ),
            ExifFieldError::TooLarge { tag, count } => write!(
                f,
                "Field `{tag:#06x}` claims too many values. count: `{count}`"
            ),
            ExifFieldError::OffsetTooFar { tag, offset, len } => write!(
                f,
                "Field `{tag:#06x}` stores its data outside the Exif block. \
                offset: `{offset}`, len: `{len}`"
            ),
        }
    }
}

impl core::error::Error for ExifFieldError {}
