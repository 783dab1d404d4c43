//! Errors returned by the engine's operations.

use std::sync::Arc;

use tagsmith_types::{
    exif::ifd::IfdGroup,
    key::{Family, KeyError, TagKey},
};

use crate::{preview::PreviewError, providers::jpeg::JpegError};

/// Something went wrong while reading or writing an image's metadata.
#[derive(Clone, Debug)]
pub enum EngineError {
    /// The input isn't a JPEG, or its segment structure is broken.
    Format(JpegError),

    /// A recognized metadata segment couldn't be decoded, and the caller
    /// tried to edit that family anyway.
    CorruptMetadata { family: Family, reason: String },

    /// A key's family wasn't `Exif`, `Iptc`, or `Xmp`.
    UnknownFamily(String),

    /// The key can't be represented by its family.
    InvalidKey { key: String, reason: String },

    /// The value can't be stored under its key.
    InvalidValue { key: TagKey, reason: String },

    /// The encoded metadata doesn't fit in the file.
    Encode(EncodeError),

    /// A preview image couldn't be found where its descriptor said.
    PreviewNotFound(PreviewError),

    /// Reading the input failed.
    Io(
        // note: `Arc` allows us to impl `Clone`
        Arc<std::io::Error>,
    ),
}

impl core::fmt::Display for EngineError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EngineError::Format(e) => write!(f, "The image is malformed. err: {e}"),
            EngineError::CorruptMetadata { family, reason } => write!(
                f,
                "The image's {family} metadata is corrupt, so it can't be \
                edited. reason: {reason}"
            ),
            EngineError::UnknownFamily(k) => write!(
                f,
                "Key `{k}` has an unknown family. \
                Expected one of `Exif`, `Iptc`, or `Xmp`."
            ),
            EngineError::InvalidKey { key, reason } => {
                write!(f, "Invalid key `{key}`: {reason}")
            }
            EngineError::InvalidValue { key, reason } => {
                write!(f, "Invalid value for key `{key}`: {reason}")
            }
            EngineError::Encode(e) => write!(f, "Failed to encode metadata. err: {e}"),
            EngineError::PreviewNotFound(e) => write!(f, "Preview image not found. err: {e}"),
            EngineError::Io(e) => write!(f, "Failed to read the image. err: {e}"),
        }
    }
}

impl core::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            EngineError::Format(e) => Some(e),
            EngineError::Encode(e) => Some(e),
            EngineError::PreviewNotFound(e) => Some(e),
            EngineError::Io(e) => Some(e.as_ref()),
            EngineError::CorruptMetadata { .. }
            | EngineError::UnknownFamily(_)
            | EngineError::InvalidKey { .. }
            | EngineError::InvalidValue { .. } => None,
        }
    }
}

impl From<JpegError> for EngineError {
    fn from(value: JpegError) -> Self {
        EngineError::Format(value)
    }
}

impl From<EncodeError> for EngineError {
    fn from(value: EncodeError) -> Self {
        EngineError::Encode(value)
    }
}

impl From<PreviewError> for EngineError {
    fn from(value: PreviewError) -> Self {
        EngineError::PreviewNotFound(value)
    }
}

impl From<std::io::Error> for EngineError {
    fn from(value: std::io::Error) -> Self {
        EngineError::Io(Arc::new(value))
    }
}

impl From<KeyError> for EngineError {
    fn from(value: KeyError) -> Self {
        match value {
            KeyError::UnknownFamily(k) => EngineError::UnknownFamily(k),
            KeyError::Malformed(ref k) => EngineError::InvalidKey {
                key: k.clone(),
                reason: value.to_string(),
            },
        }
    }
}

/// Encoding metadata back into a file failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodeError {
    /// The payload is bigger than a JPEG segment can hold.
    SegmentTooLarge {
        family: Family,

        /// The payload's length, including its signature.
        len: usize,
    },

    /// An offset inside the Exif block doesn't fit in 32 bits.
    OffsetOverflow,

    /// An IFD has more entries than its 16-bit count can say.
    TooManyEntries { group: IfdGroup, len: usize },

    /// `xmltree` couldn't write the XMP packet.
    XmlWrite(String),
}

impl core::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EncodeError::SegmentTooLarge { family, len } => write!(
                f,
                "Encoded {family} metadata is too large for one JPEG segment. \
                len: `{len}` bytes, max: `{}` bytes",
                crate::providers::jpeg::scan::MAX_PAYLOAD_LEN
            ),
            EncodeError::OffsetOverflow => {
                f.write_str("An Exif offset didn't fit in 32 bits.")
            }
            EncodeError::TooManyEntries { group, len } => write!(
                f,
                "IFD `{group}` has too many entries to write. len: `{len}`, max: `{}`",
                u16::MAX
            ),
            EncodeError::XmlWrite(e) => write!(f, "Failed to write XMP packet. err: {e}"),
        }
    }
}

impl core::error::Error for EncodeError {}
