/// An error that occurred while parsing IPTC.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IptcError {
    /// The Photoshop resources wrapping IPTC couldn't be read.
    Photoshop(PhotoshopError),
}

impl core::fmt::Display for IptcError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            IptcError::Photoshop(e) => {
                write!(f, "Failed to read Photoshop image resources. err: {e}")
            }
        }
    }
}

impl core::error::Error for IptcError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            IptcError::Photoshop(e) => Some(e),
        }
    }
}

impl From<PhotoshopError> for IptcError {
    fn from(value: PhotoshopError) -> Self {
        IptcError::Photoshop(value)
    }
}

/// A Photoshop image resource block was malformed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PhotoshopError {
    /// A resource didn't start with a known signature.
    BadSignature { offset: usize, found: [u8; 4] },

    /// The data ended in the middle of a resource.
    Truncated { offset: usize },
}

impl core::fmt::Display for PhotoshopError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PhotoshopError::BadSignature { offset, found } => write!(
                f,
                "Resource at offset `{offset}` has an unknown signature. \
                found: `{found:x?}`, expected one of `8BIM`, `PHUT`, `AgHg`, `DCSR`"
            ),
            PhotoshopError::Truncated { offset } => write!(
                f,
                "Resource at offset `{offset}` ended before its data did."
            ),
        }
    }
}

impl core::error::Error for PhotoshopError {}
