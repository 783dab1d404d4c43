/// The input isn't a JPEG, or its segment structure is broken.
#[derive(Clone, Debug, PartialEq, PartialOrd, Hash)]
pub enum JpegError {
    /// The input was too short to hold a `SOI` marker.
    TooShort,

    /// The first marker in a JPEG file should be a `SOI`.
    ///
    /// However, this file had another marker first.
    FirstMarkerWasNotSoi {
        /// The first two bytes of the file.
        found: [u8; 2],
    },

    /// The first byte of a marker should be `0xFF`.
    ///
    /// It wasn't!
    FirstMarkerByteWasWrong {
        /// What we got instead.
        byte: u8,

        /// Where the marker was expected, from the start of the file.
        offset: usize,
    },

    /// Failed to get a marker code.
    ///
    /// Might be out of data before finding one.
    NoMarkerCode { offset: usize },

    /// A marker code was `0` or `255`, but those values are disallowed.
    MarkerCodeDisallowed(u8),

    /// This marker code has a known length, but its length wasn't found.
    NoLength {
        /// The marker code for which the length was not found.
        marker_code: u8,
    },

    /// A marker had a negative length (after removing 2 len bytes).
    NegativeLength {
        /// The afflicted marker's marker code.
        marker_code: u8,

        /// Its original length, including the marker length bytes.
        original_len: u16,
    },

    /// Not enough data for marker payload.
    NoDataForPayload {
        /// The afflicted marker's marker code.
        marker_code: u8,

        /// Its original length, including the marker length bytes.
        original_len: u16,

        /// The remaining length in the input, as of parsing.
        ///
        /// This should be more than `original_len`, but it wasn't!
        remaining_input_len: u64,
    },
}

impl core::fmt::Display for JpegError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooShort => f.write_str("The input is too short to be a JPEG file."),

            Self::FirstMarkerWasNotSoi { found } => write!(
                f,
                "A JPEG file's first marker should be SOI (`0xFF 0xD8`), \
                but it was: `{found:x?}`"
            ),

            Self::FirstMarkerByteWasWrong { byte, offset } => write!(
                f,
                "JPEG marker's first byte was wrong. \
                    expected: `255`; \
                    got: `{byte}`; \
                    at offset: `{offset}`",
            ),

            Self::NoMarkerCode { offset } => write!(
                f,
                "Failed to get a marker code at offset `{offset}`. \
                    Might be out of data!",
            ),

            Self::MarkerCodeDisallowed(code) => write!(
                f,
                "A JPEG marker code had a disallowed value. \
                        expected: any value that's not `0` or `255`; \
                        got: `{code}`",
            ),

            Self::NoLength { marker_code } => write!(
                f,
                "JPEG marker segment with code `{marker_code:x?}` had no length. \
                    (out of data!) ",
            ),

            Self::NegativeLength {
                marker_code,
                original_len,
            } => write!(
                f,
                "JPEG marker segment with code `{marker_code:x?}` had \
                    a length that becomes negative after removing 2: \
                    `{original_len}` bytes"
            ),

            Self::NoDataForPayload {
                marker_code,
                original_len: payload_len,
                remaining_input_len,
            } => write!(
                f,
                "Not enough data left in input for payload. \
                    marker code: `{marker_code:x?}`, \
                    payload len: `{payload_len}` bytes, \
                    remaining input len: `{remaining_input_len}` bytes"
            ),
        }
    }
}

impl core::error::Error for JpegError {}
