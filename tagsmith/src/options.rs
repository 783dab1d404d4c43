//! Settings for writing metadata back into a file.

use tagsmith_types::exif::Endianness;

/// Controls how metadata is encoded on write.
///
/// The defaults keep the file's own choices wherever it made any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteOptions {
    /// Writes Exif in this byte order instead of the one it was read in.
    ///
    /// Files without Exif get big-endian Exif unless this is set.
    pub exif_byte_order: Option<Endianness>,

    /// Wraps the XMP packet in `<?xpacket ...?>` processing instructions.
    pub xmp_packet_wrapper: bool,

    /// Bytes of whitespace padding to leave inside the XMP packet wrapper, so
    /// other tools can edit in place.
    ///
    /// Ignored when `xmp_packet_wrapper` is off.
    pub xmp_padding: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            exif_byte_order: None,
            xmp_packet_wrapper: true,
            xmp_padding: 0,
        }
    }
}
