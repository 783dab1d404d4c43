//! # `tagsmith`
//!
//! A library to read, edit, and rewrite the metadata inside JPEG files.
//!
//! Three metadata families are supported:
//!
//! - Exif, from the `APP1` segment starting with `Exif\0\0`
//! - IPTC IIM, from the Photoshop image resources in `APP13`
//! - XMP, from the `APP1` packet (and its extended chunks, when reading)
//!
//! Each tag is named by a key like `Exif.Image.Make`,
//! `Iptc.Application2.Keywords`, or `Xmp.dc.subject`, and holds one or more
//! typed values.
//!
//! ## Usage
//!
//! ```no_run
//! use tagsmith::{Edits, TagKey, TagValue};
//!
//! let bytes: Vec<u8> = std::fs::read("cat.jpg").unwrap();
//!
//! let metadata = tagsmith::read_tags(&bytes).unwrap();
//! for (key, value) in metadata.iter() {
//!     println!("{key} = {}", value.to_text());
//! }
//!
//! let mut edits = Edits::new();
//! edits.set_single(
//!     TagKey::parse("Exif.Image.Make").unwrap(),
//!     TagValue::ascii("Acme"),
//! );
//! let rewritten: Vec<u8> = tagsmith::write_tags(&bytes, &edits).unwrap();
//! ```
//!
//! Everything besides the metadata segments is copied as-is, including the
//! compressed image data.
//!
//! ## Threads
//!
//! Every operation works on its own buffer and keeps no global state, so it's
//! fine to call them from many threads at once. Writing the same file from two
//! places at once is up to you to prevent, though!
//!
//! ## License
//!
//! This project is dual-licensed under either the Apache License 2.0 or the MIT License at your option.

#![forbid(unsafe_code)]

use crate::{
    preview::{PreviewError, PreviewImage, PreviewProperties},
    providers::jpeg::Jpeg,
};

pub mod container;
pub mod error;
pub mod exif;
pub mod host;
pub mod iptc;
pub mod options;
pub mod preview;
pub mod providers;
pub mod xmp;

pub use container::{Edits, Entries, FamilyStatus, Metadata, Warning};
pub use error::{EncodeError, EngineError};
pub use options::WriteOptions;
pub use tagsmith_types::{
    exif::Endianness,
    key::{Family, TagKey},
    value::{TagValue, ValueKind},
};

/// A media file with support for various metadata formats.
///
/// Each file format is a "provider" - it'll yield its metadata through parsing.
pub trait MetadataProvider: Clone + core::fmt::Debug + Sized + Send + Sync {
    /// An error that can occur when calling [`MetadataProvider::new`].
    type ConstructionError: Clone
        + core::fmt::Debug
        + PartialEq
        + PartialOrd
        + core::error::Error
        + Sized
        + Send
        + Sync;

    /// Checks whether `input` looks like this provider's format.
    fn magic_number(input: &[u8]) -> bool;

    /// Parses a media file for its metadata.
    ///
    /// Metadata blocks that can't be decoded don't fail construction. Instead,
    /// they're marked on [`Metadata::status`], with details in
    /// [`Metadata::warnings`].
    fn new(input: &impl AsRef<[u8]>)
    -> Result<Self, <Self as MetadataProvider>::ConstructionError>;

    /// The decoded metadata.
    fn metadata(&self) -> &Metadata;

    /// The decoded metadata, for editing.
    ///
    /// Edits are only saved when calling [`MetadataProvider::write`].
    fn metadata_mut(&mut self) -> &mut Metadata;

    /// Finds the preview images embedded in the metadata.
    fn previews(&self) -> Vec<PreviewProperties>;

    /// Copies one preview image out of the file.
    fn extract_preview(&self, props: &PreviewProperties) -> Result<PreviewImage, PreviewError>;

    /// Writes the file again, with the current metadata.
    fn write(&self) -> Result<Vec<u8>, EngineError> {
        self.write_with(&WriteOptions::default())
    }

    /// Writes the file again, with the current metadata.
    fn write_with(&self, options: &WriteOptions) -> Result<Vec<u8>, EngineError>;
}

/// Reads every tag from a JPEG file.
pub fn read_tags(bytes: &[u8]) -> Result<Metadata, EngineError> {
    Ok(Jpeg::new(&bytes)?.into_metadata())
}

/// Reads every tag from a JPEG file, reading it fully first.
pub fn read_tags_from(mut reader: impl std::io::Read) -> Result<Metadata, EngineError> {
    let mut bytes: Vec<u8> = Vec::new();
    reader.read_to_end(&mut bytes).map_err(|e| {
        log::error!("Failed to read the image. err: {e}");
        e
    })?;

    read_tags(&bytes)
}

/// Applies `edits` to a JPEG file, returning the rewritten file.
pub fn write_tags(bytes: &[u8], edits: &Edits) -> Result<Vec<u8>, EngineError> {
    write_tags_with(bytes, edits, &WriteOptions::default())
}

/// Applies `edits` to a JPEG file with custom options, returning the rewritten
/// file.
///
/// If any edit is invalid, nothing is written.
pub fn write_tags_with(
    bytes: &[u8],
    edits: &Edits,
    options: &WriteOptions,
) -> Result<Vec<u8>, EngineError> {
    let mut jpeg = Jpeg::new(&bytes)?;
    jpeg.metadata_mut().apply(edits)?;
    jpeg.write_with(options)
}

/// Removes every value under each of `keys`.
///
/// Keys that aren't in the file are skipped.
pub fn delete_tags(bytes: &[u8], keys: &[TagKey]) -> Result<Vec<u8>, EngineError> {
    let mut edits = Edits::new();
    for key in keys {
        edits.erase(key.clone());
    }

    write_tags(bytes, &edits)
}

/// Copies out every preview image in a JPEG file, smallest first.
///
/// A preview that can't be found is skipped, so one bad IFD doesn't hide the
/// others.
pub fn extract_previews(bytes: &[u8]) -> Result<Vec<PreviewImage>, EngineError> {
    let jpeg = Jpeg::new(&bytes)?;

    Ok(jpeg
        .previews()
        .iter()
        .filter_map(|props| match jpeg.extract_preview(props) {
            Ok(image) => Some(image),
            Err(e) => {
                log::warn!("Skipping preview. err: {e}");
                None
            }
        })
        .collect())
}

/// Internal utility methods.
pub(crate) mod util {
    /// Helper function to initialize the logger for testing.
    #[cfg(test)]
    pub fn logger() {
        _ = env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::max())
            .format_file(true)
            .format_line_number(true)
            .try_init();
    }
}
