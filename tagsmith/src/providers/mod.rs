//! # Providers
//!
//! Providers represent a source of metadata, such as a media file format.
//!
//! Each provider has a struct with a `MetadataProvider` implementation. This
//! allows a consistent interface for obtaining metadata from different media
//! sources. Right now, that's just JPEG.

pub mod jpeg;
