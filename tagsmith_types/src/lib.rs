//! # `tagsmith_types`
//!
//! Keys, values, and lookup tables shared by the `tagsmith` engine.
//!
//! - [`key`]: `Family.Group.Name` keys.
//! - [`value`]: typed tag values and their text forms.
//! - [`exif`]: IFD groups, the TIFF type table, and known Exif tags.
//! - [`iptc`]: IPTC records and datasets.
//! - [`xmp`]: the XMP namespace registry.

#![forbid(unsafe_code)]

pub mod exif;
pub mod iptc;
pub mod key;
pub mod value;
pub mod xmp;
