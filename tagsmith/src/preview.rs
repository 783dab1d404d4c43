//! Finds the preview images embedded in Exif.
//!
//! IFD 1 usually holds a small thumbnail, and some cameras chain on more IFDs
//! with larger previews. Each one points at a JPEG stream by offset and
//! length, relative to the TIFF header.

use std::collections::BTreeMap;

use tagsmith_types::{
    exif::{
        ifd::IfdGroup,
        tags::{JPEG_INTERCHANGE_FORMAT, JPEG_INTERCHANGE_FORMAT_LENGTH},
    },
    key::Family,
};

use crate::{container::Metadata, exif, providers::jpeg::scan};

const IMAGE_WIDTH: u16 = 0x0100;
const IMAGE_LENGTH: u16 = 0x0101;

/// Where a preview image is, and what it looks like.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PreviewProperties {
    pub mime_type: &'static str,
    pub extension: &'static str,

    /// Width in pixels, or 0 if unknown.
    pub width: u32,

    /// Height in pixels, or 0 if unknown.
    pub height: u32,

    /// Where the preview starts in the whole file.
    pub byte_offset: usize,
    pub byte_length: usize,

    /// The IFD that points at this preview.
    pub group: IfdGroup,
}

/// A preview image, copied out of the file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewImage {
    pub properties: PreviewProperties,
    pub data: Vec<u8>,
}

/// Lists every preview that `metadata` points at, smallest first.
pub fn properties(metadata: &Metadata) -> Vec<PreviewProperties> {
    let Some(tiff_offset) = metadata.exif_state.tiff_offset else {
        log::trace!("No Exif was decoded, so there are no previews.");
        return Vec::new();
    };

    #[derive(Default)]
    struct Found {
        offset: Option<u32>,
        length: Option<u32>,
        width: Option<u32>,
        height: Option<u32>,
    }

    let mut found: BTreeMap<IfdGroup, Found> = BTreeMap::new();
    for (key, value) in metadata.entries(Family::Exif).iter() {
        let Ok((group, tag)) = exif::resolve_key(key) else {
            continue;
        };

        let slot = match tag {
            JPEG_INTERCHANGE_FORMAT => &mut found.entry(group).or_default().offset,
            JPEG_INTERCHANGE_FORMAT_LENGTH => &mut found.entry(group).or_default().length,
            IMAGE_WIDTH => &mut found.entry(group).or_default().width,
            IMAGE_LENGTH => &mut found.entry(group).or_default().height,
            _ => continue,
        };
        if slot.is_none() {
            *slot = value.uint_at(0);
        }
    }

    let mut out: Vec<PreviewProperties> = found
        .into_iter()
        .filter_map(|(group, f)| {
            let (offset, length) = (f.offset?, f.length?);

            let (width, height) = metadata
                .exif_state
                .blobs
                .get(&group)
                .and_then(|blob| scan::frame_size(blob))
                .or_else(|| f.width.zip(f.height))
                .unwrap_or((0, 0));

            log::debug!("Found a `{width}x{height}` preview on IFD `{group}`.");
            Some(PreviewProperties {
                mime_type: "image/jpeg",
                extension: ".jpg",
                width,
                height,
                byte_offset: tiff_offset.saturating_add(offset as usize),
                byte_length: length as usize,
                group,
            })
        })
        .collect();

    out.sort_by_key(|p| p.byte_length);
    out
}

/// Copies one preview out of the file it was found in.
pub fn extract(bytes: &[u8], props: &PreviewProperties) -> Result<PreviewImage, PreviewError> {
    let start = props.byte_offset;
    let data = start
        .checked_add(props.byte_length)
        .and_then(|end| bytes.get(start..end))
        .ok_or_else(|| {
            log::warn!(
                "Preview on IFD `{}` is outside the file. offset: `{start}`, len: `{}`",
                props.group,
                props.byte_length
            );
            PreviewError::OutOfBounds {
                group: props.group,
                offset: start,
                len: props.byte_length,
                file_len: bytes.len(),
            }
        })?;

    if !data.starts_with(&[0xFF, scan::SOI_MARKER_CODE]) {
        log::warn!("Preview on IFD `{}` isn't a JPEG stream.", props.group);
        return Err(PreviewError::NotJpeg { group: props.group });
    }

    Ok(PreviewImage {
        properties: props.clone(),
        data: data.to_vec(),
    })
}

/// A preview couldn't be found where its IFD said.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PreviewError {
    /// The preview's range goes past the end of the file.
    OutOfBounds {
        group: IfdGroup,
        offset: usize,
        len: usize,
        file_len: usize,
    },

    /// The range doesn't start with a JPEG SOI marker.
    NotJpeg { group: IfdGroup },
}

impl core::fmt::Display for PreviewError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PreviewError::OutOfBounds {
                group,
                offset,
                len,
                file_len,
            } => write!(
                f,
                "Preview on IFD `{group}` is outside the file. \
                offset: `{offset}`, len: `{len}`, file len: `{file_len}`"
            ),
            PreviewError::NotJpeg { group } => {
                write!(f, "Preview on IFD `{group}` doesn't start with a JPEG SOI marker.")
            }
        }
    }
}

impl core::error::Error for PreviewError {}
