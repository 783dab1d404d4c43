//! Puts a JPEG back together with new metadata segments.

use tagsmith_types::key::Family;

use super::scan::{
    APP0_MARKER_CODE, APP1_MARKER_CODE, APP13_MARKER_CODE, EXIF_SIG, MAX_PAYLOAD_LEN,
    PHOTOSHOP_SIG, SOI_MARKER_CODE, Segment, SegmentKind, Segments, XMP_SIG, marker_segment,
};
use crate::{
    container::{FamilyStatus, Metadata},
    error::{EncodeError, EngineError},
    exif, iptc,
    options::WriteOptions,
    xmp,
};

/// What to do with a family's segments.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Replacement {
    /// Keep whatever the file had.
    PassThrough,

    /// Swap the family's segments for these. Empty means drop them.
    Segments(Vec<Vec<u8>>),
}

impl Replacement {
    fn segments(&self) -> &[Vec<u8>] {
        match self {
            Replacement::PassThrough => &[],
            Replacement::Segments(s) => s,
        }
    }
}

/// Rewrites `bytes` so its metadata segments hold `metadata`.
///
/// Nothing is returned unless the whole file could be written.
pub(crate) fn rewrite(
    bytes: &[u8],
    metadata: &Metadata,
    options: &WriteOptions,
) -> Result<Vec<u8>, EngineError> {
    let segments: Vec<Segment> = Segments::new(bytes)?.collect::<Result<_, _>>()?;

    let exif = replacement(metadata, Family::Exif, options)?;
    let xmp = replacement(metadata, Family::Xmp, options)?;
    let iptc = replacement(metadata, Family::Iptc, options)?;

    let has = |kind: SegmentKind| segments.iter().any(|s| s.kind == kind);
    let mut inserts: Vec<&[u8]> = Vec::new();
    if !has(SegmentKind::App1Exif) {
        inserts.extend(exif.segments().iter().map(Vec::as_slice));
    }
    if !has(SegmentKind::App1Xmp) {
        inserts.extend(xmp.segments().iter().map(Vec::as_slice));
    }
    if !has(SegmentKind::App13Photoshop) {
        inserts.extend(iptc.segments().iter().map(Vec::as_slice));
    }

    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    out.extend([0xFF, SOI_MARKER_CODE]);

    let mut inserted = false;
    let (mut seen_exif, mut seen_xmp, mut seen_iptc) = (false, false, false);

    for seg in &segments {
        // new families go after the JFIF headers
        if !inserted && seg.marker != APP0_MARKER_CODE {
            if !inserts.is_empty() {
                log::debug!("Inserting `{}` new metadata segments.", inserts.len());
            }
            inserts.iter().for_each(|s| out.extend_from_slice(s));
            inserted = true;
        }

        match seg.kind {
            SegmentKind::App1Exif => {
                write_family_segment(&mut out, seg, &exif, seen_exif, true);
                seen_exif = true;
            }
            SegmentKind::App1Xmp => {
                write_family_segment(&mut out, seg, &xmp, seen_xmp, true);
                seen_xmp = true;
            }
            SegmentKind::App13Photoshop => {
                write_family_segment(&mut out, seg, &iptc, seen_iptc, false);
                seen_iptc = true;
            }

            // the extended packet belongs to the main one
            SegmentKind::App1ExtendedXmp => {
                if xmp == Replacement::PassThrough {
                    out.extend_from_slice(seg.raw);
                } else {
                    log::trace!("Dropping extended XMP chunk at offset `{}`.", seg.offset);
                }
            }

            SegmentKind::Comment | SegmentKind::Other | SegmentKind::ImageData => {
                out.extend_from_slice(seg.raw)
            }
        }
    }

    // a file that's all headers
    if !inserted {
        inserts.iter().for_each(|s| out.extend_from_slice(s));
    }

    Ok(out)
}

/// Writes one of a family's original segments.
///
/// The first one is swapped for the replacement. Later ones are either kept
/// (`keep_duplicates`) or folded into it.
fn write_family_segment(
    out: &mut Vec<u8>,
    seg: &Segment,
    replacement: &Replacement,
    seen: bool,
    keep_duplicates: bool,
) {
    match replacement {
        Replacement::PassThrough => out.extend_from_slice(seg.raw),
        Replacement::Segments(new) if !seen => {
            new.iter().for_each(|s| out.extend_from_slice(s));
        }
        Replacement::Segments(_) if keep_duplicates => {
            log::debug!(
                "Passing through duplicate `{:?}` segment at offset `{}`.",
                seg.kind,
                seg.offset
            );
            out.extend_from_slice(seg.raw);
        }
        Replacement::Segments(_) => {
            log::trace!("Folding `{:?}` segment at offset `{}`.", seg.kind, seg.offset);
        }
    }
}

/// Decides what happens to `family`, encoding it if it needs to change.
fn replacement(
    metadata: &Metadata,
    family: Family,
    options: &WriteOptions,
) -> Result<Replacement, EngineError> {
    let edited = metadata.is_edited(family);

    if let FamilyStatus::Undecodable(reason) = metadata.status(family) {
        if edited {
            log::error!("Can't write edited {family} metadata over a corrupt segment.");
            return Err(EngineError::CorruptMetadata {
                family,
                reason: reason.clone(),
            });
        }
        return Ok(Replacement::PassThrough);
    }

    // asking for another byte order rewrites the block
    let reorder = family == Family::Exif
        && options.exif_byte_order.is_some()
        && metadata.status(family) == &FamilyStatus::Decoded
        && options.exif_byte_order != metadata.exif_state.byte_order;

    if !edited && !reorder {
        return Ok(Replacement::PassThrough);
    }

    let entries = metadata.entries(family);
    let segments = match family {
        Family::Exif => {
            let order = options
                .exif_byte_order
                .or(metadata.exif_state.byte_order)
                .unwrap_or_default();

            let blob = exif::encode(entries, &metadata.exif_state, order)?;
            single_segment(family, APP1_MARKER_CODE, EXIF_SIG, &blob)?
        }

        Family::Xmp => {
            let packet = xmp::encode(
                entries,
                &metadata.xmp_state,
                options.xmp_packet_wrapper,
                options.xmp_padding,
            )?;
            single_segment(family, APP1_MARKER_CODE, XMP_SIG, &packet)?
        }

        Family::Iptc => match iptc::encode_resources(entries, &metadata.iptc_state)? {
            Some(resources) => photoshop_segments(&resources),
            None => Vec::new(),
        },
    };

    log::debug!("Encoded {family} into `{}` segments.", segments.len());
    Ok(Replacement::Segments(segments))
}

/// Wraps `data` in one segment, or none when it's empty.
fn single_segment(
    family: Family,
    marker_code: u8,
    signature: &[u8],
    data: &[u8],
) -> Result<Vec<Vec<u8>>, EncodeError> {
    if data.is_empty() {
        return Ok(Vec::new());
    }

    let len = signature.len() + data.len();
    if len > MAX_PAYLOAD_LEN {
        log::error!("Encoded {family} is `{len}` bytes, which won't fit in a segment.");
        return Err(EncodeError::SegmentTooLarge { family, len });
    }

    Ok(vec![marker_segment(marker_code, &[signature, data])])
}

/// Splits Photoshop resources over as many APP13 segments as they need.
fn photoshop_segments(resources: &[u8]) -> Vec<Vec<u8>> {
    resources
        .chunks(MAX_PAYLOAD_LEN - PHOTOSHOP_SIG.len())
        .map(|chunk| marker_segment(APP13_MARKER_CODE, &[PHOTOSHOP_SIG, chunk]))
        .collect()
}
