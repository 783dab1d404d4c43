//! JPEG is an older image format designed with old-school compression in mind.
//!
//! It uses an unfortunate internal structure that's difficult to parse and
//! edit, so this crate treads lightly: metadata lives in a handful of
//! application segments, and everything else is copied byte-for-byte.

use std::collections::BTreeMap;

use tagsmith_types::key::Family;
use winnow::{Parser as _, binary::be_u32, error::EmptyError, token::take};

use self::scan::{SOI_MARKER_CODE, Segment, SegmentKind, Segments};
use crate::{
    MetadataProvider,
    container::{FamilyStatus, Metadata},
    error::EngineError,
    exif, iptc,
    options::WriteOptions,
    preview::{self, PreviewError, PreviewImage, PreviewProperties},
    xmp::{self, DecodedXmp},
};

mod error;
pub mod scan;
mod write;

pub use error::JpegError;

/// A JPEG file, with its metadata decoded.
#[derive(Clone, Debug)]
pub struct Jpeg {
    bytes: Vec<u8>,
    metadata: Metadata,
}

impl Jpeg {
    /// The file this was read from.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Takes the metadata, dropping the file.
    pub fn into_metadata(self) -> Metadata {
        self.metadata
    }
}

impl MetadataProvider for Jpeg {
    type ConstructionError = JpegError;

    fn magic_number(input: &[u8]) -> bool {
        input.starts_with(&[0xFF, SOI_MARKER_CODE, 0xFF])
    }

    fn new(
        input: &impl AsRef<[u8]>,
    ) -> Result<Self, <Self as MetadataProvider>::ConstructionError> {
        let bytes = input.as_ref();
        Ok(Self {
            metadata: parse(bytes)?,
            bytes: bytes.to_vec(),
        })
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    fn previews(&self) -> Vec<PreviewProperties> {
        preview::properties(&self.metadata)
    }

    fn extract_preview(&self, props: &PreviewProperties) -> Result<PreviewImage, PreviewError> {
        preview::extract(&self.bytes, props)
    }

    fn write_with(&self, options: &WriteOptions) -> Result<Vec<u8>, EngineError> {
        write::rewrite(&self.bytes, &self.metadata, options)
    }
}

/// Reads every metadata family out of a JPEG.
///
/// Only a broken segment structure is fatal. A metadata block that can't be
/// decoded is recorded on its family and skipped.
fn parse(bytes: &[u8]) -> Result<Metadata, JpegError> {
    let mut metadata = Metadata::new();

    let mut seen_exif = false;
    let mut xmp: Option<Segment> = None;
    let mut extended: Vec<Segment> = Vec::new();
    let mut photoshop: Option<Vec<u8>> = None;

    for seg in Segments::new(bytes)? {
        let seg = seg?;

        match seg.kind {
            SegmentKind::App1Exif if !seen_exif => {
                read_exif(&mut metadata, &seg);
                seen_exif = true;
            }
            SegmentKind::App1Xmp if xmp.is_none() => xmp = Some(seg),
            SegmentKind::App1Exif | SegmentKind::App1Xmp => {
                log::debug!(
                    "Ignoring duplicate `{:?}` segment at offset `{}`.",
                    seg.kind,
                    seg.offset
                );
            }
            SegmentKind::App1ExtendedXmp => extended.push(seg),

            // Photoshop splits big resource blocks over many segments
            SegmentKind::App13Photoshop => photoshop
                .get_or_insert_with(Vec::new)
                .extend_from_slice(seg.signature_payload()),

            SegmentKind::Comment if metadata.comment.is_none() => {
                let payload = seg.payload();
                let end = payload.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
                metadata.comment = Some(String::from_utf8_lossy(&payload[..end]).into_owned());
            }

            SegmentKind::Comment | SegmentKind::Other | SegmentKind::ImageData => (),
        }
    }

    if let Some(seg) = xmp {
        read_xmp(&mut metadata, &seg, &extended);
    }

    if let Some(blob) = photoshop {
        read_iptc(&mut metadata, &blob);
    }

    Ok(metadata)
}

fn read_exif(metadata: &mut Metadata, seg: &Segment) {
    let tiff_offset = seg.payload_offset() + scan::EXIF_SIG.len();

    match exif::decode(seg.signature_payload(), tiff_offset) {
        Ok(decoded) => {
            log::debug!("Decoded `{}` Exif entries.", decoded.entries.len());
            metadata.put_entries(Family::Exif, decoded.entries);
            metadata.exif_state = decoded.state;
            metadata.set_status(Family::Exif, FamilyStatus::Decoded);
            for w in decoded.warnings {
                metadata.warn(Family::Exif, w);
            }
        }
        Err(e) => {
            metadata.warn(Family::Exif, format!("Skipping Exif block. err: {e}"));
            metadata.set_status(Family::Exif, FamilyStatus::Undecodable(e.to_string()));
        }
    }
}

fn read_xmp(metadata: &mut Metadata, seg: &Segment, extended: &[Segment]) {
    let mut decoded: DecodedXmp = match xmp::decode(seg.signature_payload()) {
        Ok(d) => d,
        Err(e) => {
            metadata.warn(Family::Xmp, format!("Skipping XMP packet. err: {e}"));
            metadata.set_status(Family::Xmp, FamilyStatus::Undecodable(e.to_string()));
            return;
        }
    };

    if let Some(guid) = decoded.extended_guid.clone() {
        match extended_packet(&guid, extended) {
            Ok(packet) => {
                if let Err(e) = decoded.merge(&packet) {
                    decoded
                        .warnings
                        .push(format!("Skipping extended XMP packet. err: {e}"));
                }
            }
            Err(reason) => decoded
                .warnings
                .push(format!("Skipping extended XMP packet. reason: {reason}")),
        }
    } else if !extended.is_empty() {
        log::debug!("Found extended XMP chunks, but the main packet doesn't point at them.");
    }

    log::debug!("Decoded `{}` XMP properties.", decoded.entries.len());
    metadata.put_entries(Family::Xmp, decoded.entries);
    metadata.xmp_state = decoded.state;
    metadata.set_status(Family::Xmp, FamilyStatus::Decoded);
    for w in decoded.warnings {
        metadata.warn(Family::Xmp, w);
    }
}

fn read_iptc(metadata: &mut Metadata, blob: &[u8]) {
    match iptc::decode(blob) {
        Ok(decoded) => {
            log::debug!("Decoded `{}` IPTC datasets.", decoded.entries.len());
            metadata.put_entries(Family::Iptc, decoded.entries);
            metadata.iptc_state = decoded.state;
            metadata.set_status(Family::Iptc, FamilyStatus::Decoded);
            for w in decoded.warnings {
                metadata.warn(Family::Iptc, w);
            }
        }
        Err(e) => {
            metadata.warn(Family::Iptc, format!("Skipping Photoshop resources. err: {e}"));
            metadata.set_status(Family::Iptc, FamilyStatus::Undecodable(e.to_string()));
        }
    }
}

/// One chunk of an extended XMP packet.
struct ExtendedChunk<'a> {
    guid: &'a [u8],
    full_len: u32,
    offset: u32,
    data: &'a [u8],
}

fn extended_chunk<'a>(seg: &Segment<'a>) -> Option<ExtendedChunk<'a>> {
    let input: &mut &'a [u8] = &mut seg.signature_payload();

    let (guid, full_len, offset): (&[u8], u32, u32) = (take(32_usize), be_u32, be_u32)
        .parse_next(input)
        .map_err(|_: EmptyError| {
            log::warn!("Extended XMP chunk at offset `{}` is too short.", seg.offset)
        })
        .ok()?;

    Some(ExtendedChunk {
        guid,
        full_len,
        offset,
        data: input,
    })
}

/// Puts the extended packet with the given GUID back together.
///
/// Chunks can come in any order, so they're sorted by their offset into the
/// full packet.
fn extended_packet(guid: &str, segments: &[Segment]) -> Result<Vec<u8>, String> {
    let mut chunks: BTreeMap<u32, ExtendedChunk> = BTreeMap::new();
    let mut full_len: Option<u32> = None;

    for chunk in segments.iter().filter_map(extended_chunk) {
        if chunk.guid != guid.as_bytes() {
            log::debug!("Skipping extended XMP chunk for another packet.");
            continue;
        }

        match full_len {
            Some(len) if len != chunk.full_len => {
                return Err(format!(
                    "chunks disagree on the packet length. \
                    `{len}` vs. `{}`",
                    chunk.full_len
                ));
            }
            _ => full_len = Some(chunk.full_len),
        }

        chunks.insert(chunk.offset, chunk);
    }

    let Some(full_len) = full_len else {
        return Err(format!("no chunks were found for GUID `{guid}`"));
    };

    let mut packet: Vec<u8> = Vec::with_capacity(full_len as usize);
    for (offset, chunk) in chunks {
        if offset as usize != packet.len() {
            return Err(format!(
                "expected a chunk at offset `{}`, but the next one is at `{offset}`",
                packet.len()
            ));
        }
        packet.extend_from_slice(chunk.data);
    }

    if packet.len() != full_len as usize {
        return Err(format!(
            "packet should be `{full_len}` bytes, but the chunks hold `{}`",
            packet.len()
        ));
    }

    log::trace!("Reassembled `{full_len}` bytes of extended XMP.");
    Ok(packet)
}
