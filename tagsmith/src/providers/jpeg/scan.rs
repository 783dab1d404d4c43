//! Splits a JPEG file into its segments.
//!
//! A JPEG file is a list of marker segments, each one `0xFF`, a marker code,
//! and (for most markers) a big-endian length followed by a payload. Once the
//! first scan starts, the rest of the file is entropy-coded image data that we
//! never look inside.

use winnow::{
    Parser,
    binary::{be_u16, u8},
    error::EmptyError,
    token::take,
};

use super::JpegError;

/// The biggest payload a marker segment can hold.
///
/// The length field is a `u16` that counts itself.
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize - 2;

/// The first marker code, `SOI` (start of image).
pub const SOI_MARKER_CODE: u8 = 0xD8;

/// The last marker code, `EOI` (end of image).
pub const EOI_MARKER_CODE: u8 = 0xD9;

/// The start of scan code, `SOS`.
pub const SOS_MARKER_CODE: u8 = 0xDA;

/// `APP0`, used by JFIF and JFXX headers.
pub const APP0_MARKER_CODE: u8 = 0xE0;

/// A marker code indicating that an APP1 marker is present.
pub const APP1_MARKER_CODE: u8 = 0xE1;

/// `APP13`, home of Photoshop's image resources.
pub const APP13_MARKER_CODE: u8 = 0xED;

/// `COM`, a text comment.
pub const COM_MARKER_CODE: u8 = 0xFE;

pub const EXIF_SIG: &[u8] = b"Exif\0\0";
pub const XMP_SIG: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";
pub const XMP_EXT_SIG: &[u8] = b"http://ns.adobe.com/xmp/extension/\0";
pub const PHOTOSHOP_SIG: &[u8] = b"Photoshop 3.0\0";

/// Markers that have no length or payload.
const STANDALONE_MARKERS: &[u8] = &[
    0xD0, 0xD1, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, 0xD7, SOI_MARKER_CODE, 0x01,
];

/// What a segment holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// APP1 starting with `Exif\0\0`.
    App1Exif,

    /// APP1 holding the main XMP packet.
    App1Xmp,

    /// APP1 holding one chunk of an extended XMP packet.
    App1ExtendedXmp,

    /// APP13 holding Photoshop image resources.
    App13Photoshop,

    /// A `COM` segment.
    Comment,

    /// Anything else. Copied as-is when writing.
    Other,

    /// The first scan (or an `EOI` found before one) and everything after it.
    ImageData,
}

/// One segment, borrowed from the file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment<'a> {
    pub kind: SegmentKind,

    /// The marker code, like `0xE1` for APP1.
    pub marker: u8,

    /// Where the segment starts in the file.
    pub offset: usize,

    /// The whole segment: fill bytes, marker, length, and payload.
    pub raw: &'a [u8],

    /// How many bytes of `raw` come before the payload.
    header_len: usize,
}

impl<'a> Segment<'a> {
    /// The bytes after the length field.
    pub fn payload(&self) -> &'a [u8] {
        &self.raw[self.header_len..]
    }

    /// Where the payload starts in the file.
    pub fn payload_offset(&self) -> usize {
        self.offset + self.header_len
    }

    /// The payload, without the signature that classified it.
    pub fn signature_payload(&self) -> &'a [u8] {
        let sig_len = match self.kind {
            SegmentKind::App1Exif => EXIF_SIG.len(),
            SegmentKind::App1Xmp => XMP_SIG.len(),
            SegmentKind::App1ExtendedXmp => XMP_EXT_SIG.len(),
            SegmentKind::App13Photoshop => PHOTOSHOP_SIG.len(),
            SegmentKind::Comment | SegmentKind::Other | SegmentKind::ImageData => 0,
        };
        &self.payload()[sig_len..]
    }
}

/// Lazily walks the segments of a JPEG file, in order.
///
/// Iteration stops after the [`SegmentKind::ImageData`] segment, or after the
/// first error.
#[derive(Clone, Debug)]
pub struct Segments<'a> {
    input: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> Segments<'a> {
    /// Checks for the `SOI` marker, then gets ready to walk the rest.
    pub fn new(input: &'a [u8]) -> Result<Self, JpegError> {
        let Some(found) = input.first_chunk::<2>() else {
            log::error!("Input is too short to be a JPEG file.");
            return Err(JpegError::TooShort);
        };

        if *found != [0xFF, SOI_MARKER_CODE] {
            log::error!(
                "The first marker of a JPEG file should be `SOI`, \
                but it wasn't! \
                got: `{found:x?}`"
            );
            return Err(JpegError::FirstMarkerWasNotSoi { found: *found });
        }

        Ok(Self {
            input,
            pos: 2,
            done: false,
        })
    }

    /// Reads the segment at the current position.
    fn segment(&self) -> Result<Segment<'a>, JpegError> {
        let data: &'a [u8] = self.input;
        let offset = self.pos;
        let input: &mut &'a [u8] = &mut &data[offset..];

        // each marker must begin with one `0xFF` byte.
        let first_marker_byte: u8 = u8.parse_next(input).map_err(|_: EmptyError| {
            log::error!("Failed to get first marker byte!");
            JpegError::NoMarkerCode { offset }
        })?;
        if first_marker_byte != 0xFF {
            log::error!("JPEG marker's first byte was wrong. offset: `{offset}`");
            return Err(JpegError::FirstMarkerByteWasWrong {
                byte: first_marker_byte,
                offset,
            });
        }

        // a marker may have any number of `0xFF` fill bytes before its code
        let marker_code: u8 = loop {
            let k: u8 = u8.parse_next(input).map_err(|_: EmptyError| {
                log::error!("Failed to parse out marker byte!");
                JpegError::NoMarkerCode { offset }
            })?;

            if k != 0xFF {
                break k;
            }
        };

        if marker_code == 0 {
            log::error!("JPEG marker code was `0`, which is disallowed.");
            return Err(JpegError::MarkerCodeDisallowed(marker_code));
        }

        let consumed = |rest: &[u8]| data.len() - offset - rest.len();

        // the scan runs to the end of the file, as far as we're concerned
        if marker_code == SOS_MARKER_CODE || marker_code == EOI_MARKER_CODE {
            log::trace!("Found image data at offset `{offset}`.");
            return Ok(Segment {
                kind: SegmentKind::ImageData,
                marker: marker_code,
                offset,
                raw: &data[offset..],
                header_len: 0,
            });
        }

        if STANDALONE_MARKERS.contains(&marker_code) {
            log::trace!("Got standalone marker with code `{marker_code:x?}`.");
            let len = consumed(*input);
            return Ok(Segment {
                kind: SegmentKind::Other,
                marker: marker_code,
                offset,
                raw: &data[offset..offset + len],
                header_len: len,
            });
        }

        let original_len: u16 = be_u16.parse_next(input).map_err(|_: EmptyError| {
            log::error!("Failed to find `u16` length byte pair when parsing marker.");
            JpegError::NoLength { marker_code }
        })?;

        // the length counts its own two bytes
        let len: u16 = original_len
            .checked_sub(2_u16)
            .ok_or(JpegError::NegativeLength {
                marker_code,
                original_len,
            })?;

        let header_len = consumed(*input);
        let remaining_input_len = input.len() as u64;
        let payload: &[u8] = take(len as usize)
            .parse_next(input)
            .map_err(|_: EmptyError| {
                log::error!(
                    "Attempted to parse payload from JPEG marker, \
                    but ran out of data. \
                    marker code: `{marker_code:x?}`, len: `{len}` bytes, \
                    remaining input len: `{remaining_input_len}` bytes"
                );
                JpegError::NoDataForPayload {
                    marker_code,
                    original_len,
                    remaining_input_len,
                }
            })?;

        let kind = classify(marker_code, payload);
        log::trace!(
            "Got segment. kind: `{kind:?}`, code: `{marker_code:x?}`, \
            offset: `{offset}`, len: `{len}`"
        );

        let total = consumed(*input);
        Ok(Segment {
            kind,
            marker: marker_code,
            offset,
            raw: &data[offset..offset + total],
            header_len,
        })
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Result<Segment<'a>, JpegError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.input.len() {
            return None;
        }

        let res = self.segment();
        match res {
            Ok(ref seg) => {
                self.pos += seg.raw.len();
                self.done = seg.kind == SegmentKind::ImageData;
            }
            Err(_) => self.done = true,
        }

        Some(res)
    }
}

/// Says what a segment holds from its marker and the start of its payload.
fn classify(marker_code: u8, payload: &[u8]) -> SegmentKind {
    match marker_code {
        APP1_MARKER_CODE if payload.starts_with(EXIF_SIG) => SegmentKind::App1Exif,
        APP1_MARKER_CODE if payload.starts_with(XMP_SIG) => SegmentKind::App1Xmp,
        APP1_MARKER_CODE if payload.starts_with(XMP_EXT_SIG) => SegmentKind::App1ExtendedXmp,
        APP13_MARKER_CODE if payload.starts_with(PHOTOSHOP_SIG) => SegmentKind::App13Photoshop,
        COM_MARKER_CODE => SegmentKind::Comment,
        _ => SegmentKind::Other,
    }
}

/// Reads `(width, height)` from a JPEG's frame header.
///
/// Returns `None` if the bytes aren't a JPEG or there's no `SOFn` before the
/// image data.
pub fn frame_size(jpeg: &[u8]) -> Option<(u32, u32)> {
    for seg in Segments::new(jpeg).ok()? {
        let seg = seg.ok()?;

        // SOF0..=SOF15, except DHT, JPG, and DAC
        let is_sof = (0xC0..=0xCF).contains(&seg.marker) && ![0xC4, 0xC8, 0xCC].contains(&seg.marker);

        if is_sof {
            let input: &mut &[u8] = &mut seg.payload();
            let (_precision, height, width): (u8, u16, u16) = (u8, be_u16, be_u16)
                .parse_next(input)
                .map_err(|_: EmptyError| log::debug!("Frame header was too short."))
                .ok()?;

            return Some((u32::from(width), u32::from(height)));
        }

        if seg.kind == SegmentKind::ImageData {
            break;
        }
    }

    None
}

/// Creates a marker segment from its code and payload.
///
/// The payload must fit in [`MAX_PAYLOAD_LEN`].
pub(crate) fn marker_segment(marker_code: u8, parts: &[&[u8]]) -> Vec<u8> {
    let payload_len: usize = parts.iter().map(|p| p.len()).sum();
    debug_assert!(payload_len <= MAX_PAYLOAD_LEN);

    let mut out = Vec::with_capacity(payload_len + 4);
    out.extend_from_slice(&[0xFF, marker_code]);
    out.extend_from_slice(&((payload_len + 2) as u16).to_be_bytes());
    for p in parts {
        out.extend_from_slice(p);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::logger;

    /// SOI, APP0, APP1 (Exif), COM, a restart marker, SOS, some scan bytes,
    /// EOI.
    fn sample() -> Vec<u8> {
        let mut v = vec![0xFF, 0xD8];
        v.extend(marker_segment(APP0_MARKER_CODE, &[b"JFIF\0\x01\x02"]));
        v.extend(marker_segment(APP1_MARKER_CODE, &[EXIF_SIG, b"MM\0\x2a"]));
        v.extend([0xFF, 0xFF, 0xFF]); // fill bytes
        v.extend(marker_segment(COM_MARKER_CODE, &[b"hi"]));
        v.extend([0xFF, 0xD0]);
        v.extend(marker_segment(SOS_MARKER_CODE, &[&[1, 1, 0, 0, 0x3F, 0]]));
        v.extend([0x12, 0xFF, 0x00, 0x34, 0xFF, 0xD9]);
        v
    }

    #[test]
    fn walks_every_segment() {
        logger();

        let bytes = sample();
        let segs: Vec<Segment> = Segments::new(&bytes)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        let kinds: Vec<SegmentKind> = segs.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            [
                SegmentKind::Other,
                SegmentKind::App1Exif,
                SegmentKind::Comment,
                SegmentKind::Other,
                SegmentKind::ImageData,
            ]
        );

        // every byte after SOI belongs to exactly one segment
        let total: usize = segs.iter().map(|s| s.raw.len()).sum();
        assert_eq!(total + 2, bytes.len());

        assert_eq!(segs[1].signature_payload(), b"MM\0\x2a");
        assert_eq!(segs[1].payload_offset(), segs[1].offset + 4);

        // fill bytes stay with the segment they precede
        assert_eq!(&segs[2].raw[..3], &[0xFF, 0xFF, 0xFF]);
        assert_eq!(segs[2].payload(), b"hi");

        assert_eq!(segs[3].raw, &[0xFF, 0xD0]);
        assert!(segs[3].payload().is_empty());

        assert_eq!(segs[4].raw.last(), Some(&0xD9));
    }

    #[test]
    fn rejects_non_jpeg_input() {
        logger();

        assert_eq!(Segments::new(&[]).unwrap_err(), JpegError::TooShort);
        assert!(matches!(
            Segments::new(b"\x89PNG\r\n\x1a\n"),
            Err(JpegError::FirstMarkerWasNotSoi { .. })
        ));
    }

    #[test]
    fn truncated_segments_are_errors() {
        logger();

        // says 16 bytes, has 2
        let bytes = [0xFF, 0xD8, 0xFF, 0xE1, 0x00, 0x10, 1, 2];
        let mut segs = Segments::new(&bytes).unwrap();
        assert!(matches!(
            segs.next(),
            Some(Err(JpegError::NoDataForPayload { marker_code: 0xE1, .. }))
        ));
        assert!(segs.next().is_none());

        // a length of 1 can't even hold itself
        let bytes = [0xFF, 0xD8, 0xFF, 0xE1, 0x00, 0x01];
        let err = Segments::new(&bytes).unwrap().next().unwrap().unwrap_err();
        assert!(matches!(err, JpegError::NegativeLength { .. }));

        // garbage where a marker should be
        let bytes = [0xFF, 0xD8, 0x00, 0x01];
        let err = Segments::new(&bytes).unwrap().next().unwrap().unwrap_err();
        assert!(matches!(
            err,
            JpegError::FirstMarkerByteWasWrong { byte: 0, offset: 2 }
        ));
    }

    #[test]
    fn reads_frame_size() {
        logger();

        let mut bytes = vec![0xFF, 0xD8];
        bytes.extend(marker_segment(0xC4, &[&[0; 4]])); // DHT isn't a frame
        bytes.extend(marker_segment(0xC0, &[&[8, 0, 120, 0, 160, 3]]));
        bytes.extend([0xFF, 0xD9]);

        assert_eq!(frame_size(&bytes), Some((160, 120)));
        assert_eq!(frame_size(&[0xFF, 0xD8, 0xFF, 0xD9]), None);
        assert_eq!(frame_size(b"nope"), None);
    }
}
