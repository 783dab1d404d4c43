//! Exif is a media metadata format primarily used by cameras.
//!
//! Unlike XMP, it's a structured binary format: a TIFF header followed by a
//! graph of IFDs (Image File Directories). Each entry on an IFD contains a tag
//! ID, primitive data type, and count saying how many primitives are stored.
//! That means we can carry proprietary entries along, all without knowing how
//! they're structured.
//!
//! IFD 0 describes the main image and starts a chain of IFDs (IFD 1 is the
//! thumbnail). Pointer tags on IFD 0 lead to the Exif and GPS sub-IFDs, and
//! the Exif sub-IFD may point at the interoperability IFD.

use std::collections::{BTreeSet, VecDeque};

use tagsmith_types::{
    exif::{
        Endianness,
        ifd::IfdGroup,
        tags::{
            JPEG_INTERCHANGE_FORMAT, JPEG_INTERCHANGE_FORMAT_LENGTH,
            KnownTag, SUB_IFD_POINTER_TAGS, SUB_IFDS, pointer_target,
        },
    },
    key::{Family, TagKey, format_hex_id, hex_id},
    value::{TagValue, ValueKind},
};
use winnow::{
    Parser as _, Stateful,
    binary::{Endianness as WinnowEndianness, u16, u32},
    error::EmptyError,
    token::take,
};

use self::{
    error::{ExifFatalError, ExifFatalResult},
    ifd::parse_ifd,
};
use crate::{
    EngineError,
    container::{Entries, ExifState},
};

pub mod error;
mod encode;
mod ifd;
mod value;

pub use encode::encode;

/// Everything read from an Exif block.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedExif {
    pub entries: Entries,
    pub state: ExifState,

    /// Entries and IFDs that were skipped.
    pub warnings: Vec<String>,
}

/// Parses an Exif block, starting at its TIFF header.
///
/// `tiff_offset` is where the TIFF header sits in the whole file.
pub fn decode(blob: &[u8], tiff_offset: usize) -> ExifFatalResult<DecodedExif> {
    let input: &mut &[u8] = &mut &*blob;

    // parse the endianness
    let endianness: Endianness = parse_blob_endianness(input)?;
    let winnow_endianness = to_winnow(endianness);

    // alright. from here on out, we've got to account for the endianness
    // of everything.
    //
    // to do so, our input is wrapped in `Stateful`
    let stateful_input = &mut Stream {
        input: *input,
        state: State {
            endianness: winnow_endianness,
            blob,
            group: IfdGroup::_0, // we always start with IFD 0
        },
    };

    // ensure we've got a TIFF marker (magic number)
    parse_tiff_magic_number(stateful_input)?;

    // grab the offset from the TIFF marker where we'll start
    let first_ifd: u32 = parse_tiff_header_offset(stateful_input)?;
    if first_ifd as usize > blob.len() {
        log::error!("First IFD is outside the Exif block. offset: `{first_ifd}`");
        return Err(ExifFatalError::NotEnoughDataForHeaderOffset { offset: first_ifd });
    }

    let mut out = DecodedExif {
        entries: Entries::new(),
        state: ExifState {
            byte_order: Some(endianness),
            tiff_offset: Some(tiff_offset),
            ..Default::default()
        },
        warnings: Vec::new(),
    };

    // if there are no IFDs, do an early return
    if first_ifd as usize == blob.len() {
        log::trace!("There's no more input. Assuming there are zero IFDs.");
        return Ok(out);
    }

    // sub-IFDs go to the front of the queue, so their entries follow their
    // parent's. the chain goes to the back.
    let mut queue: VecDeque<(IfdGroup, u32)> = VecDeque::from([(IfdGroup::_0, first_ifd)]);
    let mut visited: BTreeSet<u32> = BTreeSet::new();

    while let Some((group, offset)) = queue.pop_front() {
        if !visited.insert(offset) {
            out.warn(format!(
                "IFD `{group}` points back at an IFD we've already read. \
                Cutting the loop. offset: `{offset}`"
            ));
            continue;
        }

        let state = State {
            endianness: winnow_endianness,
            blob,
            group,
        };

        let ifd = match parse_ifd(&state, offset) {
            Ok(ifd) => ifd,
            Err(e) if group == IfdGroup::_0 => {
                log::error!("Failed to parse Exif! The first IFD failed to parse! err: {e}");
                return Err(ExifFatalError::FirstIfd(e));
            }
            Err(e) => {
                out.warn(format!("Skipping IFD. err: {e}"));
                continue;
            }
        };

        let mut sub_ifds: Vec<(IfdGroup, u32)> = Vec::new();
        let mut blob_offset: Option<u32> = None;
        let mut blob_len: Option<u32> = None;

        for field in ifd.fields {
            let entry = match field {
                Ok(entry) => entry,
                Err(e) => {
                    out.warn(format!("Skipping entry on IFD `{group}`. err: {e}"));
                    continue;
                }
            };

            // pointer tags are made again when writing, so they're never
            // entries
            if SUB_IFD_POINTER_TAGS.contains(&entry.tag) {
                let target = pointer_target(entry.tag);
                let allowed = match target {
                    Some(IfdGroup::Interop) => group == IfdGroup::Exif,
                    Some(_) => group == IfdGroup::_0,
                    None => false,
                };

                match (target, entry.as_u32(winnow_endianness)) {
                    (Some(target), Some(ptr)) if allowed => {
                        log::trace!("IFD `{group}` points to `{target}` at `{ptr}`.");
                        sub_ifds.push((target, ptr));
                    }
                    _ => out.warn(format!(
                        "Ignoring pointer tag `{:#06x}` on IFD `{group}`.",
                        entry.tag
                    )),
                }
                continue;
            }

            if entry.tag == SUB_IFDS && group.chain_index().is_some() {
                out.warn(format!("Skipping the `SubIFDs` list on IFD `{group}`."));
                continue;
            }

            if group.chain_index().is_some() {
                match entry.tag {
                    JPEG_INTERCHANGE_FORMAT => blob_offset = entry.as_u32(winnow_endianness),
                    JPEG_INTERCHANGE_FORMAT_LENGTH => blob_len = entry.as_u32(winnow_endianness),
                    _ => (),
                }
            }

            let key = match entry_key(group, entry.tag) {
                Ok(k) => k,
                Err(e) => {
                    out.warn(format!("Couldn't name entry `{:#06x}`. err: {e}", entry.tag));
                    continue;
                }
            };

            let value = TagValue::new(ValueKind::from(entry.ty), entry.data.to_vec(), endianness);
            out.entries.append(key, value);
        }

        // copy the embedded image, so it can move with its IFD
        if let (Some(start), Some(len)) = (blob_offset, blob_len) {
            let range = (start as usize)
                .checked_add(len as usize)
                .map(|end| start as usize..end);
            match range.and_then(|r| blob.get(r)) {
                Some(bytes) => {
                    log::trace!("IFD `{group}` holds an embedded image of `{len}` bytes.");
                    out.state.blobs.insert(group, bytes.to_vec());
                }
                None => out.warn(format!(
                    "IFD `{group}` says it holds an embedded image outside the \
                    Exif block. offset: `{start}`, len: `{len}`"
                )),
            }
        }

        for sub in sub_ifds.into_iter().rev() {
            queue.push_front(sub);
        }

        if let (Some(index), Some(next)) = (group.chain_index(), ifd.next) {
            match index.checked_add(1) {
                Some(i) => queue.push_back((IfdGroup::from_chain_index(i), next)),
                None => out.warn("The IFD chain is too long. Ignoring the rest."),
            }
        }
    }

    Ok(out)
}

impl DecodedExif {
    fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{message}");
        self.warnings.push(message);
    }
}

/// The key an entry goes by.
fn entry_key(group: IfdGroup, tag: u16) -> Result<TagKey, tagsmith_types::key::KeyError> {
    let name = match KnownTag::try_from((group, tag)) {
        Ok(known) => known.tag_name().to_string(),
        Err(()) => format_hex_id(tag),
    };
    TagKey::new(Family::Exif, group.group_name(), name)
}

/// Finds the IFD and tag ID that an Exif key refers to.
pub fn resolve_key(key: &TagKey) -> Result<(IfdGroup, u16), EngineError> {
    let invalid = |reason: &str| EngineError::InvalidKey {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    if key.family() != Family::Exif {
        return Err(invalid("not an Exif key"));
    }

    let group = IfdGroup::from_group_name(key.group())
        .ok_or_else(|| invalid("unknown IFD group"))?;

    let tag = KnownTag::from_name(group, key.name())
        .map(|t| t.tag_id())
        .or_else(|| hex_id(key.name()))
        .ok_or_else(|| invalid("unknown tag name"))?;

    if SUB_IFD_POINTER_TAGS.contains(&tag) || tag == SUB_IFDS {
        return Err(invalid("IFD pointers are written automatically"));
    }

    Ok((group, tag))
}

/// Checks that Exif can store `value`.
pub fn check_value(key: &TagKey, value: &TagValue) -> Result<(), EngineError> {
    match value.kind().primitive() {
        Some(_) => Ok(()),
        None => Err(EngineError::InvalidValue {
            key: key.clone(),
            reason: format!("Exif can't store `{}` values", value.kind()),
        }),
    }
}

/// The kind a new value for `key` should have.
///
/// Unknown tags are treated as text.
pub fn default_kind(key: &TagKey) -> ValueKind {
    IfdGroup::from_group_name(key.group())
        .and_then(|group| KnownTag::from_name(group, key.name()))
        .map(|t| ValueKind::from(t.default_type()))
        .unwrap_or(ValueKind::Ascii)
}

/// Finds the endianness of the Exif blob.
fn parse_blob_endianness(input: &mut &[u8]) -> ExifFatalResult<Endianness> {
    let input_len = input.len();

    // ensure we've got two good bytes
    log::trace!("Looking for the BOM bytes...");
    let two_ascii_bytes: &[u8] = take(2_usize)
        .parse_next(input)
        .map_err(|_: EmptyError| {
            log::error!("Couldn't find endianness marker!");
            ExifFatalError::NoByteOrderMarker { len: input_len }
        })?;
    let found: [u8; 2] = [two_ascii_bytes[0], two_ascii_bytes[1]];

    // parse the bytes we found
    match Endianness::from_marker(found) {
        Some(e) => Ok(e).inspect(|f| log::trace!("Got BOM: {f:?}")),

        // found a weird bom!
        None => {
            let e = ExifFatalError::WeirdByteOrderMarker { found };
            log::error!("Couldn't parse out Exif! err: {e}");
            Err(e)
        }
    }
}

/*
*
*
*
  NOTE:

  all parsers from here on out generally require knowing the endianness. so,
  it's stored inside a custom state struct + a stream wrapper.

  this allows us to easily pass our state between pieces of the parser, all
  without globals or other nasty stuff
*
*
*
*
*/

#[derive(Clone, Debug)]
struct State<'a> {
    /// The IFD being read.
    group: IfdGroup,
    endianness: WinnowEndianness,

    /// The whole Exif block, starting at the TIFF header. Offsets are
    /// relative to it.
    blob: &'a [u8],
}

/// A stream of the blob wrapped with our endianness.
type Stream<'s> = Stateful<&'s [u8], State<'s>>;

fn to_winnow(endianness: Endianness) -> WinnowEndianness {
    match endianness {
        Endianness::Little => WinnowEndianness::Little,
        Endianness::Big => WinnowEndianness::Big,
    }
}

/// Ensures we're working with the correct kind of file.
fn parse_tiff_magic_number(input: &mut Stream) -> ExifFatalResult<()> {
    // we account for endianness from here on out
    let endianness = input.state.endianness;

    // grab the magic number bytes as a u16
    log::trace!("Getting magic number...");
    let magic_number: u16 = u16(endianness)
        .parse_next(input)
        .map_err(|_: EmptyError| {
            log::error!("Couldn't find TIFF magic number!");
            ExifFatalError::NoTiffMagicNumber
        })?;

    // check the magic number
    if magic_number != 42 {
        log::error!("Magic number wasn't for TIFF. got: `{magic_number}`");
        return Err(ExifFatalError::MagicNumberWasntTiff {
            found: magic_number,
        });
    }

    log::trace!("Magic number was good!");
    Ok(())
}

/// Grabs the offset of IFD 0, from the start of the TIFF header.
fn parse_tiff_header_offset(input: &mut Stream) -> ExifFatalResult<u32> {
    let endianness = input.state.endianness;

    let offset = u32(endianness)
        .parse_next(&mut input.input)
        .map_err(|_: EmptyError| {
            log::error!("Didn't find a TIFF header offset!");
            ExifFatalError::NoTiffHeaderOffset
        })
        .inspect(|offset| log::trace!("found offset: `{offset}`"))?;

    // the header itself is eight bytes
    if offset < 8 {
        log::error!("Exif blob placed offset out of bounds! Can't continue parsing.");
        return Err(ExifFatalError::HeaderOffsetBeforeHeader);
    }

    Ok(offset)
}

#[cfg(test)]
mod tests {
    use tagsmith_types::exif::primitives::PrimitiveTy;

    use super::*;
    use crate::util::logger;

    /// Writes one IFD entry.
    fn entry(v: &mut Vec<u8>, le: bool, tag: u16, ty: PrimitiveTy, count: u32, value: [u8; 4]) {
        let (tag, ty, count) = match le {
            true => (tag.to_le_bytes(), (ty as u16).to_le_bytes(), count.to_le_bytes()),
            false => (tag.to_be_bytes(), (ty as u16).to_be_bytes(), count.to_be_bytes()),
        };
        v.extend(tag);
        v.extend(ty);
        v.extend(count);
        v.extend(value);
    }

    #[test]
    fn endianness() {
        logger();

        assert_eq!(
            parse_blob_endianness(&mut b"II".as_slice()),
            Ok(Endianness::Little)
        );
        assert_eq!(
            parse_blob_endianness(&mut b"MM".as_slice()),
            Ok(Endianness::Big)
        );
        assert!(
            parse_blob_endianness(&mut b"other".as_slice()).is_err(),
            "other strings aren't indicative of endianness"
        );
    }

    #[test]
    fn broken_headers_are_fatal() {
        logger();

        assert!(matches!(
            decode(b"M", 0),
            Err(ExifFatalError::NoByteOrderMarker { len: 1 })
        ));
        assert!(matches!(
            decode(b"MM\0\x2b\0\0\0\x08", 0),
            Err(ExifFatalError::MagicNumberWasntTiff { found: 43 })
        ));
        assert!(matches!(
            decode(b"MM\0\x2a\0\0\0\x07", 0),
            Err(ExifFatalError::HeaderOffsetBeforeHeader)
        ));
        assert!(matches!(
            decode(b"MM\0\x2a\0\0\x10\x00", 0),
            Err(ExifFatalError::NotEnoughDataForHeaderOffset { .. })
        ));
    }

    #[test]
    fn parses_minimal_exif() {
        logger();

        let mut blob = Vec::new();
        blob.extend_from_slice(b"II");
        blob.extend(42_u16.to_le_bytes());
        blob.extend(9_u32.to_le_bytes()); // 9, since there's a junk byte
        blob.push(u8::MAX);

        // there's only one field in this IFD
        blob.extend(1_u16.to_le_bytes());
        entry(&mut blob, true, 0x0100, PrimitiveTy::Short, 1, [0x80, 0x07, 0, 0]);

        // no other IFDs are after this one
        blob.extend(0_u32.to_le_bytes());

        let exif = decode(&blob, 12).unwrap();
        assert_eq!(exif.state.byte_order, Some(Endianness::Little));
        assert_eq!(exif.state.tiff_offset, Some(12));
        assert!(exif.warnings.is_empty());

        let width = TagKey::parse("Exif.Image.ImageWidth").unwrap();
        let values = exif.entries.get(&width);
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].kind(), ValueKind::Short);
        assert_eq!(values[0].to_text(), "1920");
    }

    #[test]
    fn follows_pointers_and_the_chain() {
        logger();

        // header, then IFD0 at 8 with two entries (Make, ExifTag)
        let mut blob = Vec::new();
        blob.extend_from_slice(b"MM");
        blob.extend(42_u16.to_be_bytes());
        blob.extend(8_u32.to_be_bytes());

        // IFD0: 8 + 2 + 24 + 4 = 38
        blob.extend(2_u16.to_be_bytes());
        entry(&mut blob, false, 0x010F, PrimitiveTy::Ascii, 4, *b"Abc\0");
        entry(&mut blob, false, 0x8769, PrimitiveTy::Long, 1, 38_u32.to_be_bytes());
        blob.extend(56_u32.to_be_bytes()); // IFD1

        // Exif IFD at 38: 2 + 12 + 4 = 18 -> ends at 56
        blob.extend(1_u16.to_be_bytes());
        entry(&mut blob, false, 0x829A, PrimitiveTy::Short, 1, [0, 5, 0, 0]);
        blob.extend(0_u32.to_be_bytes());

        // IFD1 at 56, pointing back at IFD0
        blob.extend(1_u16.to_be_bytes());
        entry(&mut blob, false, 0x0103, PrimitiveTy::Short, 1, [0, 6, 0, 0]);
        blob.extend(8_u32.to_be_bytes());

        let exif = decode(&blob, 0).unwrap();
        let keys: Vec<String> = exif.entries.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(
            keys,
            [
                "Exif.Image.Make",
                "Exif.Photo.ExposureTime",
                "Exif.Thumbnail.Compression",
            ]
        );

        // the loop back to IFD 0 was cut
        assert_eq!(exif.warnings.len(), 1);
    }

    #[test]
    fn bad_entries_become_warnings() {
        logger();

        let mut blob = Vec::new();
        blob.extend_from_slice(b"II");
        blob.extend(42_u16.to_le_bytes());
        blob.extend(8_u32.to_le_bytes());
        blob.extend(3_u16.to_le_bytes());
        entry(&mut blob, true, 0x010F, PrimitiveTy::Ascii, 200, 1000_u32.to_le_bytes());
        entry(&mut blob, true, 0x0110, PrimitiveTy::Ascii, 2, *b"X\0\0\0");
        entry(&mut blob, true, 0x8825, PrimitiveTy::Long, 1, 9999_u32.to_le_bytes());
        blob.extend(0_u32.to_le_bytes());

        let exif = decode(&blob, 0).unwrap();
        assert_eq!(exif.entries.len(), 1);
        assert_eq!(
            exif.entries.get(&TagKey::parse("Exif.Image.Model").unwrap())[0].to_text(),
            "X"
        );

        // one for the bad Make, one for the GPS IFD that isn't there
        assert_eq!(exif.warnings.len(), 2);
    }

    #[test]
    fn huge_embedded_images_are_skipped() {
        logger();

        let mut blob = Vec::new();
        blob.extend_from_slice(b"MM");
        blob.extend(42_u16.to_be_bytes());
        blob.extend(8_u32.to_be_bytes());
        blob.extend(2_u16.to_be_bytes());
        entry(&mut blob, false, 0x0201, PrimitiveTy::Long, 1, (u32::MAX - 1).to_be_bytes());
        entry(&mut blob, false, 0x0202, PrimitiveTy::Long, 1, u32::MAX.to_be_bytes());
        blob.extend(0_u32.to_be_bytes());

        let exif = decode(&blob, 0).unwrap();
        assert!(exif.state.blobs.is_empty());
        assert_eq!(exif.warnings.len(), 1);
    }

    #[test]
    fn keys_resolve() {
        let key = |s: &str| TagKey::parse(s).unwrap();

        assert_eq!(resolve_key(&key("Exif.Image.Make")).unwrap(), (IfdGroup::_0, 0x010F));
        assert_eq!(
            resolve_key(&key("Exif.Photo.0x9999")).unwrap(),
            (IfdGroup::Exif, 0x9999)
        );
        assert_eq!(
            resolve_key(&key("Exif.Image3.Make")).unwrap(),
            (IfdGroup::Chained(3), 0x010F)
        );

        for bad in [
            "Exif.Nowhere.Make",
            "Exif.Image.NotATag",
            "Exif.Image.ExifTag",
            "Exif.Image.0x8825",
            "Iptc.Application2.Keywords",
        ] {
            assert!(
                matches!(resolve_key(&key(bad)), Err(EngineError::InvalidKey { .. })),
                "`{bad}` shouldn't resolve"
            );
        }
    }

    #[test]
    fn default_kinds() {
        let key = |s: &str| TagKey::parse(s).unwrap();

        assert_eq!(default_kind(&key("Exif.Image.Make")), ValueKind::Ascii);
        assert_eq!(default_kind(&key("Exif.Photo.ExposureTime")), ValueKind::Rational);
        assert_eq!(default_kind(&key("Exif.Photo.0x1234")), ValueKind::Ascii);
    }
}
