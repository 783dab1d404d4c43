//! IPTC-IIM is an older metadata format used by news agencies and photo
//! archives.
//!
//! It's a flat list of datasets. Each one has a record number, a dataset
//! number, and some bytes:
//!
//! - tag marker (`0x1C`)
//! - record number (1 byte)
//! - dataset number (1 byte)
//! - length (`u16`, big-endian)
//!     - when the high bit is set, the low bits say how many of the following
//!       bytes hold the real length instead
//! - data
//!
//! In JPEG, these datasets live inside a Photoshop image resource. See
//! [`photoshop`].

use tagsmith_types::{
    exif::Endianness,
    iptc::{IptcRecord, dataset, dataset_by_name, dataset_name, dataset_number},
    key::{Family, TagKey},
    value::{TagValue, ValueKind},
};
use winnow::{
    Parser as _,
    binary::{be_u16, u8},
    error::EmptyError,
    token::take,
};

use self::{
    error::IptcError,
    photoshop::{IPTC_RESOURCE, parse_resources, replace_iptc, write_resources},
};
use crate::{
    EngineError,
    container::{Entries, IptcState},
};

pub mod error;
pub mod photoshop;

/// Every dataset starts with this byte.
const TAG_MARKER: u8 = 0x1C;

/// Everything read from the APP13 segments.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedIptc {
    pub entries: Entries,
    pub state: IptcState,

    /// Datasets and bytes that were skipped.
    pub warnings: Vec<String>,
}

/// Parses the Photoshop resources in APP13 (without its signature), then the
/// IPTC datasets inside them.
///
/// When there's more than one IPTC resource, their datasets are read in
/// order.
pub fn decode(resources_blob: &[u8]) -> Result<DecodedIptc, IptcError> {
    let resources = parse_resources(resources_blob)?;

    let mut entries = Entries::new();
    let mut warnings = Vec::new();
    for r in resources.iter().filter(|r| r.id == IPTC_RESOURCE) {
        let (found, mut w) = decode_datasets(&r.data);
        found.iter().for_each(|(k, v)| entries.append(k.clone(), v.clone()));
        warnings.append(&mut w);
    }

    Ok(DecodedIptc {
        entries,
        state: IptcState { resources },
        warnings,
    })
}

/// Reads IPTC datasets.
///
/// Stray bytes between datasets are skipped. A dataset that runs past the end
/// stops the read, keeping everything before it.
pub fn decode_datasets(data: &[u8]) -> (Entries, Vec<String>) {
    let total = data.len();
    let input: &mut &[u8] = &mut &*data;
    let mut entries = Entries::new();
    let mut warnings: Vec<String> = Vec::new();
    let mut warn = |message: String| {
        log::warn!("{message}");
        warnings.push(message);
    };

    let mut skipped = 0_usize;
    while !input.is_empty() {
        if input.iter().all(|b| *b == 0) {
            break;
        }

        let offset = total - input.len();
        let Ok(marker) = u8.parse_next(input).map_err(|_: EmptyError| ()) else {
            break;
        };
        if marker != TAG_MARKER {
            skipped += 1;
            continue;
        }
        if skipped > 0 {
            warn(format!("Skipped `{skipped}` stray bytes before offset `{offset}`."));
            skipped = 0;
        }

        let Ok((record, number, len)) = (u8, u8, be_u16)
            .parse_next(input)
            .map_err(|_: EmptyError| ())
        else {
            warn(format!("Dataset header at offset `{offset}` was cut short."));
            break;
        };

        let len: usize = if len & 0x8000 == 0 {
            len as usize
        } else {
            match extended_len(input, len & 0x7FFF) {
                Some(l) => l,
                None => {
                    warn(format!(
                        "Dataset `{record}:{number}` has a bad extended length."
                    ));
                    break;
                }
            }
        };

        let Ok(bytes) = take(len).parse_next(input).map_err(|_: EmptyError| ()) else {
            warn(format!(
                "Dataset `{record}:{number}` wants `{len}` bytes, but only `{}` are left.",
                input.len()
            ));
            break;
        };

        let key = match TagKey::new(
            Family::Iptc,
            IptcRecord::from_number(record).name(),
            dataset_name(record, number),
        ) {
            Ok(k) => k,
            Err(e) => {
                warn(format!("Couldn't name dataset `{record}:{number}`. err: {e}"));
                continue;
            }
        };

        let mut kind = dataset(record, number)
            .map(|d| d.kind)
            .unwrap_or(ValueKind::String);
        if kind == ValueKind::Short && len != 2 {
            kind = ValueKind::Undefined;
        }

        log::trace!("Found dataset `{key}` with `{len}` bytes.");
        entries.append(key, TagValue::new(kind, bytes.to_vec(), Endianness::Big));
    }

    if skipped > 0 {
        warn(format!("Skipped `{skipped}` stray bytes at the end."));
    }

    (entries, warnings)
}

/// Reads a length stored in `n` big-endian bytes.
fn extended_len(input: &mut &[u8], n: u16) -> Option<usize> {
    if n == 0 || n > 4 {
        return None;
    }

    let bytes: &[u8] = take(n as usize)
        .parse_next(input)
        .map_err(|_: EmptyError| ())
        .ok()?;
    Some(bytes.iter().fold(0_usize, |acc, b| (acc << 8) | *b as usize))
}

/// Writes IPTC datasets.
///
/// Datasets are sorted by record, then dataset number. Values under the same
/// number keep their order.
pub fn encode(entries: &Entries) -> Result<Vec<u8>, EngineError> {
    let mut datasets: Vec<(u8, u8, Vec<u8>)> = Vec::with_capacity(entries.len());
    for (key, value) in entries.iter() {
        let (record, number) = resolve_key(key)?;
        check_value(key, value)?;

        let bytes = match value.kind() {
            ValueKind::Ascii => {
                let raw = value.raw();
                raw.strip_suffix(&[0]).unwrap_or(raw).to_vec()
            }
            _ => value.clone().with_order(Endianness::Big).into_raw(),
        };

        if u32::try_from(bytes.len()).is_err() {
            return Err(EngineError::InvalidValue {
                key: key.clone(),
                reason: "too large for an IPTC dataset".into(),
            });
        }
        datasets.push((record, number, bytes));
    }

    datasets.sort_by_key(|(record, number, _)| (*record, *number));

    for pair in datasets.windows(2) {
        let ((r, n, _), (r2, n2, _)) = (&pair[0], &pair[1]);
        if (r, n) == (r2, n2) && dataset(*r, *n).is_some_and(|d| !d.repeatable) {
            log::warn!("Dataset `{r}:{n}` isn't repeatable, but has more than one value.");
        }
    }

    let mut out = Vec::new();
    for (record, number, bytes) in datasets {
        out.extend_from_slice(&[TAG_MARKER, record, number]);
        if bytes.len() < 0x8000 {
            out.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
        } else {
            // the length goes in the next four bytes
            out.extend_from_slice(&0x8004_u16.to_be_bytes());
            out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
        }
        out.extend_from_slice(&bytes);
    }

    Ok(out)
}

/// Builds the Photoshop resources that should go into APP13.
///
/// The old resources are kept, with IPTC swapped out for `entries`. Returns
/// `None` when nothing is left to write.
pub fn encode_resources(entries: &Entries, state: &IptcState) -> Result<Option<Vec<u8>>, EngineError> {
    let iptc = match entries.is_empty() {
        true => None,
        false => Some(encode(entries)?),
    };

    let resources = replace_iptc(&state.resources, iptc);
    if resources.is_empty() {
        log::trace!("No Photoshop resources left. APP13 will be dropped.");
        return Ok(None);
    }

    Ok(Some(write_resources(&resources)))
}

/// Finds the record and dataset numbers that an IPTC key refers to.
pub fn resolve_key(key: &TagKey) -> Result<(u8, u8), EngineError> {
    let invalid = |reason: &str| EngineError::InvalidKey {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    if key.family() != Family::Iptc {
        return Err(invalid("not an IPTC key"));
    }

    let record = IptcRecord::from_name(key.group())
        .ok_or_else(|| invalid("unknown record"))?
        .number();
    let number = dataset_number(record, key.name()).ok_or_else(|| invalid("unknown dataset"))?;

    Ok((record, number))
}

/// Checks that IPTC can store `value`.
pub fn check_value(key: &TagKey, value: &TagValue) -> Result<(), EngineError> {
    match value.kind().is_xmp() {
        false => Ok(()),
        true => Err(EngineError::InvalidValue {
            key: key.clone(),
            reason: format!("IPTC can't store `{}` values", value.kind()),
        }),
    }
}

/// The kind a new value for `key` should have.
///
/// Unknown datasets hold strings.
pub fn default_kind(key: &TagKey) -> ValueKind {
    IptcRecord::from_name(key.group())
        .and_then(|r| dataset_by_name(r.number(), key.name()))
        .map(|d| d.kind)
        .unwrap_or(ValueKind::String)
}

#[cfg(test)]
mod tests {
    use super::{photoshop::Resource, *};
    use crate::util::logger;

    fn key(s: &str) -> TagKey {
        TagKey::parse(s).unwrap()
    }

    fn dataset_bytes(record: u8, number: u8, data: &[u8]) -> Vec<u8> {
        let mut v = vec![TAG_MARKER, record, number];
        v.extend((data.len() as u16).to_be_bytes());
        v.extend(data);
        v
    }

    #[test]
    fn reads_datasets() {
        logger();

        let mut data = Vec::new();
        data.extend(dataset_bytes(1, 90, b"\x1b%G"));
        data.extend(dataset_bytes(2, 0, &[0, 4]));
        data.extend(dataset_bytes(2, 25, b"beach"));
        data.extend(dataset_bytes(2, 25, b"sunset"));
        data.extend(dataset_bytes(2, 250, b"custom"));
        data.extend([0, 0, 0]);

        let (entries, warnings) = decode_datasets(&data);
        assert!(warnings.is_empty());
        assert_eq!(
            entries.keys(),
            [
                key("Iptc.Application2.0x00fa"),
                key("Iptc.Application2.Keywords"),
                key("Iptc.Application2.RecordVersion"),
                key("Iptc.Envelope.CharacterSet"),
            ]
        );

        let keywords: Vec<String> = entries
            .get(&key("Iptc.Application2.Keywords"))
            .iter()
            .map(|v| v.to_text())
            .collect();
        assert_eq!(keywords, ["beach", "sunset"]);

        let version = entries.get(&key("Iptc.Application2.RecordVersion"));
        assert_eq!(version[0].kind(), ValueKind::Short);
        assert_eq!(version[0].uint_at(0), Some(4));
    }

    #[test]
    fn odd_short_datasets_become_undefined() {
        logger();

        let (entries, _) = decode_datasets(&dataset_bytes(2, 0, &[4]));
        let version = entries.get(&key("Iptc.Application2.RecordVersion"));
        assert_eq!(version[0].kind(), ValueKind::Undefined);
    }

    #[test]
    fn skips_junk_and_stops_at_truncation() {
        logger();

        let mut data = vec![0xAB, 0xCD];
        data.extend(dataset_bytes(2, 5, b"Title"));
        data.extend([TAG_MARKER, 2, 120, 0, 50, b'x']);

        let (entries, warnings) = decode_datasets(&data);
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries.get(&key("Iptc.Application2.ObjectName"))[0].to_text(),
            "Title"
        );
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn extended_lengths() {
        logger();

        let big = vec![b'a'; 0x9000];
        let mut entries = Entries::new();
        entries.append(key("Iptc.Application2.Caption"), TagValue::string("hi"));
        entries.append(
            key("Iptc.Application2.Caption"),
            TagValue::new(ValueKind::String, big.clone(), Endianness::Big),
        );

        let encoded = encode(&entries).unwrap();
        assert_eq!(&encoded[..5], &[TAG_MARKER, 2, 120, 0, 2]);
        assert_eq!(&encoded[7..14], &[TAG_MARKER, 2, 120, 0x80, 0x04, 0, 0]);

        let (decoded, warnings) = decode_datasets(&encoded);
        assert!(warnings.is_empty());
        let captions = decoded.get(&key("Iptc.Application2.Caption"));
        assert_eq!(captions.len(), 2);
        assert_eq!(captions[1].raw(), big.as_slice());
    }

    #[test]
    fn encodes_sorted_and_keeps_value_order() {
        logger();

        let mut entries = Entries::new();
        entries.append(key("Iptc.Application2.Keywords"), TagValue::string("b"));
        entries.append(key("Iptc.Application2.City"), TagValue::string("Oslo"));
        entries.append(key("Iptc.Application2.Keywords"), TagValue::string("a"));
        entries.append(key("Iptc.Envelope.ModelVersion"), {
            TagValue::from_text(ValueKind::Short, "4", Endianness::Little).unwrap()
        });
        entries.append(key("Iptc.Application2.Byline"), TagValue::ascii("Kim"));

        let encoded = encode(&entries).unwrap();
        let mut expected = Vec::new();
        expected.extend(dataset_bytes(1, 0, &[0, 4]));
        expected.extend(dataset_bytes(2, 25, b"b"));
        expected.extend(dataset_bytes(2, 25, b"a"));
        expected.extend(dataset_bytes(2, 80, b"Kim"));
        expected.extend(dataset_bytes(2, 90, b"Oslo"));
        assert_eq!(encoded, expected);
    }

    #[test]
    fn resources_wrap_iptc() {
        logger();

        let state = IptcState {
            resources: vec![
                Resource::new(0x03ED, vec![1, 2]),
                Resource::new(IPTC_RESOURCE, dataset_bytes(2, 5, b"Old")),
            ],
        };

        let mut entries = Entries::new();
        entries.append(key("Iptc.Application2.ObjectName"), TagValue::string("New"));

        let blob = encode_resources(&entries, &state).unwrap().unwrap();
        let decoded = decode(&blob).unwrap();
        assert_eq!(decoded.entries, entries);
        assert_eq!(decoded.state.resources.len(), 2);
        assert_eq!(decoded.state.resources[0], state.resources[0]);

        // no IPTC and nothing else either
        let empty = IptcState {
            resources: vec![Resource::new(IPTC_RESOURCE, vec![])],
        };
        assert_eq!(encode_resources(&Entries::new(), &empty).unwrap(), None);
    }

    #[test]
    fn keys_resolve() {
        assert_eq!(resolve_key(&key("Iptc.Application2.Keywords")).unwrap(), (2, 25));
        assert_eq!(resolve_key(&key("Iptc.0x0003.0x0010")).unwrap(), (3, 16));
        assert!(matches!(
            resolve_key(&key("Iptc.Application2.NotADataset")),
            Err(EngineError::InvalidKey { .. })
        ));
        assert!(matches!(
            resolve_key(&key("Iptc.Nowhere.Keywords")),
            Err(EngineError::InvalidKey { .. })
        ));

        assert_eq!(default_kind(&key("Iptc.Application2.DateCreated")), ValueKind::Date);
        assert_eq!(default_kind(&key("Iptc.Application2.0x00fa")), ValueKind::String);

        assert!(matches!(
            check_value(
                &key("Iptc.Application2.Keywords"),
                &TagValue::xmp(ValueKind::XmpBag, "x")
            ),
            Err(EngineError::InvalidValue { .. })
        ));
    }
}
