//! A string-only interface, for callers in other languages.
//!
//! Keys and values go in and out as text, and errors are flattened into a
//! message. Keys with a family other than `Exif`, `Iptc`, or `Xmp` are skipped
//! instead of failing the call.

use std::collections::BTreeMap;

use tagsmith_types::{
    key::{Family, KeyError, TagKey},
    value::{TagValue, ValueKind},
};

use crate::{
    MetadataProvider as _, container::Edits, exif, iptc, providers::jpeg::Jpeg,
};

/// The text of a tag: one value, or several in order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum HostValue {
    Single(String),
    Many(Vec<String>),
}

impl HostValue {
    fn into_texts(self) -> Vec<String> {
        match self {
            HostValue::Single(s) => vec![s],
            HostValue::Many(v) => v,
        }
    }
}

/// Every tag in an image, by its full key.
pub type HostTags = BTreeMap<String, HostValue>;

/// A preview image, described in plain types.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HostPreview {
    pub mime_type: String,
    pub extension: String,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Reads every tag as text.
///
/// A key with one value maps to [`HostValue::Single`]. Otherwise, it's
/// [`HostValue::Many`].
pub fn get_image_tags(bytes: &[u8]) -> Result<HostTags, String> {
    let metadata = crate::read_tags(bytes).map_err(|e| e.to_string())?;

    let mut tags = HostTags::new();
    for family in Family::ALL {
        for key in metadata.keys_by_family(family) {
            let mut texts: Vec<String> = metadata.get(&key).iter().map(|v| v.to_text()).collect();

            let value = match texts.len() {
                1 => HostValue::Single(texts.remove(0)),
                _ => HostValue::Many(texts),
            };
            tags.insert(key.to_string(), value);
        }
    }

    Ok(tags)
}

/// Sets each tag to the given text, returning the rewritten image.
///
/// Values are typed like the tag's current value. New tags get their family's
/// usual type for that key. An empty [`HostValue::Many`] removes the tag.
pub fn set_image_tags(bytes: &[u8], tags: &HostTags) -> Result<Vec<u8>, String> {
    let mut jpeg = Jpeg::new(&bytes).map_err(|e| e.to_string())?;

    let mut edits = Edits::new();
    for (name, value) in tags {
        let Some(key) = parse_key(name)? else {
            continue;
        };
        let texts = value.clone().into_texts();

        let existing: Option<ValueKind> = jpeg.metadata().get(&key).first().map(|v| v.kind());
        let kind = match (key.family(), existing) {
            // a single text can't hold many values
            (Family::Xmp, Some(ValueKind::XmpText)) if texts.len() > 1 => ValueKind::XmpBag,
            (_, Some(kind)) => kind,
            (Family::Exif, None) => exif::default_kind(&key),
            (Family::Iptc, None) => iptc::default_kind(&key),
            (Family::Xmp, None) if texts.len() > 1 => ValueKind::XmpBag,
            (Family::Xmp, None) => ValueKind::XmpText,
        };

        let order = match key.family() {
            Family::Exif => jpeg.metadata().exif_byte_order().unwrap_or_default(),
            Family::Iptc | Family::Xmp => Default::default(),
        };

        let values: Vec<TagValue> = texts
            .iter()
            .map(|t| TagValue::from_text(kind, t, order))
            .collect::<Result<_, _>>()
            .map_err(|e| format!("Invalid value for key `{key}`: {e}"))?;

        edits.set(key, values);
    }

    jpeg.metadata_mut()
        .apply(&edits)
        .map_err(|e| e.to_string())?;
    jpeg.write().map_err(|e| e.to_string())
}

/// Removes every value under each key, returning the rewritten image.
pub fn delete_image_tags(bytes: &[u8], keys: &[&str]) -> Result<Vec<u8>, String> {
    let mut parsed: Vec<TagKey> = Vec::with_capacity(keys.len());
    for name in keys {
        if let Some(key) = parse_key(name)? {
            parsed.push(key);
        }
    }

    crate::delete_tags(bytes, &parsed).map_err(|e| e.to_string())
}

/// Copies out every preview image, smallest first.
pub fn get_image_previews(bytes: &[u8]) -> Result<Vec<HostPreview>, String> {
    let previews = crate::extract_previews(bytes).map_err(|e| e.to_string())?;

    Ok(previews
        .into_iter()
        .map(|p| HostPreview {
            mime_type: p.properties.mime_type.to_string(),
            extension: p.properties.extension.to_string(),
            width: p.properties.width,
            height: p.properties.height,
            data: p.data,
        })
        .collect())
}

/// Parses a key, or returns `None` if its family isn't one we know.
fn parse_key(name: &str) -> Result<Option<TagKey>, String> {
    match TagKey::parse(name) {
        Ok(key) => Ok(Some(key)),
        Err(KeyError::UnknownFamily(_)) => {
            log::debug!("Skipping key with unknown family: `{name}`");
            Ok(None)
        }
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        providers::jpeg::scan::{APP0_MARKER_CODE, marker_segment},
        util::logger,
    };

    fn blank_jpeg() -> Vec<u8> {
        let mut v = vec![0xFF, 0xD8];
        v.extend(marker_segment(APP0_MARKER_CODE, &[b"JFIF\0\x01\x02"]));
        v.extend([0xFF, 0xD9]);
        v
    }

    fn tags(pairs: &[(&str, HostValue)]) -> HostTags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn set_then_get() {
        logger();

        let written = set_image_tags(
            &blank_jpeg(),
            &tags(&[
                ("Exif.Image.Make", HostValue::Single("Acme".into())),
                (
                    "Iptc.Application2.Keywords",
                    HostValue::Many(vec!["cat".into(), "hat".into()]),
                ),
                (
                    "Xmp.dc.subject",
                    HostValue::Many(vec!["a".into(), "b".into(), "c".into()]),
                ),
                ("Xmp.xmp.Rating", HostValue::Single("5".into())),
            ]),
        )
        .unwrap();

        let got = get_image_tags(&written).unwrap();
        assert_eq!(got["Exif.Image.Make"], HostValue::Single("Acme".into()));
        assert_eq!(
            got["Iptc.Application2.Keywords"],
            HostValue::Many(vec!["cat".into(), "hat".into()])
        );
        assert_eq!(
            got["Xmp.dc.subject"],
            HostValue::Many(vec!["a".into(), "b".into(), "c".into()])
        );
        assert_eq!(got["Xmp.xmp.Rating"], HostValue::Single("5".into()));
    }

    #[test]
    fn unknown_families_are_skipped() {
        logger();

        let file = blank_jpeg();
        let written = set_image_tags(
            &file,
            &tags(&[("Foo.Bar.Baz", HostValue::Single("x".into()))]),
        )
        .unwrap();
        assert_eq!(written, file);

        assert_eq!(delete_image_tags(&file, &["Foo.Bar.Baz"]).unwrap(), file);
    }

    #[test]
    fn errors_are_messages() {
        logger();

        let err = get_image_tags(b"not a jpeg").unwrap_err();
        assert!(!err.is_empty());

        let err = set_image_tags(
            &blank_jpeg(),
            &tags(&[("Exif.Image.NotATag", HostValue::Single("x".into()))]),
        )
        .unwrap_err();
        assert!(err.contains("Exif.Image.NotATag"), "{err}");

        assert!(delete_image_tags(&blank_jpeg(), &["Exif"]).is_err());
    }

    #[test]
    fn empty_many_deletes() {
        logger();

        let written = set_image_tags(
            &blank_jpeg(),
            &tags(&[("Exif.Image.Make", HostValue::Single("Acme".into()))]),
        )
        .unwrap();

        let cleared = set_image_tags(
            &written,
            &tags(&[("Exif.Image.Make", HostValue::Many(Vec::new()))]),
        )
        .unwrap();
        assert!(get_image_tags(&cleared).unwrap().is_empty());
        assert_eq!(cleared, blank_jpeg());
    }
}
