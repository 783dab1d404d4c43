//! The metadata container.
//!
//! [`Metadata`] holds every tag read from an image as an ordered multi-map per
//! family. A key may map to many values, and the order of those values is
//! kept across edits unless the caller replaces all of them at once.

use std::collections::BTreeMap;

use tagsmith_types::{
    exif::{Endianness, ifd::IfdGroup},
    key::{Family, TagKey},
    value::{TagValue, ValueKind},
};

use crate::{EngineError, exif, iptc, iptc::photoshop::Resource, xmp};

/// An ordered list of `(key, value)` pairs.
///
/// Keys may repeat. Values under one key keep their relative order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Entries(Vec<(TagKey, TagValue)>);

impl Entries {
    pub fn new() -> Self {
        Self::default()
    }

    /// All values stored under `key`, in order.
    pub fn get(&self, key: &TagKey) -> Vec<&TagValue> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v)
            .collect()
    }

    pub fn contains(&self, key: &TagKey) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    /// Replaces every value under `key` with just `value`.
    ///
    /// The new value takes the place of the first old one. If there weren't
    /// any, it goes at the end.
    pub fn set_single(&mut self, key: TagKey, value: TagValue) {
        match self.0.iter().position(|(k, _)| *k == key) {
            Some(first) => {
                self.0[first].1 = value;

                let mut i = 0_usize;
                self.0.retain(|(k, _)| {
                    let keep = i <= first || *k != key;
                    i += 1;
                    keep
                });
            }
            None => self.0.push((key, value)),
        }
    }

    /// Removes every value under `key`, then appends `values` in order.
    pub fn set_many(&mut self, key: TagKey, values: impl IntoIterator<Item = TagValue>) {
        self.erase(&key);
        self.0.extend(values.into_iter().map(|v| (key.clone(), v)));
    }

    /// Adds one more value under `key`.
    pub fn append(&mut self, key: TagKey, value: TagValue) {
        self.0.push((key, value));
    }

    /// Removes every value under `key`.
    ///
    /// Returns how many were removed. Erasing a key that isn't there does
    /// nothing.
    pub fn erase(&mut self, key: &TagKey) -> usize {
        let before = self.0.len();
        self.0.retain(|(k, _)| k != key);
        before - self.0.len()
    }

    /// Every distinct key, in canonical order.
    pub fn keys(&self) -> Vec<TagKey> {
        let mut keys: Vec<TagKey> = self.0.iter().map(|(k, _)| k.clone()).collect();
        keys.sort();
        keys.dedup();
        keys
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TagKey, &TagValue)> {
        self.0.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(TagKey, TagValue)> for Entries {
    fn from_iter<T: IntoIterator<Item = (TagKey, TagValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// How decoding went for one family.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FamilyStatus {
    /// The image had no segment for this family.
    #[default]
    Absent,

    /// The family's segment was decoded. Some entries may have been skipped;
    /// see [`Metadata::warnings`].
    Decoded,

    /// The family's segment is there, but couldn't be decoded at all.
    Undecodable(String),
}

/// A problem found while decoding that didn't stop the rest of the read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Warning {
    pub family: Family,
    pub message: String,
}

impl core::fmt::Display for Warning {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.family, self.message)
    }
}

/// Exif state kept beside the entries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExifState {
    /// Byte order of the decoded Exif block.
    pub byte_order: Option<Endianness>,

    /// Where the TIFF header sits in the original stream.
    ///
    /// Embedded image offsets are relative to it.
    pub tiff_offset: Option<usize>,

    /// Embedded JPEG images, by the IFD that points at them.
    ///
    /// These are moved along with the IFD when Exif is rewritten.
    pub blobs: BTreeMap<IfdGroup, Vec<u8>>,
}

/// IPTC state kept beside the entries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IptcState {
    /// Every Photoshop image resource found in the APP13 segments, IPTC
    /// included.
    pub resources: Vec<Resource>,
}

/// XMP state kept beside the entries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct XmpState {
    /// `prefix -> URI` for namespaces that aren't in the registry, as
    /// declared by the decoded packet.
    pub namespaces: BTreeMap<String, String>,

    /// Array kinds of flattened arrays of structs, keyed by
    /// `prefix.Property` path.
    pub array_kinds: BTreeMap<String, ValueKind>,
}

/// All metadata read from an image.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Metadata {
    exif: Entries,
    iptc: Entries,
    xmp: Entries,

    pub(crate) exif_state: ExifState,
    pub(crate) iptc_state: IptcState,
    pub(crate) xmp_state: XmpState,

    pub(crate) exif_status: FamilyStatus,
    pub(crate) iptc_status: FamilyStatus,
    pub(crate) xmp_status: FamilyStatus,

    /// Families that were changed since decoding.
    edited: Vec<Family>,

    pub(crate) warnings: Vec<Warning>,
    pub(crate) comment: Option<String>,
}

impl Metadata {
    /// An empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// The entries of one family.
    pub fn entries(&self, family: Family) -> &Entries {
        match family {
            Family::Exif => &self.exif,
            Family::Iptc => &self.iptc,
            Family::Xmp => &self.xmp,
        }
    }

    /// Replaces a family's entries without marking it as edited.
    pub(crate) fn put_entries(&mut self, family: Family, entries: Entries) {
        *self.entries_mut(family) = entries;
    }

    fn entries_mut(&mut self, family: Family) -> &mut Entries {
        match family {
            Family::Exif => &mut self.exif,
            Family::Iptc => &mut self.iptc,
            Family::Xmp => &mut self.xmp,
        }
    }

    /// Every `(key, value)` pair, Exif first, then IPTC, then XMP.
    pub fn iter(&self) -> impl Iterator<Item = (&TagKey, &TagValue)> {
        self.exif
            .iter()
            .chain(self.iptc.iter())
            .chain(self.xmp.iter())
    }

    /// All values stored under `key`, in order.
    pub fn get(&self, key: &TagKey) -> Vec<&TagValue> {
        self.entries(key.family()).get(key)
    }

    /// Replaces every value under `key` with just `value`.
    pub fn set_single(&mut self, key: TagKey, value: TagValue) {
        log::trace!("Setting `{key}` to one value.");
        self.mark_edited(key.family());
        self.entries_mut(key.family()).set_single(key, value);
    }

    /// Replaces every value under `key` with `values`, keeping their order.
    ///
    /// In XMP, a plain text property can only hold one value, so many
    /// [`ValueKind::XmpText`] values are stored as an unordered array.
    pub fn set_many(&mut self, key: TagKey, values: impl IntoIterator<Item = TagValue>) {
        log::trace!("Setting `{key}` to many values.");
        let mut values: Vec<TagValue> = values.into_iter().collect();
        if key.family() == Family::Xmp && values.len() > 1 {
            values = values
                .into_iter()
                .map(|v| match v.kind() {
                    ValueKind::XmpText => v.with_kind(ValueKind::XmpBag),
                    _ => v,
                })
                .collect();
        }

        self.mark_edited(key.family());
        self.entries_mut(key.family()).set_many(key, values);
    }

    /// Adds one more value under `key`.
    pub fn append(&mut self, key: TagKey, value: TagValue) {
        self.mark_edited(key.family());
        self.entries_mut(key.family()).append(key, value);
    }

    /// Removes every value under `key`. Does nothing if there aren't any.
    pub fn erase(&mut self, key: &TagKey) {
        let removed = self.entries_mut(key.family()).erase(key);
        if removed > 0 {
            log::trace!("Erased `{removed}` values under `{key}`.");
            self.mark_edited(key.family());
        } else {
            log::debug!("Asked to erase `{key}`, but it wasn't there. Skipping.");
        }
    }

    /// The distinct keys of one family, in canonical order.
    pub fn keys_by_family(&self, family: Family) -> Vec<TagKey> {
        self.entries(family).keys()
    }

    /// Applies a set of edits.
    ///
    /// Every edit is checked first. If any of them names a key or value its
    /// family can't store, nothing is changed.
    pub fn apply(&mut self, edits: &Edits) -> Result<(), EngineError> {
        // erasing needs nothing but the family
        for (key, values) in edits.iter().filter(|(_, values)| !values.is_empty()) {
            self.validate(key, values)?;
        }

        for (key, values) in edits.iter() {
            match values {
                [] => self.erase(key),
                [one] => self.set_single(key.clone(), one.clone()),
                many => self.set_many(key.clone(), many.iter().cloned()),
            }
        }

        Ok(())
    }

    /// Checks that `key` and `values` can be written by their family.
    pub fn validate(&self, key: &TagKey, values: &[TagValue]) -> Result<(), EngineError> {
        match key.family() {
            Family::Exif => {
                exif::resolve_key(key)?;
                values.iter().try_for_each(|v| exif::check_value(key, v))
            }
            Family::Iptc => {
                iptc::resolve_key(key)?;
                values.iter().try_for_each(|v| iptc::check_value(key, v))
            }
            Family::Xmp => {
                xmp::resolve_key(key, &self.xmp_state)?;
                values.iter().try_for_each(|v| xmp::check_value(key, v))
            }
        }
    }

    /// How decoding went for `family`.
    pub fn status(&self, family: Family) -> &FamilyStatus {
        match family {
            Family::Exif => &self.exif_status,
            Family::Iptc => &self.iptc_status,
            Family::Xmp => &self.xmp_status,
        }
    }

    pub(crate) fn set_status(&mut self, family: Family, status: FamilyStatus) {
        match family {
            Family::Exif => self.exif_status = status,
            Family::Iptc => self.iptc_status = status,
            Family::Xmp => self.xmp_status = status,
        }
    }

    /// Whether `family` was changed after decoding.
    pub fn is_edited(&self, family: Family) -> bool {
        self.edited.contains(&family)
    }

    fn mark_edited(&mut self, family: Family) {
        if !self.edited.contains(&family) {
            self.edited.push(family);
        }
    }

    /// Problems found while decoding.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub(crate) fn warn(&mut self, family: Family, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{family}: {message}");
        self.warnings.push(Warning { family, message });
    }

    /// The image's JPEG comment, if it has one.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// The byte order of the decoded Exif block.
    pub fn exif_byte_order(&self) -> Option<Endianness> {
        self.exif_state.byte_order
    }
}

/// A set of changes to make to an image's tags.
///
/// Each key maps to the full list of values it should have afterward:
///
/// - no values: erase the key
/// - one value: replace everything under the key with it
/// - many values: replace everything under the key with them, in order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Edits(BTreeMap<TagKey, Vec<TagValue>>);

impl Edits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to exactly `values`.
    pub fn set(&mut self, key: TagKey, values: Vec<TagValue>) -> &mut Self {
        self.0.insert(key, values);
        self
    }

    /// Sets `key` to exactly one value.
    pub fn set_single(&mut self, key: TagKey, value: TagValue) -> &mut Self {
        self.set(key, vec![value])
    }

    /// Erases `key`.
    pub fn erase(&mut self, key: TagKey) -> &mut Self {
        self.set(key, Vec::new())
    }

    /// Each edit, in canonical key order.
    pub fn iter(&self) -> impl Iterator<Item = (&TagKey, &[TagValue])> {
        self.0.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(TagKey, Vec<TagValue>)> for Edits {
    fn from_iter<T: IntoIterator<Item = (TagKey, Vec<TagValue>)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::logger;

    fn key(s: &str) -> TagKey {
        TagKey::parse(s).unwrap()
    }

    fn texts(entries: &Entries, k: &str) -> Vec<String> {
        entries.get(&key(k)).iter().map(|v| v.to_text()).collect()
    }

    #[test]
    fn set_single_keeps_the_first_position() {
        logger();

        let mut e: Entries = [
            (key("Xmp.dc.subject"), TagValue::xmp(ValueKind::XmpBag, "a")),
            (key("Xmp.dc.title"), TagValue::xmp(ValueKind::XmpAlt, "t")),
            (key("Xmp.dc.subject"), TagValue::xmp(ValueKind::XmpBag, "b")),
        ]
        .into_iter()
        .collect();

        e.set_single(key("Xmp.dc.subject"), TagValue::xmp(ValueKind::XmpBag, "z"));

        let order: Vec<String> = e.iter().map(|(k, v)| format!("{k}={v}")).collect();
        assert_eq!(order, ["Xmp.dc.subject=z", "Xmp.dc.title=t"]);
    }

    #[test]
    fn set_single_is_idempotent() {
        let mut e = Entries::new();
        e.set_single(key("Exif.Image.Make"), TagValue::ascii("Acme"));
        let once = e.clone();
        e.set_single(key("Exif.Image.Make"), TagValue::ascii("Acme"));
        assert_eq!(e, once);
    }

    #[test]
    fn set_many_replaces_in_order() {
        let mut e = Entries::new();
        e.append(key("Iptc.Application2.Keywords"), TagValue::string("old"));
        e.append(key("Iptc.Application2.City"), TagValue::string("Paris"));

        e.set_many(
            key("Iptc.Application2.Keywords"),
            ["a", "b", "c"].map(TagValue::string),
        );

        assert_eq!(texts(&e, "Iptc.Application2.Keywords"), ["a", "b", "c"]);
        assert_eq!(texts(&e, "Iptc.Application2.City"), ["Paris"]);
    }

    #[test]
    fn erasing_a_missing_key_does_nothing() {
        let mut md = Metadata::new();
        md.erase(&key("Exif.Image.Artist"));
        assert!(!md.is_edited(Family::Exif));
        assert_eq!(md, Metadata::new());
    }

    #[test]
    fn keys_are_distinct_and_sorted() {
        let mut e = Entries::new();
        for k in ["Xmp.dc.subject", "Xmp.dc.creator", "Xmp.dc.subject"] {
            e.append(key(k), TagValue::xmp(ValueKind::XmpBag, "x"));
        }
        assert_eq!(e.keys(), [key("Xmp.dc.creator"), key("Xmp.dc.subject")]);
    }

    #[test]
    fn apply_checks_everything_before_changing_anything() {
        logger();

        let mut md = Metadata::new();
        md.set_single(key("Exif.Image.Make"), TagValue::ascii("Acme"));
        let before = md.clone();

        let mut edits = Edits::new();
        edits.set_single(key("Exif.Image.Make"), TagValue::ascii("Zenith"));
        edits.set_single(key("Exif.Image.NotARealTag"), TagValue::ascii("?"));

        assert!(matches!(
            md.apply(&edits),
            Err(EngineError::InvalidKey { .. })
        ));
        assert_eq!(md, before);
    }

    #[test]
    fn apply_dispatches_on_value_count() {
        let mut md = Metadata::new();
        md.append(key("Xmp.dc.subject"), TagValue::xmp(ValueKind::XmpBag, "old"));
        md.append(key("Exif.Image.Artist"), TagValue::ascii("me"));

        let mut edits = Edits::new();
        edits
            .set(
                key("Xmp.dc.subject"),
                vec![
                    TagValue::xmp(ValueKind::XmpBag, "a"),
                    TagValue::xmp(ValueKind::XmpBag, "b"),
                ],
            )
            .set_single(key("Exif.Image.Make"), TagValue::ascii("Acme"))
            .erase(key("Exif.Image.Artist"));
        md.apply(&edits).unwrap();

        assert_eq!(texts(md.entries(Family::Xmp), "Xmp.dc.subject"), ["a", "b"]);
        assert_eq!(texts(md.entries(Family::Exif), "Exif.Image.Make"), ["Acme"]);
        assert!(md.get(&key("Exif.Image.Artist")).is_empty());
    }

    #[test]
    fn wrong_value_kinds_are_rejected() {
        let md = Metadata::new();
        let err = md
            .validate(
                &key("Exif.Image.Make"),
                &[TagValue::xmp(ValueKind::XmpText, "Acme")],
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidValue { .. }));
    }

    #[test]
    fn erasing_unknown_keys_is_fine() {
        logger();

        let mut md = Metadata::new();
        md.append(key("Exif.Image.Make"), TagValue::ascii("Acme"));
        let before = md.clone();

        let mut edits = Edits::new();
        edits
            .erase(key("Exif.Image.NoSuchTag"))
            .erase(key("Iptc.Application2.NoSuchDataset"))
            .erase(key("Xmp.nosuchprefix.Thing"));
        md.apply(&edits).unwrap();

        assert_eq!(md, before);
    }

    #[test]
    fn many_xmp_texts_become_a_bag() {
        let mut md = Metadata::new();
        md.set_many(
            key("Xmp.dc.creator"),
            ["a", "b"].map(|s| TagValue::xmp(ValueKind::XmpText, s)),
        );

        let kinds: Vec<ValueKind> = md
            .get(&key("Xmp.dc.creator"))
            .iter()
            .map(|v| v.kind())
            .collect();
        assert_eq!(kinds, [ValueKind::XmpBag, ValueKind::XmpBag]);

        // one value stays as it was
        md.set_many(
            key("Xmp.dc.creator"),
            [TagValue::xmp(ValueKind::XmpText, "c")],
        );
        assert_eq!(md.get(&key("Xmp.dc.creator"))[0].kind(), ValueKind::XmpText);
    }
}
