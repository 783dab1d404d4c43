//! Tag keys.
//!
//! Every tag is named by a `Family.Group.Name` key, like `Exif.Image.Make`,
//! `Iptc.Application2.Keywords`, or `Xmp.dc.subject`.

use core::cmp::Ordering;

/// The three metadata standards a key may belong to.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Family {
    Exif,
    Iptc,
    Xmp,
}

impl Family {
    /// All families, in the order they're written into a file.
    pub const ALL: [Family; 3] = [Family::Exif, Family::Xmp, Family::Iptc];

    /// The family's name, as it appears at the start of a key.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Family::Exif => "Exif",
            Family::Iptc => "Iptc",
            Family::Xmp => "Xmp",
        }
    }

    /// Finds the family with the given name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Exif" => Some(Family::Exif),
            "Iptc" => Some(Family::Iptc),
            "Xmp" => Some(Family::Xmp),
            _ => None,
        }
    }
}

impl core::fmt::Display for Family {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A key naming one tag.
///
/// Keys sort by their canonical text form, so any ordered collection of keys
/// iterates in the same order as their strings would.
///
/// ```
/// use tagsmith_types::key::{Family, TagKey};
///
/// let key: TagKey = TagKey::parse("Xmp.xmpMM.DerivedFrom/stRef:instanceID").unwrap();
/// assert_eq!(key.family(), Family::Xmp);
/// assert_eq!(key.group(), "xmpMM");
/// assert_eq!(key.name(), "DerivedFrom/stRef:instanceID");
/// assert_eq!(key.to_string(), "Xmp.xmpMM.DerivedFrom/stRef:instanceID");
/// ```
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct TagKey {
    family: Family,
    group: String,
    name: String,
}

impl TagKey {
    /// Creates a key from its parts.
    ///
    /// The group may not contain a dot, and neither part may be empty.
    pub fn new(
        family: Family,
        group: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, KeyError> {
        let (group, name) = (group.into(), name.into());

        if group.is_empty() || name.is_empty() || group.contains('.') {
            return Err(KeyError::Malformed(format!("{family}.{group}.{name}")));
        }

        Ok(Self {
            family,
            group,
            name,
        })
    }

    /// Parses a key from its `Family.Group.Name` form.
    ///
    /// Only the first two dots split the key. Everything after the second dot
    /// is the name.
    pub fn parse(s: &str) -> Result<Self, KeyError> {
        let mut parts = s.splitn(3, '.');

        let (Some(family), Some(group), Some(name)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(KeyError::Malformed(s.to_string()));
        };

        if family.is_empty() || group.is_empty() || name.is_empty() {
            return Err(KeyError::Malformed(s.to_string()));
        }

        let family = Family::from_name(family).ok_or_else(|| KeyError::UnknownFamily(s.to_string()))?;

        Ok(Self {
            family,
            group: group.to_string(),
            name: name.to_string(),
        })
    }

    pub fn family(&self) -> Family {
        self.family
    }

    /// The group: an IFD group, an IPTC record, or an XMP namespace prefix.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// The tag name, or the property path for XMP.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The canonical text as bytes, without allocating.
    fn canonical_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.family
            .as_str()
            .bytes()
            .chain(core::iter::once(b'.'))
            .chain(self.group.bytes())
            .chain(core::iter::once(b'.'))
            .chain(self.name.bytes())
    }
}

impl Ord for TagKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical_bytes().cmp(other.canonical_bytes())
    }
}

impl PartialOrd for TagKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl core::fmt::Display for TagKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}.{}", self.family, self.group, self.name)
    }
}

impl core::str::FromStr for TagKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for TagKey {
    type Error = KeyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

/// Reads a `0xHHHH` tag, dataset, or record ID out of a key part.
///
/// ```
/// use tagsmith_types::key::hex_id;
///
/// assert_eq!(hex_id("0x9c9b"), Some(0x9C9B));
/// assert_eq!(hex_id("0X00FF"), Some(0xFF));
/// assert_eq!(hex_id("Make"), None);
/// ```
pub fn hex_id(s: &str) -> Option<u16> {
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))?;
    if digits.is_empty() || digits.len() > 4 {
        return None;
    }
    u16::from_str_radix(digits, 16).ok()
}

/// Writes an ID the way [`hex_id`] reads it.
pub fn format_hex_id(id: u16) -> String {
    format!("0x{id:04x}")
}

/// An error that happened when reading a key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyError {
    /// The key didn't have all three parts.
    Malformed(String),

    /// The key's family wasn't one of `Exif`, `Iptc`, or `Xmp`.
    UnknownFamily(String),
}

impl core::fmt::Display for KeyError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            KeyError::Malformed(k) => write!(
                f,
                "Key `{k}` is malformed. \
                Keys are written as `Family.Group.Name`."
            ),
            KeyError::UnknownFamily(k) => write!(
                f,
                "Key `{k}` has an unknown family. \
                Expected one of `Exif`, `Iptc`, or `Xmp`."
            ),
        }
    }
}

impl core::error::Error for KeyError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_parts() {
        let key = TagKey::parse("Exif.Image.Make").unwrap();
        assert_eq!(key.family(), Family::Exif);
        assert_eq!(key.group(), "Image");
        assert_eq!(key.name(), "Make");
    }

    #[test]
    fn name_keeps_further_punctuation() {
        let key = TagKey::parse("Xmp.Iptc4xmpExt.LocationCreated[1]/Iptc4xmpExt:City").unwrap();
        assert_eq!(key.group(), "Iptc4xmpExt");
        assert_eq!(key.name(), "LocationCreated[1]/Iptc4xmpExt:City");

        let dotted = TagKey::parse("Xmp.dc.a.b").unwrap();
        assert_eq!(dotted.name(), "a.b");
        assert_eq!(TagKey::parse(&dotted.to_string()).unwrap(), dotted);
    }

    #[test]
    fn malformed_keys() {
        for k in ["", "Exif", "Exif.Image", "Exif..Make", "Exif.Image.", ".Image.Make"] {
            assert!(
                matches!(TagKey::parse(k), Err(KeyError::Malformed(_))),
                "`{k}` should be malformed"
            );
        }
    }

    #[test]
    fn unknown_family() {
        assert_eq!(
            TagKey::parse("Foo.Bar.Baz"),
            Err(KeyError::UnknownFamily("Foo.Bar.Baz".into()))
        );
        // family names are case-sensitive
        assert!(matches!(
            TagKey::parse("exif.Image.Make"),
            Err(KeyError::UnknownFamily(_))
        ));
    }

    #[test]
    fn order_follows_canonical_text() {
        let mut keys: Vec<TagKey> = [
            "Xmp.dc.subject",
            "Exif.Image2.Make",
            "Exif.Image-x.Make",
            "Exif.Image.Make",
            "Iptc.Application2.Keywords",
            "Exif.Image.Artist",
        ]
        .iter()
        .map(|k| TagKey::parse(k).unwrap())
        .collect();
        keys.sort();

        let mut strings: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        let sorted_as_keys = strings.clone();
        strings.sort();
        assert_eq!(sorted_as_keys, strings);
    }

    #[test]
    fn hex_ids() {
        assert_eq!(format_hex_id(0x9C9B), "0x9c9b");
        assert_eq!(hex_id(&format_hex_id(7)), Some(7));
        assert_eq!(hex_id("0x"), None);
        assert_eq!(hex_id("0x12345"), None);
        assert_eq!(hex_id("0xzz"), None);
    }

    #[test]
    fn new_rejects_dotted_groups() {
        assert!(TagKey::new(Family::Exif, "Image", "Make").is_ok());
        assert!(TagKey::new(Family::Exif, "Ima.ge", "Make").is_err());
        assert!(TagKey::new(Family::Iptc, "", "Keywords").is_err());
    }
}
