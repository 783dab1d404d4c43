//! Implements an XMP reader and writer.
//!
//! XMP is RDF/XML, so a property may be written in several equivalent ways.
//! We flatten whatever we find into keys:
//!
//! - simple properties become `Xmp.prefix.Name`,
//! - arrays (`rdf:Bag`, `rdf:Seq`, `rdf:Alt`) keep one value per item under
//!   the same key,
//! - struct fields become `Xmp.prefix.Name/fieldPrefix:Field`,
//! - and structs inside arrays become `Xmp.prefix.Name[1]/fieldPrefix:Field`.
//!
//! Prefixes are whatever the registry in `tagsmith_types::xmp` says, not what
//! the document happened to use. Namespaces the registry doesn't know keep
//! the document's prefix.
//!
//! Qualifiers (like `xml:lang`) aren't kept.

use xmltree::{AttributeName, Element};

use tagsmith_types::{
    key::{Family, TagKey},
    value::{TagValue, ValueKind},
    xmp::{RDF_NS, XML_NS, XMP_NOTE_NS, prefix_for_uri, uri_for_prefix},
};

use self::{error::XmpError, heuristics::XmpElementHeuristicsExt as _};
use crate::{
    EngineError,
    container::{Entries, XmpState},
};

pub mod error;
mod encode;
mod heuristics;

pub use encode::encode;

/// Everything read from the XMP packets.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodedXmp {
    pub entries: Entries,
    pub state: XmpState,

    /// Properties that were skipped.
    pub warnings: Vec<String>,

    /// The GUID of the extended packet, from `xmpNote:HasExtendedXMP`.
    pub extended_guid: Option<String>,
}

/// Parses a standard XMP packet.
pub fn decode(packet: &[u8]) -> Result<DecodedXmp, XmpError> {
    let mut out = DecodedXmp::default();
    out.read_packet(packet)?;
    Ok(out)
}

impl DecodedXmp {
    /// Adds the properties of an extended XMP packet.
    pub fn merge(&mut self, packet: &[u8]) -> Result<(), XmpError> {
        log::debug!("Merging extended XMP packet of `{}` bytes.", packet.len());
        self.read_packet(packet)
    }

    fn read_packet(&mut self, packet: &[u8]) -> Result<(), XmpError> {
        // some writers leave NULs after the packet
        let end = packet.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
        let text = core::str::from_utf8(&packet[..end]).map_err(|_| XmpError::NotUtf8)?;

        let document = Element::parse(text.as_bytes())?;
        let rdf = find_rdf(&document).ok_or_else(|| {
            log::error!("Couldn't find an `rdf:RDF` element in the document.");
            XmpError::NoRdfElement
        })?;

        let descriptions = rdf
            .children
            .iter()
            .flat_map(|c| c.as_element())
            .filter(|c| c.is_rdf("Description"));

        for description in descriptions {
            for (attr, value) in sorted_attributes(description) {
                let ns = attr.namespace.as_deref();
                if ns == Some(XMP_NOTE_NS) && attr.local_name == "HasExtendedXMP" {
                    log::debug!("Packet has extended XMP with GUID `{value}`.");
                    self.extended_guid = Some(value.clone());
                    continue;
                }

                let Some(prefix) = self.prefix(ns, attr.prefix.as_deref(), &attr.local_name) else {
                    continue;
                };
                self.push(&prefix, attr.local_name.clone(), TagValue::xmp(ValueKind::XmpText, value));
            }

            for property in description.children.iter().flat_map(|c| c.as_element()) {
                let Some(prefix) = self.prefix(
                    property.namespace.as_deref(),
                    property.prefix.as_deref(),
                    &property.name,
                ) else {
                    continue;
                };
                self.read_property(&prefix, property.name.clone(), property);
            }
        }

        Ok(())
    }

    /// Reads one property (or struct field) into entries under `name`.
    fn read_property(&mut self, group: &str, name: String, element: &Element) {
        if let Some(resource) = element.rdf_attribute("resource") {
            self.push(group, name, TagValue::xmp(ValueKind::XmpText, resource));
            return;
        }

        if let Some((container, kind)) = element.collection() {
            let items = container
                .children
                .iter()
                .flat_map(|c| c.as_element())
                .filter(|c| c.is_rdf("li"));

            for (i, item) in items.enumerate() {
                if item.is_struct() {
                    self.state.array_kinds.insert(format!("{group}.{name}"), kind);
                    self.read_fields(group, &format!("{name}[{}]", i + 1), item);
                } else {
                    self.push(group, name.clone(), TagValue::xmp(kind, &text_of(item)));
                }
            }
            return;
        }

        if element.is_struct() {
            self.read_fields(group, &name, element);
            return;
        }

        self.push(group, name, TagValue::xmp(ValueKind::XmpText, &text_of(element)));
    }

    /// Reads the fields of a struct.
    fn read_fields(&mut self, group: &str, name: &str, element: &Element) {
        // the fields are either on a nested `rdf:Description` or right here
        let holder = element
            .children
            .iter()
            .flat_map(|c| c.as_element())
            .find(|c| c.is_rdf("Description"))
            .unwrap_or(element);

        for (attr, value) in sorted_attributes(holder) {
            let ns = attr.namespace.as_deref();
            let Some(prefix) = self.prefix(ns, attr.prefix.as_deref(), &attr.local_name) else {
                continue;
            };
            self.push(
                group,
                format!("{name}/{prefix}:{}", attr.local_name),
                TagValue::xmp(ValueKind::XmpText, value),
            );
        }

        for field in holder.children.iter().flat_map(|c| c.as_element()) {
            let Some(prefix) =
                self.prefix(field.namespace.as_deref(), field.prefix.as_deref(), &field.name)
            else {
                continue;
            };
            self.read_property(group, format!("{name}/{prefix}:{}", field.name), field);
        }
    }

    /// Finds the prefix we'll use for a namespace.
    fn prefix(&mut self, ns: Option<&str>, doc_prefix: Option<&str>, local: &str) -> Option<String> {
        let Some(uri) = ns else {
            self.warn(format!("`{local}` has no namespace. Skipping it."));
            return None;
        };

        if let Some(known) = prefix_for_uri(uri) {
            return Some(known.to_string());
        }

        let Some(prefix) = doc_prefix.filter(|p| !p.is_empty()) else {
            self.warn(format!("`{local}` uses the default namespace `{uri}`. Skipping it."));
            return None;
        };

        if uri_for_prefix(prefix).is_some() {
            self.warn(format!(
                "`{prefix}:{local}` reuses a registered prefix for `{uri}`. Skipping it."
            ));
            return None;
        }

        match self.state.namespaces.get(prefix) {
            Some(seen) if seen != uri => {
                let message = format!(
                    "Prefix `{prefix}` was bound to `{seen}`, then `{uri}`. Skipping `{local}`."
                );
                self.warn(message);
                None
            }
            Some(_) => Some(prefix.to_string()),
            None => {
                log::debug!("Found unregistered namespace `{prefix}` -> `{uri}`.");
                self.state.namespaces.insert(prefix.to_string(), uri.to_string());
                Some(prefix.to_string())
            }
        }
    }

    fn push(&mut self, group: &str, name: String, value: TagValue) {
        match TagKey::new(Family::Xmp, group, name) {
            Ok(key) => {
                log::trace!("Found XMP property `{key}`.");
                self.entries.append(key, value);
            }
            Err(e) => self.warn(format!("Couldn't make a key for a property. err: {e}")),
        }
    }

    fn warn(&mut self, message: String) {
        log::warn!("{message}");
        self.warnings.push(message);
    }
}

/// Finds the `rdf:RDF` element, which may be the root or sit inside
/// `x:xmpmeta`.
fn find_rdf(document: &Element) -> Option<&Element> {
    if document.is_rdf("RDF") {
        return Some(document);
    }

    let children = || document.children.iter().flat_map(|c| c.as_element());
    children().find(|c| c.is_rdf("RDF")).or_else(|| {
        children()
            .flat_map(|c| c.children.iter().flat_map(|gc| gc.as_element()))
            .find(|gc| gc.is_rdf("RDF"))
    })
}

/// Attributes that hold property values, in a stable order.
///
/// RDF's own attributes and `xml:*` qualifiers aren't properties.
fn sorted_attributes(element: &Element) -> Vec<(&AttributeName, &String)> {
    let mut attrs: Vec<(&AttributeName, &String)> = element
        .attributes
        .iter()
        .filter(|(key, _)| {
            key.namespace
                .as_deref()
                .is_none_or(|ns| ns != RDF_NS && ns != XML_NS)
        })
        .collect();

    attrs.sort_by(|(a, _), (b, _)| {
        (a.prefix.as_deref(), a.local_name.as_str()).cmp(&(b.prefix.as_deref(), b.local_name.as_str()))
    });
    attrs
}

/// An element's text, or nothing.
fn text_of(element: &Element) -> String {
    element
        .get_text()
        .map(|t| t.into_owned())
        .unwrap_or_default()
}

/// One step along an XMP property path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Step {
    pub prefix: String,
    pub local: String,

    /// The 1-based item, for structs inside arrays.
    pub index: Option<usize>,
}

impl Step {
    pub fn qualified(&self) -> String {
        format!("{}:{}", self.prefix, self.local)
    }
}

/// Splits an XMP key into its path, checking that every prefix is known.
pub(crate) fn resolve_key(key: &TagKey, state: &XmpState) -> Result<Vec<Step>, EngineError> {
    let invalid = |reason: String| EngineError::InvalidKey {
        key: key.to_string(),
        reason,
    };

    if key.family() != Family::Xmp {
        return Err(invalid("not an XMP key".into()));
    }

    let mut steps = Vec::new();
    for (i, part) in key.name().split('/').enumerate() {
        let (prefix, rest) = match i {
            0 => (key.group(), part),
            _ => part
                .split_once(':')
                .ok_or_else(|| invalid(format!("field `{part}` has no prefix")))?,
        };

        if uri_for_prefix(prefix).is_none() && !state.namespaces.contains_key(prefix) {
            return Err(invalid(format!("unknown namespace prefix `{prefix}`")));
        }

        let (local, index) = match rest.strip_suffix(']').and_then(|r| r.split_once('[')) {
            Some((local, index)) => {
                let index: usize = index
                    .parse()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| invalid(format!("bad array index in `{part}`")))?;
                (local, Some(index))
            }
            None => (rest, None),
        };

        if !is_xml_name(local) {
            return Err(invalid(format!("`{local}` isn't a valid property name")));
        }

        steps.push(Step {
            prefix: prefix.to_string(),
            local: local.to_string(),
            index,
        });
    }

    if steps.last().is_some_and(|s| s.index.is_some()) {
        return Err(invalid("the last step can't be an array item".into()));
    }

    Ok(steps)
}

/// A conservative check for XML local names.
fn is_xml_name(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Checks that XMP can store `value`.
pub fn check_value(key: &TagKey, value: &TagValue) -> Result<(), EngineError> {
    match value.kind().is_xmp() {
        true => Ok(()),
        false => Err(EngineError::InvalidValue {
            key: key.clone(),
            reason: format!("XMP can't store `{}` values", value.kind()),
        }),
    }
}
