//! Writes entries back out as an XMP packet.
//!
//! Every property goes on a single `rdf:Description` as an element. Structs
//! get a nested `rdf:Description`, and arrays get their container back.

use std::collections::BTreeMap;

use tagsmith_types::{
    key::TagKey,
    value::{TagValue, ValueKind},
    xmp::{RDF_NS, X_NS, uri_for_prefix},
};
use xmltree::{Element, EmitterConfig, Namespace, XMLNode};

use super::{Step, check_value, resolve_key};
use crate::{
    EncodeError, EngineError,
    container::{Entries, XmpState},
};

/// The packet wrapper's ID. It's the same in every packet.
const PACKET_ID: &str = "W5M0MpCehiHzreSzNTczkc9d";

/// A property, rebuilt from its flattened entries.
#[derive(Clone, Debug, PartialEq)]
enum Node {
    Simple(String),
    Array(ValueKind, Vec<Node>),
    Struct(Vec<(Step, Node)>),
}

/// Builds an XMP packet from `entries`.
///
/// Returns nothing when there are no entries.
pub fn encode(
    entries: &Entries,
    state: &XmpState,
    wrapper: bool,
    padding: usize,
) -> Result<Vec<u8>, EngineError> {
    if entries.is_empty() {
        return Ok(Vec::new());
    }

    let mut properties: Vec<(Step, Node)> = Vec::new();
    for (key, value) in entries.iter() {
        let steps = resolve_key(key, state)?;
        check_value(key, value)?;

        insert(&mut properties, &steps, "", key, value, state).map_err(|reason| {
            log::warn!("Can't place `{key}` in the XMP tree: {reason}");
            EngineError::InvalidKey {
                key: key.to_string(),
                reason: reason.to_string(),
            }
        })?;
    }

    let mut used: BTreeMap<String, String> = BTreeMap::new();
    let mut description = rdf_element("Description");
    for (step, node) in &properties {
        description
            .children
            .push(XMLNode::Element(write_node(step, node, state, &mut used)));
    }

    let mut rdf = rdf_element("RDF");
    rdf.children.push(XMLNode::Element(description));

    let mut namespaces = Namespace::empty();
    namespaces.put("x", X_NS);
    namespaces.put("rdf", RDF_NS);
    for (prefix, uri) in &used {
        namespaces.put(prefix.as_str(), uri.as_str());
    }

    let mut root = element("x", "xmpmeta", X_NS);
    root.namespaces = Some(namespaces);
    root.children.push(XMLNode::Element(rdf));

    let mut xml: Vec<u8> = Vec::new();
    root.write_with_config(
        &mut xml,
        EmitterConfig::new()
            .write_document_declaration(false)
            .perform_indent(true),
    )
    .map_err(|e| {
        log::error!("Failed to write XMP packet. err: {e}");
        EncodeError::XmlWrite(e.to_string())
    })?;

    if !wrapper {
        return Ok(xml);
    }

    let mut out = Vec::with_capacity(xml.len() + padding + 128);
    out.extend_from_slice(format!("<?xpacket begin=\"\u{feff}\" id=\"{PACKET_ID}\"?>\n").as_bytes());
    out.extend_from_slice(&xml);
    out.push(b'\n');
    out.extend(padding_bytes(padding));
    out.extend_from_slice(b"<?xpacket end=\"w\"?>");
    Ok(out)
}

/// Places one value into the property tree.
///
/// `path` is the property path walked so far, as it appears in keys.
fn insert(
    fields: &mut Vec<(Step, Node)>,
    steps: &[Step],
    path: &str,
    key: &TagKey,
    value: &TagValue,
    state: &XmpState,
) -> Result<(), &'static str> {
    let Some((step, rest)) = steps.split_first() else {
        return Err("empty path");
    };

    let here = match path.is_empty() {
        true => step.local.clone(),
        false => format!("{path}/{}", step.qualified()),
    };

    let slot = match fields
        .iter()
        .position(|(s, _)| s.prefix == step.prefix && s.local == step.local)
    {
        Some(i) => i,
        None => {
            let fresh = match (rest.is_empty(), step.index) {
                (true, _) if value.kind() == ValueKind::XmpText => Node::Simple(String::new()),
                (true, _) => Node::Array(value.kind(), Vec::new()),
                (false, Some(_)) => {
                    let kind = state
                        .array_kinds
                        .get(&format!("{}.{here}", key.group()))
                        .copied()
                        .unwrap_or(ValueKind::XmpBag);
                    Node::Array(kind, Vec::new())
                }
                (false, None) => Node::Struct(Vec::new()),
            };

            let plain = Step {
                index: None,
                ..step.clone()
            };
            fields.push((plain, fresh));
            let last = fields.len() - 1;

            // a brand new simple node takes the value directly
            if let (true, Node::Simple(text)) = (rest.is_empty(), &mut fields[last].1) {
                *text = value.to_text();
                return Ok(());
            }
            last
        }
    };

    let node = &mut fields[slot].1;
    match (rest.is_empty(), step.index, node) {
        (true, _, Node::Simple(_)) => Err("a simple property can only hold one value"),
        (true, _, Node::Array(kind, items)) if *kind == value.kind() => {
            items.push(Node::Simple(value.to_text()));
            Ok(())
        }
        (true, _, _) => Err("the key was already used with another shape"),

        (false, Some(index), Node::Array(_, items)) => {
            while items.len() < index {
                items.push(Node::Struct(Vec::new()));
            }
            match &mut items[index - 1] {
                Node::Struct(inner) => {
                    insert(inner, rest, &format!("{here}[{index}]"), key, value, state)
                }
                _ => Err("array item isn't a struct"),
            }
        }
        (false, None, Node::Struct(inner)) => insert(inner, rest, &here, key, value, state),
        (false, _, _) => Err("the key was already used with another shape"),
    }
}

/// Turns a property back into XML.
fn write_node(
    step: &Step,
    node: &Node,
    state: &XmpState,
    used: &mut BTreeMap<String, String>,
) -> Element {
    let uri = uri_for_prefix(&step.prefix)
        .map(str::to_string)
        .or_else(|| state.namespaces.get(&step.prefix).cloned())
        .unwrap_or_default();
    used.insert(step.prefix.clone(), uri.clone());

    let mut el = element(&step.prefix, &step.local, &uri);
    match node {
        Node::Simple(text) => {
            if !text.is_empty() {
                el.children.push(XMLNode::Text(text.clone()));
            }
        }

        Node::Array(kind, items) => {
            let mut container = rdf_element(match kind {
                ValueKind::XmpSeq => "Seq",
                ValueKind::XmpAlt => "Alt",
                _ => "Bag",
            });

            for item in items {
                let mut li = rdf_element("li");
                match item {
                    Node::Simple(text) => {
                        if !text.is_empty() {
                            li.children.push(XMLNode::Text(text.clone()));
                        }
                    }
                    Node::Struct(fields) => {
                        li.children
                            .push(XMLNode::Element(write_struct(fields, state, used)));
                    }
                    // arrays don't hold arrays in a flat key
                    Node::Array(..) => {}
                }
                container.children.push(XMLNode::Element(li));
            }

            el.children.push(XMLNode::Element(container));
        }

        Node::Struct(fields) => {
            el.children
                .push(XMLNode::Element(write_struct(fields, state, used)));
        }
    }

    el
}

fn write_struct(
    fields: &[(Step, Node)],
    state: &XmpState,
    used: &mut BTreeMap<String, String>,
) -> Element {
    let mut description = rdf_element("Description");
    for (step, node) in fields {
        description
            .children
            .push(XMLNode::Element(write_node(step, node, state, used)));
    }
    description
}

fn element(prefix: &str, local: &str, uri: &str) -> Element {
    let mut el = Element::new(local);
    el.prefix = Some(prefix.to_string());
    el.namespace = Some(uri.to_string());
    el
}

fn rdf_element(local: &str) -> Element {
    element("rdf", local, RDF_NS)
}

/// Whitespace for in-place editing, in lines of up to 100 bytes.
fn padding_bytes(len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    while out.len() < len {
        let line = (len - out.len()).min(100);
        out.extend(core::iter::repeat_n(b' ', line - 1));
        out.push(b'\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{util::logger, xmp::decode};

    fn key(s: &str) -> TagKey {
        TagKey::parse(s).unwrap()
    }

    fn xmp(kind: ValueKind, text: &str) -> TagValue {
        TagValue::xmp(kind, text)
    }

    #[test]
    fn nothing_to_write() {
        assert!(
            encode(&Entries::new(), &XmpState::default(), true, 0)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn round_trips_every_shape() {
        logger();

        let mut entries = Entries::new();
        entries.append(key("Xmp.xmp.Rating"), xmp(ValueKind::XmpText, "5"));
        entries.append(key("Xmp.dc.subject"), xmp(ValueKind::XmpBag, "a & b"));
        entries.append(key("Xmp.dc.subject"), xmp(ValueKind::XmpBag, "<c>"));
        entries.append(key("Xmp.dc.subject"), xmp(ValueKind::XmpBag, "d"));
        entries.append(key("Xmp.dc.title"), xmp(ValueKind::XmpAlt, "Harbor"));
        entries.append(
            key("Xmp.xmpMM.DerivedFrom/stRef:instanceID"),
            xmp(ValueKind::XmpText, "xmp.iid:1"),
        );
        entries.append(
            key("Xmp.xmpMM.DerivedFrom/stRef:documentID"),
            xmp(ValueKind::XmpText, "xmp.did:2"),
        );
        entries.append(
            key("Xmp.iptcExt.LocationShown[1]/iptcExt:City"),
            xmp(ValueKind::XmpText, "Bergen"),
        );
        entries.append(
            key("Xmp.iptcExt.LocationShown[2]/iptcExt:City"),
            xmp(ValueKind::XmpText, "Tromso"),
        );

        let mut state = XmpState::default();
        state
            .array_kinds
            .insert("iptcExt.LocationShown".into(), ValueKind::XmpSeq);

        let packet = encode(&entries, &state, true, 250).unwrap();
        let text = String::from_utf8(packet.clone()).unwrap();
        assert!(text.starts_with("<?xpacket begin=\"\u{feff}\""));
        assert!(text.ends_with("<?xpacket end=\"w\"?>"));
        assert!(text.contains("<rdf:Seq>"));

        let decoded = decode(&packet).unwrap();
        assert!(decoded.warnings.is_empty(), "{:?}", decoded.warnings);
        assert_eq!(decoded.entries, entries);
        assert_eq!(decoded.state.array_kinds, state.array_kinds);
    }

    #[test]
    fn keeps_unregistered_namespaces() {
        logger();

        let mut state = XmpState::default();
        state
            .namespaces
            .insert("acme".into(), "http://example.com/acme/".into());

        let mut entries = Entries::new();
        entries.append(key("Xmp.acme.Flavor"), xmp(ValueKind::XmpText, "mint"));

        let packet = encode(&entries, &state, false, 0).unwrap();
        let text = String::from_utf8(packet.clone()).unwrap();
        assert!(text.starts_with("<x:xmpmeta"));
        assert!(text.contains(r#"xmlns:acme="http://example.com/acme/""#));

        let decoded = decode(&packet).unwrap();
        assert_eq!(decoded.entries, entries);
        assert_eq!(decoded.state.namespaces, state.namespaces);
    }

    #[test]
    fn conflicting_shapes_are_rejected() {
        logger();

        let mut entries = Entries::new();
        entries.append(key("Xmp.dc.subject"), xmp(ValueKind::XmpBag, "a"));
        entries.append(key("Xmp.dc.subject"), xmp(ValueKind::XmpSeq, "b"));
        assert!(matches!(
            encode(&entries, &XmpState::default(), true, 0),
            Err(EngineError::InvalidKey { .. })
        ));

        let mut entries = Entries::new();
        entries.append(key("Xmp.xmp.Rating"), xmp(ValueKind::XmpText, "1"));
        entries.append(key("Xmp.xmp.Rating"), xmp(ValueKind::XmpText, "2"));
        assert!(matches!(
            encode(&entries, &XmpState::default(), true, 0),
            Err(EngineError::InvalidKey { .. })
        ));

        let mut entries = Entries::new();
        entries.append(key("Xmp.xmpMM.DerivedFrom"), xmp(ValueKind::XmpText, "x"));
        entries.append(
            key("Xmp.xmpMM.DerivedFrom/stRef:instanceID"),
            xmp(ValueKind::XmpText, "y"),
        );
        assert!(matches!(
            encode(&entries, &XmpState::default(), true, 0),
            Err(EngineError::InvalidKey { .. })
        ));
    }

    #[test]
    fn pads_in_lines() {
        let padding = padding_bytes(250);
        assert_eq!(padding.len(), 250);
        assert_eq!(padding.iter().filter(|b| **b == b'\n').count(), 3);
    }
}
