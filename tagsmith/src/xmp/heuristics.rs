//! Guesses the shape of an XMP property from its element.
//!
//! There's no schema to consult, so we look at what the element holds: an
//! RDF container makes an array, fields make a struct, and anything else is
//! simple text.

use tagsmith_types::{value::ValueKind, xmp::RDF_NS};
use xmltree::Element;

pub trait XmpElementHeuristicsExt {
    fn is_rdf(&self, name: &str) -> bool;
    fn is_struct(&self) -> bool;
    fn collection(&self) -> Option<(&Element, ValueKind)>;
    fn rdf_attribute(&self, name: &str) -> Option<&str>;
}

impl XmpElementHeuristicsExt for Element {
    /// Whether this is the `rdf:{name}` element.
    fn is_rdf(&self, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == Some(RDF_NS)
    }

    /// Determines whether or not `self` is a struct.
    fn is_struct(&self) -> bool {
        // if we have the `rdf:parseType="Resource"`, we must be a struct.
        if self.rdf_attribute("parseType") == Some("Resource") {
            return true;
        }

        // any element children (that aren't containers) are fields.
        //
        // a nested `rdf:Description` counts too: it holds the fields
        self.collection().is_none()
            && self
                .children
                .iter()
                .flat_map(|c| c.as_element())
                .next()
                .is_some()
    }

    /// Finds an `rdf:Bag`, `rdf:Seq`, or `rdf:Alt` child.
    fn collection(&self) -> Option<(&Element, ValueKind)> {
        self.children
            .iter()
            .flat_map(|c| c.as_element())
            .filter(|c| c.namespace.as_deref() == Some(RDF_NS))
            .find_map(|c| match c.name.as_str() {
                "Bag" => Some((c, ValueKind::XmpBag)),
                "Seq" => Some((c, ValueKind::XmpSeq)),
                "Alt" => Some((c, ValueKind::XmpAlt)),
                _ => None,
            })
    }

    /// The value of the `rdf:{name}` attribute, if any.
    fn rdf_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| {
                key.local_name == name && key.namespace_ref().is_some_and(|ns| ns == RDF_NS)
            })
            .map(|(_, value)| value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> Element {
        Element::parse(xml.as_bytes()).expect("`xmltree` should parse the XML correctly")
    }

    #[test]
    fn detects_shapes() {
        let bag = parse(
            r#"<dc:subject xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
                <rdf:Bag><rdf:li>a</rdf:li></rdf:Bag>
            </dc:subject>"#,
        );
        assert!(matches!(bag.collection(), Some((_, ValueKind::XmpBag))));
        assert!(!bag.is_struct());

        let resource = parse(
            r#"<xmpMM:DerivedFrom rdf:parseType="Resource" xmlns:xmpMM="http://ns.adobe.com/xap/1.0/mm/" xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"/>"#,
        );
        assert!(resource.is_struct());
        assert_eq!(resource.rdf_attribute("parseType"), Some("Resource"));

        let described = parse(
            r#"<xmpMM:DerivedFrom xmlns:xmpMM="http://ns.adobe.com/xap/1.0/mm/" xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
                <rdf:Description/>
            </xmpMM:DerivedFrom>"#,
        );
        assert!(described.is_struct());

        let text = parse(r#"<xmp:Rating xmlns:xmp="http://ns.adobe.com/xap/1.0/">5</xmp:Rating>"#);
        assert!(!text.is_struct());
        assert!(text.collection().is_none());
    }
}
