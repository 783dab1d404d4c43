//! The XMP namespace registry.
//!
//! XMP keys use a namespace prefix as their group (`Xmp.dc.subject`). The
//! prefix a document uses is its own business, so we map every URI we know
//! onto one canonical prefix when reading, and back again when writing.

use std::sync::LazyLock;

use rustc_hash::FxHashMap;

/// The RDF namespace.
pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// The namespace of the `x:xmpmeta` wrapper element.
pub const X_NS: &str = "adobe:ns:meta/";

/// The XML namespace, used for `xml:lang`.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Holds `xmpNote:HasExtendedXMP`, which names the extended packet's GUID.
pub const XMP_NOTE_NS: &str = "http://ns.adobe.com/xmp/note/";

/// A known namespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub prefix: &'static str,
    pub uri: &'static str,
}

const fn ns(prefix: &'static str, uri: &'static str) -> Namespace {
    Namespace { prefix, uri }
}

/// All the namespaces with a canonical prefix.
pub static NAMESPACES: &[Namespace] = &[
    // xmp standard
    ns("dc", "http://purl.org/dc/elements/1.1/"),
    ns("xmp", "http://ns.adobe.com/xap/1.0/"),
    ns("xmpRights", "http://ns.adobe.com/xap/1.0/rights/"),
    ns("xmpMM", "http://ns.adobe.com/xap/1.0/mm/"),
    ns("xmpBJ", "http://ns.adobe.com/xap/1.0/bj/"),
    ns("xmpTPg", "http://ns.adobe.com/xap/1.0/t/pg/"),
    ns("xmpDM", "http://ns.adobe.com/xmp/1.0/DynamicMedia/"),
    ns("xmpNote", XMP_NOTE_NS),
    ns("xmpidq", "http://ns.adobe.com/xmp/Identifier/qual/1.0/"),
    ns("pdf", "http://ns.adobe.com/pdf/1.3/"),
    ns("photoshop", "http://ns.adobe.com/photoshop/1.0/"),
    ns("crs", "http://ns.adobe.com/camera-raw-settings/1.0/"),
    ns("tiff", "http://ns.adobe.com/tiff/1.0/"),
    ns("exif", "http://ns.adobe.com/exif/1.0/"),
    ns("exifEX", "http://cipa.jp/exif/1.0/"),
    ns("aux", "http://ns.adobe.com/exif/1.0/aux/"),
    // struct field namespaces
    ns("stRef", "http://ns.adobe.com/xap/1.0/sType/ResourceRef#"),
    ns("stEvt", "http://ns.adobe.com/xap/1.0/sType/ResourceEvent#"),
    ns("stDim", "http://ns.adobe.com/xap/1.0/sType/Dimensions#"),
    ns("stVer", "http://ns.adobe.com/xap/1.0/sType/Version#"),
    ns("stJob", "http://ns.adobe.com/xap/1.0/sType/Job#"),
    ns("stFnt", "http://ns.adobe.com/xap/1.0/sType/Font#"),
    ns("stArea", "http://ns.adobe.com/xmp/sType/Area#"),
    ns("xmpG", "http://ns.adobe.com/xap/1.0/g/"),
    ns("xmpGImg", "http://ns.adobe.com/xap/1.0/g/img/"),
    // iptc
    ns("iptc", "http://iptc.org/std/Iptc4xmpCore/1.0/xmlns/"),
    ns("iptcExt", "http://iptc.org/std/Iptc4xmpExt/2008-02-29/"),
    ns("plus", "http://ns.useplus.org/ldf/xmp/1.0/"),
    // others seen in the wild
    ns("dcterms", "http://purl.org/dc/terms/"),
    ns("lr", "http://ns.adobe.com/lightroom/1.0/"),
    ns("mwg-rs", "http://www.metadataworkinggroup.com/schemas/regions/"),
    ns("mwg-kw", "http://www.metadataworkinggroup.com/schemas/keywords/"),
    ns("digiKam", "http://www.digikam.org/ns/1.0/"),
    ns("MicrosoftPhoto", "http://ns.microsoft.com/photo/1.0/"),
    ns("GPano", "http://ns.google.com/photos/1.0/panorama/"),
    ns("GCamera", "http://ns.google.com/photos/1.0/camera/"),
    ns("acdsee", "http://ns.acdsee.com/iptc/1.0/"),
];

static BY_PREFIX: LazyLock<FxHashMap<&'static str, &'static str>> =
    LazyLock::new(|| NAMESPACES.iter().map(|n| (n.prefix, n.uri)).collect());

static BY_URI: LazyLock<FxHashMap<&'static str, &'static str>> =
    LazyLock::new(|| NAMESPACES.iter().map(|n| (n.uri, n.prefix)).collect());

/// The URI behind a canonical prefix.
///
/// ```
/// use tagsmith_types::xmp::uri_for_prefix;
///
/// assert_eq!(uri_for_prefix("dc"), Some("http://purl.org/dc/elements/1.1/"));
/// assert_eq!(uri_for_prefix("nope"), None);
/// ```
pub fn uri_for_prefix(prefix: &str) -> Option<&'static str> {
    BY_PREFIX.get(prefix).copied()
}

/// The canonical prefix for a namespace URI.
pub fn prefix_for_uri(uri: &str) -> Option<&'static str> {
    BY_URI.get(uri).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_one_to_one() {
        assert_eq!(BY_PREFIX.len(), NAMESPACES.len(), "duplicate prefix");
        assert_eq!(BY_URI.len(), NAMESPACES.len(), "duplicate uri");

        for n in NAMESPACES {
            assert_eq!(prefix_for_uri(uri_for_prefix(n.prefix).unwrap()), Some(n.prefix));
        }
    }
}
