//! Photoshop image resource blocks.
//!
//! In JPEG, IPTC isn't stored directly. APP13 holds `Photoshop 3.0\0`
//! followed by a list of image resources, and IPTC is just one of them
//! (`0x0404`). The others belong to Photoshop, and we carry them along
//! untouched.
//!
//! Each resource looks like this:
//!
//! - signature (4 bytes, usually `8BIM`)
//! - resource ID (`u16`, big-endian)
//! - Pascal string name, padded so that it takes an even number of bytes
//! - data size (`u32`, big-endian)
//! - data, padded to an even length

use winnow::{
    Parser as _,
    binary::{be_u16, be_u32, u8},
    error::EmptyError,
    token::take,
};

use super::error::PhotoshopError;

/// The resource holding IPTC-IIM data.
pub const IPTC_RESOURCE: u16 = 0x0404;

/// An MD5 digest of the IPTC resource. It goes stale when IPTC is edited.
pub const IPTC_DIGEST: u16 = 0x0425;

/// Signatures that may start a resource.
const SIGNATURES: &[&[u8; 4]] = &[b"8BIM", b"PHUT", b"AgHg", b"DCSR"];

/// One image resource.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Resource {
    pub signature: [u8; 4],
    pub id: u16,

    /// The resource's name, without its length byte or padding. Usually
    /// empty.
    pub name: Vec<u8>,

    pub data: Vec<u8>,
}

impl Resource {
    /// A new `8BIM` resource without a name.
    pub fn new(id: u16, data: Vec<u8>) -> Self {
        Self {
            signature: *b"8BIM",
            id,
            name: Vec::new(),
            data,
        }
    }
}

/// Reads every resource in a (concatenated) APP13 payload.
///
/// Trailing zero bytes are taken as padding.
pub fn parse_resources(input: &[u8]) -> Result<Vec<Resource>, PhotoshopError> {
    let total = input.len();
    let input: &mut &[u8] = &mut &*input;
    let mut resources = Vec::new();

    while !input.is_empty() {
        if input.iter().all(|b| *b == 0) {
            log::trace!("Ignoring `{}` bytes of padding after the resources.", input.len());
            break;
        }

        let offset = total - input.len();
        let truncated = |_: EmptyError| {
            log::warn!("Photoshop resource at offset `{offset}` was cut short.");
            PhotoshopError::Truncated { offset }
        };

        let signature: &[u8] = take(4_usize).parse_next(input).map_err(truncated)?;
        let signature: [u8; 4] = [signature[0], signature[1], signature[2], signature[3]];
        if !SIGNATURES.contains(&&signature) {
            log::warn!("Unknown Photoshop resource signature: `{signature:x?}`");
            return Err(PhotoshopError::BadSignature { offset, found: signature });
        }

        let id: u16 = be_u16.parse_next(input).map_err(truncated)?;

        // the name's length byte counts toward its padding
        let name_len: u8 = u8.parse_next(input).map_err(truncated)?;
        let name: &[u8] = take(name_len as usize).parse_next(input).map_err(truncated)?;
        if name_len % 2 == 0 {
            u8.void().parse_next(input).map_err(truncated)?;
        }

        let size: u32 = be_u32.parse_next(input).map_err(truncated)?;
        let data: &[u8] = take(size as usize).parse_next(input).map_err(truncated)?;

        // the last resource may skip its pad byte
        if size % 2 == 1 && !input.is_empty() {
            u8.void().parse_next(input).map_err(truncated)?;
        }

        log::trace!("Found Photoshop resource `{id:#06x}` with `{size}` bytes.");
        resources.push(Resource {
            signature,
            id,
            name: name.to_vec(),
            data: data.to_vec(),
        });
    }

    Ok(resources)
}

/// Writes resources back out, padding as needed.
pub fn write_resources(resources: &[Resource]) -> Vec<u8> {
    let mut out = Vec::new();

    for r in resources {
        // names can't be longer than a byte says
        let name = &r.name[..r.name.len().min(u8::MAX as usize)];

        out.extend_from_slice(&r.signature);
        out.extend_from_slice(&r.id.to_be_bytes());
        out.push(name.len() as u8);
        out.extend_from_slice(name);
        if name.len() % 2 == 0 {
            out.push(0);
        }
        out.extend_from_slice(&(r.data.len() as u32).to_be_bytes());
        out.extend_from_slice(&r.data);
        if r.data.len() % 2 == 1 {
            out.push(0);
        }
    }

    out
}

/// Swaps the IPTC resource for a new one.
///
/// The new IPTC takes the place of the first old one, and any other IPTC
/// resources are dropped along with the digest. With `None`, IPTC is removed
/// entirely.
pub fn replace_iptc(resources: &[Resource], iptc: Option<Vec<u8>>) -> Vec<Resource> {
    let mut iptc = iptc;
    let mut out = Vec::with_capacity(resources.len() + 1);
    let mut seen = false;

    for r in resources {
        match r.id {
            IPTC_RESOURCE if !seen => {
                seen = true;
                if let Some(data) = iptc.take() {
                    out.push(Resource {
                        data,
                        ..r.clone()
                    });
                }
            }
            IPTC_RESOURCE | IPTC_DIGEST => {
                log::trace!("Dropping resource `{:#06x}`.", r.id);
            }
            _ => out.push(r.clone()),
        }
    }

    if let Some(data) = iptc {
        out.push(Resource::new(IPTC_RESOURCE, data));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::logger;

    #[test]
    fn reads_padded_resources() {
        logger();

        let mut bytes = Vec::new();

        // named "ab" (odd total with length byte -> 3, padded to 4), 3 bytes
        bytes.extend(b"8BIM");
        bytes.extend(0x03ED_u16.to_be_bytes());
        bytes.extend([2, b'a', b'b', 0]);
        bytes.extend(3_u32.to_be_bytes());
        bytes.extend([1, 2, 3, 0]);

        // no name, 2 bytes
        bytes.extend(b"8BIM");
        bytes.extend(IPTC_RESOURCE.to_be_bytes());
        bytes.extend([0, 0]);
        bytes.extend(2_u32.to_be_bytes());
        bytes.extend([9, 9]);

        // padding
        bytes.extend([0, 0, 0]);

        let resources = parse_resources(&bytes).unwrap();
        assert_eq!(
            resources,
            [
                Resource {
                    signature: *b"8BIM",
                    id: 0x03ED,
                    name: b"ab".to_vec(),
                    data: vec![1, 2, 3],
                },
                Resource::new(IPTC_RESOURCE, vec![9, 9]),
            ]
        );

        // and it writes out the same way, minus trailing padding
        assert_eq!(write_resources(&resources), bytes[..bytes.len() - 3]);
    }

    #[test]
    fn rejects_junk() {
        logger();

        assert!(matches!(
            parse_resources(b"JUNK\x04\x04\0\0\0\0\0\0"),
            Err(PhotoshopError::BadSignature { offset: 0, .. })
        ));
        assert_eq!(
            parse_resources(b"8BIM\x04\x04\0\0\0\0\0\x10ab"),
            Err(PhotoshopError::Truncated { offset: 0 })
        );
    }

    #[test]
    fn replaces_iptc_in_place() {
        let resources = vec![
            Resource::new(0x03ED, vec![1]),
            Resource::new(IPTC_RESOURCE, vec![2]),
            Resource::new(IPTC_DIGEST, vec![3; 16]),
            Resource::new(0x0409, vec![4]),
            Resource::new(IPTC_RESOURCE, vec![5]),
        ];

        let ids = |rs: &[Resource]| rs.iter().map(|r| r.id).collect::<Vec<_>>();

        let replaced = replace_iptc(&resources, Some(vec![7]));
        assert_eq!(ids(&replaced), [0x03ED, IPTC_RESOURCE, 0x0409]);
        assert_eq!(replaced[1].data, [7]);

        let removed = replace_iptc(&resources, None);
        assert_eq!(ids(&removed), [0x03ED, 0x0409]);

        let added = replace_iptc(&[Resource::new(0x03ED, vec![1])], Some(vec![8]));
        assert_eq!(ids(&added), [0x03ED, IPTC_RESOURCE]);
    }
}
