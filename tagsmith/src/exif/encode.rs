//! Writes entries back out as a TIFF-structured Exif block.
//!
//! Each IFD is laid out as its count, its twelve-byte entries, and its next
//! pointer, followed by the data of any values too big to sit inline, then
//! its embedded image (if it has one). Offsets that aren't known until later
//! (sub-IFD pointers, next pointers) are patched in at the end.

use std::collections::BTreeMap;

use tagsmith_types::{
    exif::{
        Endianness,
        ifd::IfdGroup,
        tags::{
            EXIF_IFD_POINTER, GPS_IFD_POINTER, INTEROP_IFD_POINTER, JPEG_INTERCHANGE_FORMAT,
            JPEG_INTERCHANGE_FORMAT_LENGTH,
        },
    },
    value::{TagValue, ValueKind},
};

use super::resolve_key;
use crate::{
    EngineError, EncodeError,
    container::{Entries, ExifState},
};

/// The IFDs to write, by group, each with its entries in tag order.
type Layout = BTreeMap<IfdGroup, Vec<(u16, TagValue)>>;

/// Encodes Exif entries into a TIFF block, in the given byte order.
///
/// Returns an empty `Vec` if there's nothing to write.
pub fn encode(
    entries: &Entries,
    state: &ExifState,
    order: Endianness,
) -> Result<Vec<u8>, EngineError> {
    let mut layout: Layout = BTreeMap::new();
    for (key, value) in entries.iter() {
        let (group, tag) = resolve_key(key)?;
        super::check_value(key, value)?;
        layout
            .entry(group)
            .or_default()
            .push((tag, value.clone().with_order(order)));
    }

    if layout.is_empty() {
        log::trace!("No Exif entries to write.");
        return Ok(Vec::new());
    }

    let blobs = embedded_images(&mut layout, state, order);
    add_structure(&mut layout, order);

    // stable, so repeated tags keep their order
    for ifd in layout.values_mut() {
        ifd.sort_by_key(|(tag, _)| *tag);
    }

    write(&layout, &blobs, order)
}

/// Picks the embedded images that will be written.
///
/// An image is kept only while its IFD still has a `JPEGInterchangeFormat`
/// entry. The offset and length entries of IFDs without an image are dropped,
/// since they'd point at nothing.
fn embedded_images<'s>(
    layout: &mut Layout,
    state: &'s ExifState,
    order: Endianness,
) -> BTreeMap<IfdGroup, &'s [u8]> {
    let mut kept = BTreeMap::new();

    for (group, ifd) in layout.iter_mut() {
        let has_pointer = ifd.iter().any(|(t, _)| *t == JPEG_INTERCHANGE_FORMAT);

        match (state.blobs.get(group), has_pointer) {
            (Some(blob), true) => {
                // placeholders, patched once the image is placed
                ifd.retain(|(t, _)| {
                    *t != JPEG_INTERCHANGE_FORMAT && *t != JPEG_INTERCHANGE_FORMAT_LENGTH
                });
                ifd.push((JPEG_INTERCHANGE_FORMAT, long(0, order)));
                ifd.push((JPEG_INTERCHANGE_FORMAT_LENGTH, long(blob.len() as u32, order)));
                kept.insert(*group, blob.as_slice());
            }
            (None, true) => {
                log::warn!(
                    "IFD `{group}` points at an embedded image we don't have. \
                    Dropping the pointer."
                );
                ifd.retain(|(t, _)| {
                    *t != JPEG_INTERCHANGE_FORMAT && *t != JPEG_INTERCHANGE_FORMAT_LENGTH
                });
            }
            (Some(_), false) => {
                log::debug!("The embedded image of IFD `{group}` was removed.");
            }
            (None, false) => (),
        }
    }

    kept
}

/// Adds the IFDs and pointer entries needed to reach every group.
fn add_structure(layout: &mut Layout, order: Endianness) {
    if layout.contains_key(&IfdGroup::Interop) {
        layout
            .entry(IfdGroup::Exif)
            .or_default()
            .push((INTEROP_IFD_POINTER, long(0, order)));
    }

    let mut ifd0_pointers = Vec::new();
    if layout.contains_key(&IfdGroup::Exif) {
        ifd0_pointers.push((EXIF_IFD_POINTER, long(0, order)));
    }
    if layout.contains_key(&IfdGroup::Gps) {
        ifd0_pointers.push((GPS_IFD_POINTER, long(0, order)));
    }

    // the chain can't have gaps, so fill them with empty IFDs
    let last = layout
        .keys()
        .filter_map(|g| g.chain_index())
        .max()
        .unwrap_or(0);
    for i in 0..=last {
        layout.entry(IfdGroup::from_chain_index(i)).or_default();
    }

    if let Some(ifd0) = layout.get_mut(&IfdGroup::_0) {
        ifd0.extend(ifd0_pointers);
    }
}

/// The order IFDs are written in.
fn write_order(layout: &Layout) -> Vec<IfdGroup> {
    let mut order = vec![IfdGroup::_0];
    order.extend(
        [IfdGroup::Exif, IfdGroup::Interop, IfdGroup::Gps]
            .into_iter()
            .filter(|g| layout.contains_key(g)),
    );
    order.extend(
        layout
            .keys()
            .filter(|g| g.chain_index().is_some_and(|i| i > 0))
            .copied(),
    );
    order
}

/// Lays out every IFD and patches the offsets.
fn write(
    layout: &Layout,
    blobs: &BTreeMap<IfdGroup, &[u8]>,
    order: Endianness,
) -> Result<Vec<u8>, EngineError> {
    let mut out = Vec::new();
    out.extend_from_slice(&order.marker());
    out.extend_from_slice(&u16_bytes(42, order));
    out.extend_from_slice(&u32_bytes(8, order));

    let mut ifd_offsets: BTreeMap<IfdGroup, u32> = BTreeMap::new();
    let mut next_fields: BTreeMap<IfdGroup, usize> = BTreeMap::new();

    // where the value fields of entries we'll patch later are
    let mut patch_sites: BTreeMap<(IfdGroup, u16), usize> = BTreeMap::new();

    for group in write_order(layout) {
        let Some(ifd) = layout.get(&group) else {
            continue;
        };

        pad_even(&mut out);
        ifd_offsets.insert(group, offset_of(&out)?);
        log::trace!("Writing IFD `{group}` with `{}` entries.", ifd.len());

        let count = u16::try_from(ifd.len()).map_err(|_| {
            log::error!("IFD `{group}` has `{}` entries, which won't fit.", ifd.len());
            EncodeError::TooManyEntries {
                group,
                len: ifd.len(),
            }
        })?;
        out.extend_from_slice(&u16_bytes(count, order));

        let mut deferred: Vec<(usize, &[u8])> = Vec::new();
        for (tag, value) in ifd {
            let (ty, count, data) = entry_parts(value);

            out.extend_from_slice(&u16_bytes(*tag, order));
            out.extend_from_slice(&u16_bytes(ty, order));
            out.extend_from_slice(&u32_bytes(count, order));

            let site = out.len();
            if data.len() <= 4 {
                let mut inline = [0_u8; 4];
                inline[..data.len()].copy_from_slice(data);
                out.extend_from_slice(&inline);
            } else {
                out.extend_from_slice(&[0; 4]);
                deferred.push((site, data));
            }

            if [
                EXIF_IFD_POINTER,
                GPS_IFD_POINTER,
                INTEROP_IFD_POINTER,
                JPEG_INTERCHANGE_FORMAT,
            ]
            .contains(tag)
            {
                patch_sites.insert((group, *tag), site);
            }
        }

        next_fields.insert(group, out.len());
        out.extend_from_slice(&[0; 4]);

        for (site, data) in deferred {
            pad_even(&mut out);
            let at = offset_of(&out)?;
            patch_u32(&mut out, site, at, order);
            out.extend_from_slice(data);
        }

        if let Some(blob) = blobs.get(&group) {
            pad_even(&mut out);
            let at = offset_of(&out)?;
            if let Some(site) = patch_sites.get(&(group, JPEG_INTERCHANGE_FORMAT)) {
                patch_u32(&mut out, *site, at, order);
            }
            out.extend_from_slice(blob);
        }
    }
    offset_of(&out)?;

    // sub-IFD pointers
    for (parent, tag, target) in [
        (IfdGroup::_0, EXIF_IFD_POINTER, IfdGroup::Exif),
        (IfdGroup::_0, GPS_IFD_POINTER, IfdGroup::Gps),
        (IfdGroup::Exif, INTEROP_IFD_POINTER, IfdGroup::Interop),
    ] {
        if let (Some(site), Some(at)) = (patch_sites.get(&(parent, tag)), ifd_offsets.get(&target)) {
            patch_u32(&mut out, *site, *at, order);
        }
    }

    // the chain
    let chain: Vec<IfdGroup> = write_order(layout)
        .into_iter()
        .filter(|g| g.chain_index().is_some())
        .collect();
    for pair in chain.windows(2) {
        if let (Some(site), Some(at)) = (next_fields.get(&pair[0]), ifd_offsets.get(&pair[1])) {
            patch_u32(&mut out, *site, *at, order);
        }
    }

    Ok(out)
}

/// The TIFF type ID, count, and data of an entry.
fn entry_parts(value: &TagValue) -> (u16, u32, &[u8]) {
    let ty = value
        .kind()
        .primitive()
        .map(|p| p as u16)
        .unwrap_or(tagsmith_types::exif::primitives::PrimitiveTy::Undefined as u16);
    let count = value.count() as u32;
    let size = value.kind().primitive().map(|p| p.size_bytes() as usize).unwrap_or(1);
    let data = &value.raw()[..count as usize * size];
    (ty, count, data)
}

/// A `Long` placeholder.
fn long(n: u32, order: Endianness) -> TagValue {
    TagValue::new(ValueKind::Long, u32_bytes(n, order).to_vec(), order)
}

fn pad_even(out: &mut Vec<u8>) {
    if out.len() % 2 == 1 {
        out.push(0);
    }
}

/// The current end of `out`, as an Exif offset.
fn offset_of(out: &[u8]) -> Result<u32, EncodeError> {
    u32::try_from(out.len()).map_err(|_| {
        log::error!("Exif block grew past 4 GiB. len: `{}`", out.len());
        EncodeError::OffsetOverflow
    })
}

fn u16_bytes(n: u16, order: Endianness) -> [u8; 2] {
    match order {
        Endianness::Little => n.to_le_bytes(),
        Endianness::Big => n.to_be_bytes(),
    }
}

fn u32_bytes(n: u32, order: Endianness) -> [u8; 4] {
    match order {
        Endianness::Little => n.to_le_bytes(),
        Endianness::Big => n.to_be_bytes(),
    }
}

fn patch_u32(out: &mut [u8], site: usize, n: u32, order: Endianness) {
    out[site..site + 4].copy_from_slice(&u32_bytes(n, order));
}
