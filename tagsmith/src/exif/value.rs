use winnow::{
    Parser as _,
    binary::{Endianness as WinnowEndianness, u16, u32},
    error::EmptyError,
};

use tagsmith_types::exif::primitives::PrimitiveTy;

use super::{Stream, error::ExifFieldError};

/// One IFD entry, with its data pulled out of the blob.
#[derive(Clone, Debug, PartialEq)]
pub struct RawEntry<'a> {
    pub tag: u16,
    pub ty: PrimitiveTy,
    pub count: u32,
    pub data: &'a [u8],
}

impl RawEntry<'_> {
    /// Reads the first component as an offset or length.
    ///
    /// Works on `Short` and `Long` entries.
    pub fn as_u32(&self, order: WinnowEndianness) -> Option<u32> {
        let mut data: &[u8] = self.data;
        let input = &mut data;
        match self.ty {
            PrimitiveTy::Short => u16(order)
                .parse_next(input)
                .map(u32::from)
                .map_err(|_: EmptyError| ())
                .ok(),
            PrimitiveTy::Long => u32(order).parse_next(input).map_err(|_: EmptyError| ()).ok(),
            _ => None,
        }
    }
}

/// Parses out one entry from an IFD.
///
/// The input must be the entry's twelve bytes.
pub fn parse_entry<'a>(input: &mut Stream<'a>) -> Result<RawEntry<'a>, ExifFieldError> {
    let endianness = input.state.endianness;

    // tag (2 bytes), type (2 bytes), count (4 bytes)
    let (tag, raw_ty, count): (u16, u16, u32) = (u16(endianness), u16(endianness), u32(endianness))
        .parse_next(&mut input.input)
        .map_err(|_: EmptyError| ExifFieldError::Truncated)?;

    // make the type into a type repr enum
    let ty: PrimitiveTy = PrimitiveTy::try_from(raw_ty).map_err(|_| {
        log::warn!("Encountered unknown field type: `{raw_ty}`");
        ExifFieldError::FieldUnknownType { tag, got: raw_ty }
    })?;

    // grab the value or offset (4 bytes. we'll handle deciding in a sec)
    let value: &'a [u8] = input.input;
    if value.len() != 4 {
        return Err(ExifFieldError::Truncated);
    }

    log::trace!(
        "(field info...
    tag: {tag:#06x},
    ty: {ty:?},
    count: {count},
)"
    );

    // check how large the stored data is
    let total_size: u64 = u64::from(ty.size_bytes()) * u64::from(count);
    if total_size > u64::from(u32::MAX) {
        log::warn!("Field `{tag:#06x}` is too large to exist. count: `{count}`");
        return Err(ExifFieldError::TooLarge { tag, count });
    }

    // if the value is an offset, use the blob at that offset as our buffer.
    // (offsets are relative to the beginning of the blob)
    let data: &'a [u8] = if total_size > 4 {
        let offset: u32 = u32(endianness)
            .parse_next(&mut input.input)
            .map_err(|_: EmptyError| ExifFieldError::Truncated)?;

        let start = offset as usize;
        let end = start.saturating_add(total_size as usize);

        input.state.blob.get(start..end).ok_or_else(|| {
            log::warn!(
                "Field said its data is stored outside the blob! \
                Can't continue parsing this field. \
                offset: `{offset}`, len: `{total_size}`, \
                blob len: `{}`",
                input.state.blob.len()
            );
            ExifFieldError::OffsetTooFar {
                tag,
                offset,
                len: total_size,
            }
        })?
    } else {
        &value[..total_size as usize]
    };

    Ok(RawEntry {
        tag,
        ty,
        count,
        data,
    })
}

#[cfg(test)]
mod tests {
    use tagsmith_types::exif::ifd::IfdGroup;
    use winnow::binary::Endianness as WinnowEndianness;

    use super::*;
    use crate::{exif::State, util::logger};

    fn stream<'a>(entry: &'a [u8], blob: &'a [u8], endianness: WinnowEndianness) -> Stream<'a> {
        Stream {
            input: entry,
            state: State {
                endianness,
                blob,
                group: IfdGroup::_0,
            },
        }
    }

    #[test]
    fn inline_values() {
        logger();

        let mut entry = Vec::new();
        entry.extend(0x0100_u16.to_le_bytes());
        entry.extend(3_u16.to_le_bytes());
        entry.extend(1_u32.to_le_bytes());
        entry.extend([0x80, 0x07, 0, 0]);

        let parsed = parse_entry(&mut stream(&entry, &[], WinnowEndianness::Little)).unwrap();
        assert_eq!(parsed.tag, 0x0100);
        assert_eq!(parsed.ty, PrimitiveTy::Short);
        assert_eq!(parsed.data, &[0x80, 0x07]);
        assert_eq!(parsed.as_u32(WinnowEndianness::Little), Some(1920));
    }

    #[test]
    fn offset_values() {
        logger();

        let blob = b"........Acme Corp\0";
        let mut entry = Vec::new();
        entry.extend(0x010F_u16.to_be_bytes());
        entry.extend(2_u16.to_be_bytes());
        entry.extend(10_u32.to_be_bytes());
        entry.extend(8_u32.to_be_bytes());

        let parsed = parse_entry(&mut stream(&entry, blob, WinnowEndianness::Big)).unwrap();
        assert_eq!(parsed.data, b"Acme Corp\0");
    }

    #[test]
    fn bad_entries() {
        logger();

        let mut entry = Vec::new();
        entry.extend(0x010F_u16.to_be_bytes());
        entry.extend(99_u16.to_be_bytes());
        entry.extend(1_u32.to_be_bytes());
        entry.extend([0; 4]);
        assert_eq!(
            parse_entry(&mut stream(&entry, &[], WinnowEndianness::Big)),
            Err(ExifFieldError::FieldUnknownType {
                tag: 0x010F,
                got: 99
            })
        );

        let mut entry = Vec::new();
        entry.extend(0x010F_u16.to_be_bytes());
        entry.extend(2_u16.to_be_bytes());
        entry.extend(100_u32.to_be_bytes());
        entry.extend(4_u32.to_be_bytes());
        assert!(matches!(
            parse_entry(&mut stream(&entry, &[0; 16], WinnowEndianness::Big)),
            Err(ExifFieldError::OffsetTooFar { offset: 4, .. })
        ));
    }
}
