use winnow::{
    Parser,
    binary::{u16, u32},
    error::EmptyError,
    token::take,
};

use super::{
    State, Stream,
    error::{ExifFieldError, IfdError},
    value::{RawEntry, parse_entry},
};

/// Each IFD entry is always twelve bytes: tag, type, count, and value (or
/// offset).
const ENTRY_LEN: usize = 12;

/// An image file directory found within Exif metadata.
///
/// These contain a number of fields and directions to the next IFD.
#[derive(Clone, Debug, PartialEq)]
pub struct Ifd<'a> {
    /// A list of fields on this IFD.
    pub fields: Vec<Result<RawEntry<'a>, ExifFieldError>>,

    /// A pointer in the blob to the next IFD, if any.
    pub next: Option<u32>,
}

/// Parses out an entire IFD, starting at `offset` in the blob.
pub fn parse_ifd<'a>(state: &State<'a>, offset: u32) -> Result<Ifd<'a>, IfdError> {
    let endianness = state.endianness;
    let group = state.group;

    let Some(start) = state.blob.get(offset as usize..) else {
        log::warn!("IFD `{group}` is outside the blob! offset: `{offset}`");
        return Err(IfdError::OutOfBounds { group, offset });
    };

    let input = &mut Stream {
        input: start,
        state: state.clone(),
    };

    let entry_count: u16 = u16(endianness).parse_next(input).map_err(|_: EmptyError| {
        log::warn!("Couldn't find count on IFD `{group}` - ran out of data!");
        IfdError::NoEntryCount { group }
    })?;

    log::trace!("Parsing `{entry_count}` fields on IFD `{group}`...");
    let mut fields = Vec::with_capacity(entry_count as usize);
    for i in 0..entry_count {
        // take the whole entry first, so a bad one doesn't throw off the rest
        let Ok(chunk) = take(ENTRY_LEN)
            .parse_next(&mut input.input)
            .map_err(|_: EmptyError| ())
        else {
            log::warn!(
                "IFD `{group}` ran out of data at entry `{i}` of `{entry_count}`. \
                Keeping what we have."
            );
            fields.push(Err(ExifFieldError::Truncated));
            return Ok(Ifd { fields, next: None });
        };

        fields.push(parse_entry(&mut Stream {
            input: chunk,
            state: state.clone(),
        }));
    }
    log::trace!("Completed field parsing!");

    let next = match u32(endianness).parse_next(input) {
        Ok(0_u32) => {
            log::trace!("There won't be a next IFD.");
            None
        }
        Ok(raw_location) => {
            log::trace!("Another IFD was detected! offset: `{raw_location}`");
            Some(raw_location)
        }
        Err(EmptyError) => {
            log::warn!("IFD `{group}` didn't contain a pointer to the next IFD!");
            None
        }
    };

    Ok(Ifd { fields, next })
}
