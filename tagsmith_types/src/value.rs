//! Tag values.
//!
//! A [`TagValue`] is a kind, some raw bytes, and the byte order those bytes
//! are in. Its text form is always derived from the bytes.

use crate::exif::{Endianness, primitives::PrimitiveTy};

/// Every kind of value a tag may hold.
///
/// The first twelve are the TIFF primitive types used by Exif. IPTC uses
/// `String`, `Date`, and `Time` (plus `Undefined` for binary datasets). XMP
/// values are always text, but remember which kind of array they came from.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValueKind {
    Byte,
    Ascii,
    Short,
    Long,
    Rational,
    SByte,
    Undefined,
    SShort,
    SLong,
    SRational,
    Float,
    Double,

    String,
    Date,
    Time,

    XmpText,
    XmpBag,
    XmpSeq,
    XmpAlt,
}

impl ValueKind {
    /// The TIFF primitive backing this kind, if it's an Exif kind.
    pub const fn primitive(&self) -> Option<PrimitiveTy> {
        Some(match self {
            ValueKind::Byte => PrimitiveTy::Byte,
            ValueKind::Ascii => PrimitiveTy::Ascii,
            ValueKind::Short => PrimitiveTy::Short,
            ValueKind::Long => PrimitiveTy::Long,
            ValueKind::Rational => PrimitiveTy::Rational,
            ValueKind::SByte => PrimitiveTy::SByte,
            ValueKind::Undefined => PrimitiveTy::Undefined,
            ValueKind::SShort => PrimitiveTy::SShort,
            ValueKind::SLong => PrimitiveTy::SLong,
            ValueKind::SRational => PrimitiveTy::SRational,
            ValueKind::Float => PrimitiveTy::Float,
            ValueKind::Double => PrimitiveTy::Double,
            _ => return None,
        })
    }

    /// Whether this kind is one of the XMP kinds.
    pub const fn is_xmp(&self) -> bool {
        matches!(
            self,
            ValueKind::XmpText | ValueKind::XmpBag | ValueKind::XmpSeq | ValueKind::XmpAlt
        )
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Byte => "Byte",
            ValueKind::Ascii => "Ascii",
            ValueKind::Short => "Short",
            ValueKind::Long => "Long",
            ValueKind::Rational => "Rational",
            ValueKind::SByte => "SByte",
            ValueKind::Undefined => "Undefined",
            ValueKind::SShort => "SShort",
            ValueKind::SLong => "SLong",
            ValueKind::SRational => "SRational",
            ValueKind::Float => "Float",
            ValueKind::Double => "Double",
            ValueKind::String => "String",
            ValueKind::Date => "Date",
            ValueKind::Time => "Time",
            ValueKind::XmpText => "XmpText",
            ValueKind::XmpBag => "XmpBag",
            ValueKind::XmpSeq => "XmpSeq",
            ValueKind::XmpAlt => "XmpAlt",
        }
    }
}

impl From<PrimitiveTy> for ValueKind {
    fn from(value: PrimitiveTy) -> Self {
        match value {
            PrimitiveTy::Byte => ValueKind::Byte,
            PrimitiveTy::Ascii => ValueKind::Ascii,
            PrimitiveTy::Short => ValueKind::Short,
            PrimitiveTy::Long => ValueKind::Long,
            PrimitiveTy::Rational => ValueKind::Rational,
            PrimitiveTy::SByte => ValueKind::SByte,
            PrimitiveTy::Undefined => ValueKind::Undefined,
            PrimitiveTy::SShort => ValueKind::SShort,
            PrimitiveTy::SLong => ValueKind::SLong,
            PrimitiveTy::SRational => ValueKind::SRational,
            PrimitiveTy::Float => ValueKind::Float,
            PrimitiveTy::Double => ValueKind::Double,
        }
    }
}

impl core::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single tag value.
///
/// ```
/// use tagsmith_types::{exif::Endianness, value::{TagValue, ValueKind}};
///
/// let exposure = TagValue::from_text(ValueKind::Rational, "1/250", Endianness::Little).unwrap();
/// assert_eq!(exposure.raw(), &[1, 0, 0, 0, 250, 0, 0, 0]);
/// assert_eq!(exposure.to_string(), "1/250");
///
/// let big = exposure.with_order(Endianness::Big);
/// assert_eq!(big.raw(), &[0, 0, 0, 1, 0, 0, 0, 250]);
/// assert_eq!(big.to_string(), "1/250");
/// ```
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct TagValue {
    kind: ValueKind,
    raw: Vec<u8>,
    order: Endianness,
}

impl TagValue {
    /// Wraps some raw bytes.
    ///
    /// The bytes aren't checked against the kind. Any bytes that don't fit
    /// are shown as-is (or dropped, for numbers) in the text form.
    pub fn new(kind: ValueKind, raw: Vec<u8>, order: Endianness) -> Self {
        Self { kind, raw, order }
    }

    /// An Exif ASCII value. A NUL terminator is added.
    pub fn ascii(text: &str) -> Self {
        let mut raw = text.as_bytes().to_vec();
        raw.push(0);
        Self::new(ValueKind::Ascii, raw, Endianness::default())
    }

    /// An IPTC string value.
    pub fn string(text: &str) -> Self {
        Self::new(ValueKind::String, text.as_bytes().to_vec(), Endianness::default())
    }

    /// An XMP value of the given kind.
    pub fn xmp(kind: ValueKind, text: &str) -> Self {
        Self::new(kind, text.as_bytes().to_vec(), Endianness::default())
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.raw
    }

    /// The byte order of multi-byte numbers in [`Self::raw`].
    pub fn order(&self) -> Endianness {
        self.order
    }

    /// The same value with another kind. The bytes are kept untouched.
    pub fn with_kind(mut self, kind: ValueKind) -> Self {
        self.kind = kind;
        self
    }

    /// How many components this value stores.
    ///
    /// For the TIFF kinds, this is the Exif "count". For everything else,
    /// it's the byte length.
    pub fn count(&self) -> usize {
        match self.kind.primitive() {
            Some(ty) => self.raw.len() / ty.size_bytes() as usize,
            None => self.raw.len(),
        }
    }

    /// Grabs the component at `index` as an unsigned integer.
    ///
    /// Only works on `Byte`, `Short`, and `Long` values.
    pub fn uint_at(&self, index: usize) -> Option<u32> {
        let width = match self.kind {
            ValueKind::Byte => 1,
            ValueKind::Short => 2,
            ValueKind::Long => 4,
            _ => return None,
        };

        let chunk = self.raw.chunks_exact(width).nth(index)?;
        Some(read_uint(chunk, self.order) as u32)
    }

    /// Converts multi-byte components to another byte order.
    ///
    /// Values without multi-byte components only change their recorded
    /// order.
    pub fn with_order(mut self, order: Endianness) -> Self {
        if order == self.order {
            return self;
        }

        if let Some(ty) = self.kind.primitive() {
            let unit = ty.unit_bytes() as usize;
            if unit > 1 {
                self.raw.chunks_exact_mut(unit).for_each(|c| c.reverse());
            }
        }

        self.order = order;
        self
    }

    /// The value's text form.
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    /// Creates a value of the given kind from its text form.
    ///
    /// This is the inverse of [`Self::to_text`]. Numbers are separated by
    /// whitespace, rationals are written as `n/d`, IPTC dates are `YYYY-MM-DD`
    /// and times are `HH:MM:SS±HH:MM`.
    pub fn from_text(kind: ValueKind, text: &str, order: Endianness) -> Result<Self, ValueError> {
        let fail = || ValueError::Unparsable {
            kind,
            text: text.to_string(),
        };

        let raw: Vec<u8> = match kind {
            ValueKind::Ascii => {
                let mut raw = text.as_bytes().to_vec();
                if raw.last() != Some(&0) {
                    raw.push(0);
                }
                raw
            }

            ValueKind::String
            | ValueKind::XmpText
            | ValueKind::XmpBag
            | ValueKind::XmpSeq
            | ValueKind::XmpAlt => text.as_bytes().to_vec(),

            ValueKind::Byte | ValueKind::Undefined => {
                numbers(text, |t| t.parse::<u8>().ok().map(|n| vec![n])).ok_or_else(fail)?
            }
            ValueKind::SByte => {
                numbers(text, |t| t.parse::<i8>().ok().map(|n| vec![n as u8])).ok_or_else(fail)?
            }
            ValueKind::Short => numbers(text, |t| {
                t.parse::<u16>().ok().map(|n| write_uint(n.into(), 2, order))
            })
            .ok_or_else(fail)?,
            ValueKind::SShort => numbers(text, |t| {
                t.parse::<i16>()
                    .ok()
                    .map(|n| write_uint((n as u16).into(), 2, order))
            })
            .ok_or_else(fail)?,
            ValueKind::Long => numbers(text, |t| {
                t.parse::<u32>().ok().map(|n| write_uint(n.into(), 4, order))
            })
            .ok_or_else(fail)?,
            ValueKind::SLong => numbers(text, |t| {
                t.parse::<i32>()
                    .ok()
                    .map(|n| write_uint((n as u32).into(), 4, order))
            })
            .ok_or_else(fail)?,
            ValueKind::Rational => numbers(text, |t| {
                let (n, d) = split_rational(t)?;
                let (n, d) = (n.parse::<u32>().ok()?, d.parse::<u32>().ok()?);
                let mut out = write_uint(n.into(), 4, order);
                out.extend(write_uint(d.into(), 4, order));
                Some(out)
            })
            .ok_or_else(fail)?,
            ValueKind::SRational => numbers(text, |t| {
                let (n, d) = split_rational(t)?;
                let (n, d) = (n.parse::<i32>().ok()?, d.parse::<i32>().ok()?);
                let mut out = write_uint((n as u32).into(), 4, order);
                out.extend(write_uint((d as u32).into(), 4, order));
                Some(out)
            })
            .ok_or_else(fail)?,
            ValueKind::Float => numbers(text, |t| {
                t.parse::<f32>()
                    .ok()
                    .map(|n| write_uint(n.to_bits().into(), 4, order))
            })
            .ok_or_else(fail)?,
            ValueKind::Double => numbers(text, |t| {
                t.parse::<f64>()
                    .ok()
                    .map(|n| write_uint(n.to_bits(), 8, order))
            })
            .ok_or_else(fail)?,

            ValueKind::Date => parse_date(text).ok_or_else(fail)?,
            ValueKind::Time => parse_time(text).ok_or_else(fail)?,
        };

        Ok(Self { kind, raw, order })
    }
}

impl core::fmt::Display for TagValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let raw = self.raw.as_slice();
        let order = self.order;

        match self.kind {
            ValueKind::Ascii => {
                let end = raw.iter().position(|b| *b == 0).unwrap_or(raw.len());
                f.write_str(&String::from_utf8_lossy(&raw[..end]))
            }

            ValueKind::String
            | ValueKind::XmpText
            | ValueKind::XmpBag
            | ValueKind::XmpSeq
            | ValueKind::XmpAlt => f.write_str(&String::from_utf8_lossy(raw)),

            ValueKind::Byte | ValueKind::Undefined => join(f, raw.iter()),
            ValueKind::SByte => join(f, raw.iter().map(|b| *b as i8)),
            ValueKind::Short => join(f, raw.chunks_exact(2).map(|c| read_uint(c, order) as u16)),
            ValueKind::SShort => join(f, raw.chunks_exact(2).map(|c| read_uint(c, order) as u16 as i16)),
            ValueKind::Long => join(f, raw.chunks_exact(4).map(|c| read_uint(c, order) as u32)),
            ValueKind::SLong => join(f, raw.chunks_exact(4).map(|c| read_uint(c, order) as u32 as i32)),
            ValueKind::Rational => join(
                f,
                raw.chunks_exact(8).map(|c| {
                    let n = read_uint(&c[..4], order) as u32;
                    let d = read_uint(&c[4..], order) as u32;
                    format!("{n}/{d}")
                }),
            ),
            ValueKind::SRational => join(
                f,
                raw.chunks_exact(8).map(|c| {
                    let n = read_uint(&c[..4], order) as u32 as i32;
                    let d = read_uint(&c[4..], order) as u32 as i32;
                    format!("{n}/{d}")
                }),
            ),
            ValueKind::Float => join(
                f,
                raw.chunks_exact(4)
                    .map(|c| f32::from_bits(read_uint(c, order) as u32)),
            ),
            ValueKind::Double => join(f, raw.chunks_exact(8).map(|c| f64::from_bits(read_uint(c, order)))),

            ValueKind::Date => match (raw.len(), raw.iter().all(u8::is_ascii_digit)) {
                (8, true) => {
                    let s = String::from_utf8_lossy(raw);
                    write!(f, "{}-{}-{}", &s[0..4], &s[4..6], &s[6..8])
                }
                _ => f.write_str(&String::from_utf8_lossy(raw)),
            },

            ValueKind::Time => match parse_time(&String::from_utf8_lossy(raw)) {
                Some(t) if t == raw => {
                    let s = String::from_utf8_lossy(raw);
                    write!(
                        f,
                        "{}:{}:{}{}{}:{}",
                        &s[0..2],
                        &s[2..4],
                        &s[4..6],
                        &s[6..7],
                        &s[7..9],
                        &s[9..11]
                    )
                }
                _ => f.write_str(&String::from_utf8_lossy(raw)),
            },
        }
    }
}

/// Writes each item, separated by a space.
fn join<T: core::fmt::Display>(
    f: &mut core::fmt::Formatter<'_>,
    items: impl Iterator<Item = T>,
) -> core::fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Parses each whitespace-separated token, concatenating the results.
///
/// Returns `None` if any token fails, or if there weren't any.
fn numbers(text: &str, parse: impl Fn(&str) -> Option<Vec<u8>>) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    let mut any = false;

    for token in text.split_whitespace() {
        out.extend(parse(token)?);
        any = true;
    }

    any.then_some(out)
}

/// `n/d`, or a plain `n` meaning `n/1`.
fn split_rational(token: &str) -> Option<(&str, &str)> {
    match token.split_once('/') {
        Some((n, d)) => Some((n, d)),
        None => Some((token, "1")),
    }
}

/// Reads an unsigned integer of any width up to eight bytes.
pub(crate) fn read_uint(chunk: &[u8], order: Endianness) -> u64 {
    let fold = |acc: u64, b: &u8| (acc << 8) | u64::from(*b);
    match order {
        Endianness::Big => chunk.iter().fold(0, fold),
        Endianness::Little => chunk.iter().rev().fold(0, fold),
    }
}

/// Writes the low `width` bytes of `value`.
pub(crate) fn write_uint(value: u64, width: usize, order: Endianness) -> Vec<u8> {
    let be = value.to_be_bytes();
    let bytes = &be[8 - width..];
    match order {
        Endianness::Big => bytes.to_vec(),
        Endianness::Little => bytes.iter().rev().copied().collect(),
    }
}

/// Checks that `digits` holds only digits, and that the number they make is
/// in `range`.
fn digits_in(digits: &str, range: core::ops::RangeInclusive<u32>) -> bool {
    digits.bytes().all(|b| b.is_ascii_digit())
        && digits.parse::<u32>().is_ok_and(|n| range.contains(&n))
}

/// `YYYY-MM-DD` or `YYYYMMDD` into `YYYYMMDD`.
fn parse_date(text: &str) -> Option<Vec<u8>> {
    let text = text.trim();
    if !text.is_ascii() {
        return None;
    }

    let compact: String = match text.len() {
        10 if text.as_bytes()[4] == b'-' && text.as_bytes()[7] == b'-' => {
            [&text[0..4], &text[5..7], &text[8..10]].concat()
        }
        8 => text.to_string(),
        _ => return None,
    };

    (digits_in(&compact[0..4], 0..=9999)
        && digits_in(&compact[4..6], 1..=12)
        && digits_in(&compact[6..8], 1..=31))
    .then(|| compact.into_bytes())
}

/// `HH:MM:SS±HH:MM`, `HHMMSS±HHMM`, `HH:MM:SS` or `HHMMSS` into
/// `HHMMSS±HHMM`.
fn parse_time(text: &str) -> Option<Vec<u8>> {
    let text = text.trim();
    if !text.is_ascii() {
        return None;
    }

    let (clock, zone) = match text.find(['+', '-']) {
        Some(i) => (&text[..i], &text[i..]),
        None => (text, "+00:00"),
    };

    let clock: String = match clock.len() {
        8 if clock.as_bytes()[2] == b':' && clock.as_bytes()[5] == b':' => {
            [&clock[0..2], &clock[3..5], &clock[6..8]].concat()
        }
        6 => clock.to_string(),
        _ => return None,
    };

    let zone: String = match zone.len() {
        6 if zone.as_bytes()[3] == b':' => [&zone[0..3], &zone[4..6]].concat(),
        5 => zone.to_string(),
        _ => return None,
    };

    let ok = digits_in(&clock[0..2], 0..=23)
        && digits_in(&clock[2..4], 0..=59)
        && digits_in(&clock[4..6], 0..=60)
        && digits_in(&zone[1..3], 0..=23)
        && digits_in(&zone[3..5], 0..=59);

    ok.then(|| format!("{clock}{zone}").into_bytes())
}

/// An error that happened when creating a value from text.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueError {
    /// The text doesn't fit the kind.
    Unparsable { kind: ValueKind, text: String },
}

impl core::fmt::Display for ValueError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ValueError::Unparsable { kind, text } => {
                write!(f, "Can't read `{text}` as a value of kind `{kind}`.")
            }
        }
    }
}

impl core::error::Error for ValueError {}
