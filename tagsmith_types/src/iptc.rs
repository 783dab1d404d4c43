//! IPTC-IIM records and datasets.
//!
//! IPTC splits its datasets into numbered records. Only two see real use: the
//! envelope record (1) and the application record (2). Datasets in any other
//! record are still kept, but go by their numbers.

use std::sync::LazyLock;

use rustc_hash::FxHashMap;

use crate::{
    key::{format_hex_id, hex_id},
    value::ValueKind,
};

/// An IPTC record, as used in the group part of a key.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum IptcRecord {
    /// Record 1.
    Envelope,

    /// Record 2.
    Application2,

    /// Any other record, named like `0x0003`.
    Other(u8),
}

impl IptcRecord {
    pub const fn number(&self) -> u8 {
        match self {
            IptcRecord::Envelope => 1,
            IptcRecord::Application2 => 2,
            IptcRecord::Other(n) => *n,
        }
    }

    pub const fn from_number(n: u8) -> Self {
        match n {
            1 => IptcRecord::Envelope,
            2 => IptcRecord::Application2,
            n => IptcRecord::Other(n),
        }
    }

    /// The record's name inside a key.
    pub fn name(&self) -> String {
        match self {
            IptcRecord::Envelope => "Envelope".into(),
            IptcRecord::Application2 => "Application2".into(),
            IptcRecord::Other(n) => format_hex_id(u16::from(*n)),
        }
    }

    /// Reads a record from the group part of a key.
    ///
    /// ```
    /// use tagsmith_types::iptc::IptcRecord;
    ///
    /// assert_eq!(IptcRecord::from_name("Application2"), Some(IptcRecord::Application2));
    /// assert_eq!(IptcRecord::from_name("0x0002"), Some(IptcRecord::Application2));
    /// assert_eq!(IptcRecord::from_name("0x0009"), Some(IptcRecord::Other(9)));
    /// assert_eq!(IptcRecord::from_name("0x0100"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Envelope" => Some(IptcRecord::Envelope),
            "Application2" => Some(IptcRecord::Application2),
            other => {
                let n = u8::try_from(hex_id(other)?).ok()?;
                Some(IptcRecord::from_number(n))
            }
        }
    }
}

/// Info about one known dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dataset {
    pub record: u8,
    pub number: u8,

    /// The dataset's name inside a key.
    pub name: &'static str,

    /// The kind of value this dataset holds.
    pub kind: ValueKind,

    /// Whether the dataset may appear more than once.
    pub repeatable: bool,
}

/// The dataset at `(record, number)`, if we know it.
///
/// ```
/// use tagsmith_types::{iptc::dataset, value::ValueKind};
///
/// let keywords = dataset(2, 25).unwrap();
/// assert_eq!(keywords.name, "Keywords");
/// assert!(keywords.repeatable);
///
/// assert_eq!(dataset(2, 55).unwrap().kind, ValueKind::Date);
/// ```
pub fn dataset(record: u8, number: u8) -> Option<&'static Dataset> {
    BY_NUMBER.get(&(record, number)).copied()
}

/// The dataset with the given name in a record.
pub fn dataset_by_name(record: u8, name: &str) -> Option<&'static Dataset> {
    BY_NAME.get(&record)?.get(name).copied()
}

/// The name a dataset goes by inside a key.
pub fn dataset_name(record: u8, number: u8) -> String {
    match dataset(record, number) {
        Some(d) => d.name.to_string(),
        None => format_hex_id(u16::from(number)),
    }
}

/// Finds the dataset number that a key's name part refers to.
///
/// Known names resolve through the table. Anything else must be a `0xHHHH`
/// number that fits in a byte.
pub fn dataset_number(record: u8, name: &str) -> Option<u8> {
    match dataset_by_name(record, name) {
        Some(d) => Some(d.number),
        None => u8::try_from(hex_id(name)?).ok(),
    }
}

static BY_NUMBER: LazyLock<FxHashMap<(u8, u8), &'static Dataset>> =
    LazyLock::new(|| DATASETS.iter().map(|d| ((d.record, d.number), d)).collect());

static BY_NAME: LazyLock<FxHashMap<u8, FxHashMap<&'static str, &'static Dataset>>> =
    LazyLock::new(|| {
        let mut m: FxHashMap<u8, FxHashMap<&'static str, &'static Dataset>> =
            FxHashMap::default();
        for d in DATASETS {
            m.entry(d.record).or_default().insert(d.name, d);
        }
        m
    });

const fn ds(record: u8, number: u8, name: &'static str, kind: ValueKind, repeatable: bool) -> Dataset {
    Dataset {
        record,
        number,
        name,
        kind,
        repeatable,
    }
}

use ValueKind::{Date as D, Short as N, String as S, Time as T, Undefined as U};

/// Every dataset we know about.
pub const DATASETS: &[Dataset] = &[
    //
    // envelope record
    ds(1, 0, "ModelVersion", N, false),
    ds(1, 5, "Destination", S, true),
    ds(1, 20, "FileFormat", N, false),
    ds(1, 22, "FileVersion", N, false),
    ds(1, 30, "ServiceId", S, false),
    ds(1, 40, "EnvelopeNumber", S, false),
    ds(1, 50, "ProductId", S, true),
    ds(1, 60, "EnvelopePriority", S, false),
    ds(1, 70, "DateSent", D, false),
    ds(1, 80, "TimeSent", T, false),
    ds(1, 90, "CharacterSet", U, false),
    ds(1, 100, "UNO", S, false),
    ds(1, 120, "ARMId", N, false),
    ds(1, 122, "ARMVersion", N, false),
    //
    // application record
    ds(2, 0, "RecordVersion", N, false),
    ds(2, 3, "ObjectType", S, false),
    ds(2, 4, "ObjectAttribute", S, true),
    ds(2, 5, "ObjectName", S, false),
    ds(2, 7, "EditStatus", S, false),
    ds(2, 8, "EditorialUpdate", S, false),
    ds(2, 10, "Urgency", S, false),
    ds(2, 12, "Subject", S, true),
    ds(2, 15, "Category", S, false),
    ds(2, 20, "SuppCategory", S, true),
    ds(2, 22, "FixtureId", S, false),
    ds(2, 25, "Keywords", S, true),
    ds(2, 26, "LocationCode", S, true),
    ds(2, 27, "LocationName", S, true),
    ds(2, 30, "ReleaseDate", D, false),
    ds(2, 35, "ReleaseTime", T, false),
    ds(2, 37, "ExpirationDate", D, false),
    ds(2, 38, "ExpirationTime", T, false),
    ds(2, 40, "SpecialInstructions", S, false),
    ds(2, 42, "ActionAdvised", S, false),
    ds(2, 45, "ReferenceService", S, true),
    ds(2, 47, "ReferenceDate", D, true),
    ds(2, 50, "ReferenceNumber", S, true),
    ds(2, 55, "DateCreated", D, false),
    ds(2, 60, "TimeCreated", T, false),
    ds(2, 62, "DigitizationDate", D, false),
    ds(2, 63, "DigitizationTime", T, false),
    ds(2, 65, "Program", S, false),
    ds(2, 70, "ProgramVersion", S, false),
    ds(2, 75, "ObjectCycle", S, false),
    ds(2, 80, "Byline", S, true),
    ds(2, 85, "BylineTitle", S, true),
    ds(2, 90, "City", S, false),
    ds(2, 92, "SubLocation", S, false),
    ds(2, 95, "ProvinceState", S, false),
    ds(2, 100, "CountryCode", S, false),
    ds(2, 101, "CountryName", S, false),
    ds(2, 103, "TransmissionReference", S, false),
    ds(2, 105, "Headline", S, false),
    ds(2, 110, "Credit", S, false),
    ds(2, 115, "Source", S, false),
    ds(2, 116, "Copyright", S, false),
    ds(2, 118, "Contact", S, true),
    ds(2, 120, "Caption", S, false),
    ds(2, 122, "Writer", S, true),
    ds(2, 125, "RasterizedCaption", U, false),
    ds(2, 130, "ImageType", S, false),
    ds(2, 131, "ImageOrientation", S, false),
    ds(2, 135, "Language", S, false),
    ds(2, 150, "AudioType", S, false),
    ds(2, 151, "AudioRate", S, false),
    ds(2, 152, "AudioResolution", S, false),
    ds(2, 153, "AudioDuration", S, false),
    ds(2, 154, "AudioOutcue", S, false),
    ds(2, 200, "PreviewFormat", N, false),
    ds(2, 201, "PreviewVersion", N, false),
    ds(2, 202, "Preview", U, false),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_numbers_agree() {
        for d in DATASETS {
            assert_eq!(dataset(d.record, d.number), Some(d));
            assert_eq!(dataset_by_name(d.record, d.name), Some(d));
            assert_eq!(dataset_number(d.record, d.name), Some(d.number));
        }
    }

    #[test]
    fn unknown_datasets_use_hex() {
        assert_eq!(dataset_name(2, 99), "0x0063");
        assert_eq!(dataset_number(2, "0x0063"), Some(99));
        assert_eq!(dataset_number(2, "0x0163"), None);
        assert_eq!(dataset_number(2, "NotADataset"), None);

        // names only resolve in their own record
        assert_eq!(dataset_number(1, "Keywords"), None);
    }

    #[test]
    fn record_names() {
        assert_eq!(IptcRecord::Envelope.name(), "Envelope");
        assert_eq!(IptcRecord::from_number(7).name(), "0x0007");
        assert_eq!(IptcRecord::from_name("0x0007"), Some(IptcRecord::Other(7)));
        assert_eq!(IptcRecord::from_name("Application3"), None);
    }
}
