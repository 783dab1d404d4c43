//! Many calls at once, each with its own buffer.

mod common;

use common::*;
use tagsmith::{Edits, TagKey, TagValue};

#[test]
fn parallel_reads_and_writes() {
    logger();

    let tiff = tiff(&[vec![ascii(0x010F, "Acme")]], &[]);
    let file = jpeg(&[jfif(), exif_segment(&tiff)]);

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let file = file.clone();
                s.spawn(move || {
                    let make = format!("Maker {i}");

                    let mut edits = Edits::new();
                    edits.set_single(
                        TagKey::parse("Exif.Image.Make").unwrap(),
                        TagValue::ascii(&make),
                    );

                    let written = tagsmith::write_tags(&file, &edits).unwrap();
                    let m = tagsmith::read_tags(&written).unwrap();
                    let got = m.get(&TagKey::parse("Exif.Image.Make").unwrap())[0].to_text();
                    (make, got)
                })
            })
            .collect();

        for h in handles {
            let (want, got) = h.join().unwrap();
            assert_eq!(want, got);
        }
    });
}
