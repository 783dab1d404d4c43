//! Finding and copying the preview images in Exif.

mod common;

use common::*;
use tagsmith::{Edits, MetadataProvider as _, TagKey, TagValue, providers::jpeg::Jpeg};
use tagsmith_types::exif::ifd::IfdGroup;

fn with_previews() -> (Vec<u8>, Vec<u8>, Vec<u8>) {
    let thumb = tiny_jpeg(160, 120, 0x11);
    let big = tiny_jpeg(1024, 768, 0x22);

    let tiff = tiff(
        &[
            vec![ascii(0x010F, "Acme")],
            vec![short(0x0103, 6)],
            vec![long(0x0100, 1024), long(0x0101, 768)],
        ],
        &[(1, &thumb), (2, &big)],
    );

    (jpeg(&[jfif(), exif_segment(&tiff)]), thumb, big)
}

#[test]
fn finds_every_preview() {
    logger();

    let (file, thumb, big) = with_previews();
    let jpeg = Jpeg::new(&file).unwrap();

    let props = jpeg.previews();
    assert_eq!(props.len(), 2);

    assert_eq!(props[0].group, IfdGroup::_1);
    assert_eq!((props[0].width, props[0].height), (160, 120));
    assert_eq!(props[0].mime_type, "image/jpeg");
    assert_eq!(props[0].extension, ".jpg");
    assert_eq!(
        &file[props[0].byte_offset..props[0].byte_offset + props[0].byte_length],
        thumb.as_slice()
    );

    assert_eq!(props[1].group, IfdGroup::Chained(2));
    assert_eq!((props[1].width, props[1].height), (1024, 768));

    let images = tagsmith::extract_previews(&file).unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0].data, thumb);
    assert_eq!(images[1].data, big);
}

#[test]
fn a_bad_preview_doesnt_hide_the_others() {
    logger();

    let thumb = tiny_jpeg(160, 120, 0x11);
    let tiff = tiff(
        &[
            vec![ascii(0x010F, "Acme")],
            vec![],
            // points far past the end of the file
            vec![long(0x0201, 60_000), long(0x0202, 5_000)],
        ],
        &[(1, &thumb)],
    );
    let file = jpeg(&[exif_segment(&tiff)]);

    let jpeg = Jpeg::new(&file).unwrap();
    assert_eq!(jpeg.previews().len(), 2);

    let images = tagsmith::extract_previews(&file).unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].data, thumb);
    assert_eq!(images[0].properties.group, IfdGroup::_1);
}

#[test]
fn previews_survive_a_rewrite() {
    logger();

    let (file, thumb, big) = with_previews();

    let mut edits = Edits::new();
    edits.set_single(
        TagKey::parse("Exif.Image.Make").unwrap(),
        TagValue::ascii("A much longer camera maker name"),
    );
    let written = tagsmith::write_tags(&file, &edits).unwrap();

    let images = tagsmith::extract_previews(&written).unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0].data, thumb);
    assert_eq!(images[1].data, big);
}

#[test]
fn no_exif_no_previews() {
    logger();

    let file = jpeg(&[jfif()]);
    assert!(tagsmith::extract_previews(&file).unwrap().is_empty());
}
