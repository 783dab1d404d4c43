//! Builds small JPEG files for the integration tests.

#![allow(dead_code)]

pub fn logger() {
    _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::max())
        .format_file(true)
        .format_line_number(true)
        .try_init();
}

pub const APP0: u8 = 0xE0;
pub const APP1: u8 = 0xE1;
pub const APP2: u8 = 0xE2;
pub const APP13: u8 = 0xED;
pub const COM: u8 = 0xFE;

/// A marker segment, with its length.
pub fn segment(marker: u8, parts: &[&[u8]]) -> Vec<u8> {
    let len: usize = parts.iter().map(|p| p.len()).sum();
    let mut out = vec![0xFF, marker];
    out.extend(((len + 2) as u16).to_be_bytes());
    parts.iter().for_each(|p| out.extend_from_slice(p));
    out
}

pub fn jfif() -> Vec<u8> {
    segment(APP0, &[b"JFIF\0\x01\x02\0\0\x01\0\x01\0\0"])
}

/// An ICC profile chunk. We never touch these.
pub fn icc() -> Vec<u8> {
    segment(APP2, &[b"ICC_PROFILE\0\x01\x01", &[0x42; 32]])
}

/// A frame header, the scan, and `EOI`.
pub fn image_data() -> Vec<u8> {
    let mut v = segment(0xC0, &[&[8, 0, 2, 0, 2, 1, 1, 0x11, 0]]);
    v.extend(segment(0xDA, &[&[1, 1, 0, 0, 0x3F, 0]]));
    v.extend([0x01, 0x02, 0xFF, 0x00, 0x03, 0xFF, 0xD9]);
    v
}

/// `SOI`, the given segments, then the image data.
pub fn jpeg(segments: &[Vec<u8>]) -> Vec<u8> {
    let mut v = vec![0xFF, 0xD8];
    segments.iter().for_each(|s| v.extend_from_slice(s));
    v.extend(image_data());
    v
}

/// A whole (tiny) JPEG stream, for use as a preview.
pub fn tiny_jpeg(width: u16, height: u16, fill: u8) -> Vec<u8> {
    let [w0, w1] = width.to_be_bytes();
    let [h0, h1] = height.to_be_bytes();

    let mut v = vec![0xFF, 0xD8];
    v.extend(segment(0xC0, &[&[8, h0, h1, w0, w1, 1, 1, 0x11, 0]]));
    v.extend(segment(0xDA, &[&[1, 1, 0, 0, 0x3F, 0]]));
    v.extend([fill; 8]);
    v.extend([0xFF, 0xD9]);
    v
}

pub fn exif_segment(tiff: &[u8]) -> Vec<u8> {
    segment(APP1, &[b"Exif\0\0", tiff])
}

pub fn xmp_segment(description: &str) -> Vec<u8> {
    let packet = format!(
        r#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?><x:xmpmeta xmlns:x="adobe:ns:meta/"><rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">{description}</rdf:RDF></x:xmpmeta><?xpacket end="w"?>"#
    );
    segment(APP1, &[b"http://ns.adobe.com/xap/1.0/\0", packet.as_bytes()])
}

/// One Photoshop image resource.
pub fn resource(id: u16, data: &[u8]) -> Vec<u8> {
    let mut v = b"8BIM".to_vec();
    v.extend(id.to_be_bytes());
    v.extend([0, 0]); // empty name, padded
    v.extend((data.len() as u32).to_be_bytes());
    v.extend_from_slice(data);
    if data.len() % 2 == 1 {
        v.push(0);
    }
    v
}

/// IPTC datasets, as `(record, dataset, data)`.
pub fn datasets(sets: &[(u8, u8, &[u8])]) -> Vec<u8> {
    let mut v = Vec::new();
    for (record, dataset, data) in sets {
        v.extend([0x1C, *record, *dataset]);
        v.extend((data.len() as u16).to_be_bytes());
        v.extend_from_slice(data);
    }
    v
}

pub fn app13(resources: &[Vec<u8>]) -> Vec<u8> {
    let body: Vec<u8> = resources.concat();
    segment(APP13, &[b"Photoshop 3.0\0", &body])
}

/// A TIFF entry.
#[derive(Clone, Debug)]
pub struct Entry {
    pub tag: u16,
    pub ty: u16,
    pub count: u32,
    pub data: Vec<u8>,
}

pub fn ascii(tag: u16, text: &str) -> Entry {
    let mut data = text.as_bytes().to_vec();
    data.push(0);
    Entry {
        tag,
        ty: 2,
        count: data.len() as u32,
        data,
    }
}

pub fn short(tag: u16, n: u16) -> Entry {
    Entry {
        tag,
        ty: 3,
        count: 1,
        data: n.to_be_bytes().to_vec(),
    }
}

pub fn long(tag: u16, n: u32) -> Entry {
    Entry {
        tag,
        ty: 4,
        count: 1,
        data: n.to_be_bytes().to_vec(),
    }
}

/// Builds a big-endian TIFF block.
///
/// `ifds` are chained in order, starting at IFD 0. Each `(index, image)` in
/// `images` is stored after the IFDs, and IFD `index` gets a pointer to it.
pub fn tiff(ifds: &[Vec<Entry>], images: &[(usize, &[u8])]) -> Vec<u8> {
    let mut ifds: Vec<Vec<Entry>> = ifds.to_vec();
    for (index, image) in images {
        ifds[*index].push(long(0x0201, 0));
        ifds[*index].push(long(0x0202, image.len() as u32));
    }
    for ifd in &mut ifds {
        ifd.sort_by_key(|e| e.tag);
    }

    let ifd_size = |ifd: &Vec<Entry>| 2 + 12 * ifd.len() + 4;
    let data_start: usize = 8 + ifds.iter().map(ifd_size).sum::<usize>();
    let data_len: usize = ifds
        .iter()
        .flatten()
        .filter(|e| e.data.len() > 4)
        .map(|e| e.data.len() + e.data.len() % 2)
        .sum();

    // place the images, then point at them
    let mut next_image = data_start + data_len;
    for (index, image) in images {
        for e in ifds[*index].iter_mut().filter(|e| e.tag == 0x0201) {
            e.data = (next_image as u32).to_be_bytes().to_vec();
        }
        next_image += image.len();
    }

    let mut out: Vec<u8> = b"MM\0\x2a\0\0\0\x08".to_vec();
    let mut data: Vec<u8> = Vec::new();
    let mut ifd_offset = 8;

    for (i, ifd) in ifds.iter().enumerate() {
        out.extend((ifd.len() as u16).to_be_bytes());
        for e in ifd {
            out.extend(e.tag.to_be_bytes());
            out.extend(e.ty.to_be_bytes());
            out.extend(e.count.to_be_bytes());
            if e.data.len() > 4 {
                out.extend(((data_start + data.len()) as u32).to_be_bytes());
                data.extend_from_slice(&e.data);
                if e.data.len() % 2 == 1 {
                    data.push(0);
                }
            } else {
                let mut inline = e.data.clone();
                inline.resize(4, 0);
                out.extend(inline);
            }
        }

        ifd_offset += ifd_size(ifd);
        let next = match i + 1 < ifds.len() {
            true => ifd_offset as u32,
            false => 0,
        };
        out.extend(next.to_be_bytes());
    }

    out.extend(data);
    images.iter().for_each(|(_, image)| out.extend_from_slice(image));
    out
}
