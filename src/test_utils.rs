//! Shared test fixture builders: hand-assembled MP4 atom trees, RIFF/WAVE
//! files and encoded tile images. Test-only module.

use std::io::Cursor;

use image::{Rgba, RgbaImage};

/// One MP4 atom: 32-bit big-endian size, fourcc, content.
pub fn atom(kind: &[u8; 4], content: &[u8]) -> Vec<u8> {
    let size = (8 + content.len()) as u32;
    let mut out = Vec::with_capacity(size as usize);
    out.extend_from_slice(&size.to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(content);
    out
}

/// An MP4 atom using the 64-bit extended size form (size field == 1).
pub fn atom64(kind: &[u8; 4], content: &[u8]) -> Vec<u8> {
    let size = (16 + content.len()) as u64;
    let mut out = Vec::with_capacity(size as usize);
    out.extend_from_slice(&1u32.to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(&size.to_be_bytes());
    out.extend_from_slice(content);
    out
}

/// A tag atom as found under `ilst`: the tag fourcc wrapping a `data`
/// sub-atom whose content is an 8-byte type indicator/locale prefix plus
/// the payload.
pub fn tag_atom(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut data_content = vec![0u8; 8];
    data_content.extend_from_slice(payload);
    atom(kind, &atom(b"data", &data_content))
}

/// A minimal tagged M4A: `moov/udta/meta/ilst` holding whichever of the
/// standard tag atoms are given, preceded by an `ftyp`.
pub fn m4a_fixture(
    artist: Option<&str>,
    album: Option<&str>,
    title: Option<&str>,
    art: Option<&[u8]>,
) -> Vec<u8> {
    let mut ilst_content = Vec::new();
    if let Some(artist) = artist {
        ilst_content.extend(tag_atom(&[0xA9, b'A', b'R', b'T'], artist.as_bytes()));
    }
    if let Some(album) = album {
        ilst_content.extend(tag_atom(&[0xA9, b'a', b'l', b'b'], album.as_bytes()));
    }
    if let Some(title) = title {
        ilst_content.extend(tag_atom(&[0xA9, b'n', b'a', b'm'], title.as_bytes()));
    }
    if let Some(art) = art {
        ilst_content.extend(tag_atom(b"covr", art));
    }

    // `meta` carries 4 version/flag bytes before its children.
    let mut meta_content = vec![0u8; 4];
    meta_content.extend(atom(b"ilst", &ilst_content));

    let udta = atom(b"udta", &atom(b"meta", &meta_content));
    let moov = atom(b"moov", &udta);

    let mut out = atom(b"ftyp", b"M4A \x00\x00\x00\x00");
    out.extend(moov);
    out
}

/// One RIFF chunk: fourcc, 32-bit little-endian size, payload, pad byte
/// when the payload length is odd.
pub fn riff_chunk(id: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + payload.len() + 1);
    out.extend_from_slice(id);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
    out
}

/// A complete RIFF/WAVE file wrapping the given pre-built chunks.
pub fn wav_fixture(chunks: &[Vec<u8>]) -> Vec<u8> {
    let body_len: usize = chunks.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(12 + body_len);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&((4 + body_len) as u32).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    for chunk in chunks {
        out.extend_from_slice(chunk);
    }
    out
}

/// A `LIST`/`INFO` chunk with NUL-terminated text entries.
pub fn info_list(entries: &[(&[u8; 4], &str)]) -> Vec<u8> {
    let mut payload = b"INFO".to_vec();
    for (id, text) in entries {
        let mut value = text.as_bytes().to_vec();
        value.push(0);
        payload.extend(riff_chunk(id, &value));
    }
    riff_chunk(b"LIST", &payload)
}

/// An `id3 ` chunk holding a serialized ID3v2.4 tag block.
pub fn id3_chunk(tag: &::id3::Tag) -> Vec<u8> {
    let mut block = Vec::new();
    tag.write_to(&mut block, ::id3::Version::Id3v24)
        .expect("serialize tag");
    riff_chunk(b"id3 ", &block)
}

/// A square single-color PNG, as a tile server would return.
pub fn tile_png(size: u32, color: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(size, size, Rgba(color));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}
