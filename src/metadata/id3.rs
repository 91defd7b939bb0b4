//! ID3 frame extraction.
//!
//! Thin wrapper over the `id3` crate: pull the first text value of
//! TPE1 (artist), TALB (album) and TIT2 (title) plus the first APIC
//! attached-picture payload out of a parsed tag. The same application
//! function serves the mp3 path, the WAV library pass and ID3 blocks
//! embedded in WAV `id3 ` chunks.

use std::io::Cursor;
use std::path::Path;

use id3::frame::Content;
use id3::{Tag, TagLike};

use super::AudioMetadata;

/// Read the ID3v2 tag of an mp3 file. Absent or unreadable tags are logged
/// and reported as `None`; the extractor falls back to defaults.
pub fn read_path(path: &Path) -> Option<Tag> {
    match Tag::read_from_path(path) {
        Ok(tag) => Some(tag),
        Err(e) => {
            tracing::debug!("No ID3 tag read from {:?}: {}", path, e);
            None
        }
    }
}

/// Read the ID3 chunk of a WAV file through the id3 crate's RIFF support.
pub fn read_wav_path(path: &Path) -> Option<Tag> {
    match Tag::read_from_wav_path(path) {
        Ok(tag) => Some(tag),
        Err(e) => {
            tracing::debug!("No ID3 tag read from WAV {:?}: {}", path, e);
            None
        }
    }
}

/// Parse a raw in-memory ID3 block (the payload of a WAV `id3 ` chunk).
pub fn read_embedded(buf: &[u8]) -> Option<Tag> {
    match Tag::read_from2(Cursor::new(buf)) {
        Ok(tag) => Some(tag),
        Err(e) => {
            tracing::debug!("Embedded ID3 block did not parse: {}", e);
            None
        }
    }
}

/// Merge tag frames into the metadata record. Each field is overwritten only
/// when the corresponding frame carries a non-empty value; absent frames
/// leave whatever the record already holds.
pub fn apply_tag(tag: &Tag, meta: &mut AudioMetadata) {
    if let Some(artist) = first_text(tag, "TPE1") {
        meta.artist = artist;
    }
    if let Some(album) = first_text(tag, "TALB") {
        meta.album = album;
    }
    if let Some(title) = first_text(tag, "TIT2") {
        meta.title = title;
    }
    if let Some(picture) = tag.pictures().find(|p| !p.data.is_empty()) {
        meta.art = Some(picture.data.clone());
    }
}

/// First text value of a frame id, via the accessor where one exists and the
/// raw frame content otherwise.
fn first_text(tag: &Tag, id: &str) -> Option<String> {
    let direct = match id {
        "TPE1" => tag.artist().map(str::to_owned),
        "TALB" => tag.album().map(str::to_owned),
        "TIT2" => tag.title().map(str::to_owned),
        _ => None,
    };
    let text = direct.or_else(|| match tag.get(id)?.content() {
        Content::Text(s) => Some(s.clone()),
        _ => None,
    })?;
    if text.is_empty() { None } else { Some(text) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use id3::frame::{Picture, PictureType};

    fn meta_with_defaults() -> AudioMetadata {
        AudioMetadata {
            artist: "Unknown".to_string(),
            album: "Unknown".to_string(),
            title: "track.mp3".to_string(),
            art: None,
            notice: None,
        }
    }

    #[test]
    fn test_apply_tag_sets_text_fields() {
        let mut tag = Tag::new();
        tag.set_artist("Nina Simone");
        tag.set_album("Pastel Blues");
        tag.set_title("Sinnerman");

        let mut meta = meta_with_defaults();
        apply_tag(&tag, &mut meta);

        assert_eq!(meta.artist, "Nina Simone");
        assert_eq!(meta.album, "Pastel Blues");
        assert_eq!(meta.title, "Sinnerman");
        assert_eq!(meta.art, None);
    }

    #[test]
    fn test_apply_tag_keeps_defaults_for_missing_frames() {
        let mut tag = Tag::new();
        tag.set_title("Only a Title");

        let mut meta = meta_with_defaults();
        apply_tag(&tag, &mut meta);

        assert_eq!(meta.artist, "Unknown");
        assert_eq!(meta.album, "Unknown");
        assert_eq!(meta.title, "Only a Title");
    }

    #[test]
    fn test_apply_tag_takes_first_picture() {
        let mut tag = Tag::new();
        tag.add_frame(Picture {
            mime_type: "image/jpeg".to_string(),
            picture_type: PictureType::CoverFront,
            description: String::new(),
            data: vec![1, 2, 3, 4],
        });

        let mut meta = meta_with_defaults();
        apply_tag(&tag, &mut meta);

        assert_eq!(meta.art.as_deref(), Some(&[1, 2, 3, 4][..]));
    }

    #[test]
    fn test_embedded_roundtrip() {
        let mut tag = Tag::new();
        tag.set_artist("Embedded Artist");
        let mut buf = Vec::new();
        tag.write_to(&mut buf, id3::Version::Id3v24).unwrap();

        let parsed = read_embedded(&buf).expect("tag parses from memory");
        let mut meta = meta_with_defaults();
        apply_tag(&parsed, &mut meta);
        assert_eq!(meta.artist, "Embedded Artist");
    }

    #[test]
    fn test_garbage_embedded_block_is_none() {
        assert!(read_embedded(&[0u8; 16]).is_none());
        assert!(read_embedded(b"not an id3 block at all").is_none());
    }
}
