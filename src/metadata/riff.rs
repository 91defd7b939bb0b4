//! RIFF/WAVE metadata walk.
//!
//! Hand-rolled pass over a WAV file's chunk list looking for two things:
//! a `LIST`/`INFO` block carrying IART/INAM/IPRD/IALB text fields, and an
//! `id3 ` chunk carrying an embedded ID3v2 tag. Chunk sizes are little
//! endian and odd-sized chunks are padded to word alignment.
//!
//! Precedence: INFO fields are applied first and an embedded ID3 tag is
//! applied after, so the ID3 values win whenever both are present. That
//! matches the behavior this walk replaces, independent of the order the
//! chunks appear in the file.

use super::cursor::{ByteCursor, ParseOutcome};
use super::{AudioMetadata, id3};

/// Fields recovered from a LIST/INFO block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct InfoFields {
    artist: Option<String>,
    album: Option<String>,
    title: Option<String>,
}

/// Walk the buffer as a RIFF/WAVE file and merge what was found into `meta`.
///
/// Any truncation ends the walk with the fields gathered so far; a buffer
/// that is not RIFF/WAVE at all leaves `meta` untouched.
pub fn extract_fields(buf: &[u8], meta: &mut AudioMetadata) -> ParseOutcome {
    if buf.len() < 12 || &buf[0..4] != b"RIFF" || &buf[8..12] != b"WAVE" {
        return ParseOutcome::Malformed;
    }

    let mut cur = ByteCursor::new(buf);
    cur.seek(12);

    let mut info = InfoFields::default();
    let mut embedded_tag = None;

    let outcome = loop {
        if cur.remaining() == 0 {
            break ParseOutcome::Complete;
        }
        let Some(chunk_id) = cur.read_fourcc() else {
            break ParseOutcome::Truncated;
        };
        let Some(chunk_size) = cur.read_u32_le() else {
            break ParseOutcome::Truncated;
        };
        let chunk_size = chunk_size as usize;

        if chunk_id == *b"LIST" && chunk_size >= 4 {
            let Some(list_type) = cur.read_fourcc() else {
                break ParseOutcome::Truncated;
            };
            let remaining = chunk_size - 4;
            if list_type == *b"INFO" {
                // A short read here means the file ends inside the INFO
                // block; parse what there is.
                let payload = cur.read_up_to(remaining);
                walk_info_entries(payload, &mut info);
            } else if !cur.skip(remaining) {
                break ParseOutcome::Truncated;
            }
        } else if chunk_id.eq_ignore_ascii_case(b"id3 ") {
            let payload = cur.read_up_to(chunk_size);
            if let Some(tag) = id3::read_embedded(payload) {
                embedded_tag = Some(tag);
            }
        } else if !cur.skip(chunk_size) {
            break ParseOutcome::Truncated;
        }

        // RIFF word alignment: odd-sized chunks carry one pad byte.
        if chunk_size % 2 == 1 && !cur.skip(1) {
            break ParseOutcome::Truncated;
        }
    };

    if let Some(artist) = info.artist {
        meta.artist = artist;
    }
    if let Some(album) = info.album {
        meta.album = album;
    }
    if let Some(title) = info.title {
        meta.title = title;
    }
    if let Some(tag) = embedded_tag {
        id3::apply_tag(&tag, meta);
    }

    outcome
}

/// Walk `id(4) + size(4, LE) + payload [+ pad]` sub-chunks of an INFO block.
/// First occurrence wins per field; empty values are ignored.
fn walk_info_entries(payload: &[u8], info: &mut InfoFields) {
    let mut cur = ByteCursor::new(payload);
    while cur.remaining() >= 8 {
        let Some(sub_id) = cur.read_fourcc() else {
            return;
        };
        let Some(sub_size) = cur.read_u32_le() else {
            return;
        };
        // Truncated final entry still yields its readable prefix.
        let sub_data = cur.read_up_to(sub_size as usize);
        let text = decode_info_text(sub_data);

        if let Some(text) = text {
            match &sub_id {
                b"IART" => {
                    info.artist.get_or_insert(text);
                }
                b"INAM" => {
                    info.title.get_or_insert(text);
                }
                b"IPRD" | b"IALB" => {
                    info.album.get_or_insert(text);
                }
                _ => {}
            }
        }

        if sub_size % 2 == 1 {
            cur.skip(1);
        }
    }
}

/// Trim trailing NULs and decode permissively.
fn decode_info_text(data: &[u8]) -> Option<String> {
    let trimmed = match data.iter().rposition(|&b| b != 0) {
        Some(last) => &data[..=last],
        None => return None,
    };
    let text = String::from_utf8_lossy(trimmed).into_owned();
    if text.is_empty() { None } else { Some(text) }
}
