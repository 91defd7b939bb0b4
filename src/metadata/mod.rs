//! Audio file metadata extraction.
//!
//! Recovers artist/album/title and embedded cover art from local audio files
//! without a demux library: M4A/MP4 atoms and RIFF/WAVE chunks are parsed
//! byte-by-byte, ID3 frames go through the id3 crate.
//!
//! The contract of [`extract`] is that it never fails: any parse problem
//! degrades to defaults ("Unknown" fields, the file name as title) with the
//! cause logged, and at most a diagnostic `notice` on the record.

pub mod cursor;
pub mod id3;
pub mod mp4;
pub mod riff;

use std::path::Path;

pub use cursor::ParseOutcome;

/// Metadata record for one audio file. The three text fields always hold a
/// value; `art` is either a complete encoded image or absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioMetadata {
    pub artist: String,
    pub album: String,
    pub title: String,
    /// Raw encoded image bytes (JPEG/PNG), exactly as stored in the file.
    pub art: Option<Vec<u8>>,
    /// Diagnostic for degraded extraction (e.g. unsupported format).
    pub notice: Option<String>,
}

impl AudioMetadata {
    /// Defaults for a path: "Unknown" text fields, file name as title.
    fn defaults_for(path: &Path) -> Self {
        let title = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Unknown".to_string());
        Self {
            artist: "Unknown".to_string(),
            album: "Unknown".to_string(),
            title,
            art: None,
            notice: None,
        }
    }
}

/// Extract metadata from an audio file, dispatching on the file extension.
///
/// `.m4a` runs the atom walk, `.mp3` the ID3 read, `.wav` the library pass
/// followed by the authoritative manual RIFF walk. Anything else returns
/// filename-only defaults with a notice.
pub fn extract(path: &Path) -> AudioMetadata {
    let mut meta = AudioMetadata::defaults_for(path);

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    match ext.as_deref() {
        Some("m4a") => extract_m4a(path, &mut meta),
        Some("mp3") => extract_mp3(path, &mut meta),
        Some("wav") => extract_wav(path, &mut meta),
        _ => {
            meta.notice = Some("metadata extraction unsupported for this format".to_string());
        }
    }

    meta
}

fn extract_m4a(path: &Path, meta: &mut AudioMetadata) {
    let Some(buf) = read_file(path, meta) else {
        return;
    };

    let (fields, outcome) = mp4::extract_fields(&buf);
    if outcome != ParseOutcome::Complete {
        tracing::debug!("Atom walk over {:?} ended early: {:?}", path, outcome);
    }

    if let Some(artist) = fields.artist {
        meta.artist = artist;
    }
    if let Some(album) = fields.album {
        meta.album = album;
    }
    if let Some(title) = fields.title {
        meta.title = title;
    }
    meta.art = fields.art;
}

fn extract_mp3(path: &Path, meta: &mut AudioMetadata) {
    if let Some(tag) = id3::read_path(path) {
        id3::apply_tag(&tag, meta);
    }
}

fn extract_wav(path: &Path, meta: &mut AudioMetadata) {
    // Library pass first; the manual RIFF walk below overwrites its values
    // wherever it finds its own matches.
    if let Some(tag) = id3::read_wav_path(path) {
        id3::apply_tag(&tag, meta);
    }

    let Some(buf) = read_file(path, meta) else {
        return;
    };
    let outcome = riff::extract_fields(&buf, meta);
    if outcome != ParseOutcome::Complete {
        tracing::debug!("RIFF walk over {:?} ended early: {:?}", path, outcome);
    }
}

fn read_file(path: &Path, meta: &mut AudioMetadata) -> Option<Vec<u8>> {
    match std::fs::read(path) {
        Ok(buf) => Some(buf),
        Err(e) => {
            tracing::warn!("Could not read {:?}: {}", path, e);
            meta.notice = Some(format!("could not read file: {e}"));
            None
        }
    }
}
