//! M4A/MP4 atom walk.
//!
//! Recovers iTunes-style metadata (artist, album, title, cover art) from the
//! MP4 container without a demux library. Atoms are 32-bit big-endian
//! size + fourcc records; a size of 1 switches to a 64-bit extended size and
//! a size of 0 means "runs to the end of the file". Known containers are
//! descended in place rather than skipped, so their children are parsed by
//! the same loop.

use super::cursor::{ByteCursor, ParseOutcome};

/// Fields recovered from the `ilst` metadata atoms. All optional; the caller
/// merges them over its defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mp4Fields {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub title: Option<String>,
    pub art: Option<Vec<u8>>,
}

/// Container atoms whose children are parsed in place.
const CONTAINERS: [[u8; 4]; 7] = [
    *b"moov", *b"trak", *b"mdia", *b"minf", *b"stbl", *b"udta", *b"ilst",
];

/// Which metadata slot a tagged atom fills.
#[derive(Debug, Clone, Copy)]
enum TagTarget {
    Artist,
    Album,
    Title,
    Art,
}

/// Walk the whole buffer as a run of top-level atoms.
pub fn extract_fields(buf: &[u8]) -> (Mp4Fields, ParseOutcome) {
    let mut fields = Mp4Fields::default();
    let mut cur = ByteCursor::new(buf);
    let outcome = walk_atoms(&mut cur, &mut fields);
    (fields, outcome)
}

fn walk_atoms(cur: &mut ByteCursor<'_>, fields: &mut Mp4Fields) -> ParseOutcome {
    let end = cur.len();
    while cur.pos() < end {
        let Some(size32) = cur.read_u32_be() else {
            return ParseOutcome::Truncated;
        };
        let Some(fourcc) = cur.read_fourcc() else {
            return ParseOutcome::Truncated;
        };

        let content_len = match size32 {
            1 => {
                // Extended-size atom: the real size follows as a u64.
                let Some(size64) = cur.read_u64_be() else {
                    return ParseOutcome::Truncated;
                };
                match size64.checked_sub(16) {
                    Some(n) => n as usize,
                    None => return ParseOutcome::Malformed,
                }
            }
            // Last atom in the file, runs to the end of the buffer.
            0 => end - cur.pos(),
            n => match n.checked_sub(8) {
                Some(v) => v as usize,
                None => return ParseOutcome::Malformed,
            },
        };

        if CONTAINERS.contains(&fourcc) {
            // Descend: children start right here, parsed by this loop.
            continue;
        }

        if fourcc == *b"meta" {
            // meta carries a 4-byte version/flags field before its children.
            if !cur.skip(4) {
                return ParseOutcome::Truncated;
            }
            continue;
        }

        // The © prefix is byte 0xA9 in the atom type, not UTF-8.
        let target = match &fourcc {
            [0xA9, b'A', b'R', b'T'] => Some(TagTarget::Artist),
            [0xA9, b'a', b'l', b'b'] => Some(TagTarget::Album),
            [0xA9, b'n', b'a', b'm'] => Some(TagTarget::Title),
            b"covr" => Some(TagTarget::Art),
            _ => None,
        };

        if let Some(target) = target {
            let atom_end = cur.pos().saturating_add(content_len);
            scan_data_child(cur, atom_end, target, fields);
            // Reseek to the end of the parent atom no matter how much the
            // child scan consumed, so the walk always makes forward progress.
            cur.seek(atom_end);
            continue;
        }

        if !cur.skip(content_len) {
            return ParseOutcome::Truncated;
        }
    }
    ParseOutcome::Complete
}

/// Scan the children of a tagged atom for its `data` sub-atom and store the
/// payload. Stops quietly on truncation or inconsistent sizes; the caller
/// reseeks past the parent either way.
fn scan_data_child(
    cur: &mut ByteCursor<'_>,
    atom_end: usize,
    target: TagTarget,
    fields: &mut Mp4Fields,
) {
    while cur.pos() < atom_end {
        let Some(d_size) = cur.read_u32_be() else {
            return;
        };
        let Some(d_type) = cur.read_fourcc() else {
            return;
        };

        if d_type == *b"data" {
            // 4 bytes type indicator + 4 bytes locale precede the payload.
            if !cur.skip(8) {
                return;
            }
            let Some(payload_len) = d_size.checked_sub(16) else {
                return;
            };
            let Some(payload) = cur.read_exact(payload_len as usize) else {
                return;
            };
            match target {
                TagTarget::Art => fields.art = Some(payload.to_vec()),
                TagTarget::Artist => {
                    fields.artist = Some(String::from_utf8_lossy(payload).into_owned());
                }
                TagTarget::Album => {
                    fields.album = Some(String::from_utf8_lossy(payload).into_owned());
                }
                TagTarget::Title => {
                    fields.title = Some(String::from_utf8_lossy(payload).into_owned());
                }
            }
            return;
        }

        // Skip other sub-atoms (e.g. "name" or "mean" in ---- atoms).
        match d_size.checked_sub(8) {
            Some(n) => {
                if !cur.skip(n as usize) {
                    return;
                }
            }
            None => return,
        }
    }
}
