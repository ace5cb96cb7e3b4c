//! Flat-text disk image encoding and decoding.
//!
//! The whole tree serializes to a line-oriented text format:
//!
//! ```text
//! DIR <absolute-path-with-trailing-slash>
//! FILE <absolute-path>
//! <raw content lines...>
//! END
//! ```
//!
//! Records appear in pre-order, subdirectories before files at each level.
//! The root is implicit and never written. There is no header, version tag
//! or checksum, and no escaping: names may not contain `/` or line breaks
//! and content may not contain a line equal to the sentinel, both enforced
//! at write time by the tree.

use crate::tree::{DirId, Tree};
use tracing::warn;

/// Record prefix for a directory.
pub const DIR_PREFIX: &str = "DIR ";

/// Record prefix for a file.
pub const FILE_PREFIX: &str = "FILE ";

/// Sentinel line terminating a file's content block.
pub const END_MARK: &str = "END";

/// Serialize the entire tree to its flat-text form.
///
/// This is a total rewrite of the persisted representation: the output
/// replaces any prior image, never appends to it. Non-empty content that
/// does not already end in a newline gains one for framing.
pub fn encode(tree: &Tree) -> String {
    let mut out = String::new();
    encode_dir(tree, tree.root(), "/", &mut out);
    out
}

fn encode_dir(tree: &Tree, dir: DirId, path: &str, out: &mut String) {
    for &sub in tree.subdirs(dir) {
        let full = format!("{}{}/", path, tree.name(sub));
        out.push_str(DIR_PREFIX);
        out.push_str(&full);
        out.push('\n');
        encode_dir(tree, sub, &full, out);
    }
    for file in tree.files(dir) {
        out.push_str(FILE_PREFIX);
        out.push_str(path);
        out.push_str(&file.name);
        out.push('\n');
        if !file.content.is_empty() {
            out.push_str(&file.content);
            if !file.content.ends_with('\n') {
                out.push('\n');
            }
        }
        out.push_str(END_MARK);
        out.push('\n');
    }
}

/// Parse a flat-text image into a fresh tree.
///
/// Directory records go through the create-on-demand path resolver, so
/// ancestors materialize even when their own records are missing. A file
/// record consumes subsequent lines as content until the sentinel line or
/// end of input; a content block truncated by end of input is kept as-is,
/// not an error. Unparsable records are skipped and parsing continues.
///
/// Callers must decode into a fresh tree: the resolver's create-on-demand
/// semantics make repeated decodes into one tree additive.
pub fn decode(text: &str) -> Tree {
    let mut tree = Tree::new();
    let mut lines = text.lines();

    while let Some(line) = lines.next() {
        if let Some(path) = line.strip_prefix(DIR_PREFIX) {
            tree.resolve_or_create(path);
        } else if let Some(path) = line.strip_prefix(FILE_PREFIX) {
            // Consume the content block first so a malformed record does
            // not leave its content to be misread as further records.
            let mut content = String::new();
            for body in lines.by_ref() {
                if body == END_MARK {
                    break;
                }
                content.push_str(body);
                content.push('\n');
            }

            let Some((dir_path, name)) = path.rsplit_once('/') else {
                warn!(record = path, "skipping file record without separator");
                continue;
            };
            if name.is_empty() {
                warn!(record = path, "skipping file record without a name");
                continue;
            }

            let dir = tree.resolve_or_create(dir_path);
            if let Err(err) = tree.write_file(dir, name, &content) {
                warn!(record = path, %err, "skipping unloadable file record");
            }
        }
        // Anything else is not a record; skip it.
    }

    tree
}
