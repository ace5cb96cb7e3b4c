//! # Vdisk Core
//!
//! An in-memory hierarchical virtual filesystem with flat-text persistence.
//!
//! This library provides the core functionality for a virtual shell: a
//! directory/file tree held entirely in memory, a line-oriented text format
//! that the whole tree serializes to and reconstructs from losslessly, and
//! a small app registry whose installed entries are parsed out of files in
//! a reserved `/apps` directory.
//!
//! ## Features
//!
//! - Arena-backed directory tree with stable handles and parent links
//! - Create-on-demand path resolution over `/`-separated paths
//! - Full-rewrite persistence: every mutation saves the complete image
//! - Tolerant loading: malformed records are skipped, truncated content
//!   blocks are kept
//! - App registry with builtin and installed records
//!
//! ## Example
//!
//! ```no_run
//! use vdisk_core::{Session, Store};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Open a session backed by a disk image file
//! let mut session = Session::open(Store::at("./vdisk.txt"))?;
//!
//! // Build a tree; every mutation persists before returning
//! session.make_dir("docs")?;
//! session.change_dir("docs")?;
//! session.write_file("a.txt", "hello\n")?;
//!
//! // Read it back
//! println!("{}", session.read_file("a.txt")?);
//! # Ok(())
//! # }
//! ```

mod apps;
mod error;
mod image;
mod session;
mod store;
mod tree;

pub use apps::{APP_DIR, APP_END_MARK, APP_EXT, AppRecord, AppRegistry};
pub use error::{Error, Result};
pub use image::{DIR_PREFIX, END_MARK, FILE_PREFIX, decode, encode};
pub use session::Session;
pub use store::Store;
pub use tree::{DirId, File, Tree};
