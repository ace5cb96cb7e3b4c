//! Directory tree model and operations.
//!
//! Nodes live in an arena addressed by stable [`DirId`] handles. Each node
//! stores its parent's handle and the handles of its children, which keeps
//! "move to parent" O(1) and makes recursive deletion a matter of
//! invalidating arena slots. The root occupies a fixed slot, has no parent
//! and is never deleted, only wiped.

use crate::error::{Error, Result};
use crate::image::END_MARK;

/// Stable handle to a directory in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirId(u32);

/// A file: a name and a text content blob, possibly empty or multi-line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    /// Name, unique among the files of one directory.
    pub name: String,
    /// Content, stored verbatim.
    pub content: String,
}

/// A directory node. Children are kept in insertion order.
#[derive(Debug)]
struct DirNode {
    name: String,
    parent: Option<DirId>,
    subdirs: Vec<DirId>,
    files: Vec<File>,
}

/// The in-memory filesystem tree.
///
/// Directory and file names are case-sensitive and unique per namespace
/// within one directory: two subdirectories (or two files) of one directory
/// may not share a name, but a subdirectory and a file may. All listings and
/// searches scan children in insertion order, first match wins.
///
/// Operations panic when given a handle to a directory that has since been
/// deleted; handles stay valid across every other mutation.
#[derive(Debug)]
pub struct Tree {
    nodes: Vec<Option<DirNode>>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create a tree containing only the root directory.
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(DirNode {
                name: String::new(),
                parent: None,
                subdirs: Vec::new(),
                files: Vec::new(),
            })],
        }
    }

    /// Handle of the root directory.
    pub fn root(&self) -> DirId {
        DirId(0)
    }

    fn node(&self, id: DirId) -> &DirNode {
        self.nodes[id.0 as usize]
            .as_ref()
            .expect("stale directory handle")
    }

    fn node_mut(&mut self, id: DirId) -> &mut DirNode {
        self.nodes[id.0 as usize]
            .as_mut()
            .expect("stale directory handle")
    }

    fn alloc(&mut self, node: DirNode) -> DirId {
        // Reuse the first free slot, if any
        if let Some(slot) = self.nodes.iter().position(Option::is_none) {
            self.nodes[slot] = Some(node);
            DirId(slot as u32)
        } else {
            self.nodes.push(Some(node));
            DirId((self.nodes.len() - 1) as u32)
        }
    }

    /// Name of a directory. The root's name is empty.
    pub fn name(&self, dir: DirId) -> &str {
        &self.node(dir).name
    }

    /// Parent of a directory, `None` for the root.
    pub fn parent(&self, dir: DirId) -> Option<DirId> {
        self.node(dir).parent
    }

    /// Absolute `/`-rooted path of a directory, reconstructed by walking
    /// parent links. The root's path is `/`.
    pub fn full_path(&self, dir: DirId) -> String {
        let mut segments = Vec::new();
        let mut cur = dir;
        while let Some(parent) = self.node(cur).parent {
            segments.push(self.node(cur).name.as_str());
            cur = parent;
        }
        segments.reverse();
        format!("/{}", segments.join("/"))
    }

    /// Child directory handles, in insertion order.
    pub fn subdirs(&self, dir: DirId) -> &[DirId] {
        &self.node(dir).subdirs
    }

    /// Files of a directory, in insertion order.
    pub fn files(&self, dir: DirId) -> &[File] {
        &self.node(dir).files
    }

    /// Directory names and file names of a directory, in insertion order.
    pub fn list(&self, dir: DirId) -> (Vec<&str>, Vec<&str>) {
        let node = self.node(dir);
        let dirs = node
            .subdirs
            .iter()
            .map(|&id| self.name(id))
            .collect();
        let files = node.files.iter().map(|f| f.name.as_str()).collect();
        (dirs, files)
    }

    /// Find a child directory by exact name.
    pub fn find_subdir(&self, dir: DirId, name: &str) -> Option<DirId> {
        self.node(dir)
            .subdirs
            .iter()
            .copied()
            .find(|&id| self.name(id) == name)
    }

    /// Find a file by exact name.
    pub fn find_file(&self, dir: DirId, name: &str) -> Option<&File> {
        self.node(dir).files.iter().find(|f| f.name == name)
    }

    /// Walk a `/`-separated path without creating anything.
    ///
    /// Returns `None` if any segment does not resolve to an existing
    /// directory. Empty segments are ignored, so an empty string or `/`
    /// resolves to the root.
    pub fn find_path(&self, path: &str) -> Option<DirId> {
        let mut cur = self.root();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            cur = self.find_subdir(cur, segment)?;
        }
        Some(cur)
    }

    /// Walk a `/`-separated path, creating missing directories on demand.
    ///
    /// A leading `/` is optional; empty segments are ignored, so
    /// `dir1/dir2`, `/dir1/dir2` and `dir1//dir2` resolve identically.
    /// Never matches or creates files, never fails. Calling it twice with
    /// the same path returns the same directory and creates no duplicates.
    pub fn resolve_or_create(&mut self, path: &str) -> DirId {
        let mut cur = self.root();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            cur = match self.find_subdir(cur, segment) {
                Some(existing) => existing,
                None => self.append_dir(cur, segment),
            };
        }
        cur
    }

    fn append_dir(&mut self, parent: DirId, name: &str) -> DirId {
        let id = self.alloc(DirNode {
            name: name.to_string(),
            parent: Some(parent),
            subdirs: Vec::new(),
            files: Vec::new(),
        });
        self.node_mut(parent).subdirs.push(id);
        id
    }

    /// Create a new empty directory under `dir`.
    ///
    /// Unlike the path resolver, an existing sibling directory of the same
    /// name is an error here, not a descend.
    pub fn make_dir(&mut self, dir: DirId, name: &str) -> Result<DirId> {
        validate_name(name)?;
        if self.find_subdir(dir, name).is_some() {
            return Err(Error::already_exists("directory", name));
        }
        Ok(self.append_dir(dir, name))
    }

    /// Create a file or replace an existing file's content in place.
    pub fn write_file(&mut self, dir: DirId, name: &str, content: &str) -> Result<()> {
        validate_name(name)?;
        validate_content(content)?;
        let node = self.node_mut(dir);
        if let Some(file) = node.files.iter_mut().find(|f| f.name == name) {
            file.content = content.to_string();
        } else {
            node.files.push(File {
                name: name.to_string(),
                content: content.to_string(),
            });
        }
        Ok(())
    }

    /// Read a file's content.
    pub fn read_file(&self, dir: DirId, name: &str) -> Result<&str> {
        self.find_file(dir, name)
            .map(|f| f.content.as_str())
            .ok_or_else(|| Error::not_found("file", name))
    }

    /// Remove a file, preserving the relative order of the rest.
    pub fn remove_file(&mut self, dir: DirId, name: &str) -> Result<()> {
        let node = self.node_mut(dir);
        let pos = node
            .files
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| Error::not_found("file", name))?;
        node.files.remove(pos);
        Ok(())
    }

    /// Remove a child directory and free its entire subtree.
    pub fn remove_dir(&mut self, dir: DirId, name: &str) -> Result<()> {
        let pos = self
            .node(dir)
            .subdirs
            .iter()
            .position(|&id| self.name(id) == name)
            .ok_or_else(|| Error::not_found("directory", name))?;
        let target = self.node_mut(dir).subdirs.remove(pos);
        self.free_subtree(target);
        Ok(())
    }

    /// Remove all children of the root, keeping the root node itself valid.
    pub fn wipe(&mut self) {
        let root = self.root();
        let subdirs = std::mem::take(&mut self.node_mut(root).subdirs);
        for id in subdirs {
            self.free_subtree(id);
        }
        self.node_mut(root).files.clear();
    }

    fn free_subtree(&mut self, id: DirId) {
        if let Some(node) = self.nodes[id.0 as usize].take() {
            for child in node.subdirs {
                self.free_subtree(child);
            }
        }
    }
}

/// Validate an entry name.
///
/// Names must be non-empty, must not contain the path separator or line
/// breaks (the disk image format has no escaping), and must not collide
/// with the `.`/`..` navigation names.
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_name("name cannot be empty"));
    }
    if name == "." || name == ".." {
        return Err(Error::invalid_name(format!("name is reserved: {}", name)));
    }
    if name.contains('/') {
        return Err(Error::invalid_name(format!(
            "name must not contain '/': {}",
            name
        )));
    }
    if name.contains('\n') || name.contains('\r') {
        return Err(Error::invalid_name(format!(
            "name must not contain line breaks: {:?}",
            name
        )));
    }
    Ok(())
}

/// Validate file content against the disk image framing.
///
/// A line equal to the end-of-content sentinel would terminate the content
/// block early on reload, so it is rejected at write time.
fn validate_content(content: &str) -> Result<()> {
    if content.lines().any(|line| line == END_MARK) {
        return Err(Error::invalid_content(format!(
            "content must not contain a line equal to {:?}",
            END_MARK
        )));
    }
    Ok(())
}
