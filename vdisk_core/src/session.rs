//! Process-scoped session over one tree, one store and one app registry.
//!
//! A session is single-threaded by construction: every operation takes the
//! session by reference, runs to completion, and structural mutations
//! finish a full save to the store before returning. A failed save is
//! returned to the caller but the in-memory mutation stands, so memory and
//! storage can diverge until the next successful save.

use crate::apps::{APP_DIR, APP_EXT, AppRecord, AppRegistry};
use crate::error::{Error, Result};
use crate::image;
use crate::store::Store;
use crate::tree::{DirId, Tree};

/// One logical shell session owning the whole tree.
#[derive(Debug)]
pub struct Session {
    tree: Tree,
    cwd: DirId,
    store: Store,
    apps: AppRegistry,
}

impl Session {
    /// Load the tree from the store, seed the builtin apps and rebuild the
    /// installed-app cache from `/apps`.
    pub fn open(store: Store) -> Result<Self> {
        let tree = store.load()?;
        let cwd = tree.root();

        let mut apps = AppRegistry::new();
        apps.seed_builtins();
        apps.rebuild_installed(&tree);

        Ok(Self {
            tree,
            cwd,
            store,
            apps,
        })
    }

    /// The underlying tree.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// The app registry.
    pub fn apps(&self) -> &AppRegistry {
        &self.apps
    }

    /// Current directory handle.
    pub fn cwd(&self) -> DirId {
        self.cwd
    }

    /// Absolute path of the current directory, for prompts.
    pub fn cwd_path(&self) -> String {
        self.tree.full_path(self.cwd)
    }

    /// Serialize the tree and write the image.
    pub fn save(&self) -> Result<()> {
        self.store.save(&self.tree)
    }

    /// The raw flat-text image of the current tree.
    pub fn dump_image(&self) -> String {
        image::encode(&self.tree)
    }

    // ------------------------------------------------------------------
    // Current-directory operations
    // ------------------------------------------------------------------

    /// Directory names and file names of the current directory.
    pub fn list(&self) -> (Vec<&str>, Vec<&str>) {
        self.tree.list(self.cwd)
    }

    /// Change into a child directory, or to the parent for `..`.
    ///
    /// Returns `Ok(false)` for `..` at the root (a no-op), `Ok(true)` when
    /// the current directory changed.
    pub fn change_dir(&mut self, name: &str) -> Result<bool> {
        if name == ".." {
            return Ok(self.go_up());
        }
        let dir = self
            .tree
            .find_subdir(self.cwd, name)
            .ok_or_else(|| Error::not_found("directory", name))?;
        self.cwd = dir;
        Ok(true)
    }

    /// Move to the parent directory. Returns false when already at root.
    pub fn go_up(&mut self) -> bool {
        match self.tree.parent(self.cwd) {
            Some(parent) => {
                self.cwd = parent;
                true
            }
            None => false,
        }
    }

    /// Create a directory in the current directory.
    pub fn make_dir(&mut self, name: &str) -> Result<()> {
        self.tree.make_dir(self.cwd, name)?;
        self.save()
    }

    /// Create or overwrite a file in the current directory.
    pub fn write_file(&mut self, name: &str, content: &str) -> Result<()> {
        self.tree.write_file(self.cwd, name, content)?;
        self.save()
    }

    /// Read a file in the current directory.
    pub fn read_file(&self, name: &str) -> Result<&str> {
        self.tree.read_file(self.cwd, name)
    }

    /// Remove a file from the current directory.
    pub fn remove_file(&mut self, name: &str) -> Result<()> {
        self.tree.remove_file(self.cwd, name)?;
        self.save()
    }

    /// Remove a child directory and its entire subtree.
    pub fn remove_dir(&mut self, name: &str) -> Result<()> {
        self.tree.remove_dir(self.cwd, name)?;
        self.save()
    }

    /// Remove everything under the root, keeping the root itself.
    ///
    /// Resets the current directory to the root and purges cached
    /// installed-app records, whose backing files are gone.
    pub fn wipe(&mut self) -> Result<()> {
        self.tree.wipe();
        self.cwd = self.tree.root();
        self.apps.rebuild_installed(&self.tree);
        self.save()
    }

    // ------------------------------------------------------------------
    // Path-based surface
    // ------------------------------------------------------------------

    /// Resolve a `/`-separated path, creating missing directories.
    pub fn resolve(&mut self, path: &str) -> DirId {
        self.tree.resolve_or_create(path)
    }

    /// Directory names and file names of the directory at `path`.
    pub fn list_at(&self, path: &str) -> Result<(Vec<&str>, Vec<&str>)> {
        let dir = self
            .tree
            .find_path(path)
            .ok_or_else(|| Error::not_found("directory", path))?;
        Ok(self.tree.list(dir))
    }

    /// Create the directory named by `path`, creating missing ancestors.
    pub fn make_dir_at(&mut self, path: &str) -> Result<()> {
        let (parent, leaf) = split_path(path)?;
        let dir = self.tree.resolve_or_create(parent);
        self.tree.make_dir(dir, leaf)?;
        self.save()
    }

    /// Create or overwrite the file named by `path`, creating missing
    /// ancestor directories.
    pub fn write_file_at(&mut self, path: &str, content: &str) -> Result<()> {
        let (parent, leaf) = split_path(path)?;
        let dir = self.tree.resolve_or_create(parent);
        self.tree.write_file(dir, leaf, content)?;
        self.save()
    }

    /// Read the file named by `path`.
    pub fn read_file_at(&self, path: &str) -> Result<&str> {
        let (parent, leaf) = split_path(path)?;
        let dir = self
            .tree
            .find_path(parent)
            .ok_or_else(|| Error::not_found("directory", parent.to_string()))?;
        self.tree.read_file(dir, leaf)
    }

    /// Remove the file named by `path`.
    pub fn remove_file_at(&mut self, path: &str) -> Result<()> {
        let (parent, leaf) = split_path(path)?;
        let dir = self
            .tree
            .find_path(parent)
            .ok_or_else(|| Error::not_found("directory", parent.to_string()))?;
        self.tree.remove_file(dir, leaf)?;
        self.save()
    }

    /// Remove the directory named by `path` and its entire subtree.
    pub fn remove_dir_at(&mut self, path: &str) -> Result<()> {
        let (parent, leaf) = split_path(path)?;
        let dir = self
            .tree
            .find_path(parent)
            .ok_or_else(|| Error::not_found("directory", parent.to_string()))?;
        self.tree.remove_dir(dir, leaf)?;
        self.save()
    }

    // ------------------------------------------------------------------
    // App operations
    // ------------------------------------------------------------------

    /// Write an installed-app record file under `/apps` and rebuild the
    /// installed-app cache.
    ///
    /// `file_name` must carry the installed-app extension. A record file of
    /// the same name means the package is already installed.
    pub fn install_package(&mut self, file_name: &str, source: &str) -> Result<()> {
        if !file_name.ends_with(APP_EXT) {
            return Err(Error::invalid_name(format!(
                "package file must end with {}: {}",
                APP_EXT, file_name
            )));
        }
        let dir = self.tree.resolve_or_create(APP_DIR);
        if self.tree.find_file(dir, file_name).is_some() {
            return Err(Error::already_exists("package", file_name));
        }
        self.tree.write_file(dir, file_name, source)?;
        self.save()?;
        self.apps.rebuild_installed(&self.tree);
        Ok(())
    }

    /// Delete the record file backing the named installed app and rebuild
    /// the installed-app cache.
    ///
    /// The file is located by parsing every record under `/apps` and
    /// matching its `APP_NAME`, not by file name.
    pub fn uninstall_app(&mut self, app_name: &str) -> Result<()> {
        let file_name = self
            .tree
            .find_path(APP_DIR)
            .and_then(|dir| {
                self.tree.files(dir).iter().find(|file| {
                    file.name.ends_with(APP_EXT)
                        && AppRecord::parse(&file.content)
                            .is_some_and(|record| record.name == app_name)
                })
            })
            .map(|file| file.name.clone())
            .ok_or_else(|| Error::not_found("app", app_name))?;

        let dir = self
            .tree
            .find_path(APP_DIR)
            .ok_or_else(|| Error::not_found("directory", APP_DIR))?;
        self.tree.remove_file(dir, &file_name)?;
        self.save()?;
        self.apps.rebuild_installed(&self.tree);
        Ok(())
    }
}

/// Split a path into its parent directory path and final component.
fn split_path(path: &str) -> Result<(&str, &str)> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::invalid_name(format!(
            "path has no final component: {:?}",
            path
        )));
    }
    Ok(match trimmed.rsplit_once('/') {
        Some((parent, leaf)) => (parent, leaf),
        None => ("", trimmed),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn session_in(temp_dir: &TempDir) -> Session {
        Session::open(Store::at(temp_dir.path().join("vdisk.txt"))).unwrap()
    }

    #[test]
    fn test_mutations_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();

        let mut session = session_in(&temp_dir);
        session.make_dir("docs").unwrap();
        session.change_dir("docs").unwrap();
        session.write_file("a.txt", "hello\n").unwrap();
        drop(session);

        let session = session_in(&temp_dir);
        assert_eq!(session.read_file_at("/docs/a.txt").unwrap(), "hello\n");
    }

    #[test]
    fn test_change_dir_and_back() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = session_in(&temp_dir);

        session.make_dir("a").unwrap();
        assert!(session.change_dir("a").unwrap());
        assert_eq!(session.cwd_path(), "/a");

        assert!(session.change_dir("..").unwrap());
        assert_eq!(session.cwd_path(), "/");

        // `..` at root is a no-op with a signal, not an error
        assert!(!session.change_dir("..").unwrap());
        assert!(!session.go_up());
        assert_eq!(session.cwd_path(), "/");
    }

    #[test]
    fn test_change_dir_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = session_in(&temp_dir);

        let result = session.change_dir("ghost");
        assert!(matches!(result, Err(Error::NotFound { .. })));

        // Files are never matched by cd
        session.write_file("entry", "x\n").unwrap();
        assert!(session.change_dir("entry").is_err());
    }

    #[test]
    fn test_wipe_resets_cwd_and_installed_apps() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = session_in(&temp_dir);

        session
            .install_package(
                "hello.app",
                "APP_NAME=hello\nAPP_DESC=x\nCODE=PRINT:hi\nENDAPP\n",
            )
            .unwrap();
        session.make_dir("deep").unwrap();
        session.change_dir("deep").unwrap();
        assert!(session.apps().lookup("hello").is_some());

        session.wipe().unwrap();

        assert_eq!(session.cwd_path(), "/");
        let (dirs, files) = session.list();
        assert!(dirs.is_empty());
        assert!(files.is_empty());
        assert!(session.apps().lookup("hello").is_none());
        // Builtins survive a wipe
        assert!(session.apps().lookup("calculator").is_some());
    }

    #[test]
    fn test_install_and_uninstall_cycle() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = session_in(&temp_dir);

        let source = "APP_NAME=hello\nAPP_DESC=Simple Hello App\nCODE=PRINT:hi\nENDAPP\n";
        session.install_package("hello.app", source).unwrap();

        let record = session.apps().lookup("hello").unwrap();
        assert!(!record.builtin);
        assert_eq!(session.read_file_at("/apps/hello.app").unwrap(), source);

        // Installing again is an error
        let result = session.install_package("hello.app", source);
        assert!(matches!(result, Err(Error::AlreadyExists { .. })));

        session.uninstall_app("hello").unwrap();
        assert!(session.apps().lookup("hello").is_none());
        assert!(session.read_file_at("/apps/hello.app").is_err());

        let result = session.uninstall_app("hello");
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_installed_apps_load_on_open() {
        let temp_dir = TempDir::new().unwrap();

        let mut session = session_in(&temp_dir);
        session
            .install_package(
                "hello.app",
                "APP_NAME=hello\nAPP_DESC=x\nCODE=PRINT:hi\nENDAPP\n",
            )
            .unwrap();
        drop(session);

        let session = session_in(&temp_dir);
        let record = session.apps().lookup("hello").unwrap();
        assert_eq!(record.code, "PRINT:hi\n");
    }

    #[test]
    fn test_path_based_operations() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = session_in(&temp_dir);

        session.make_dir_at("/a/b").unwrap();
        session.write_file_at("/a/b/f.txt", "data\n").unwrap();

        let (dirs, files) = session.list_at("/a/b").unwrap();
        assert!(dirs.is_empty());
        assert_eq!(files, vec!["f.txt"]);

        session.remove_file_at("/a/b/f.txt").unwrap();
        assert!(session.read_file_at("/a/b/f.txt").is_err());

        session.remove_dir_at("/a/b").unwrap();
        assert!(session.list_at("/a/b").is_err());
        assert!(session.list_at("/a").is_ok());
    }

    #[test]
    fn test_failed_save_keeps_memory_mutation() {
        let temp_dir = TempDir::new().unwrap();
        // A store rooted in a directory that does not exist cannot save
        let store = Store::at(temp_dir.path().join("missing/sub/vdisk.txt"));
        let mut session = Session::open(store).unwrap();

        let result = session.make_dir("kept");
        assert!(matches!(result, Err(Error::Io { .. })));

        // The mutation is not rolled back
        let (dirs, _) = session.list();
        assert_eq!(dirs, vec!["kept"]);
    }

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("/a/b/c").unwrap(), ("/a/b", "c"));
        assert_eq!(split_path("name").unwrap(), ("", "name"));
        assert_eq!(split_path("/name").unwrap(), ("", "name"));
        assert_eq!(split_path("/a/b/").unwrap(), ("/a", "b"));
        assert!(split_path("/").is_err());
        assert!(split_path("").is_err());
    }
}
