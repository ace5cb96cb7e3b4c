//! App records and the installed-app cache.
//!
//! Builtin apps are registered once per session and live for the whole
//! process. Installed apps are parsed out of files under the reserved
//! `/apps` directory; the registry's installed entries are a cache over
//! that directory, rebuilt whenever the installed set changes. The files
//! are the source of truth, never the cache.

use crate::tree::Tree;
use serde::Serialize;
use tracing::debug;

/// Reserved directory holding installed-app records.
pub const APP_DIR: &str = "/apps";

/// File extension marking an installed-app record.
pub const APP_EXT: &str = ".app";

/// Terminator line for the `CODE=` payload block.
pub const APP_END_MARK: &str = "ENDAPP";

const NAME_KEY: &str = "APP_NAME=";
const DESC_KEY: &str = "APP_DESC=";
const CODE_KEY: &str = "CODE=";

/// A named, described unit of executable behavior.
///
/// For builtins `code` is a fixed tag; for installed apps it is the raw
/// payload text, stored and retrieved verbatim and interpreted only by the
/// app runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppRecord {
    pub name: String,
    pub desc: String,
    pub code: String,
    pub builtin: bool,
}

impl AppRecord {
    /// Parse an installed-app record from file content.
    ///
    /// The format is line-oriented: `APP_NAME=`, `APP_DESC=`, then `CODE=`
    /// whose remainder plus all subsequent lines up to an `ENDAPP` line (or
    /// end of content) form the payload. Keys after the payload block are
    /// ignored. Returns `None` when the name key is missing or empty.
    pub fn parse(source: &str) -> Option<Self> {
        let mut name = String::new();
        let mut desc = String::new();
        let mut code = String::new();

        let mut lines = source.lines();
        while let Some(line) = lines.next() {
            if let Some(value) = line.strip_prefix(NAME_KEY) {
                name = value.to_string();
            } else if let Some(value) = line.strip_prefix(DESC_KEY) {
                desc = value.to_string();
            } else if let Some(value) = line.strip_prefix(CODE_KEY) {
                code.push_str(value);
                code.push('\n');
                for body in lines.by_ref() {
                    if body == APP_END_MARK {
                        break;
                    }
                    code.push_str(body);
                    code.push('\n');
                }
                break;
            }
        }

        if name.is_empty() {
            return None;
        }

        Some(Self {
            name,
            desc,
            code,
            builtin: false,
        })
    }
}

/// Registry of builtin and installed apps, keyed by name.
#[derive(Debug, Default)]
pub struct AppRegistry {
    apps: Vec<AppRecord>,
}

impl AppRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the process-lifetime builtin apps.
    pub fn seed_builtins(&mut self) {
        self.register(builtin(
            "calculator",
            "Interactive calculator (+ - * /)",
            "BUILTIN_CALC",
        ));
        self.register(builtin(
            "notepad",
            "Notepad (saves as a file in current dir)",
            "BUILTIN_NOTEPAD",
        ));
        self.register(builtin(
            "numbergame",
            "Number Guess Game (1-100)",
            "BUILTIN_NUMBERGAME",
        ));
        self.register(builtin("about", "About this shell", "BUILTIN_ABOUT"));
    }

    /// Append a record.
    pub fn register(&mut self, record: AppRecord) {
        self.apps.push(record);
    }

    /// Find a record by exact name, first match wins.
    pub fn lookup(&self, name: &str) -> Option<&AppRecord> {
        self.apps.iter().find(|a| a.name == name)
    }

    /// All records, builtins first, in registration order.
    pub fn list(&self) -> &[AppRecord] {
        &self.apps
    }

    /// Remove the first installed record with the given name.
    ///
    /// Builtins are never removed; returns whether a record was dropped.
    pub fn unregister(&mut self, name: &str) -> bool {
        match self.apps.iter().position(|a| !a.builtin && a.name == name) {
            Some(pos) => {
                self.apps.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Drop every installed record and rescan the `/apps` directory.
    ///
    /// Only files directly inside `/apps` with the installed-app extension
    /// are considered; files that fail to parse are skipped.
    pub fn rebuild_installed(&mut self, tree: &Tree) {
        self.apps.retain(|a| a.builtin);

        let Some(dir) = tree.find_path(APP_DIR) else {
            return;
        };

        for file in tree.files(dir) {
            if !file.name.ends_with(APP_EXT) {
                continue;
            }
            match AppRecord::parse(&file.content) {
                Some(record) => self.apps.push(record),
                None => debug!(file = %file.name, "skipping app record without a name"),
            }
        }
    }
}

fn builtin(name: &str, desc: &str, tag: &str) -> AppRecord {
    AppRecord {
        name: name.to_string(),
        desc: desc.to_string(),
        code: tag.to_string(),
        builtin: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record() {
        let source = "APP_NAME=hello\nAPP_DESC=x\nCODE=PRINT:hi\nENDAPP\n";
        let record = AppRecord::parse(source).unwrap();

        assert_eq!(record.name, "hello");
        assert_eq!(record.desc, "x");
        assert_eq!(record.code, "PRINT:hi\n");
        assert!(!record.builtin);
    }

    #[test]
    fn test_parse_multi_line_payload() {
        let source = "APP_NAME=multi\nCODE=first\nsecond\nthird\nENDAPP\nAPP_DESC=ignored\n";
        let record = AppRecord::parse(source).unwrap();

        assert_eq!(record.code, "first\nsecond\nthird\n");
        // Keys after the payload block are not read
        assert_eq!(record.desc, "");
    }

    #[test]
    fn test_parse_payload_without_terminator() {
        let source = "APP_NAME=open\nCODE=line1\nline2";
        let record = AppRecord::parse(source).unwrap();
        assert_eq!(record.code, "line1\nline2\n");
    }

    #[test]
    fn test_parse_missing_name_is_none() {
        assert!(AppRecord::parse("APP_DESC=x\nCODE=PRINT:hi\nENDAPP\n").is_none());
        assert!(AppRecord::parse("").is_none());
        assert!(AppRecord::parse("APP_NAME=\nCODE=x\n").is_none());
    }

    #[test]
    fn test_seed_builtins() {
        let mut registry = AppRegistry::new();
        registry.seed_builtins();

        assert_eq!(registry.list().len(), 4);
        let calc = registry.lookup("calculator").unwrap();
        assert!(calc.builtin);
        assert_eq!(calc.code, "BUILTIN_CALC");
    }

    #[test]
    fn test_lookup_first_match_wins() {
        let mut registry = AppRegistry::new();
        registry.register(AppRecord {
            name: "dup".into(),
            desc: "first".into(),
            code: String::new(),
            builtin: false,
        });
        registry.register(AppRecord {
            name: "dup".into(),
            desc: "second".into(),
            code: String::new(),
            builtin: false,
        });

        assert_eq!(registry.lookup("dup").unwrap().desc, "first");
    }

    #[test]
    fn test_unregister_skips_builtins() {
        let mut registry = AppRegistry::new();
        registry.seed_builtins();

        assert!(!registry.unregister("calculator"));
        assert!(registry.lookup("calculator").is_some());
        assert!(!registry.unregister("missing"));
    }

    #[test]
    fn test_rebuild_installed_scans_app_dir() {
        let mut tree = Tree::new();
        let apps = tree.resolve_or_create(APP_DIR);
        tree.write_file(
            apps,
            "hello.app",
            "APP_NAME=hello\nAPP_DESC=Simple Hello App\nCODE=PRINT:hi\nENDAPP\n",
        )
        .unwrap();
        tree.write_file(apps, "readme.txt", "not an app\n").unwrap();
        tree.write_file(apps, "broken.app", "CODE=PRINT:orphan\n")
            .unwrap();

        let mut registry = AppRegistry::new();
        registry.seed_builtins();
        registry.rebuild_installed(&tree);

        assert_eq!(registry.list().len(), 5);
        let hello = registry.lookup("hello").unwrap();
        assert!(!hello.builtin);
        assert_eq!(hello.code, "PRINT:hi\n");
    }

    #[test]
    fn test_rebuild_installed_drops_stale_entries() {
        let tree = Tree::new();

        let mut registry = AppRegistry::new();
        registry.seed_builtins();
        registry.register(AppRecord {
            name: "stale".into(),
            desc: String::new(),
            code: String::new(),
            builtin: false,
        });

        // No /apps directory at all: only builtins survive
        registry.rebuild_installed(&tree);
        assert_eq!(registry.list().len(), 4);
        assert!(registry.lookup("stale").is_none());
    }
}
