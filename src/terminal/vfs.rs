use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::terminal::script;
use crate::terminal::state::DEFAULT_DIRECTORY;

/// Read-only files and directory listings the demo terminal can browse.
#[derive(Debug, Clone)]
pub struct VirtualFileSystem {
    files: BTreeMap<String, String>,
    directories: BTreeMap<String, Vec<String>>,
}

impl VirtualFileSystem {
    pub fn new(
        files: impl IntoIterator<Item = (String, String)>,
        directories: impl IntoIterator<Item = (String, Vec<String>)>,
    ) -> Self {
        Self {
            files: files.into_iter().collect(),
            directories: directories.into_iter().collect(),
        }
    }

    pub fn stock() -> Self {
        let files = [
            ("mission.txt", script::MISSION_TXT),
            ("values.txt", script::VALUES_TXT),
            (".config/system.json", script::SYSTEM_JSON),
        ];
        let directories = [
            ("~", vec!["pointlabs/"]),
            (DEFAULT_DIRECTORY, vec!["mission.txt", "values.txt", ".config/"]),
            ("~/pointlabs/.config", vec!["system.json"]),
        ];
        Self::new(
            files
                .into_iter()
                .map(|(path, content)| (path.to_owned(), content.to_owned())),
            directories.into_iter().map(|(path, entries)| {
                (
                    path.to_owned(),
                    entries.into_iter().map(str::to_owned).collect(),
                )
            }),
        )
    }

    /// Looks the name up as given, then with a leading `./` or home prefix removed.
    pub fn resolve_file(&self, name: &str) -> Option<&str> {
        if let Some(content) = self.files.get(name) {
            return Some(content);
        }
        let stripped = home_prefix().replace(name, "");
        self.files.get(stripped.as_ref()).map(String::as_str)
    }

    /// Resolves a directory relative to `cwd`. An empty name or `.` means `cwd` itself.
    pub fn resolve_directory(&self, name: &str, cwd: &str) -> Option<&[String]> {
        let trimmed = name.strip_suffix('/').unwrap_or(name);
        let normalized = match trimmed {
            "" | "." => cwd,
            other => other.strip_prefix("./").unwrap_or(other),
        };
        if let Some(entries) = self.directories.get(normalized) {
            return Some(entries);
        }

        let joined = format!("{DEFAULT_DIRECTORY}/{normalized}");
        let collapsed = repeated_slashes().replace_all(&joined, "/");
        self.directories
            .get(collapsed.trim_end_matches('/'))
            .map(Vec::as_slice)
    }
}

impl Default for VirtualFileSystem {
    fn default() -> Self {
        Self::stock()
    }
}

fn home_prefix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\./|~/pointlabs/)").expect("home prefix regex should compile")
    })
}

fn repeated_slashes() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/+").expect("slash regex should compile"))
}
