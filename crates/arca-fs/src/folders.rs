//! Special folder tokens and portable key mapping
//!
//! Path specs may embed placeholder tokens such as `%Documents%` that stand
//! for per-machine special folders. [`SpecialFolders`] expands tokens to
//! concrete paths and maps concrete paths back into portable keys that stay
//! stable when the same data moves between machines.

use std::sync::LazyLock;

use regex::{NoExpand, Regex};

use crate::path::NormalizedPath;

/// Matches any `%Token%` placeholder.
static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%[^%/\\]+%").unwrap());

/// A resolved placeholder token.
#[derive(Debug, Clone)]
pub struct FolderEntry {
    token: String,
    resolved: NormalizedPath,
    pattern: Regex,
}

impl FolderEntry {
    fn new(token: impl Into<String>, resolved: NormalizedPath) -> Self {
        let mut token = token.into();
        if !token.starts_with('%') {
            token = format!("%{token}%");
        }
        let pattern = Regex::new(&format!("(?i){}", regex::escape(&token))).unwrap();
        Self {
            token,
            resolved,
            pattern,
        }
    }

    /// The token text, including the percent wrappers.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The concrete folder the token stands for.
    pub fn resolved(&self) -> &NormalizedPath {
        &self.resolved
    }
}

/// The table of known special folders on this machine.
///
/// Tokens match case-insensitively wherever they occur in a spec. The table
/// is data driven: [`SpecialFolders::from_system`] seeds it from the running
/// platform and [`SpecialFolders::from_pairs`] builds an arbitrary table,
/// which tests use to sandbox resolution under a temp directory.
#[derive(Debug, Clone)]
pub struct SpecialFolders {
    entries: Vec<FolderEntry>,
}

impl SpecialFolders {
    /// Resolve the standard token set from the running system.
    ///
    /// Tokens whose folder cannot be determined here are simply absent from
    /// the table; specs using them stay unexpanded and are reported as such.
    pub fn from_system() -> Self {
        let mut entries = Vec::new();
        let mut push = |token: &str, path: Option<std::path::PathBuf>| {
            if let Some(p) = path {
                let p = dunce::simplified(&p).to_path_buf();
                entries.push(FolderEntry::new(token, NormalizedPath::new(p)));
            }
        };

        push("%UserProfile%", dirs::home_dir());
        push("%AppData%", dirs::config_dir());
        push("%LocalAppData%", dirs::data_local_dir());
        push("%Documents%", dirs::document_dir());
        push("%Desktop%", dirs::desktop_dir());
        push("%ProgramFiles%", env_path("ProgramFiles"));
        push("%ProgramFiles(x86)%", env_path("ProgramFiles(x86)"));
        push("%ProgramData%", env_path("ProgramData"));
        push("%SystemRoot%", env_path("SystemRoot"));
        push("%SystemDrive%", env_path("SystemDrive"));

        Self::build(entries)
    }

    /// Build a table from explicit token/path pairs.
    pub fn from_pairs<I, T, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (T, P)>,
        T: Into<String>,
        P: AsRef<std::path::Path>,
    {
        let entries = pairs
            .into_iter()
            .map(|(token, path)| FolderEntry::new(token, NormalizedPath::new(path)))
            .collect();
        Self::build(entries)
    }

    fn build(mut entries: Vec<FolderEntry>) -> Self {
        // Longer tokens first so nested token names never shadow each other.
        entries.sort_by(|a, b| b.token.len().cmp(&a.token.len()));
        Self { entries }
    }

    /// The resolved entries, longest token first.
    pub fn entries(&self) -> &[FolderEntry] {
        &self.entries
    }

    /// Replace every known token occurrence in `spec`, case-insensitively.
    ///
    /// Unknown tokens are left in place; [`SpecialFolders::has_token`] on
    /// the result tells whether expansion fully succeeded.
    pub fn expand(&self, spec: &str) -> String {
        let mut out = spec.to_string();
        for entry in &self.entries {
            if entry.pattern.is_match(&out) {
                out = entry
                    .pattern
                    .replace_all(&out, NoExpand(entry.resolved.as_str()))
                    .into_owned();
            }
        }
        out
    }

    /// Whether `text` still contains a `%Token%` placeholder.
    pub fn has_token(&self, text: &str) -> bool {
        TOKEN_PATTERN.is_match(text)
    }

    /// Map a concrete path to its portable key.
    ///
    /// The longest matching resolved folder wins, ties broken by separator
    /// count. Without a token match, a drive-rooted path becomes
    /// `<letter>/<remainder>` with the letter uppercased; anything else
    /// keeps the path itself, minus leading separators so the key never
    /// escapes the backup directory it is joined under.
    pub fn to_portable(&self, path: &str) -> String {
        let norm = NormalizedPath::new(path);
        let s = norm.as_str();

        let mut best: Option<(&FolderEntry, &str)> = None;
        for entry in &self.entries {
            let base = entry.resolved.as_str().trim_end_matches('/');
            if let Some(rest) = strip_prefix_ci(s, base) {
                let better = match best {
                    None => true,
                    Some((current, _)) => {
                        let cur = current.resolved.as_str().trim_end_matches('/');
                        (base.len(), separator_count(base))
                            > (cur.len(), separator_count(cur))
                    }
                };
                if better {
                    best = Some((entry, rest));
                }
            }
        }
        if let Some((entry, rest)) = best {
            return format!("{}{}", entry.token, rest);
        }

        let bytes = s.as_bytes();
        if bytes.len() >= 2
            && bytes[0].is_ascii_alphabetic()
            && bytes[1] == b':'
            && (bytes.len() == 2 || bytes[2] == b'/')
        {
            let drive = bytes[0].to_ascii_uppercase() as char;
            return format!("{}{}", drive, &s[2..]);
        }

        s.trim_start_matches('/').to_string()
    }

    /// Map a portable key back to a concrete path.
    ///
    /// Returns `None` for blank keys, keys whose token is unknown on this
    /// machine, and keys that carry neither a token nor a drive-letter
    /// first segment.
    pub fn expand_key(&self, key: &str) -> Option<String> {
        if key.trim().is_empty() {
            return None;
        }
        if self.has_token(key) {
            let expanded = self.expand(key);
            if self.has_token(&expanded) {
                return None;
            }
            return Some(expanded);
        }
        let bytes = key.as_bytes();
        if bytes[0].is_ascii_alphabetic() && (bytes.len() == 1 || bytes[1] == b'/') {
            let drive = bytes[0].to_ascii_uppercase() as char;
            return Some(format!("{}:{}", drive, &key[1..]));
        }
        None
    }
}

/// Case-insensitive prefix strip that honours component boundaries.
///
/// The remainder keeps its leading separator so keys concatenate cleanly.
/// An empty `base` stands for a filesystem root and matches any absolute
/// path.
fn strip_prefix_ci<'a>(path: &'a str, base: &str) -> Option<&'a str> {
    if base.is_empty() {
        return if path.starts_with('/') { Some(path) } else { None };
    }
    if path.len() < base.len() || !path.is_char_boundary(base.len()) {
        return None;
    }
    let (head, rest) = path.split_at(base.len());
    if !head.eq_ignore_ascii_case(base) {
        return None;
    }
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

fn separator_count(s: &str) -> usize {
    s.matches('/').count()
}

fn env_path(var: &str) -> Option<std::path::PathBuf> {
    std::env::var_os(var).map(std::path::PathBuf::from)
}
