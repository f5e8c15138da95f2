//! Path comparison for rules.
//!
//! Both sides are resolved to absolute, lexically normalized paths before
//! comparing. No filesystem access happens: symlinks are not followed and the
//! paths need not exist.

use std::borrow::Cow;
use std::path::{Component, MAIN_SEPARATOR_STR, Path, PathBuf};

use crate::rules::MatchMode;

/// Whether path comparison folds case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathCase {
    Sensitive,
    Insensitive,
}

impl PathCase {
    /// The convention of the platform we are running on.
    pub fn host() -> Self {
        if cfg!(windows) {
            PathCase::Insensitive
        } else {
            PathCase::Sensitive
        }
    }
}

/// Decides whether a working directory is covered by a rule path.
///
/// Holds only immutable settings, so one matcher can be shared freely
/// across threads.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    case: PathCase,
    /// Base for resolving relative paths.
    base: PathBuf,
    /// Expand a leading `~` to the home directory.
    expand_home: bool,
}

impl Default for PathMatcher {
    fn default() -> Self {
        Self::host()
    }
}

impl PathMatcher {
    /// Host case convention, relative paths resolved against the current
    /// directory as of this call.
    pub fn host() -> Self {
        let base = std::env::current_dir().unwrap_or_else(|_| PathBuf::from(MAIN_SEPARATOR_STR));
        Self {
            case: PathCase::host(),
            base,
            expand_home: false,
        }
    }

    pub fn with_case(mut self, case: PathCase) -> Self {
        self.case = case;
        self
    }

    pub fn with_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = base.into();
        self
    }

    pub fn with_home_expansion(mut self, expand: bool) -> Self {
        self.expand_home = expand;
        self
    }

    pub fn case(&self) -> PathCase {
        self.case
    }

    /// Absolute, normalized form of `path`, case-folded when the matcher is
    /// case-insensitive.
    pub fn normalize(&self, path: &str) -> String {
        let expanded = if self.expand_home {
            shellexpand::tilde(path)
        } else {
            Cow::Borrowed(path)
        };
        let raw = Path::new(expanded.as_ref());
        let absolute = if raw.is_absolute() {
            lexical_normalize(raw)
        } else {
            lexical_normalize(&self.base.join(raw))
        };
        let text = absolute.to_string_lossy();
        match self.case {
            PathCase::Sensitive => text.into_owned(),
            PathCase::Insensitive => text.to_lowercase(),
        }
    }

    /// Does `working_directory` satisfy a rule for `rule_path` under `mode`?
    ///
    /// `Prefix` containment is decided per path component, so `/a/b` covers
    /// `/a/b/c` but not `/a/b2`.
    pub fn matches(&self, rule_path: &str, working_directory: &str, mode: MatchMode) -> bool {
        let rule = self.normalize(rule_path);
        let dir = self.normalize(working_directory);
        match mode {
            MatchMode::Exact => rule == dir,
            MatchMode::Prefix => Path::new(&dir).strip_prefix(Path::new(&rule)).is_ok(),
        }
    }
}

/// [`PathMatcher::matches`] with the host matcher.
pub fn matches(rule_path: &str, working_directory: &str, mode: MatchMode) -> bool {
    PathMatcher::host().matches(rule_path, working_directory, mode)
}

/// Resolve `.` and `..` and drop redundant separators without touching the
/// filesystem. `..` never climbs above the root.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sensitive() -> PathMatcher {
        PathMatcher::host()
            .with_case(PathCase::Sensitive)
            .with_base("/home/dev")
    }

    fn insensitive() -> PathMatcher {
        sensitive().with_case(PathCase::Insensitive)
    }

    #[test]
    fn normalize_collapses_segments() {
        let m = sensitive();
        assert_eq!(m.normalize("/a//b/./c/"), "/a/b/c");
        assert_eq!(m.normalize("/a/b/../c"), "/a/c");
        assert_eq!(m.normalize("/../../a"), "/a");
        assert_eq!(m.normalize("/"), "/");
    }

    #[test]
    fn normalize_resolves_relative_against_base() {
        let m = sensitive();
        assert_eq!(m.normalize("proj"), "/home/dev/proj");
        assert_eq!(m.normalize("../other"), "/home/other");
        assert_eq!(m.normalize("."), "/home/dev");
    }

    #[test]
    fn normalize_folds_case_when_insensitive() {
        assert_eq!(insensitive().normalize("/Users/Alice"), "/users/alice");
        assert_eq!(sensitive().normalize("/Users/Alice"), "/Users/Alice");
    }

    #[test]
    fn exact_requires_same_location() {
        let m = sensitive();
        assert!(m.matches("/a/b", "/a/b", MatchMode::Exact));
        assert!(m.matches("/a/b/", "/a/./b", MatchMode::Exact));
        assert!(!m.matches("/a/b", "/a/b/c", MatchMode::Exact));
        assert!(!m.matches("/a/b", "/a", MatchMode::Exact));
    }

    #[test]
    fn prefix_respects_component_boundary() {
        let m = sensitive();
        assert!(m.matches("/a/b", "/a/b", MatchMode::Prefix));
        assert!(m.matches("/a/b", "/a/b/c", MatchMode::Prefix));
        assert!(m.matches("/a/b", "/a/b/c/d/e", MatchMode::Prefix));
        assert!(!m.matches("/a/b", "/a/b2", MatchMode::Prefix));
        assert!(!m.matches("/a/b", "/a", MatchMode::Prefix));
        assert!(!m.matches("/a/b", "/x/a/b", MatchMode::Prefix));
    }

    #[test]
    fn root_prefix_covers_everything() {
        let m = sensitive();
        assert!(m.matches("/", "/anything/at/all", MatchMode::Prefix));
    }

    #[test]
    fn case_handling() {
        assert!(!sensitive().matches("/Users/Alice/Proj", "/users/alice/proj", MatchMode::Exact));
        assert!(insensitive().matches("/Users/Alice/Proj", "/users/alice/proj", MatchMode::Exact));
        assert!(insensitive().matches("/Users/Alice", "/users/alice/proj", MatchMode::Prefix));
    }

    #[test]
    fn home_expansion() {
        let Some(home) = std::env::var_os("HOME") else {
            return;
        };
        let home = home.to_string_lossy().into_owned();
        let m = sensitive().with_home_expansion(true);
        assert!(m.matches("~/proj", &format!("{home}/proj/src"), MatchMode::Prefix));
        // Without expansion `~` is an ordinary relative component.
        let plain = sensitive();
        assert_eq!(plain.normalize("~/proj"), "/home/dev/~/proj");
    }
}
