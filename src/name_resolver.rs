/// Collision-free destination naming.
///
/// A destination is free when nothing exists at that path on disk and no
/// earlier file in the same run has been assigned it. Duplicates are tagged
/// with `_dup` before the extension; any remaining clash gets an increasing
/// number (`_dup1`, `_dup2`, ... for duplicates, `_1`, `_2`, ... otherwise).
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Hands out unique destination paths for one run.
#[derive(Debug, Default)]
pub struct NameResolver {
    claimed: HashSet<PathBuf>,
}

impl NameResolver {
    /// Creates a resolver with nothing claimed yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `desired` to a free path and claims it.
    ///
    /// # Examples
    ///
    /// ```
    /// use file_collector::name_resolver::NameResolver;
    /// use std::path::{Path, PathBuf};
    ///
    /// let mut resolver = NameResolver::new();
    /// let out = Path::new("/nonexistent/out/Images_2024-01-01");
    /// assert_eq!(resolver.resolve(&out.join("a.jpg"), false), out.join("a.jpg"));
    /// assert_eq!(resolver.resolve(&out.join("a.jpg"), true), out.join("a_dup.jpg"));
    /// assert_eq!(resolver.resolve(&out.join("a.jpg"), true), out.join("a_dup1.jpg"));
    /// assert_eq!(resolver.resolve(&out.join("a.jpg"), false), out.join("a_1.jpg"));
    /// ```
    pub fn resolve(&mut self, desired: &Path, is_duplicate: bool) -> PathBuf {
        let resolved = if is_duplicate {
            self.first_free(desired, "_dup", true)
        } else if self.is_taken(desired) {
            self.first_free(desired, "_", false)
        } else {
            desired.to_path_buf()
        };

        self.claimed.insert(resolved.clone());
        resolved
    }

    /// Returns true if the path has been handed out in this run.
    pub fn is_claimed(&self, path: &Path) -> bool {
        self.claimed.contains(path)
    }

    /// Number of paths handed out so far.
    pub fn claimed_count(&self) -> usize {
        self.claimed.len()
    }

    fn is_taken(&self, path: &Path) -> bool {
        // symlink_metadata so a dangling link still counts as occupied
        self.claimed.contains(path) || path.symlink_metadata().is_ok()
    }

    /// Tries `<stem><tag><ext>` (when `bare_tag` is set), then
    /// `<stem><tag>1<ext>`, `<stem><tag>2<ext>`, ...
    fn first_free(&self, desired: &Path, tag: &str, bare_tag: bool) -> PathBuf {
        if bare_tag {
            let candidate = with_suffix(desired, tag);
            if !self.is_taken(&candidate) {
                return candidate;
            }
        }

        let mut counter: u64 = 1;
        loop {
            let candidate = with_suffix(desired, &format!("{}{}", tag, counter));
            if !self.is_taken(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }
}

/// Inserts `suffix` between the file stem and its extension.
///
/// `photo.jpg` + `_dup` is `photo_dup.jpg`; `backup.tar.gz` becomes
/// `backup.tar_dup.gz`; `README` becomes `README_dup`.
/// The name is assembled from raw OS strings, so bytes that are not valid
/// UTF-8 are carried over unchanged.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_stem().map(OsStr::to_os_string).unwrap_or_default();
    name.push(suffix);
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    path.with_file_name(name)
}
