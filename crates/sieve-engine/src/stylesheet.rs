//! Cosmetic stylesheet synthesis
//!
//! Generated stylesheets live in a per-process directory below the
//! configured cache root:
//!
//! ```text
//! <cache_dir>/css/<pid>-<n>/default.css     user stylesheet + general selectors
//! <cache_dir>/css/<pid>-<n>/<host>.css      user stylesheet + host selectors + general selectors
//! ```
//!
//! Every write goes through a temporary file and a rename so a reader never
//! sees a partial sheet.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Declaration appended after the combined selector list.
pub const HIDING_DECLARATION: &str = "{display:none!important;}";

const DEFAULT_STYLESHEET: &str = "default.css";

static NEXT_INSTANCE: AtomicUsize = AtomicUsize::new(0);

/// Build stylesheet text: user content, then host selectors, then general
/// selectors, all under one hiding rule.
///
/// No hiding rule is written when there are no selectors at all.
pub fn render_stylesheet(user_content: Option<&str>, specific: &[&str], general: &str) -> String {
    let mut css = String::new();

    if let Some(user) = user_content.filter(|user| !user.is_empty()) {
        css.push_str(user);
        if !user.ends_with('\n') {
            css.push('\n');
        }
    }

    let mut selectors = specific.join(",");
    if !general.is_empty() {
        if !selectors.is_empty() {
            selectors.push(',');
        }
        selectors.push_str(general);
    }

    if !selectors.is_empty() {
        css.push_str(&selectors);
        css.push_str(HIDING_DECLARATION);
        css.push('\n');
    }

    css
}

/// Split a selector list at top-level commas. Commas inside brackets,
/// parentheses or quotes belong to the selector.
pub fn split_selectors(list: &str) -> Vec<String> {
    let mut selectors = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, ch) in list.char_indices() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None => match ch {
                '"' | '\'' => quote = Some(ch),
                '(' | '[' => depth += 1,
                ')' | ']' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    push_selector(&mut selectors, &list[start..i]);
                    start = i + 1;
                }
                _ => {}
            },
        }
    }
    push_selector(&mut selectors, &list[start..]);

    selectors
}

fn push_selector(selectors: &mut Vec<String>, raw: &str) {
    let selector = raw.trim();
    if !selector.is_empty() {
        selectors.push(selector.to_string());
    }
}

/// Read back the selectors hidden by a generated stylesheet.
///
/// Looks at the last line carrying the hiding declaration; anything before
/// it is user content.
pub fn read_hiding_selectors(path: impl AsRef<Path>) -> io::Result<Vec<String>> {
    let css = fs::read_to_string(path)?;
    let selectors = css
        .lines()
        .rev()
        .find_map(|line| line.trim_end().strip_suffix(HIDING_DECLARATION))
        .map(split_selectors)
        .unwrap_or_default();
    Ok(selectors)
}

/// Write `contents` to `path` through a sibling temporary file.
pub fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, contents)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

/// Per-engine directory of generated stylesheets. Removed on drop.
#[derive(Debug)]
pub struct StylesheetCache {
    dir: PathBuf,
    default_path: PathBuf,
    hosts: HashMap<String, PathBuf>,
}

impl StylesheetCache {
    /// Create `<cache_root>/css/<pid>-<n>/`, owner-only on unix. `n` counts
    /// caches created by this process, so engines never share a directory.
    pub fn create(cache_root: &Path) -> io::Result<Self> {
        let instance = NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed);
        let dir = cache_root
            .join("css")
            .join(format!("{}-{}", std::process::id(), instance));
        // Left behind by an earlier process with the same pid
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        create_private_dir(&dir)?;
        log::debug!("stylesheet cache at {}", dir.display());

        Ok(Self {
            default_path: dir.join(DEFAULT_STYLESHEET),
            dir,
            hosts: HashMap::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn default_path(&self) -> &Path {
        &self.default_path
    }

    pub fn host_path(&self, host: &str) -> PathBuf {
        self.dir.join(format!("{host}.css"))
    }

    /// A previously generated stylesheet for `host` that is still on disk.
    pub fn cached(&mut self, host: &str) -> Option<PathBuf> {
        if let Some(path) = self.hosts.get(host) {
            if path.is_file() {
                return Some(path.clone());
            }
            self.hosts.remove(host);
        }

        let path = self.host_path(host);
        if path.is_file() {
            self.hosts.insert(host.to_string(), path.clone());
            return Some(path);
        }
        None
    }

    pub fn write_default(&self, css: &str) -> io::Result<()> {
        write_atomic(&self.default_path, css)
    }

    pub fn store(&mut self, host: &str, css: &str) -> io::Result<PathBuf> {
        let path = self.host_path(host);
        write_atomic(&path, css)?;
        self.hosts.insert(host.to_string(), path.clone());
        Ok(path)
    }

    /// Delete every per-host stylesheet. The default sheet stays.
    pub fn invalidate_hosts(&mut self) {
        self.hosts.clear();

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("cannot list {}: {}", self.dir.display(), e);
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path == self.default_path {
                continue;
            }
            if let Err(e) = fs::remove_file(&path) {
                log::warn!("cannot remove {}: {}", path.display(), e);
            }
        }
    }
}

impl Drop for StylesheetCache {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.dir) {
            if e.kind() != io::ErrorKind::NotFound {
                log::warn!("cannot remove {}: {}", self.dir.display(), e);
            }
        }
    }
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::{DirBuilderExt, PermissionsExt};

    fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)?;
    // mode() is filtered through the umask
    fs::set_permissions(dir, fs::Permissions::from_mode(0o700))
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}
