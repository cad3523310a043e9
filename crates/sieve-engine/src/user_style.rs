use std::fs;
use std::path::{Path, PathBuf};

/// The user's own stylesheet, merged at the top of every generated sheet.
///
/// Only local files are supported. A `file://` URI or a bare path is read
/// from disk; any other scheme is reported and ignored.
#[derive(Debug, Default)]
pub struct UserStylesheet {
    path: Option<PathBuf>,
    content: Option<String>,
}

impl UserStylesheet {
    pub fn from_uri(uri: Option<&str>) -> Self {
        let uri = match uri.map(str::trim).filter(|uri| !uri.is_empty()) {
            Some(uri) => uri,
            None => return Self::default(),
        };

        let path = match uri_scheme(uri) {
            Some(scheme) if scheme.eq_ignore_ascii_case("file") => {
                let rest = &uri[scheme.len() + 1..];
                PathBuf::from(rest.strip_prefix("//").unwrap_or(rest))
            }
            Some(scheme) => {
                log::warn!(
                    "user stylesheets with scheme {} are not supported with the adblocker",
                    scheme
                );
                return Self::default();
            }
            None => PathBuf::from(uri),
        };

        let content = read_stylesheet(&path);
        Self {
            path: Some(path),
            content,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Re-read the file. Returns `true` when its content changed.
    pub fn refresh(&mut self) -> bool {
        let path = match &self.path {
            Some(path) => path,
            None => return false,
        };

        let content = read_stylesheet(path);
        if content == self.content {
            return false;
        }
        log::info!("user stylesheet {} changed", path.display());
        self.content = content;
        true
    }
}

fn read_stylesheet(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) => {
            log::warn!("cannot read user stylesheet {}: {}", path.display(), e);
            None
        }
    }
}

/// The scheme of a URI, if it has one. Windows drive letters are not schemes.
fn uri_scheme(uri: &str) -> Option<&str> {
    let (scheme, _) = uri.split_once(':')?;
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    (valid && scheme.len() > 1).then_some(scheme)
}
