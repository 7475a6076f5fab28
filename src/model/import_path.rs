//! Import-path inference for files on disk, and the module-cache case
//! escaping it has to undo.

use std::io;
use std::path::Path;

use thiserror::Error;

/// Canonical import identifier of a file's package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportPath {
    pub path: String,
    /// The file lives under the dependency root
    pub external: bool,
}

/// The file could not be located. `path` is the path exactly as given.
#[derive(Debug, Error)]
#[error("cannot infer import path of {path}: {source}")]
pub struct ImportPathError {
    pub path: String,
    #[source]
    pub source: io::Error,
}

/// Derives the import path of the package containing `file`.
///
/// Files below `dependency_root` yield the module-relative import path with
/// any `@version` and file name removed and case escaping reversed. Anything
/// else yields its containing directory.
pub fn infer(file: &str, dependency_root: Option<&Path>) -> Result<ImportPath, ImportPathError> {
    let fail = |source| ImportPathError {
        path: file.to_owned(),
        source,
    };

    let abs = std::path::absolute(file).map_err(fail)?;
    std::fs::metadata(&abs).map_err(fail)?;
    let abs = slashed(&abs);

    let root = dependency_root.map(|r| {
        let mut r = slashed(r);
        while r.len() > 1 && r.ends_with('/') {
            r.pop();
        }
        r
    });

    let rest = match root.as_deref().and_then(|r| strip_root(&abs, r)) {
        Some(rest) => rest,
        None => {
            let dir = match abs.rfind('/') {
                Some(i) => &abs[..i],
                None => "",
            };
            return Ok(ImportPath {
                path: dir.to_owned(),
                external: false,
            });
        }
    };

    let mut path = rest;
    path = path.strip_prefix("/src/").unwrap_or(path);
    path = path.strip_prefix("/pkg/mod/").unwrap_or(path);

    if let Some(i) = path.find('@').filter(|&i| i > 0) {
        path = &path[..i];
    }

    if path.to_ascii_lowercase().ends_with(".go") {
        if let Some(i) = path.rfind('/').filter(|&i| i > 0) {
            path = &path[..i];
        }
    }

    let mut path = unescape(path);
    if path.ends_with('/') {
        path.pop();
    }

    Ok(ImportPath {
        path,
        external: true,
    })
}

fn slashed(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn strip_root<'a>(abs: &'a str, root: &str) -> Option<&'a str> {
    let rest = abs.strip_prefix(root)?;
    (rest.is_empty() || rest.starts_with('/') || root.ends_with('/')).then_some(rest)
}

/// Reverses module-cache case escaping: `!x` becomes `X`.
///
/// Each marker is consumed exactly once; a string without markers comes back
/// unchanged.
pub fn unescape(path: &str) -> String {
    if !path.contains('!') {
        return path.to_owned();
    }
    let mut out = String::with_capacity(path.len());
    let mut upper = false;
    for c in path.chars() {
        if c == '!' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Module-cache case escaping: every upper-case letter becomes `!` plus its
/// lower-case form.
pub fn escape(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 4);
    for c in path.chars() {
        if c.is_uppercase() {
            out.push('!');
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
