//! The subset of `go.mod` the resolvers need.

use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoMod {
    /// Directory holding the `go.mod` file
    pub dir: PathBuf,
    pub module: String,
    /// Required module path to version
    pub requires: IndexMap<String, String>,
    pub replaces: Vec<Replace>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replace {
    pub old: String,
    pub old_version: Option<String>,
    pub new: String,
    pub new_version: Option<String>,
}

impl Replace {
    /// A replacement by a directory rather than another module.
    pub fn is_local(&self) -> bool {
        self.new.starts_with("./") || self.new.starts_with("../") || Path::new(&self.new).is_absolute()
    }
}

impl GoMod {
    /// Reads the nearest `go.mod` in `start` or one of its ancestors.
    pub fn find(start: &Path) -> io::Result<Option<Self>> {
        let start = std::path::absolute(start)?;
        for dir in start.ancestors() {
            let file = dir.join("go.mod");
            match fs::read_to_string(&file) {
                Ok(text) => return Ok(Some(Self::parse(dir, &text))),
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(None)
    }

    pub fn parse(dir: &Path, text: &str) -> Self {
        let mut gomod = Self {
            dir: dir.to_owned(),
            module: String::new(),
            requires: IndexMap::new(),
            replaces: Vec::new(),
        };

        let mut block: Option<String> = None;
        for line in text.lines() {
            let line = match line.find("//") {
                Some(i) => &line[..i],
                None => line,
            };
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let Some(&first) = tokens.first() else { continue };

            if let Some(verb) = &block {
                if first == ")" {
                    block = None;
                } else {
                    gomod.directive(verb, &tokens);
                }
                continue;
            }
            if tokens.get(1) == Some(&"(") {
                block = Some(first.to_owned());
                continue;
            }
            gomod.directive(first, &tokens[1..]);
        }
        gomod
    }

    fn directive(&mut self, verb: &str, args: &[&str]) {
        let unquote = |s: &str| s.trim_matches('"').to_owned();
        match (verb, args) {
            ("module", [path, ..]) => self.module = unquote(path),
            ("require", [path, version, ..]) => {
                self.requires.insert(unquote(path), unquote(version));
            }
            ("replace", _) => {
                let Some(arrow) = args.iter().position(|a| *a == "=>") else {
                    return;
                };
                let (lhs, rhs) = (&args[..arrow], &args[arrow + 1..]);
                let (Some(old), Some(new)) = (lhs.first(), rhs.first()) else {
                    return;
                };
                self.replaces.push(Replace {
                    old: unquote(old),
                    old_version: lhs.get(1).map(|v| unquote(v)),
                    new: unquote(new),
                    new_version: rhs.get(1).map(|v| unquote(v)),
                });
            }
            _ => {}
        }
    }

    /// Subdirectory of the module for `path`, if it belongs to this module.
    pub fn local_dir(&self, path: &str) -> Option<PathBuf> {
        if self.module.is_empty() {
            return None;
        }
        if path == self.module {
            return Some(self.dir.clone());
        }
        let rest = path.strip_prefix(&self.module)?.strip_prefix('/')?;
        Some(self.dir.join(rest))
    }

    /// Directory for `path` under a local `replace` target.
    pub fn replaced_dir(&self, path: &str) -> Option<PathBuf> {
        self.replaces.iter().filter(|r| r.is_local()).find_map(|r| {
            let rest = module_suffix(path, &r.old)?;
            let base = self.dir.join(&r.new);
            Some(if rest.is_empty() { base } else { base.join(rest) })
        })
    }

    /// The module `path` should be looked up as, with its version if known,
    /// after applying module replacements.
    pub fn module_for(&self, module: &str) -> (String, Option<String>) {
        let version = self.requires.get(module).cloned();
        let replaced = self.replaces.iter().find(|r| {
            !r.is_local() && r.old == module && (r.old_version.is_none() || r.old_version == version)
        });
        match replaced {
            Some(r) => (r.new.clone(), r.new_version.clone().or(version)),
            None => (module.to_owned(), version),
        }
    }
}

/// What is left of `path` after the module prefix `module`, if `path` is in it.
pub fn module_suffix<'a>(path: &'a str, module: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(module)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix('/')
    }
}

/// Orders module versions by semantic version precedence.
///
/// Releases sort after their pre-releases; pseudo-versions, being
/// pre-releases, sort by their timestamp suffix. Unparsable versions sort
/// before everything else.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (parse_version(a), parse_version(b)) {
        (Some(x), Some(y)) => x
            .core
            .cmp(&y.core)
            .then_with(|| match (x.pre, y.pre) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(p), Some(q)) => compare_prerelease(p, q),
            }),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

struct Version<'a> {
    core: (u64, u64, u64),
    pre: Option<&'a str>,
}

fn parse_version(v: &str) -> Option<Version<'_>> {
    let v = v.strip_prefix('v')?;
    let v = v.split('+').next().unwrap_or(v);
    let (core, pre) = match v.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (v, None),
    };
    let mut nums = core.split('.').map(|n| n.parse::<u64>().ok());
    let major = nums.next()??;
    let minor = nums.next().unwrap_or(Some(0))?;
    let patch = nums.next().unwrap_or(Some(0))?;
    Some(Version {
        core: (major, minor, patch),
        pre,
    })
}

fn compare_prerelease(a: &str, b: &str) -> Ordering {
    let mut xs = a.split('.');
    let mut ys = b.split('.');
    loop {
        match (xs.next(), ys.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(m), Ok(n)) => m.cmp(&n),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GO_MOD: &str = r#"
module example.com/app // main module

go 1.22

require github.com/pkg/errors v0.9.1

require (
	golang.org/x/text v0.14.0
	github.com/BurntSushi/toml v1.3.2 // indirect
)

replace example.com/lib => ../lib

replace (
	golang.org/x/text v0.14.0 => golang.org/x/text v0.15.0
)
"#;

    #[test]
    fn parses_directives() {
        let gomod = GoMod::parse(Path::new("/w/app"), GO_MOD);
        assert_eq!(gomod.module, "example.com/app");
        assert_eq!(gomod.requires.get("github.com/pkg/errors").map(String::as_str), Some("v0.9.1"));
        assert_eq!(gomod.requires.get("github.com/BurntSushi/toml").map(String::as_str), Some("v1.3.2"));
        assert_eq!(gomod.replaces.len(), 2);
        assert!(gomod.replaces[0].is_local());
        assert_eq!(gomod.replaces[1].old_version.as_deref(), Some("v0.14.0"));
    }

    #[test]
    fn maps_paths_to_directories() {
        let gomod = GoMod::parse(Path::new("/w/app"), GO_MOD);
        assert_eq!(gomod.local_dir("example.com/app"), Some(PathBuf::from("/w/app")));
        assert_eq!(gomod.local_dir("example.com/app/internal/db"), Some(PathBuf::from("/w/app/internal/db")));
        assert_eq!(gomod.local_dir("example.com/application"), None);
        assert_eq!(gomod.replaced_dir("example.com/lib/x"), Some(PathBuf::from("/w/app/../lib/x")));
        assert_eq!(
            gomod.module_for("golang.org/x/text"),
            ("golang.org/x/text".to_owned(), Some("v0.15.0".to_owned()))
        );
        assert_eq!(gomod.module_for("github.com/pkg/errors").1.as_deref(), Some("v0.9.1"));
    }

    #[test]
    fn version_order() {
        let mut versions = vec!["v1.10.0", "v1.2.0", "v1.2.0-rc.1", "v0.0.0-20240101000000-abcdef", "v2.0.0+incompatible"];
        versions.sort_by(|a, b| compare_versions(a, b));
        assert_eq!(
            versions,
            vec!["v0.0.0-20240101000000-abcdef", "v1.2.0-rc.1", "v1.2.0", "v1.10.0", "v2.0.0+incompatible"]
        );
    }
}
