//! Resource kinds and path classification.
//!
//! A path is tokenized into segments and scanned left to right for the
//! first segment naming a [`ResourceKind`]. The segment right after it is
//! the resource file: its stem is the name and whatever follows its last
//! `.` is the extension.

use std::fmt;
use std::str::FromStr;

use crate::error::ClassificationError;

/// The four resource collections of an Outlyer account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Alerts,
    Checks,
    Dashboards,
    Plugins,
}

impl ResourceKind {
    /// Every kind, in the order `.`/`all` expands to.
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Alerts,
        ResourceKind::Checks,
        ResourceKind::Dashboards,
        ResourceKind::Plugins,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Alerts => "alerts",
            ResourceKind::Checks => "checks",
            ResourceKind::Dashboards => "dashboards",
            ResourceKind::Plugins => "plugins",
        }
    }

    /// Exact, case-sensitive match of a single path segment.
    pub fn from_segment(segment: &str) -> Option<Self> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == segment)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ClassificationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ResourceKind::from_segment(s).ok_or_else(|| ClassificationError::NoKindSegment {
            path: s.to_string(),
        })
    }
}

/// Identity of one resource.
///
/// `name` never contains `/`. `extension` is empty or the text after the
/// last `.` of the resource file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub name: String,
    pub extension: String,
}

impl ResourceRef {
    /// Classify a local path.
    pub fn from_path(path: &str) -> Result<Self, ClassificationError> {
        let located = locate(path)?;
        let (name, extension) = split_extension(located.file);
        if name.is_empty() {
            return Err(ClassificationError::InvalidName {
                name: located.file.to_string(),
            });
        }
        Ok(ResourceRef {
            kind: located.kind,
            name: name.to_string(),
            extension: extension.to_string(),
        })
    }

    /// Identity of a document returned by the API under `remote_name`.
    ///
    /// Plugins are named after their file (`docker.py`). Every other kind is
    /// stored locally as `<name>.yaml`.
    pub fn for_document(kind: ResourceKind, remote_name: &str) -> Result<Self, ClassificationError> {
        validate_name(remote_name)?;
        let (name, extension) = match kind {
            ResourceKind::Plugins => split_extension(remote_name),
            _ => (remote_name, "yaml"),
        };
        if name.is_empty() {
            return Err(ClassificationError::InvalidName {
                name: remote_name.to_string(),
            });
        }
        Ok(ResourceRef {
            kind,
            name: name.to_string(),
            extension: extension.to_string(),
        })
    }

    /// `name.ext`, or `name` when there is no extension
    pub fn file_name(&self) -> String {
        if self.extension.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.name, self.extension)
        }
    }

    /// `kind/name`
    pub fn identity(&self) -> String {
        format!("{}/{}", self.kind, self.name)
    }

    /// `kind/name.ext`
    pub fn identity_with_extension(&self) -> String {
        format!("{}/{}", self.kind, self.file_name())
    }

    /// Name the API knows the resource by: the file name for plugins,
    /// the bare name otherwise.
    pub fn remote_name(&self) -> String {
        match self.kind {
            ResourceKind::Plugins => self.file_name(),
            _ => self.name.clone(),
        }
    }

    /// `/accounts/{account}/{kind}`
    pub fn collection_path(&self, account: &str) -> String {
        collection_path(account, self.kind)
    }

    /// `/accounts/{account}/{kind}/{remote name}`
    pub fn resource_path(&self, account: &str) -> String {
        format!("{}/{}", self.collection_path(account), self.remote_name())
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identity_with_extension())
    }
}

/// `/accounts/{account}/{kind}`
pub fn collection_path(account: &str, kind: ResourceKind) -> String {
    format!("/accounts/{}/{}", account, kind)
}

/// Reject names that cannot be used as a single file name.
pub fn validate_name(name: &str) -> Result<(), ClassificationError> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\\')
    {
        return Err(ClassificationError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Non-empty path segments, `.` segments dropped.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty() && *s != ".")
}

struct Located<'a> {
    kind: ResourceKind,
    file: &'a str,
    /// The resource file is the final segment of the path
    is_last: bool,
}

fn locate(path: &str) -> Result<Located<'_>, ClassificationError> {
    let mut iter = segments(path);
    let kind = iter
        .by_ref()
        .find_map(ResourceKind::from_segment)
        .ok_or_else(|| ClassificationError::NoKindSegment {
            path: path.to_string(),
        })?;
    let file = iter.next().ok_or_else(|| ClassificationError::MissingName {
        path: path.to_string(),
        kind: kind.to_string(),
    })?;
    Ok(Located {
        kind,
        file,
        is_last: iter.next().is_none(),
    })
}

fn split_extension(file: &str) -> (&str, &str) {
    match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, ext),
        _ => (file, ""),
    }
}

/// Kind of the first kind segment in `path`.
pub fn kind_of(path: &str) -> Result<ResourceKind, ClassificationError> {
    segments(path)
        .find_map(ResourceKind::from_segment)
        .ok_or_else(|| ClassificationError::NoKindSegment {
            path: path.to_string(),
        })
}

/// `(kind, name)` with the extension stripped.
pub fn identity_of(path: &str) -> Result<(ResourceKind, String), ClassificationError> {
    let r = ResourceRef::from_path(path)?;
    Ok((r.kind, r.name))
}

/// `(kind, name, extension)`.
pub fn identity_with_extension_of(
    path: &str,
) -> Result<(ResourceKind, String, String), ClassificationError> {
    let r = ResourceRef::from_path(path)?;
    Ok((r.kind, r.name, r.extension))
}

/// Final path segment, extension included. Empty for an empty path.
pub fn file_name_of(path: &str) -> &str {
    segments(path).last().unwrap_or("")
}

/// Whether `path` has the `…/(kind)/(name).(ext)` shape of a resource file.
pub fn is_resource_file_path(path: &str) -> bool {
    match locate(path) {
        Ok(located) => {
            let (name, ext) = split_extension(located.file);
            located.is_last && !name.is_empty() && !ext.is_empty()
        }
        Err(_) => false,
    }
}
