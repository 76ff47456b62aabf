//! Turns command-line arguments into the set of resources to sync.
//!
//! Apply takes local paths: files, kind directories (`dir/alerts`) or
//! parent directories holding kind directories (`dir`). Export takes
//! selectors: a kind, a `kind/name`, or `.`/`all` for every kind.
//! Both fail with [`ResolveError::NoResources`] when nothing is left.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::error::ResolveError;
use crate::resource::{self, ResourceKind};
use crate::store::{join, FileStore};

/// Expand apply arguments into a deduplicated list of resource file paths.
///
/// Order follows the arguments, then the sorted directory listing. File
/// arguments without a `(kind)/(name).(ext)` shape are dropped.
pub fn resolve_paths(args: &[String], store: &dyn FileStore) -> Result<Vec<String>, ResolveError> {
    let mut paths = Vec::new();

    for arg in args {
        if !store.exists(arg) {
            return Err(ResolveError::NoSuchPath(arg.clone()));
        }

        if !store.is_dir(arg) {
            if resource::is_resource_file_path(arg) {
                paths.push(arg.clone());
            } else {
                debug!(path = %arg, "ignoring file outside a resource directory");
            }
            continue;
        }

        if resource::kind_of(arg).is_ok() {
            paths.extend(files_in(store, arg)?);
            continue;
        }

        for child in store.list_children(arg)? {
            let child_path = join(arg, &child);
            if ResourceKind::from_segment(&child).is_some() && store.is_dir(&child_path) {
                paths.extend(files_in(store, &child_path)?);
            }
        }
    }

    let mut seen = HashSet::new();
    paths.retain(|p| seen.insert(p.clone()));

    if paths.is_empty() {
        return Err(ResolveError::NoResources("apply"));
    }
    debug!(count = paths.len(), "resolved apply paths");
    Ok(paths)
}

/// Children of `dir` with the `(kind)/(name).(ext)` shape. A directory
/// nested below a kind directory yields nothing.
fn files_in(store: &dyn FileStore, dir: &str) -> Result<Vec<String>, ResolveError> {
    Ok(store
        .list_children(dir)?
        .into_iter()
        .map(|name| join(dir, &name))
        .filter(|path| !store.is_dir(path) && resource::is_resource_file_path(path))
        .collect())
}

/// One export request: a whole collection or a single resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExportSelector {
    pub kind: ResourceKind,
    /// Remote name; plugins include their extension (`docker.py`)
    pub name: Option<String>,
}

impl ExportSelector {
    pub fn collection(kind: ResourceKind) -> Self {
        ExportSelector { kind, name: None }
    }

    pub fn single(kind: ResourceKind, name: &str) -> Self {
        ExportSelector {
            kind,
            name: Some(name.to_string()),
        }
    }

    pub fn is_single(&self) -> bool {
        self.name.is_some()
    }

    /// API path of the export view for this selector.
    pub fn remote_path(&self, account: &str) -> String {
        let collection = resource::collection_path(account, self.kind);
        match &self.name {
            Some(name) => format!("{collection}/{name}?view=export"),
            None => format!("{collection}?view=export"),
        }
    }

    /// Directory the selected documents are written to.
    pub fn output_dir(&self, folder: &str) -> String {
        join(folder, self.kind.as_str())
    }
}

impl fmt::Display for ExportSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}/{}", self.kind, name),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl FromStr for ExportSelector {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| ResolveError::InvalidSelector {
            selector: s.to_string(),
            reason,
        };

        let trimmed = s.trim_start_matches("./").trim_end_matches('/');
        let (kind, name) = match trimmed.split_once('/') {
            Some((kind, name)) => (kind, Some(name)),
            None => (trimmed, None),
        };

        let kind = ResourceKind::from_segment(kind).ok_or_else(|| {
            invalid("expected alerts, checks, dashboards or plugins".to_string())
        })?;

        match name {
            Some(name) => {
                resource::validate_name(name).map_err(|e| invalid(e.to_string()))?;
                Ok(ExportSelector::single(kind, name))
            }
            None => Ok(ExportSelector::collection(kind)),
        }
    }
}

/// Parse export arguments.
///
/// `.` and `all` expand to every kind. A `kind/name` selector is dropped
/// when its whole kind is also requested.
pub fn resolve_selectors(args: &[String]) -> Result<Vec<ExportSelector>, ResolveError> {
    let mut selectors = Vec::new();
    for arg in args {
        if arg == "." || arg == "all" {
            selectors.extend(ResourceKind::ALL.into_iter().map(ExportSelector::collection));
        } else {
            selectors.push(arg.parse::<ExportSelector>()?);
        }
    }

    let whole_kinds: HashSet<ResourceKind> = selectors
        .iter()
        .filter(|s| !s.is_single())
        .map(|s| s.kind)
        .collect();

    let mut seen = HashSet::new();
    let resolved: Vec<ExportSelector> = selectors
        .into_iter()
        .filter(|s| !s.is_single() || !whole_kinds.contains(&s.kind))
        .filter(|s| seen.insert(s.clone()))
        .collect();

    if resolved.is_empty() {
        return Err(ResolveError::NoResources("export"));
    }
    Ok(resolved)
}

/// Output root for export, with `~` expanded to the home directory.
pub fn output_folder(flag: &str) -> Result<String, ResolveError> {
    expand_output_folder(flag, dirs::home_dir().as_deref())
}

/// Empty means the current directory. Trailing slashes are dropped.
pub fn expand_output_folder(flag: &str, home: Option<&Path>) -> Result<String, ResolveError> {
    let expanded = match flag.strip_prefix('~') {
        Some(rest) => {
            let home = home.ok_or(ResolveError::NoHomeDirectory)?;
            format!("{}{}", home.to_string_lossy(), rest)
        }
        None => flag.to_string(),
    };

    let trimmed = expanded.trim_end_matches('/');
    if trimmed.is_empty() && expanded.starts_with('/') {
        return Ok("/".to_string());
    }
    Ok(trimmed.to_string())
}
