//! Request key parsing for the private host.

use modpox_upstream::UpstreamError;

const VERSION_SEPARATOR: &str = "/@v/";

/// What a module proxy request asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    List,
    Latest,
    Info(String),
    Mod(String),
    Zip(String),
    /// A path under the private host with no protocol meaning.
    Unsupported,
}

/// A parsed request for a module hosted on the private host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRequest {
    /// Full module path, host included.
    pub module: String,
    /// `namespace/project` of the backing repository.
    pub project: String,
    pub kind: RequestKind,
}

/// Splits `<module>/@v/<file>` at the last separator.
fn split_version(path: &str) -> Option<(&str, &str)> {
    let index = path.rfind(VERSION_SEPARATOR)?;
    Some((&path[..index], &path[index + VERSION_SEPARATOR.len()..]))
}

fn project_path(key: &str, module: &str) -> Result<String, UpstreamError> {
    // module = <host>/<namespace>/<project>[/<subpath>]
    let mut segments = module.split('/').skip(1);
    match (segments.next(), segments.next()) {
        (Some(namespace), Some(project)) if !namespace.is_empty() && !project.is_empty() => {
            Ok(format!("{namespace}/{project}"))
        }
        _ => Err(UpstreamError::invalid_key(key)),
    }
}

/// Returns `true` if `key` is addressed to `host`.
pub fn is_private(host: &str, key: &str) -> bool {
    key.strip_prefix('/')
        .and_then(|rest| rest.strip_prefix(host))
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Parses a key already known to be under the private host.
pub fn parse_request(key: &str) -> Result<ModuleRequest, UpstreamError> {
    let path = key
        .strip_prefix('/')
        .ok_or_else(|| UpstreamError::invalid_key(key))?;

    let (module, kind) = if let Some(module) = path.strip_suffix("/@latest") {
        (module, RequestKind::Latest)
    } else if let Some((module, file)) = split_version(path) {
        let kind = if file == "list" {
            RequestKind::List
        } else if let Some(version) = file.strip_suffix(".zip") {
            RequestKind::Zip(version.to_string())
        } else if let Some(version) = file.strip_suffix(".info") {
            RequestKind::Info(version.to_string())
        } else if let Some(version) = file.strip_suffix(".mod") {
            RequestKind::Mod(version.to_string())
        } else {
            RequestKind::Unsupported
        };
        (module, kind)
    } else {
        (path, RequestKind::Unsupported)
    };

    if matches!(
        &kind,
        RequestKind::Info(v) | RequestKind::Mod(v) | RequestKind::Zip(v) if v.is_empty()
    ) {
        return Err(UpstreamError::invalid_key(key));
    }

    Ok(ModuleRequest {
        module: module.to_string(),
        project: project_path(key, module)?,
        kind,
    })
}
