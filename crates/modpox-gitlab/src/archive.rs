//! Source archive rewriting.
//!
//! GitLab archives are rooted at `<project>-<ref>-<sha>/`; the module proxy
//! protocol requires `<module>@<version>/`. Entries are copied raw (still
//! compressed) under the new name, so contents are byte-identical.

use std::io::Cursor;

use modpox_upstream::UpstreamError;
use zip::{ZipArchive, ZipWriter};

/// Returns `<module>@<version>` for a `.zip` request key.
///
/// `/gitlab.example.com/team/svc/@v/v1.0.0.zip` →
/// `gitlab.example.com/team/svc@v1.0.0`.
pub fn module_root(key: &str) -> Result<String, UpstreamError> {
    let trimmed = key.trim_start_matches('/');
    let trimmed = trimmed
        .strip_suffix(".zip")
        .ok_or_else(|| UpstreamError::invalid_key(key))?;
    let (module, version) = trimmed
        .rsplit_once("/@v/")
        .ok_or_else(|| UpstreamError::invalid_key(key))?;
    if module.is_empty() || version.is_empty() {
        return Err(UpstreamError::invalid_key(key));
    }
    Ok(format!("{module}@{version}"))
}

/// Replaces the first path component of an entry name with `root`.
fn rename_entry(name: &str, root: &str) -> String {
    match name.split_once('/') {
        Some((_, rest)) => format!("{root}/{rest}"),
        None => root.to_string(),
    }
}

/// Re-roots every entry of `raw` under `root`.
pub fn rewrite_archive(raw: &[u8], root: &str) -> Result<Vec<u8>, UpstreamError> {
    let mut reader = ZipArchive::new(Cursor::new(raw)).map_err(UpstreamError::archive)?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for index in 0..reader.len() {
        let entry = reader.by_index_raw(index).map_err(UpstreamError::archive)?;
        let name = rename_entry(entry.name(), root);
        writer
            .raw_copy_file_rename(entry, name)
            .map_err(UpstreamError::archive)?;
    }

    let out = writer.finish().map_err(UpstreamError::archive)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use zip::write::SimpleFileOptions;

    fn build_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            if name.ends_with('/') {
                writer
                    .add_directory(name.trim_end_matches('/'), SimpleFileOptions::default())
                    .unwrap();
            } else {
                writer.start_file(*name, SimpleFileOptions::default()).unwrap();
                writer.write_all(content).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    fn read_archive(raw: &[u8]) -> Vec<(String, Vec<u8>)> {
        let mut reader = ZipArchive::new(Cursor::new(raw)).unwrap();
        (0..reader.len())
            .map(|i| {
                let mut file = reader.by_index(i).unwrap();
                let mut content = Vec::new();
                file.read_to_end(&mut content).unwrap();
                (file.name().to_string(), content)
            })
            .collect()
    }

    #[test]
    fn test_module_root() {
        assert_eq!(module_root("ns/proj/@v/v1.0.0.zip").unwrap(), "ns/proj@v1.0.0");
        assert_eq!(
            module_root("/gitlab.example.com/ns/proj/@v/v0.0.0-20210704090807-abcdef123456.zip")
                .unwrap(),
            "gitlab.example.com/ns/proj@v0.0.0-20210704090807-abcdef123456"
        );
        // The separator is found from the right.
        assert_eq!(
            module_root("/host/ns/proj/@v/sub/@v/v1.0.0.zip").unwrap(),
            "host/ns/proj/@v/sub@v1.0.0"
        );
        assert!(module_root("/host/ns/proj/@v/v1.0.0.mod").is_err());
        assert!(module_root("/host/ns/proj/v1.0.0.zip").is_err());
    }

    #[test]
    fn test_rewrite_preserves_paths_and_content() {
        let raw = build_archive(&[
            ("proj-v1.0.0-abcdef/", b""),
            ("proj-v1.0.0-abcdef/go.mod", b"module ns/proj\n"),
            ("proj-v1.0.0-abcdef/pkg/lib.go", b"package pkg\n"),
        ]);

        let rewritten = rewrite_archive(&raw, "ns/proj@v1.0.0").unwrap();
        let entries = read_archive(&rewritten);

        assert_eq!(entries.len(), 3);
        for (name, _) in &entries {
            assert!(name.starts_with("ns/proj@v1.0.0/"), "{name}");
        }
        assert_eq!(entries[1].0, "ns/proj@v1.0.0/go.mod");
        assert_eq!(entries[1].1, b"module ns/proj\n");
        assert_eq!(entries[2].0, "ns/proj@v1.0.0/pkg/lib.go");
        assert_eq!(entries[2].1, b"package pkg\n");
    }

    #[test]
    fn test_rewrite_rejects_garbage() {
        let err = rewrite_archive(b"not a zip", "ns/proj@v1.0.0").unwrap_err();
        assert!(matches!(err, UpstreamError::Archive(_)));
    }
}
