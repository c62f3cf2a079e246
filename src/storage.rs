use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;

/// Flat key/value access to stored files (doctor photos, generated tickets).
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// `Ok(None)` when the key does not exist.
    async fn get_object(&self, key: &str) -> anyhow::Result<Option<Bytes>>;
    async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<()>;
}

/// Directory-backed store. Keys are relative paths below `root`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a key, refusing anything that could leave `root`.
    pub fn resolve(&self, key: &str) -> Option<PathBuf> {
        let rel = Path::new(key);
        if key.is_empty() || key.contains('\\') {
            return None;
        }
        if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return None;
        }
        Some(self.root.join(rel))
    }
}

#[async_trait]
impl AssetStore for LocalStore {
    async fn get_object(&self, key: &str) -> anyhow::Result<Option<Bytes>> {
        let Some(path) = self.resolve(key) else {
            return Ok(None);
        };
        match tokio::fs::read(&path).await {
            Ok(body) => Ok(Some(Bytes::from(body))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
        }
    }

    async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<()> {
        let path = self
            .resolve(key)
            .with_context(|| format!("invalid object key `{key}`"))?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create {}", parent.display()))?;
        }
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write {}", path.display()))
    }
}

/// Content type for a stored image, by file extension.
pub fn mime_from_ext(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> LocalStore {
        let dir = std::env::temp_dir().join(format!("hms-store-{name}-{}", std::process::id()));
        LocalStore::new(dir)
    }

    #[test]
    fn keys_cannot_escape_the_root() {
        let store = LocalStore::new("/srv/assets");
        assert_eq!(
            store.resolve("doctor/doc1.png"),
            Some(PathBuf::from("/srv/assets/doctor/doc1.png"))
        );
        assert_eq!(store.resolve("../etc/passwd"), None);
        assert_eq!(store.resolve("doctor/../../x"), None);
        assert_eq!(store.resolve("/etc/passwd"), None);
        assert_eq!(store.resolve("a\\b"), None);
        assert_eq!(store.resolve(""), None);
    }

    #[test]
    fn mime_by_extension() {
        assert_eq!(mime_from_ext("doc1.PNG"), "image/png");
        assert_eq!(mime_from_ext("a.jpeg"), "image/jpeg");
        assert_eq!(mime_from_ext("a.jpg"), "image/jpeg");
        assert_eq!(mime_from_ext("a.webp"), "image/webp");
        assert_eq!(mime_from_ext("README"), "application/octet-stream");
    }

    #[tokio::test]
    async fn put_then_get() {
        let store = scratch("roundtrip");
        store
            .put_object("tickets/t.png", Bytes::from_static(b"png"))
            .await
            .unwrap();
        let body = store.get_object("tickets/t.png").await.unwrap();
        assert_eq!(body.as_deref(), Some(&b"png"[..]));
        assert_eq!(store.get_object("tickets/missing.png").await.unwrap(), None);
        let _ = std::fs::remove_dir_all(store.root());
    }
}
