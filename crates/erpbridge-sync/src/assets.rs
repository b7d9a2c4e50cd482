//! Image import: resolves ERP image references to stored assets.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use erpbridge_core::{AppConfig, AssetId, AssetStore, EntryId};
use reqwest::Url;
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportedImages {
    pub primary: Option<AssetId>,
    pub gallery: Vec<AssetId>,
}

#[derive(Debug, Error)]
enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("not found in source or fallback directory")]
    Missing,
    #[error("refusing path outside the image directories")]
    UnsafePath,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Asset lookup key for a reference: the basename with any query string,
/// fragment and extension removed.
///
/// `https://cdn.example.com/img/utp6.jpg?v=2` and `utp6.jpg` share the title
/// `utp6`, so re-syncs reuse the stored asset whichever form the ERP sends.
#[must_use]
pub fn normalized_title(reference: &str) -> String {
    let without_query = reference
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim();
    let basename = without_query
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    match basename.rfind('.') {
        Some(idx) if idx > 0 => basename[..idx].to_string(),
        _ => basename.to_string(),
    }
}

fn remote_url(reference: &str) -> Option<Url> {
    Url::parse(reference)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}

/// Filename to store a reference under.
fn stored_filename(reference: &str) -> String {
    let without_query = reference.split(['?', '#']).next().unwrap_or_default();
    without_query
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("image")
        .to_string()
}

/// Fetches image bytes from a URL or from the local image directories.
#[derive(Debug, Clone)]
pub struct AssetImporter {
    client: reqwest::Client,
    source_dir: PathBuf,
    fallback_dir: PathBuf,
}

impl AssetImporter {
    /// # Errors
    ///
    /// Returns [`reqwest::Error`] if the HTTP client cannot be built.
    pub fn new(
        source_dir: impl Into<PathBuf>,
        fallback_dir: impl Into<PathBuf>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            source_dir: source_dir.into(),
            fallback_dir: fallback_dir.into(),
        })
    }

    /// # Errors
    ///
    /// Returns [`reqwest::Error`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, reqwest::Error> {
        Self::new(
            config.image_source_dir.clone(),
            config.image_fallback_dir.clone(),
            config.image_timeout_secs,
            &config.erp_user_agent,
        )
    }

    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, FetchError> {
        match remote_url(reference) {
            Some(url) => self.fetch_remote(url).await,
            None => self.read_local(reference).await,
        }
    }

    async fn fetch_remote(&self, url: Url) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn read_local(&self, reference: &str) -> Result<Vec<u8>, FetchError> {
        let relative = Path::new(reference.trim());
        let safe = relative.components().count() > 0
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(FetchError::UnsafePath);
        }

        for dir in [&self.source_dir, &self.fallback_dir] {
            match tokio::fs::read(dir.join(relative)).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Err(FetchError::Missing)
    }
}

/// An importer paired with the store its assets are written to.
#[derive(Clone)]
pub struct ImageSync {
    importer: AssetImporter,
    assets: Arc<dyn AssetStore>,
}

impl ImageSync {
    #[must_use]
    pub fn new(importer: AssetImporter, assets: Arc<dyn AssetStore>) -> Self {
        Self { importer, assets }
    }

    /// Resolves every reference in order. The first one that resolves becomes
    /// the primary image and the rest form the gallery. References that fail
    /// to resolve are skipped with a warning.
    pub async fn import_images(&self, entry_id: EntryId, refs: &[String]) -> ImportedImages {
        let mut imported = ImportedImages::default();
        for reference in refs {
            let reference = reference.trim();
            if reference.is_empty() {
                continue;
            }
            let Some(asset_id) = self.import_one(entry_id, reference).await else {
                continue;
            };
            if imported.primary.is_none() {
                imported.primary = Some(asset_id);
            } else if Some(asset_id) != imported.primary && !imported.gallery.contains(&asset_id) {
                imported.gallery.push(asset_id);
            }
        }
        imported
    }

    async fn import_one(&self, entry_id: EntryId, reference: &str) -> Option<AssetId> {
        let title = normalized_title(reference);
        if title.is_empty() {
            tracing::warn!(entry_id, reference, "skipping image reference with no filename");
            return None;
        }

        match self.assets.find_by_title(&title).await {
            Ok(Some(existing)) => return Some(existing),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(entry_id, reference, error = %e, "asset lookup failed");
                return None;
            }
        }

        let bytes = match self.importer.fetch(reference).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(entry_id, reference, error = %e, "skipping image");
                return None;
            }
        };

        match self
            .assets
            .store_asset(entry_id, &stored_filename(reference), &title, &bytes)
            .await
        {
            Ok(id) => {
                tracing::debug!(entry_id, asset_id = id, reference, "imported image");
                Some(id)
            }
            Err(e) => {
                tracing::warn!(entry_id, reference, error = %e, "storing image failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_strips_path_query_and_extension() {
        assert_eq!(normalized_title("utp6.jpg"), "utp6");
        assert_eq!(normalized_title("https://cdn.example.com/img/utp6.jpg?v=2"), "utp6");
        assert_eq!(normalized_title("sub/dir/domo.tar.png"), "domo.tar");
        assert_eq!(normalized_title(".hidden"), ".hidden");
        assert_eq!(normalized_title("noext"), "noext");
        assert_eq!(normalized_title(""), "");
    }

    #[test]
    fn only_http_urls_are_remote() {
        assert!(remote_url("https://example.com/a.jpg").is_some());
        assert!(remote_url("http://example.com/a.jpg").is_some());
        assert!(remote_url("file:///etc/passwd").is_none());
        assert!(remote_url("a.jpg").is_none());
    }

    #[test]
    fn stored_filename_is_the_basename() {
        assert_eq!(stored_filename("https://x.test/p/a.jpg?w=1"), "a.jpg");
        assert_eq!(stored_filename("a.jpg"), "a.jpg");
        assert_eq!(stored_filename("https://x.test/"), "image");
    }

    #[tokio::test]
    async fn local_read_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let importer = AssetImporter::new(dir.path(), dir.path(), 5, "test").unwrap();
        assert!(matches!(
            importer.read_local("../secret.jpg").await,
            Err(FetchError::UnsafePath)
        ));
        assert!(matches!(
            importer.read_local("/etc/passwd").await,
            Err(FetchError::UnsafePath)
        ));
        assert!(matches!(
            importer.read_local("missing.jpg").await,
            Err(FetchError::Missing)
        ));
    }
}
