//! Displayable resource cache.
//!
//! One live resource per surface. Asking again with the same version returns
//! the same handle; a new version disposes the old handle first, then creates
//! a fresh one. Every handle is disposed exactly once.

use crate::error::CacheError;
use crate::synth::Artifact;
use crate::version::VersionToken;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Backend that turns an artifact into something a surface can display.
pub trait ResourceProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Materialize `artifact` for `surface`. Returns the resource URI.
    fn create(&self, surface: &str, artifact: &Artifact) -> Result<String, CacheError>;

    fn dispose(&self, uri: &str) -> Result<(), CacheError>;
}

#[derive(Debug)]
pub struct ResourceHandle {
    surface: String,
    version: VersionToken,
    digest: String,
    uri: String,
    disposed: AtomicBool,
}

impl ResourceHandle {
    pub fn surface(&self) -> &str {
        &self.surface
    }

    pub fn version(&self) -> VersionToken {
        self.version
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

pub struct ArtifactCache<P: ResourceProvider> {
    provider: P,
    entries: Mutex<HashMap<String, Arc<ResourceHandle>>>,
}

impl<P: ResourceProvider> ArtifactCache<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Arc<ResourceHandle>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Live handle for `surface` showing `artifact`.
    pub fn get_displayable_resource(
        &self,
        surface: &str,
        artifact: &Artifact,
    ) -> Result<Arc<ResourceHandle>, CacheError> {
        let mut entries = self.entries();
        if let Some(current) = entries.get(surface) {
            if current.version == artifact.version() && !current.is_disposed() {
                return Ok(current.clone());
            }
        }
        if let Some(previous) = entries.remove(surface) {
            self.dispose_handle(&previous);
        }

        let uri = self.provider.create(surface, artifact)?;
        let handle = Arc::new(ResourceHandle {
            surface: surface.to_string(),
            version: artifact.version(),
            digest: artifact.digest().to_string(),
            uri,
            disposed: AtomicBool::new(false),
        });
        tracing::debug!(
            provider = self.provider.name(),
            surface,
            version = %handle.version,
            "created displayable resource"
        );
        entries.insert(surface.to_string(), handle.clone());
        Ok(handle)
    }

    /// Current handle for `surface`, if any.
    pub fn current(&self, surface: &str) -> Option<Arc<ResourceHandle>> {
        self.entries().get(surface).cloned()
    }

    /// Dispose the handle for one surface.
    pub fn release(&self, surface: &str) -> bool {
        let removed = self.entries().remove(surface);
        match removed {
            Some(handle) => {
                self.dispose_handle(&handle);
                true
            }
            None => false,
        }
    }

    /// Dispose every outstanding handle. Returns how many were released.
    pub fn dispose_all(&self) -> usize {
        let drained: Vec<Arc<ResourceHandle>> = self.entries().drain().map(|(_, h)| h).collect();
        for handle in &drained {
            self.dispose_handle(handle);
        }
        drained.len()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn dispose_handle(&self, handle: &ResourceHandle) {
        if handle.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.provider.dispose(&handle.uri) {
            tracing::warn!("failed to dispose {}: {}", handle.uri, e);
        }
    }
}

impl<P: ResourceProvider> Drop for ArtifactCache<P> {
    fn drop(&mut self) {
        self.dispose_all();
    }
}

// ─── Providers ───────────────────────────────────────────────────────────────

/// Writes each artifact to an HTML file under a directory.
pub struct DirectoryProvider {
    root: PathBuf,
    _temp: Option<tempfile::TempDir>,
}

impl DirectoryProvider {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root, _temp: None })
    }

    /// Provider rooted in a fresh temp dir removed on drop.
    pub fn temporary() -> Result<Self, CacheError> {
        let temp = tempfile::Builder::new().prefix("interplay-").tempdir()?;
        Ok(Self {
            root: temp.path().to_path_buf(),
            _temp: Some(temp),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `{surface}-{surface hash}-{version}-{digest}.html`. The hash of the raw
    /// surface name keeps surfaces that sanitize alike apart.
    fn file_name(surface: &str, artifact: &Artifact) -> String {
        let safe: String = surface
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        let surface_hash = hex::encode(&Sha256::digest(surface.as_bytes())[..4]);
        let digest = &artifact.digest()[..artifact.digest().len().min(12)];
        format!("{}-{}-{}-{}.html", safe, surface_hash, artifact.version(), digest)
    }
}

impl ResourceProvider for DirectoryProvider {
    fn name(&self) -> &str {
        "directory"
    }

    fn create(&self, surface: &str, artifact: &Artifact) -> Result<String, CacheError> {
        let path = self.root.join(Self::file_name(surface, artifact));
        fs::write(&path, artifact.html()).map_err(|source| CacheError::Create {
            surface: surface.to_string(),
            source,
        })?;
        Ok(format!("file://{}", path.display()))
    }

    fn dispose(&self, uri: &str) -> Result<(), CacheError> {
        let path = Path::new(uri.strip_prefix("file://").unwrap_or(uri));
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CacheError::Dispose {
                uri: uri.to_string(),
                source,
            }),
        }
    }
}

/// Keeps documents in memory and counts lifecycle calls.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    documents: Mutex<HashMap<String, String>>,
    created: AtomicUsize,
    disposed: AtomicUsize,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn disposed(&self) -> usize {
        self.disposed.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn document(&self, uri: &str) -> Option<String> {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(uri)
            .cloned()
    }
}

impl ResourceProvider for MemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    fn create(&self, surface: &str, artifact: &Artifact) -> Result<String, CacheError> {
        let uri = format!("memory://{}/{}", surface, artifact.version());
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(uri.clone(), artifact.html().to_string());
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(uri)
    }

    fn dispose(&self, uri: &str) -> Result<(), CacheError> {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(uri);
        self.disposed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl<T: ResourceProvider + ?Sized> ResourceProvider for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn create(&self, surface: &str, artifact: &Artifact) -> Result<String, CacheError> {
        (**self).create(surface, artifact)
    }

    fn dispose(&self, uri: &str) -> Result<(), CacheError> {
        (**self).dispose(uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentBuilder;

    fn artifact(version: u64, body: &str) -> Artifact {
        Artifact::new(
            VersionToken::from_millis(version),
            DocumentBuilder::new("t").structure(body).build(),
        )
    }

    #[test]
    fn test_same_version_returns_same_handle() {
        let cache = ArtifactCache::new(MemoryProvider::new());
        let a = artifact(1, "<p>a</p>");
        let first = cache.get_displayable_resource("editor", &a).unwrap();
        let second = cache.get_displayable_resource("editor", &a).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.provider().created(), 1);
    }

    #[test]
    fn test_new_version_disposes_previous_exactly_once() {
        let cache = ArtifactCache::new(MemoryProvider::new());
        let old = cache
            .get_displayable_resource("editor", &artifact(1, "<p>a</p>"))
            .unwrap();
        let new = cache
            .get_displayable_resource("editor", &artifact(2, "<p>b</p>"))
            .unwrap();
        assert!(old.is_disposed());
        assert!(!new.is_disposed());
        assert_eq!(cache.provider().disposed(), 1);
        assert_eq!(cache.provider().live(), 1);
        assert!(cache
            .provider()
            .document(new.uri())
            .unwrap()
            .contains("<p>b</p>"));

        cache.release("editor");
        cache.release("editor");
        assert_eq!(cache.provider().disposed(), 2);
    }

    #[test]
    fn test_surfaces_are_independent() {
        let cache = ArtifactCache::new(MemoryProvider::new());
        let a = artifact(1, "x");
        let editor = cache.get_displayable_resource("editor", &a).unwrap();
        let learner = cache.get_displayable_resource("learner", &a).unwrap();
        assert!(!Arc::ptr_eq(&editor, &learner));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_dispose_all_releases_everything() {
        let provider = Arc::new(MemoryProvider::new());
        {
            let cache = ArtifactCache::new(provider.clone());
            cache.get_displayable_resource("a", &artifact(1, "x")).unwrap();
            cache.get_displayable_resource("b", &artifact(2, "y")).unwrap();
            assert_eq!(cache.dispose_all(), 2);
            assert!(cache.is_empty());
            cache.get_displayable_resource("c", &artifact(3, "z")).unwrap();
        }
        assert_eq!(provider.created(), 3);
        assert_eq!(provider.disposed(), 3);
        assert_eq!(provider.live(), 0);
    }

    #[test]
    fn test_directory_provider_writes_and_removes_files() {
        let provider = DirectoryProvider::temporary().unwrap();
        let root = provider.root().to_path_buf();
        let cache = ArtifactCache::new(provider);
        let handle = cache
            .get_displayable_resource("learner view", &artifact(7, "<p>hi</p>"))
            .unwrap();
        let path = PathBuf::from(handle.uri().trim_start_matches("file://"));
        assert!(path.starts_with(&root));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("learner_view-"), "{}", name);
        assert!(name.contains("-7-"), "{}", name);
        assert!(fs::read_to_string(&path).unwrap().contains("<p>hi</p>"));

        cache.get_displayable_resource("learner view", &artifact(8, "<p>bye</p>")).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_lookalike_surfaces_get_separate_files() {
        let cache = ArtifactCache::new(DirectoryProvider::temporary().unwrap());
        let a = artifact(3, "<p>same</p>");
        let spaced = cache.get_displayable_resource("a b", &a).unwrap();
        let underscored = cache.get_displayable_resource("a_b", &a).unwrap();
        assert_ne!(spaced.uri(), underscored.uri());

        cache.release("a b");
        let kept = PathBuf::from(underscored.uri().trim_start_matches("file://"));
        assert!(kept.exists());
        assert!(fs::read_to_string(&kept).unwrap().contains("<p>same</p>"));
    }
}
