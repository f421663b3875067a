use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::info;

use crate::error::ServiceError;
use crate::model::InferenceBackend;

pub type BackendLoader =
    Box<dyn Fn(&Path) -> Result<Arc<dyn InferenceBackend>, ServiceError> + Send + Sync>;

/// Process-wide holder of the loaded model. The first `ensure_loaded` call
/// performs the load; every later call gets the cached handle back. The
/// `OnceCell` serializes concurrent first calls, so a large model is never
/// loaded twice, and a failed load leaves the cell empty so the next call
/// retries from scratch.
pub struct ModelStore {
    model_dir: PathBuf,
    loader: BackendLoader,
    handle: OnceCell<Arc<dyn InferenceBackend>>,
}

impl ModelStore {
    /// Store backed by the tch TorchScript loader (the production path).
    #[cfg(feature = "tch-backend")]
    pub fn new(model_dir: impl Into<PathBuf>, device: tch::Device) -> Self {
        Self::with_loader(
            model_dir,
            Box::new(move |dir| {
                let backend = crate::model::TchBackend::load(dir, device)?;
                Ok(Arc::new(backend) as Arc<dyn InferenceBackend>)
            }),
        )
    }

    /// Store with a caller-supplied loader. Used by tests and by anything
    /// that wants to plug in a different inference runtime.
    pub fn with_loader(model_dir: impl Into<PathBuf>, loader: BackendLoader) -> Self {
        Self {
            model_dir: model_dir.into(),
            loader,
            handle: OnceCell::new(),
        }
    }

    pub fn ensure_loaded(&self) -> Result<Arc<dyn InferenceBackend>, ServiceError> {
        self.handle
            .get_or_try_init(|| {
                if !self.model_dir.exists() {
                    return Err(ServiceError::ModelNotFound(self.model_dir.clone()));
                }
                info!(path = %self.model_dir.display(), "loading legal language model");
                let backend = (self.loader)(&self.model_dir)?;
                info!("model loaded");
                Ok(backend)
            })
            .cloned()
    }

    /// Reports whether a handle exists without triggering a load.
    pub fn is_loaded(&self) -> bool {
        self.handle.get().is_some()
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::model::GenerationParams;

    struct NoopBackend;

    impl InferenceBackend for NoopBackend {
        fn encode(&self, _: &str) -> Result<Vec<i64>, ServiceError> {
            Ok(vec![0])
        }
        fn generate(&self, ids: &[i64], _: &GenerationParams) -> Result<Vec<i64>, ServiceError> {
            Ok(ids.to_vec())
        }
        fn decode(&self, _: &[i64]) -> Result<String, ServiceError> {
            Ok(String::new())
        }
    }

    fn counting_loader(counter: Arc<AtomicUsize>) -> BackendLoader {
        Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(NoopBackend) as Arc<dyn InferenceBackend>)
        })
    }

    #[test]
    fn missing_path_fails_without_invoking_loader() {
        let loads = Arc::new(AtomicUsize::new(0));
        let store = ModelStore::with_loader(
            "/nonexistent/legal_lm_model_dir",
            counting_loader(loads.clone()),
        );

        let err = store.ensure_loaded().unwrap_err();
        assert!(matches!(err, ServiceError::ModelNotFound(_)));
        assert_eq!(loads.load(Ordering::SeqCst), 0);
        assert!(!store.is_loaded());
    }

    #[test]
    fn concurrent_first_calls_load_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let loads = Arc::new(AtomicUsize::new(0));
        let store = Arc::new(ModelStore::with_loader(
            dir.path(),
            counting_loader(loads.clone()),
        ));

        let threads = 8;
        let barrier = Arc::new(Barrier::new(threads));
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let store = store.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    store.ensure_loaded().map(|_| ())
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap().unwrap();
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(store.is_loaded());
    }

    #[test]
    fn failed_load_caches_nothing_and_retries() {
        let dir = tempfile::tempdir().unwrap();
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_in_loader = attempts.clone();
        let store = ModelStore::with_loader(
            dir.path(),
            Box::new(move |_| {
                if attempts_in_loader.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ServiceError::Generation("corrupt checkpoint".into()))
                } else {
                    Ok(Arc::new(NoopBackend) as Arc<dyn InferenceBackend>)
                }
            }),
        );

        assert!(store.ensure_loaded().is_err());
        assert!(!store.is_loaded());

        store.ensure_loaded().unwrap();
        assert!(store.is_loaded());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);

        // a third call reuses the cached handle
        store.ensure_loaded().unwrap();
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
