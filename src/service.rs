use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::AppResult;
use crate::snapshot::{ImportReport, Snapshot};
use crate::storage::SettingsStorage;
use crate::tokens::{
    FluidToken, RequestOutcome, RootUnitSize, SearchResults, StaticToken, TokenEntry,
    TokenRequest, TokenResult, TokenStore,
};
use crate::viewport::ViewportRange;

/// Owns the token store and its persistence.
///
/// Mutations hold the lock across the whole read-modify-save cycle, so
/// concurrent writers never lose each other's updates. A failed save rolls
/// the in-memory store back to its previous state.
pub struct TokenService<S> {
    store: Mutex<TokenStore>,
    storage: S,
}

impl<S: SettingsStorage> TokenService<S> {
    pub fn open(storage: S) -> AppResult<Self> {
        let settings = storage.load_settings()?;
        tracing::info!(
            fluid = settings.tokens.len(),
            statics = settings.static_tokens.len(),
            "loaded token settings"
        );
        Ok(Self {
            store: Mutex::new(TokenStore::from_settings(settings)),
            storage,
        })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn lock(&self) -> MutexGuard<'_, TokenStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn mutate<T>(&self, op: impl FnOnce(&mut TokenStore) -> TokenResult<T>) -> AppResult<T> {
        let mut store = self.lock();
        let previous = store.clone();
        let value = op(&mut *store)?;
        if let Err(err) = self.storage.save_settings(store.settings()) {
            tracing::warn!(%err, "failed to persist token settings; rolling back");
            *store = previous;
            return Err(err.into());
        }
        Ok(value)
    }

    /// Point-in-time copy of the store for lock-free reads.
    pub fn snapshot(&self) -> TokenStore {
        self.lock().clone()
    }

    pub fn apply(&self, request: TokenRequest) -> AppResult<RequestOutcome> {
        self.mutate(|store| store.apply(request))
    }

    pub fn add_fluid_token(&self, name: &str, min: f64, max: f64) -> AppResult<TokenEntry<FluidToken>> {
        self.mutate(|store| store.add_fluid_token(name, min, max))
    }

    pub fn edit_fluid_token(
        &self,
        original_name: &str,
        new_name: &str,
        min: f64,
        max: f64,
    ) -> AppResult<TokenEntry<FluidToken>> {
        self.mutate(|store| store.edit_fluid_token(original_name, new_name, min, max))
    }

    pub fn delete_fluid_token(&self, name: &str) -> AppResult<TokenEntry<FluidToken>> {
        self.mutate(|store| store.delete_fluid_token(name))
    }

    pub fn add_static_token(&self, name: &str, value: f64) -> AppResult<TokenEntry<StaticToken>> {
        self.mutate(|store| store.add_static_token(name, value))
    }

    pub fn edit_static_token(
        &self,
        original_name: &str,
        new_name: &str,
        value: f64,
    ) -> AppResult<TokenEntry<StaticToken>> {
        self.mutate(|store| store.edit_static_token(original_name, new_name, value))
    }

    pub fn delete_static_token(&self, name: &str) -> AppResult<TokenEntry<StaticToken>> {
        self.mutate(|store| store.delete_static_token(name))
    }

    pub fn update_root_unit_size(&self, choice: &str) -> AppResult<RootUnitSize> {
        self.mutate(|store| store.update_root_unit_size(choice))
    }

    pub fn import_snapshot_str(&self, payload: &str) -> AppResult<ImportReport> {
        self.mutate(|store| store.import_snapshot_str(payload))
    }

    pub fn export_snapshot(&self) -> Snapshot {
        self.lock().export_snapshot()
    }

    pub fn search(&self, term: &str) -> SearchResults {
        self.lock().search(term)
    }

    pub fn render_css_variables(&self, viewport: &ViewportRange) -> AppResult<String> {
        Ok(self.snapshot().render_css_variables(viewport)?)
    }

    /// Persist the current state; called once on shutdown.
    pub fn flush(&self) -> AppResult<()> {
        let store = self.lock();
        self.storage.save_settings(store.settings())?;
        tracing::debug!("flushed token settings");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::storage::{MemoryStorage, StorageError, StorageResult};
    use crate::tokens::Settings;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct FlakyStorage {
        fail: AtomicBool,
        inner: MemoryStorage,
    }

    impl SettingsStorage for FlakyStorage {
        fn load_settings(&self) -> StorageResult<Settings> {
            self.inner.load_settings()
        }

        fn save_settings(&self, settings: &Settings) -> StorageResult<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(StorageError::Rejected {
                    message: "disk full".to_string(),
                });
            }
            self.inner.save_settings(settings)
        }
    }

    #[test]
    fn mutations_are_persisted() {
        let service = TokenService::open(MemoryStorage::new()).unwrap();
        service.add_fluid_token("h1", 1.0, 2.0).unwrap();
        service.add_static_token("gap", 1.0).unwrap();
        service.update_root_unit_size("100%").unwrap();

        let stored = service.storage().stored().unwrap();
        assert!(stored.tokens.contains_key("h1"));
        assert!(stored.static_tokens.contains_key("gap"));
        assert_eq!(stored.root_font_size, RootUnitSize::LargeBase);
    }

    #[test]
    fn open_loads_existing_settings() {
        let mut settings = Settings::default();
        settings
            .tokens
            .insert("h1".to_string(), FluidToken { min: 1.0, max: 2.0 });
        let service = TokenService::open(MemoryStorage::with_settings(settings)).unwrap();
        assert!(service.snapshot().fluid_tokens().contains_key("h1"));
    }

    #[test]
    fn failed_save_rolls_back() {
        let service = TokenService::open(FlakyStorage::default()).unwrap();
        service.add_fluid_token("h1", 1.0, 2.0).unwrap();

        service.storage().fail.store(true, Ordering::SeqCst);
        let err = service.add_fluid_token("h2", 1.0, 2.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert!(!service.snapshot().fluid_tokens().contains_key("h2"));

        let err = service.delete_fluid_token("h1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert!(service.snapshot().fluid_tokens().contains_key("h1"));
    }

    #[test]
    fn validation_errors_do_not_touch_storage() {
        let service = TokenService::open(MemoryStorage::new()).unwrap();
        let err = service.add_fluid_token("h1", 2.0, 1.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(service.storage().stored().is_none());
    }

    #[test]
    fn concurrent_writers_do_not_lose_updates() {
        let service = Arc::new(TokenService::open(MemoryStorage::new()).unwrap());
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let service = Arc::clone(&service);
                std::thread::spawn(move || {
                    for index in 0..25 {
                        service
                            .add_static_token(&format!("w{worker}-{index}"), 1.0)
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(service.snapshot().static_tokens().len(), 200);
        assert_eq!(service.storage().stored().unwrap().static_tokens.len(), 200);
    }

    #[test]
    fn apply_and_flush() {
        let service = TokenService::open(MemoryStorage::new()).unwrap();
        let request =
            TokenRequest::from_json(r#"{"action":"add_token","name":"h1","min":1,"max":2}"#)
                .unwrap();
        service.apply(request).unwrap();
        service.flush().unwrap();
        assert!(service.storage().stored().unwrap().tokens.contains_key("h1"));
    }
}
