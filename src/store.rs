use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::PartialConfig;

static GLOBAL: OnceLock<ConfigStore> = OnceLock::new();

/// Shared holder of default request configuration.
///
/// Cloning yields another handle to the same defaults. Reads take a
/// snapshot under a shared lock and writes replace fields under an
/// exclusive lock, so a reader never observes a half-applied update.
#[derive(Clone, Debug, Default)]
pub struct ConfigStore {
    defaults: Arc<RwLock<PartialConfig>>,
}

impl ConfigStore {
    /// Creates an isolated, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide store, created empty on first access.
    pub fn global() -> &'static ConfigStore {
        GLOBAL.get_or_init(ConfigStore::new)
    }

    /// Merges `config` into the current defaults, last write wins per field.
    pub fn set_defaults(&self, config: PartialConfig) {
        let mut defaults = self
            .defaults
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        defaults.merge(config);

        #[cfg(feature = "tracing")]
        tracing::debug!("updated default request configuration");
    }

    /// Returns a snapshot of the current defaults.
    pub fn get_defaults(&self) -> PartialConfig {
        self.defaults
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Clears every default.
    pub fn reset_defaults(&self) {
        *self
            .defaults
            .write()
            .unwrap_or_else(PoisonError::into_inner) = PartialConfig::default();
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use crate::{ConfigStore, Headers, Method, PartialConfig};

    #[test]
    fn set_defaults_merges_into_existing() {
        let store = ConfigStore::new();
        store.set_defaults(PartialConfig {
            max_retries: Some(5),
            ..PartialConfig::default()
        });
        store.set_defaults(PartialConfig {
            method: Some(Method::Put),
            ..PartialConfig::default()
        });

        let defaults = store.get_defaults();
        assert_eq!(defaults.max_retries, Some(5));
        assert_eq!(defaults.method, Some(Method::Put));
    }

    #[test]
    fn reset_clears_everything() {
        let store = ConfigStore::new();
        store.set_defaults(PartialConfig {
            headers: Some(Headers::from_pairs([("x-a", "1")]).expect("must be valid")),
            ..PartialConfig::default()
        });
        store.reset_defaults();
        assert_eq!(store.get_defaults(), PartialConfig::default());
    }

    #[test]
    fn clones_share_state_but_new_stores_are_isolated() {
        let store = ConfigStore::new();
        let handle = store.clone();
        handle.set_defaults(PartialConfig {
            timeout_ms: Some(250),
            ..PartialConfig::default()
        });

        assert_eq!(store.get_defaults().timeout_ms, Some(250));
        assert_eq!(ConfigStore::new().get_defaults().timeout_ms, None);
    }

    #[test]
    fn snapshot_is_detached_from_later_writes() {
        let store = ConfigStore::new();
        store.set_defaults(PartialConfig {
            retry_delay_ms: Some(1),
            ..PartialConfig::default()
        });
        let snapshot = store.get_defaults();
        store.set_defaults(PartialConfig {
            retry_delay_ms: Some(2),
            ..PartialConfig::default()
        });
        assert_eq!(snapshot.retry_delay_ms, Some(1));
    }

    #[test]
    fn concurrent_readers_see_whole_updates() {
        let store = ConfigStore::new();
        let writer = {
            let store = store.clone();
            thread::spawn(move || {
                for n in 0..200u32 {
                    store.set_defaults(PartialConfig {
                        max_retries: Some(n),
                        retry_delay_ms: Some(u64::from(n)),
                        ..PartialConfig::default()
                    });
                }
            })
        };

        for _ in 0..200 {
            let defaults = store.get_defaults();
            if let (Some(retries), Some(delay)) = (defaults.max_retries, defaults.retry_delay_ms) {
                assert_eq!(u64::from(retries), delay);
            }
        }
        writer.join().expect("writer thread must not panic");
    }
}
