//! Menu tree cache keyed on the deployment mode.

use std::sync::Arc;

use horizon_trellis_core::logging::targets;
use horizon_trellis_core::{DeploymentMode, TrellisConfig, TrellisError, TrellisResult};
use parking_lot::RwLock;

use super::source::load_menu_file;
use super::tree::MenuTree;

/// Long-lived holder of the application menu.
///
/// In production-like modes the first built tree is kept and shared; in
/// development-like modes every call rebuilds so edits to the menu document
/// show up without a restart. Concurrent cold-start builds are tolerated and
/// the last one stored wins; readers only ever see a complete tree.
///
/// # Example
///
/// ```
/// use horizon_trellis::menu::{MenuCache, MenuTree};
/// use horizon_trellis_core::DeploymentMode;
///
/// let cache = MenuCache::new();
/// let first = cache.get_or_build(DeploymentMode::Production, || Ok(MenuTree::default())).unwrap();
/// let again = cache.get_or_build(DeploymentMode::Production, || unreachable!()).unwrap();
/// assert!(std::sync::Arc::ptr_eq(&first, &again));
/// ```
#[derive(Debug, Default)]
pub struct MenuCache {
    slot: RwLock<Option<Arc<MenuTree>>>,
}

impl MenuCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached tree or build one with `build`.
    pub fn get_or_build<F>(&self, mode: DeploymentMode, build: F) -> TrellisResult<Arc<MenuTree>>
    where
        F: FnOnce() -> TrellisResult<MenuTree>,
    {
        if !mode.is_production_like() {
            tracing::trace!(target: targets::MENU, %mode, "rebuilding menu");
            return build().map(Arc::new);
        }

        if let Some(tree) = self.cached() {
            return Ok(tree);
        }

        let tree = Arc::new(build()?);
        *self.slot.write() = Some(Arc::clone(&tree));
        tracing::debug!(target: targets::MENU, nodes = tree.len(), "cached menu");
        Ok(tree)
    }

    /// Return the menu described by `config.menu.source`.
    pub fn load(&self, config: &TrellisConfig) -> TrellisResult<Arc<MenuTree>> {
        let path = config
            .menu
            .source
            .as_deref()
            .ok_or_else(|| TrellisError::Config("no menu source configured".to_string()))?;
        self.get_or_build(config.mode, || load_menu_file(path))
    }

    /// The cached tree, if any.
    pub fn cached(&self) -> Option<Arc<MenuTree>> {
        self.slot.read().clone()
    }

    /// Returns true if a tree is cached.
    pub fn is_cached(&self) -> bool {
        self.slot.read().is_some()
    }

    /// Drop the cached tree; the next production-mode access rebuilds.
    pub fn invalidate(&self) {
        if self.slot.write().take().is_some() {
            tracing::debug!(target: targets::MENU, "menu cache invalidated");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::menu::MenuItem;

    fn counting_build(counter: &AtomicUsize) -> TrellisResult<MenuTree> {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(MenuTree::new(MenuItem::new("root")))
    }

    #[test]
    fn test_production_caches() {
        let cache = MenuCache::new();
        let builds = AtomicUsize::new(0);
        for mode in [DeploymentMode::Production, DeploymentMode::Profile] {
            cache.invalidate();
            let a = cache.get_or_build(mode, || counting_build(&builds)).unwrap();
            let b = cache.get_or_build(mode, || counting_build(&builds)).unwrap();
            assert!(Arc::ptr_eq(&a, &b));
        }
        assert_eq!(builds.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_development_rebuilds() {
        let cache = MenuCache::new();
        let builds = AtomicUsize::new(0);
        for mode in [DeploymentMode::Development, DeploymentMode::Debug, DeploymentMode::Trace] {
            cache.get_or_build(mode, || counting_build(&builds)).unwrap();
            cache.get_or_build(mode, || counting_build(&builds)).unwrap();
        }
        assert_eq!(builds.load(Ordering::SeqCst), 6);
        assert!(!cache.is_cached());
    }

    #[test]
    fn test_invalidate() {
        let cache = MenuCache::new();
        let builds = AtomicUsize::new(0);
        cache.get_or_build(DeploymentMode::Production, || counting_build(&builds)).unwrap();
        assert!(cache.is_cached());
        cache.invalidate();
        assert!(cache.cached().is_none());
        cache.get_or_build(DeploymentMode::Production, || counting_build(&builds)).unwrap();
        assert_eq!(builds.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failed_build_is_not_cached() {
        let cache = MenuCache::new();
        let err = cache
            .get_or_build(DeploymentMode::Production, || Err(TrellisError::menu_source("broken")))
            .unwrap_err();
        assert!(matches!(err, TrellisError::MenuSource(_)));
        assert!(!cache.is_cached());
    }

    #[test]
    fn test_load_from_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"<menu><menu name="home" path="home.htm"/></menu>"#).unwrap();

        let mut config = TrellisConfig::default().with_mode(DeploymentMode::Production);
        let cache = MenuCache::new();
        assert!(matches!(cache.load(&config), Err(TrellisError::Config(_))));

        config.menu.source = Some(file.path().to_path_buf());
        let tree = cache.load(&config).unwrap();
        assert_eq!(tree.len(), 2);
        assert!(cache.is_cached());
    }
}
