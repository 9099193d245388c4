use std::sync::Arc;

use crate::cache::DirectoryCache;
use crate::directory::Directory;
use crate::store::DirectoryStore;

pub struct AppState {
    pub directory: Directory,
    pub site_base_url: String,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DirectoryStore>,
        cache: Arc<DirectoryCache>,
        site_base_url: impl Into<String>,
    ) -> Self {
        Self {
            directory: Directory::new(store, cache),
            site_base_url: site_base_url.into(),
        }
    }
}
