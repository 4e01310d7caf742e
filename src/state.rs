use std::sync::Arc;

use crate::users::repo::UserStore;
use crate::users::rules::UserRules;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub rules: Arc<UserRules>,
}

impl AppState {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self {
            store,
            rules: Arc::new(UserRules::standard()),
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::fake_with(Arc::new(crate::users::memory::MemoryUserStore::new()))
    }

    #[cfg(test)]
    pub fn fake_with(store: Arc<crate::users::memory::MemoryUserStore>) -> Self {
        Self::new(store)
    }
}
