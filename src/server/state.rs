use axum::extract::FromRef;

use crate::library_store::LibraryStore;
use std::sync::Arc;
use std::time::Instant;

pub type SharedStore = Arc<dyn LibraryStore>;

#[derive(Clone)]
pub struct ServerState {
    pub start_time: Instant,
    pub store: SharedStore,
}

impl FromRef<ServerState> for SharedStore {
    fn from_ref(input: &ServerState) -> Self {
        input.store.clone()
    }
}
