use std::sync::Arc;

use crate::registry::Registry;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub registry: Registry,
}
