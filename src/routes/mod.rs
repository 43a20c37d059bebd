use axum::Router;

use crate::store::SharedStore;
use crate::Config;

mod checks;
mod health;
mod urls;

// ---

/// State shared by every route: the record store and the loaded config.
pub type AppState = (SharedStore, Config);

pub fn router(store: SharedStore, config: Config) -> Router {
    // ---
    Router::new()
        .merge(urls::router())
        .merge(checks::router())
        .merge(health::router())
        .with_state((store, config))
}
