pub mod extract;
pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::{cors_layer, create_router};
pub use state::AppState;
