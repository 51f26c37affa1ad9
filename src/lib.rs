pub mod app;
pub mod buckets;
pub mod clock;
pub mod config;
pub mod errors;
pub mod export;
pub mod handlers;
pub mod histogram;
pub mod history;
pub mod models;
pub mod peak;
pub mod session;
pub mod state;
pub mod stats;

pub use app::router;
pub use config::Config;
pub use session::{ClickSession, EngineSettings, OrderingPolicy};
pub use state::AppState;
