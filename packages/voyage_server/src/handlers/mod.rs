pub mod health;
pub mod voyages;
pub mod websocket;

// Re-export all handlers for easy route registration
pub use health::{
    architecture_handler, health_handler, health_live_handler, metrics_handler, root_handler,
};
pub use voyages::{get_role_status, get_voyage};
pub use websocket::voyage_websocket_handler;
