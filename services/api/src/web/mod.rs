pub mod dashboard;
pub mod middleware;
pub mod rest;
pub mod router;
pub mod sections;
pub mod state;

// Re-export what the binary needs to build the server.
pub use dashboard::TabRegistry;
pub use middleware::require_user;
pub use router::build_router;
pub use state::AppState;
