// Configuration loading
pub mod config;

// Train data model and shared registry
pub mod state;

// HTTP and WebSocket APIs
pub mod api;

// WebSocket subscription management
pub mod subscription;

// Optional background demo stepping loop
pub mod stepper;
