// HTTP and WebSocket APIs

pub mod status;
pub mod update;
pub mod websocket;

pub use status::{create_status_router, StatusAppState};
pub use update::{create_update_router, UpdateAppState};
pub use websocket::{create_ws_router, ws_handler, WsAppState};
