//! Network collaborators of the session: the HTTP endpoints and the
//! WebSocket stream channel

pub mod http;
pub mod ws;

pub use http::HttpApi;
pub use ws::{connect, StreamConnection};
