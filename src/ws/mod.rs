//! WebSocket transport

pub mod gateway;
pub mod handler;
pub mod protocol;
pub mod session;
