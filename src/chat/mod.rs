pub mod client;
pub mod conversation;
pub mod session;
pub mod controller;

pub use client::{ChatBackend, MistralClient};
pub use session::ChatSession;
pub use controller::TurnController;
