pub mod chat;
pub mod onboard;
