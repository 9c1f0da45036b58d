pub mod auth;
pub mod chat;
pub mod health;
pub mod logs;
pub mod profiles;
