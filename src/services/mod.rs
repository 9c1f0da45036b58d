pub mod chat;
pub mod logs;
pub mod personality;
pub mod pillars;
pub mod profiles;
