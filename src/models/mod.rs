pub mod chat_entry;
pub mod log_entry;
pub mod user_profile;
