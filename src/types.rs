pub mod fetch;
pub mod notification;
pub mod preferences;
pub mod push;
