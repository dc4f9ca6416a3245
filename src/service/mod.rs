pub mod auth;
pub mod dispatch;
pub mod fanout;
pub mod groups;
pub mod push;
