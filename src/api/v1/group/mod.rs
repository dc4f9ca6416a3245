pub mod add_member;
pub mod create;
pub mod delete;
pub mod delete_message;
pub mod leave;
pub mod remove_member;
pub mod send;
