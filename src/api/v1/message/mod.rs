pub mod delete;
pub mod edit;
pub mod read;
pub mod send;
