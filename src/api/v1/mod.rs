pub mod connection;
pub mod group;
pub mod health;
pub mod message;
pub mod notify;
