//! edu-connect-hub
//!
//! 教育平台的实时在线状态、消息与通知扇出核心
//! Real-time presence, messaging and notification-fanout core for the education platform

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod hub;
pub mod response;
pub mod router;
pub mod service;
pub mod storage;
pub mod tasks;
pub mod ws;

pub use domain::event::{EventFrame, Outbound};
pub use domain::model::{Identity, RecipientSet, Role};
pub use error::HubError;
pub use hub::{Collaborators, Connection, EduConnectServer};
