pub mod broadcast;
pub mod notification;
