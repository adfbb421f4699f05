pub mod charts;
pub mod chat;
