pub mod api;
pub mod auth;
pub mod booking;
pub mod hello;
pub mod http;
pub mod messages;
pub mod tables;
