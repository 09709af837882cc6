pub mod config;
pub mod controller;
pub mod error;
pub mod keymap;
pub mod platform;
pub mod session;
