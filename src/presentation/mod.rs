pub mod components;
pub mod input;
pub mod services;
pub mod ui;
