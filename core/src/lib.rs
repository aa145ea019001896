pub mod accounts;
pub mod clients;
pub mod config;
pub mod errors;
pub mod model;
pub mod notify;
pub mod ranking;
pub mod service;
pub mod window;
