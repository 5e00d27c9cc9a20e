// src/lib.rs
//! quanBuy shopping assistant: the client search flow (capture, dispatch,
//! render, controller) and the Gemini-backed assistant service behind it.

pub mod capture;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod render;
pub mod services;
pub mod share;

pub use config::AppConfig;
pub use controller::{AppController, Outcome, Phase, Ticket};
pub use dispatcher::Dispatcher;
pub use errors::QuanBuyError;
