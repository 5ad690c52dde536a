//! Ghars browser client.
//!
//! This crate provides the Leptos client-side app that wires the session core
//! into routes. Build it for the browser with the `csr` feature.

#![allow(non_snake_case)]

pub mod app;
pub mod config;
pub mod context;
pub mod pages;

#[cfg(feature = "csr")]
pub mod logging;
#[cfg(feature = "csr")]
pub mod storage;

#[cfg(feature = "csr")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    use crate::app::App;
    console_error_panic_hook::set_once();
    logging::init(config::log_filter());
    leptos::mount::mount_to_body(App);
}
