//! Shared Dioxus components and Leaflet bridge for the DBW explorer.
//!
//! This crate provides:
//! - `js_bridge`: `MarkerLayer` implementation over Leaflet via `js_sys::eval()`
//! - `fetch`: `Transport` implementation over `window.fetch`
//! - `state`: Reactive AppState with Dioxus Signals
//! - `actions`: the coroutine running user actions against the server
//! - `components`: RSX components (filter fields, data table, station panel, ...)

pub mod actions;
pub mod components;
pub mod fetch;
pub mod js_bridge;
pub mod state;
