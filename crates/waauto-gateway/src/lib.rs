// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket dashboard surface.
//!
//! Request handlers stay thin: validate input, call into the engine or the
//! store, serialize rows back out. Everything live
//! (connection state, QR codes, bulk progress, scheduler outcomes) reaches
//! the dashboard through the `/ws` relay, never through request/response.

pub mod auth;
pub mod handlers;
pub mod server;
pub mod ws;

pub use server::{GatewayState, start_server};
