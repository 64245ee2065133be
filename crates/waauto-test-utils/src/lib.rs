// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared test doubles for the waauto workspace.

pub mod mock_transport;

pub use mock_transport::{MockTransport, SentMessage};
