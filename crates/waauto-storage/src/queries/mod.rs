// SPDX-FileCopyrightText: 2026 Waauto Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query operations, grouped per table.

pub mod logs;
pub mod rules;
pub mod scheduled;
pub mod settings;
