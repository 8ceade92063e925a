// SPDX-FileCopyrightText: 2026 Stravach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query functions, one module per table.

pub mod activities;
pub mod users;
