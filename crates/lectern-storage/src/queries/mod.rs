// SPDX-FileCopyrightText: 2026 Lectern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules, one per owned table.

pub mod courses;
pub mod entitlements;
pub mod live_streams;
pub mod materials;
pub mod payments;
pub mod users;
