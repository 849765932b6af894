// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Query modules for persistence layer.
//!
//! This module contains all read-only queries for the persistence layer.
//!
//! ## Module Organization
//!
//! - `audit` — Audit event queries
//! - `users` — Account lookups, listings and dependent record counts
//! - `sessions` — Session lookups
//! - `notifications` — Notification inbox queries

pub mod audit;
pub mod notifications;
pub mod sessions;
pub mod users;
