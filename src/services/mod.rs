// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod access;
pub mod mapping;
pub mod story;

pub use access::ensure_owner;
pub use story::StoryService;
