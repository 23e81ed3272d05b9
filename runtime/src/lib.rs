// Copyright 2026 Katsini Contributors
// SPDX-License-Identifier: Apache-2.0

//! Katsini runtime library: app metadata lookups across Google Play, the
//! Apple App Store and Huawei AppGallery.
//!
//! Two of the stores are scraped through a headless Chromium under a single
//! per-call deadline; the App Store and the AppGallery fallback use JSON
//! APIs. [`service::Katsini`] is the entry point.

pub mod acquisition;
pub mod app;
pub mod cli;
pub mod config;
pub mod date;
pub mod error;
pub mod orchestrator;
pub mod providers;
pub mod renderer;
pub mod rest;
pub mod service;

pub use app::App;
pub use config::Config;
pub use error::{KatsiniError, KatsiniResult};
pub use service::Katsini;
