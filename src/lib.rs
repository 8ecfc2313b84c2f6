// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Sitemap crawler that audits each listed page for on-page SEO signals.

pub mod app;
pub mod error;
pub mod models;
pub mod services;
