// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod audit;
pub mod config;
pub mod fetch;
pub mod scan;
pub mod sitemap;
pub mod version;
