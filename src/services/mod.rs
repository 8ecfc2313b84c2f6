// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod fetcher;
pub mod html;
pub mod logging;
pub mod page_auditor;
pub mod registry;
pub mod scan;
pub mod sitemap;
pub mod stop_signal;
pub mod url_filter;
