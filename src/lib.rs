// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

pub mod api;
pub mod charts;
pub mod config;
pub mod error;
pub mod financials;
pub mod llm;
pub mod models;
pub mod news;
pub mod newsapi;
pub mod prices;
pub mod providers;
pub mod render;
pub mod report;
pub mod semaphore;
pub mod utils;
