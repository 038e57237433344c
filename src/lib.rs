//! Subreddit SaaS planner library.
//!
//! Fetches recent posts from a Reddit community, falling back to scraping the
//! rendered page when the JSON listing is unavailable, and turns a chosen post
//! into a structured SaaS business plan via a generative-AI provider.

#![allow(clippy::needless_raw_string_hashes)]

pub mod browser;
pub mod cache;
pub mod config;
pub mod constants;
pub mod feed;
pub mod plan;
pub mod web;
