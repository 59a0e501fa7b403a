//! Telegram bot that scrapes pwnews.net for reviews, PPV results and weekly
//! show results, previews them to an operator for confirmation and
//! republishes the curated posts to a public channel.

pub mod config;
pub mod fetch;
pub mod handlers;
pub mod keyboard;
pub mod messenger;
pub mod model;
pub mod news;
pub mod scheduler;
pub mod scrape;
pub mod store;
