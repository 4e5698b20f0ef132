//! Homefind — Telegram rental-property bot core.

pub mod config;
pub mod delivery;
pub mod dialog;
pub mod dispatch;
pub mod error;
pub mod health;
pub mod listings;
pub mod outbound;
pub mod pager;
pub mod session;
pub mod telegram;
