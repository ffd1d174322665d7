//! Poputka — a ride-share matching Telegram bot.
//!
//! Drivers create trip offers through a guided dialog; passengers search
//! them by route and date and reveal a driver's contact. A disclosed
//! contact triggers a delayed follow-up asking the driver whether the
//! trip is still open.
//!
//! The core (dialogs, trip store, follow-up scheduling) is transport
//! independent; `telegram` is the only module that knows about teloxide.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod dialog;
pub mod disclosure;
pub mod followup;
pub mod i18n;
pub mod logging;
pub mod presenter;
pub mod telegram;
pub mod trips;
pub mod validate;
