//! Library exports for the quickrewind capture engine.
//!
//! Exposes the capture scheduler, rolling buffer, and encoding pipeline so
//! that external frontends (tray icons, hotkey listeners, test harnesses)
//! can drive the core through its operation entry points.

pub mod capture;
pub mod config;
pub mod daemon;
pub mod encode;
pub mod export;
pub mod notification;

pub use config::Config;
