//! Browser automation for the registry site
//!
//! This module handles:
//! - Locating and launching Chrome
//! - The single page session the crawl engine navigates with

mod session;
mod setup;

pub use session::BrowserSession;
pub use setup::{find_browser_executable, launch_browser};
