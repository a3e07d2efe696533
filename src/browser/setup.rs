//! Browser discovery and launch

use crate::config::BrowserConfig;
use crate::HarvestError;
use chromiumoxide::browser::{Browser, BrowserConfigBuilder};
use futures::StreamExt;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;
use tokio::task::{self, JoinHandle};
use tracing::{info, warn};

/// Find Chrome/Chromium executable on the system with platform-specific search paths
pub fn find_browser_executable() -> Option<PathBuf> {
    // Environment variable overrides all other methods
    if let Ok(path) = std::env::var("CHROMIUM_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            info!(
                "Using browser from CHROMIUM_PATH environment variable: {}",
                path.display()
            );
            return Some(path);
        }
        warn!(
            "CHROMIUM_PATH environment variable points to non-existent file: {}",
            path.display()
        );
    }

    let paths: &[&str] = if cfg!(target_os = "windows") {
        &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\Chromium\Application\chrome.exe",
        ]
    } else if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/opt/homebrew/bin/chromium",
        ]
    } else {
        &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/usr/local/bin/chromium",
            "/opt/google/chrome/chrome",
        ]
    };

    if let Some(path) = paths.iter().map(PathBuf::from).find(|p| p.exists()) {
        info!("Found browser at: {}", path.display());
        return Some(path);
    }

    if !cfg!(target_os = "windows") {
        for cmd in ["chromium", "chromium-browser", "google-chrome", "chrome"] {
            let Ok(output) = Command::new("which").arg(cmd).output() else {
                continue;
            };
            if !output.status.success() {
                continue;
            }
            let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !found.is_empty() {
                info!("Found browser using 'which' command: {}", found);
                return Some(PathBuf::from(found));
            }
        }
    }

    None
}

/// Launches Chrome and spawns the CDP event handler
///
/// The returned handle must be aborted once the browser is closed.
pub async fn launch_browser(config: &BrowserConfig) -> Result<(Browser, JoinHandle<()>), HarvestError> {
    let executable = find_browser_executable().ok_or_else(|| {
        HarvestError::Browser(
            "Chrome/Chromium executable not found; set CHROMIUM_PATH".to_string(),
        )
    })?;

    let mut builder = BrowserConfigBuilder::default()
        .request_timeout(Duration::from_secs(config.request_timeout))
        .window_size(1920, 1080)
        .chrome_executable(executable)
        .arg("--disable-blink-features=AutomationControlled")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--disable-notifications")
        .arg("--lang=ko-KR");
    if !config.headless {
        builder = builder.with_head();
    }
    let browser_config = builder
        .build()
        .map_err(|e| HarvestError::Browser(format!("Failed to build browser config: {}", e)))?;

    info!("Launching browser (headless: {})", config.headless);
    let (browser, mut handler) = Browser::launch(browser_config)
        .await
        .map_err(|e| HarvestError::Browser(format!("Failed to launch browser: {}", e)))?;

    let handler_task = task::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                tracing::debug!("Browser handler error: {:?}", e);
            }
        }
        info!("Browser event handler task completed");
    });

    Ok((browser, handler_task))
}
