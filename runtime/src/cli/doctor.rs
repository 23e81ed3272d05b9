//! Environment readiness check.

use crate::config::Config;
use crate::renderer::chromium::find_chromium;
use anyhow::Result;
use std::time::Duration;

/// Report browser mode, Chromium discovery and the AppGallery fallback.
pub async fn run(config: Config) -> Result<()> {
    println!("Katsini Doctor");
    println!("==============");
    println!();

    println!("OS:   {}", std::env::consts::OS);
    println!("Arch: {}", std::env::consts::ARCH);
    println!();

    let browser_ready = match &config.browser_endpoint {
        Some(endpoint) => {
            let url = format!("{}/json/version", endpoint.http_url());
            if remote_reachable(&url).await {
                println!("[OK] Remote browser reachable at {}", endpoint.http_url());
                true
            } else {
                println!("[!!] Remote browser NOT reachable at {url}");
                false
            }
        }
        None => match find_chromium(config.chromium_path.as_deref()) {
            Some(path) => {
                println!("[OK] Chromium found: {}", path.display());
                true
            }
            None => {
                println!("[!!] Chromium NOT found. Set KATSINI_CHROMIUM_PATH or CHROME_HOST.");
                false
            }
        },
    };

    if config.appgallery_fallback_enabled() {
        println!("[OK] AppGallery API fallback enabled");
    } else {
        println!("[--] AppGallery API fallback disabled (HUAWEI_CLIENT_ID / HUAWEI_CLIENT_SECRET unset)");
    }
    println!("[OK] Per-call deadline: {}s", config.deadline.as_secs());

    println!();
    if browser_ready {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
        println!("  App Store lookups still work; Play Store and AppGallery need a browser.");
    }

    Ok(())
}

async fn remote_reachable(url: &str) -> bool {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
    {
        Ok(c) => c,
        Err(_) => return false,
    };
    matches!(client.get(url).send().await, Ok(r) if r.status().is_success())
}
