//! Example: Dynamic Loading Page
//!
//! Demonstrates: declaring a page object, loading it through the lifecycle,
//! and recovering when the page re-renders mid-wait
//!
//! Run with: `PAGEBIND_LOG=debug cargo run --example dynamic_loading`

use pagebind::mock::{DisplayState, MockDriver, MockElement};
use pagebind::prelude::*;
use pagebind::{init_tracing, LogFormat, LogListener, NotificationPool, PageConfig};
use std::sync::Arc;

#[derive(Debug, Default, PageObject)]
#[page(name = "Dynamic loading", url = "https://example.test/dynamic_loading/1")]
struct DynamicLoadingPage {
    #[page(visible, css = "#start button")]
    start: Button,
    #[page(invisible, id = "loading")]
    loading: TextBlock,
    #[page(force_visible, id = "finish")]
    finish: TextBlock,
}

fn main() -> PageResult<()> {
    let _ = init_tracing(LogFormat::Pretty)?;
    println!("=== Dynamic Loading Example ===\n");

    // 1. A scripted document: the loader stays up for two polls and the start
    //    button is re-rendered once while we wait for it
    let driver = MockDriver::new();
    driver.insert(
        MockElement::new("start")
            .matching(By::css("#start button"))
            .tag("button")
            .text("Start"),
    );
    driver.insert(MockElement::new("loading").text("Loading..."));
    driver.insert(MockElement::new("finish").hidden().text("Hello World!"));
    driver.queue_display("start", [DisplayState::Stale]);
    driver.queue_display("loading", [DisplayState::Shown, DisplayState::Shown]);

    // 2. Lifecycle with fast polling and a notification pool
    let mut config = PageConfig::default();
    config.poll_interval_ms = 20;
    config.settle.interval_ms = 20;
    config.detect_angular = false;
    let pool = Arc::new(NotificationPool::new(config.pool_config())?.with_listener(LogListener));
    let lifecycle = PageLifecycle::from_config(driver.shared(), &config).with_notifier(pool.clone());

    // 3. Navigate and load
    println!("1. Opening {}", DynamicLoadingPage::default_url().unwrap_or("-"));
    let page = lifecycle.open_default::<DynamicLoadingPage>()?;
    println!("   State: {}", page.state());
    println!("   Bound: {:?}", page.bind_report().bound);

    // 4. Interact through the lazy proxies
    println!("\n2. Clicking start...");
    page.start.click()?;
    println!("   Finish text: {}", page.finish.display_value()?);

    // 5. Wait for listeners before exiting
    println!("\n3. Draining notifications...");
    println!("   Drained: {}", pool.drain());

    println!("\n=== Example Complete ===");
    Ok(())
}
