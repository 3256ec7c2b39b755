//! Headless demo: mounts a scene on the in-memory map store and walks it
//! through the readiness milestones

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, error, info};

use mv_components::ViewTree;
use mv_core::{LngLat, MapEvent};
use mv_store::MemorySdk;

mod scene;

use scene::SceneConfig;

/// Delay between SDK milestones, standing in for style and tile loading
const MILESTONE_DELAY: Duration = Duration::from_millis(25);

async fn run(scene: SceneConfig) -> Result<()> {
    let sdk = MemorySdk::new();
    let mut tree = ViewTree::new();
    let host = scene.mount(&mut tree, sdk.clone())?;

    let scope = tree.scope(host)?;
    let ready = scope.use_on_map_ready()?;
    ready.on_ready(Box::new(|| info!("Map is fully loaded")));
    tree.use_map_event(host, "click", |event: &MapEvent| match event.lng_lat {
        Some(lng_lat) => info!("Map clicked at {}", lng_lat),
        None => info!("Map clicked"),
    })?;

    tree.flush()?;
    if scope.use_map()?.trigger_init()? {
        info!("Triggered lazy map initialization");
    }
    tree.flush()?;
    let map = sdk.last_map().context("Map host did not create a map")?;

    // The SDK reports readiness asynchronously
    let driver = tokio::spawn({
        let map = map.clone();
        async move {
            tokio::time::sleep(MILESTONE_DELAY).await;
            map.emit_style_load();
            tokio::time::sleep(MILESTONE_DELAY).await;
            map.emit_load();
        }
    });

    let mut ticker = tokio::time::interval(Duration::from_millis(5));
    while !map.is_loaded() {
        ticker.tick().await;
        if tree.is_dirty() {
            tree.flush()?;
        }
    }
    driver.await.context("Milestone driver panicked")?;
    tree.flush()?;

    info!(
        "Map settled with sources {:?} and layers {:?}",
        map.source_ids(),
        map.layer_ids()
    );

    map.fire(&MapEvent::new("click").at(LngLat::new(139.76, 35.68)));
    if let Some(marker) = map.markers().into_iter().find(|marker| marker.options().draggable) {
        marker.drag_to(LngLat::new(139.77, 35.685));
    }

    tree.unmount(host)?;
    let calls = map.journal().calls();
    for call in &calls {
        debug!("{:?}", call);
    }
    info!("Scene '{}' torn down after {} map calls", scene.name, calls.len());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let scene = match std::env::args().nth(1) {
        Some(path) => SceneConfig::load(&path)?,
        None => SceneConfig::builtin()?,
    };
    info!("Starting map demo with scene '{}'", scene.name);

    if let Err(err) = run(scene).await {
        error!("Demo failed: {:#}", err);
        return Err(err);
    }
    Ok(())
}
