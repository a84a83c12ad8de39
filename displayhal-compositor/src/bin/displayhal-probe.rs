//! Prints what the display helpers decide on this machine.
//!
//! Usage: `displayhal-probe [config.toml]`. Without an argument the default
//! configuration location is used.

use anyhow::{Context, Result};
use displayhal_buffer::{
    is_gpu_supported_format, page_size, BufferGeometry, BufferManager, BufferReallocator,
    HandleFlags, PixelFormat, PoolAllocator, UsageFlags,
};
use displayhal_compositor::{composition_type, ExternalDisplay, ExternalDisplayArbiter, WindowRequest};
use displayhal_core::{init_logging, ConfigLoader};
use std::num::NonZeroU64;
use std::sync::Arc;
use tracing::info;

const PROBE_FORMATS: [PixelFormat; 5] = [
    PixelFormat::RGBA_8888,
    PixelFormat::RGB_565,
    PixelFormat::YV12,
    PixelFormat::YCRCB_420_SP,
    PixelFormat::YCBCR_420_SP_TILED,
];

fn main() -> Result<()> {
    let config = match std::env::args_os().nth(1) {
        Some(path) => ConfigLoader::load_from_path(&path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?,
        None => ConfigLoader::load().context("Failed to load configuration")?,
    };
    init_logging(&config.logging, false).context("Failed to initialize logging")?;

    let composition = composition_type(config.property_map());
    info!(?composition, clears_without_gpu = composition.clears_without_gpu(), "Composition type");
    info!(page_size = page_size(), "Platform");

    for format in PROBE_FORMATS {
        info!(?format, gpu_supported = is_gpu_supported_format(format), "Format");
    }

    let mut arbiter = ExternalDisplayArbiter::new();
    for event in [ExternalDisplay::Wifi, ExternalDisplay::Hdmi, ExternalDisplay::Wifi, ExternalDisplay::Off] {
        let enabled = arbiter.handle(event);
        info!(?event, ?enabled, "External display");
    }

    // One reallocation cycle against an in-process pool.
    let pool = Arc::new(PoolAllocator::new());
    let mut manager = BufferManager::new(BufferReallocator::new(pool.clone()));
    let geometry = BufferGeometry::new(64, 64, PixelFormat::RGBA_8888);
    let initial = NonZeroU64::new(64 * 64 * 4).context("Initial size must be non-zero")?;
    let id = manager
        .allocate(geometry, initial, UsageFlags::HW_TEXTURE, HandleFlags::empty())
        .context("Failed to allocate probe buffer")?;

    let requests = [
        WindowRequest::decode(0x2000_0000, &[128, 96, i64::from(PixelFormat::YCBCR_420_SP_TILED.0)])?,
        WindowRequest::decode(0x1000_0000, &[128 * 96 * 3 / 2])?,
    ];
    for request in requests {
        request
            .apply(&mut manager, id)
            .with_context(|| format!("Failed to apply {:?}", request))?;
    }
    let stats = pool.stats()?;
    info!(live = stats.live_allocations, bytes = stats.bytes_in_use, "Pool after reallocation");

    manager.release(id).context("Failed to release probe buffer")?;
    Ok(())
}
