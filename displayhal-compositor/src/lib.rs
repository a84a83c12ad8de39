//! # DisplayHAL Compositor
//!
//! Compositor-side helpers built on `displayhal-buffer`:
//!
//! - Composition policy: which backend (CPU, GPU, MDP, C2D, DYN) composes
//!   frames, resolved from system properties and cached per process.
//! - External display arbitration between HDMI and wireless displays.
//! - Layer flags exchanged with the hardware composer.
//! - Vendor window operations, decoded and applied to managed buffers.
//! - Clearing framebuffer regions without the GPU.

pub mod composition;
pub mod error;
pub mod external_display;
pub mod framebuffer;
pub mod layer;
pub mod operation;

pub use composition::{
    composition_type, resolve_composition_type, CompositionPolicy, CompositionType,
    PROP_COMPOSITION_TYPE, PROP_HW_COMPOSITION,
};
#[cfg(any(test, feature = "test-support"))]
pub use composition::reset_composition_cache;
pub use error::CompositorError;
pub use external_display::{ExternalDisplay, ExternalDisplayArbiter};
pub use framebuffer::{clear_region, Rectangle, Region, RenderTarget};
pub use layer::{
    is_updating_fb, per_frame_flags, update_layer_flags, update_layer_flags_raw, HwcCompositionType,
    HwcLayerFlags, LayerAttribute, LayerFlags,
};
pub use operation::{WindowOperation, WindowRequest};
