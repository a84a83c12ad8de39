//! Per-layer flags exchanged with the hardware composer.

use crate::error::CompositorError;
use bitflags::bitflags;
use tracing::error;

bitflags! {
    /// Flags the compositor keeps on each layer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LayerFlags: u32 {
        /// The layer's content changed since the last frame.
        const UPDATING = 1 << 0;
    }
}

bitflags! {
    /// Per-frame flags handed to the hardware composer for a layer.
    ///
    /// Only the bits this crate manages are named; others pass through.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HwcLayerFlags: u32 {
        const SKIP_LAYER = 0x0000_0001;
        const NOT_UPDATING = 0x0000_0002;
    }
}

/// Layer attributes the compositor can toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum LayerAttribute {
    UpdateStatus = 0,
}

impl TryFrom<i32> for LayerAttribute {
    type Error = CompositorError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(LayerAttribute::UpdateStatus),
            _ => {
                error!(attribute = raw, "Invalid layer attribute");
                Err(CompositorError::UnknownAttribute(raw))
            }
        }
    }
}

/// How the hardware composer handles a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum HwcCompositionType {
    Gpu = 0,
    Overlay = 1,
    Copybit = 2,
}

/// Sets or clears the flag tied to `attribute`.
pub fn update_layer_flags(attribute: LayerAttribute, enable: bool, flags: &mut LayerFlags) {
    match attribute {
        LayerAttribute::UpdateStatus => flags.set(LayerFlags::UPDATING, enable),
    }
}

/// [`update_layer_flags`] for a raw attribute code.
pub fn update_layer_flags_raw(attribute: i32, enable: bool, flags: &mut LayerFlags) -> Result<(), CompositorError> {
    update_layer_flags(LayerAttribute::try_from(attribute)?, enable, flags);
    Ok(())
}

/// The hardware composer flags for this frame, given the layer's own flags.
pub fn per_frame_flags(hwc: HwcLayerFlags, layer: LayerFlags) -> HwcLayerFlags {
    let mut flags = hwc;
    flags.set(HwcLayerFlags::NOT_UPDATING, !layer.contains(LayerFlags::UPDATING));
    flags
}

/// Whether composing with `composition` writes the framebuffer directly.
pub fn is_updating_fb(composition: HwcCompositionType) -> bool {
    matches!(composition, HwcCompositionType::Copybit)
}
