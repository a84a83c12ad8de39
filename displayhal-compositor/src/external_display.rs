//! Arbitration between external displays.
//!
//! Only one external display is driven at a time. HDMI always wins; a
//! wireless display is only enabled while HDMI is not.

use crate::error::CompositorError;
use tracing::{debug, error};

/// An external display, or none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum ExternalDisplay {
    #[default]
    Off = 0,
    Hdmi = 1,
    Wifi = 2,
}

impl ExternalDisplay {
    /// Decodes a display event code.
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(ExternalDisplay::Off),
            1 => Some(ExternalDisplay::Hdmi),
            2 => Some(ExternalDisplay::Wifi),
            _ => None,
        }
    }

    /// The display to enable when `event` arrives while `self` is enabled.
    pub fn next(self, event: ExternalDisplay) -> ExternalDisplay {
        match event {
            ExternalDisplay::Hdmi => ExternalDisplay::Hdmi,
            ExternalDisplay::Wifi if self != ExternalDisplay::Hdmi => ExternalDisplay::Wifi,
            ExternalDisplay::Wifi => self,
            ExternalDisplay::Off => ExternalDisplay::Off,
        }
    }
}

/// Tracks the enabled external display for a display session.
#[derive(Debug, Default)]
pub struct ExternalDisplayArbiter {
    current: ExternalDisplay,
}

impl ExternalDisplayArbiter {
    /// Starts with no external display enabled.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> ExternalDisplay {
        self.current
    }

    /// Applies `event` and returns the display now enabled.
    pub fn handle(&mut self, event: ExternalDisplay) -> ExternalDisplay {
        let next = self.current.next(event);
        if next != self.current {
            debug!(from = ?self.current, to = ?next, ?event, "External display changed");
        }
        self.current = next;
        next
    }

    /// Applies a raw event code.
    ///
    /// An unknown code leaves the state unchanged and is reported as
    /// `UnknownDisplayEvent`; the arbiter stays usable.
    pub fn handle_raw(&mut self, raw: i32) -> Result<ExternalDisplay, CompositorError> {
        match ExternalDisplay::from_raw(raw) {
            Some(event) => Ok(self.handle(event)),
            None => {
                error!(event = raw, current = ?self.current, "Unknown external display event");
                Err(CompositorError::UnknownDisplayEvent(raw))
            }
        }
    }
}
