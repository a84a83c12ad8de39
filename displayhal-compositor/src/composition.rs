//! Selecting the composition backend.
//!
//! The backend is chosen from two system properties:
//!
//! | `debug.sf.hw`      | `debug.composition.type` | result |
//! |--------------------|--------------------------|--------|
//! | unset, empty, `0`  | ignored                  | CPU    |
//! | non-zero           | starts with `mdp`        | MDP    |
//! | non-zero           | starts with `c2d`        | C2D    |
//! | non-zero           | starts with `dyn`        | DYN    |
//! | non-zero           | anything else or unset   | GPU    |
//!
//! `debug.sf.hw` is read as a leading integer, so `"1"`, `" 1"` and `"1x"`
//! enable hardware composition while `"true"` does not.

use displayhal_core::PropertyProvider;
use once_cell::sync::OnceCell;
use std::sync::RwLock;
use tracing::debug;

/// Property enabling hardware composition.
pub const PROP_HW_COMPOSITION: &str = "debug.sf.hw";
/// Property naming the hardware composition backend.
pub const PROP_COMPOSITION_TYPE: &str = "debug.composition.type";

/// The composition backend in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum CompositionType {
    Gpu = 0x0,
    Mdp = 0x1,
    C2d = 0x2,
    Cpu = 0x4,
    Dyn = 0x8,
}

impl CompositionType {
    /// Whether framebuffer regions can be cleared without the GPU.
    pub fn clears_without_gpu(self) -> bool {
        matches!(self, CompositionType::Cpu | CompositionType::Mdp | CompositionType::C2d)
    }
}

/// Integer prefix of `value`, the way C's `atoi` reads it.
fn leading_int(value: &str) -> i64 {
    let trimmed = value.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(i64::from(d - b'0')));
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// Resolves the composition type from `properties` without caching.
pub fn resolve_composition_type(properties: &dyn PropertyProvider) -> CompositionType {
    let hw_enabled = properties
        .get(PROP_HW_COMPOSITION)
        .filter(|value| !value.is_empty())
        .map(|value| leading_int(&value) != 0)
        .unwrap_or(false);
    if !hw_enabled {
        return CompositionType::Cpu;
    }

    match properties.get(PROP_COMPOSITION_TYPE) {
        Some(name) if name.starts_with("mdp") => CompositionType::Mdp,
        Some(name) if name.starts_with("c2d") => CompositionType::C2d,
        Some(name) if name.starts_with("dyn") => CompositionType::Dyn,
        _ => CompositionType::Gpu,
    }
}

/// Resolves the composition type once and remembers it.
pub struct CompositionPolicy<P> {
    properties: P,
    resolved: OnceCell<CompositionType>,
}

impl<P: PropertyProvider> CompositionPolicy<P> {
    pub fn new(properties: P) -> Self {
        Self {
            properties,
            resolved: OnceCell::new(),
        }
    }

    /// The composition type, read from the properties on first call only.
    pub fn resolve(&self) -> CompositionType {
        *self.resolved.get_or_init(|| {
            let resolved = resolve_composition_type(&self.properties);
            debug!(?resolved, "Resolved composition type");
            resolved
        })
    }

    pub fn properties(&self) -> &P {
        &self.properties
    }

    /// Forgets the resolved value so the next `resolve` reads the properties again.
    #[cfg(any(test, feature = "test-support"))]
    pub fn reset(&mut self) {
        self.resolved.take();
    }
}

static COMPOSITION_TYPE: RwLock<Option<CompositionType>> = RwLock::new(None);

/// The process-wide composition type.
///
/// The first call resolves it from `properties`; every later call returns the
/// same value and ignores its argument, for the lifetime of the process.
/// Concurrent first calls may each resolve, but all store the same answer.
pub fn composition_type(properties: &dyn PropertyProvider) -> CompositionType {
    let cached = *COMPOSITION_TYPE.read().unwrap_or_else(|e| e.into_inner());
    if let Some(resolved) = cached {
        return resolved;
    }

    let resolved = resolve_composition_type(properties);
    let mut slot = COMPOSITION_TYPE.write().unwrap_or_else(|e| e.into_inner());
    let resolved = *slot.get_or_insert(resolved);
    debug!(?resolved, "Cached process-wide composition type");
    resolved
}

/// Clears the process-wide cache used by [`composition_type`].
#[cfg(any(test, feature = "test-support"))]
pub fn reset_composition_cache() {
    *COMPOSITION_TYPE.write().unwrap_or_else(|e| e.into_inner()) = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use displayhal_core::PropertyMap;
    use rstest::rstest;

    fn props(pairs: &[(&str, &str)]) -> PropertyMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[rstest]
    #[case::unset(&[], CompositionType::Cpu)]
    #[case::empty(&[("debug.sf.hw", "")], CompositionType::Cpu)]
    #[case::disabled(&[("debug.sf.hw", "0"), ("debug.composition.type", "mdp")], CompositionType::Cpu)]
    #[case::not_numeric(&[("debug.sf.hw", "true")], CompositionType::Cpu)]
    #[case::no_backend(&[("debug.sf.hw", "1")], CompositionType::Gpu)]
    #[case::mdp(&[("debug.sf.hw", "1"), ("debug.composition.type", "mdp")], CompositionType::Mdp)]
    #[case::c2d(&[("debug.sf.hw", "1"), ("debug.composition.type", "c2d")], CompositionType::C2d)]
    #[case::dyn_prefix(&[("debug.sf.hw", "1"), ("debug.composition.type", "dyn_mdp")], CompositionType::Dyn)]
    #[case::other(&[("debug.sf.hw", "1"), ("debug.composition.type", "gpu")], CompositionType::Gpu)]
    #[case::case_sensitive(&[("debug.sf.hw", "1"), ("debug.composition.type", "MDP")], CompositionType::Gpu)]
    #[case::leading_digits(&[("debug.sf.hw", " 2x"), ("debug.composition.type", "c2d")], CompositionType::C2d)]
    fn test_resolve(#[case] pairs: &[(&str, &str)], #[case] expected: CompositionType) {
        assert_eq!(resolve_composition_type(&props(pairs)), expected);
    }

    #[rstest]
    #[case("0", 0)]
    #[case("17", 17)]
    #[case("  -3", -3)]
    #[case("+9z", 9)]
    #[case("abc", 0)]
    #[case("-", 0)]
    fn test_leading_int(#[case] value: &str, #[case] expected: i64) {
        assert_eq!(leading_int(value), expected);
    }

    #[test]
    fn test_policy_caches_until_reset() {
        let mut policy = CompositionPolicy::new(props(&[("debug.sf.hw", "1")]));
        assert_eq!(policy.resolve(), CompositionType::Gpu);

        policy.properties = props(&[("debug.sf.hw", "0")]);
        assert_eq!(policy.resolve(), CompositionType::Gpu);

        policy.reset();
        assert_eq!(policy.resolve(), CompositionType::Cpu);
    }

    #[test]
    fn test_clears_without_gpu() {
        assert!(CompositionType::Cpu.clears_without_gpu());
        assert!(CompositionType::Mdp.clears_without_gpu());
        assert!(CompositionType::C2d.clears_without_gpu());
        assert!(!CompositionType::Gpu.clears_without_gpu());
        assert!(!CompositionType::Dyn.clears_without_gpu());
    }
}
