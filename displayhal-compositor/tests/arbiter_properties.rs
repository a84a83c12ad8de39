use displayhal_compositor::{resolve_composition_type, CompositionType, ExternalDisplay, ExternalDisplayArbiter};
use displayhal_core::PropertyMap;
use proptest::prelude::*;

fn any_event() -> impl Strategy<Value = ExternalDisplay> {
    prop_oneof![
        Just(ExternalDisplay::Off),
        Just(ExternalDisplay::Hdmi),
        Just(ExternalDisplay::Wifi),
    ]
}

proptest! {
    #[test]
    fn wifi_never_displaces_hdmi(events in prop::collection::vec(any_event(), 0..32)) {
        let mut arbiter = ExternalDisplayArbiter::new();
        for event in events {
            let before = arbiter.current();
            let after = arbiter.handle(event);
            if before == ExternalDisplay::Hdmi && event == ExternalDisplay::Wifi {
                prop_assert_eq!(after, ExternalDisplay::Hdmi);
            }
            if event != ExternalDisplay::Wifi {
                prop_assert_eq!(after, event);
            }
        }
    }

    #[test]
    fn unknown_raw_events_never_change_state(
        events in prop::collection::vec(any_event(), 0..8),
        raw in 3i32..,
    ) {
        let mut arbiter = ExternalDisplayArbiter::new();
        for event in events {
            arbiter.handle(event);
        }
        let before = arbiter.current();
        prop_assert!(arbiter.handle_raw(raw).is_err());
        prop_assert_eq!(arbiter.current(), before);
    }

    #[test]
    fn backend_is_ignored_without_hw_switch(backend in "\\PC*") {
        let properties: PropertyMap = [("debug.composition.type", backend)].into_iter().collect();
        prop_assert_eq!(resolve_composition_type(&properties), CompositionType::Cpu);
    }
}
