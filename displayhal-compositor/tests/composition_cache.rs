use displayhal_compositor::{
    composition_type, reset_composition_cache, CompositionType, PROP_COMPOSITION_TYPE,
    PROP_HW_COMPOSITION,
};
use displayhal_core::{ConfigLoader, PropertyMap};

// The cache is process-wide, so every step runs in this one test.
#[test]
fn process_cache_resolves_once_until_reset() {
    reset_composition_cache();

    let mdp: PropertyMap = [(PROP_HW_COMPOSITION, "1"), (PROP_COMPOSITION_TYPE, "mdp")]
        .into_iter()
        .collect();
    assert_eq!(composition_type(&mdp), CompositionType::Mdp);

    let cpu = PropertyMap::new();
    assert_eq!(composition_type(&cpu), CompositionType::Mdp, "later calls ignore their properties");

    reset_composition_cache();
    assert_eq!(composition_type(&cpu), CompositionType::Cpu);

    reset_composition_cache();
    let config = ConfigLoader::load_from_str(
        r#"
        [properties]
        "debug.sf.hw" = 1
        debug.composition.type = "c2d"
        "#,
    )
    .unwrap();
    assert_eq!(composition_type(config.property_map()), CompositionType::C2d);

    let threads: Vec<_> = (0..4)
        .map(|_| std::thread::spawn(|| composition_type(&PropertyMap::new())))
        .collect();
    for thread in threads {
        assert_eq!(thread.join().unwrap(), CompositionType::C2d);
    }

    reset_composition_cache();
}
