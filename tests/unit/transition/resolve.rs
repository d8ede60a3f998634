use super::*;

fn rng() -> fastrand::Rng {
    fastrand::Rng::with_seed(42)
}

#[test]
fn absent_or_last_clip_is_zero_length() {
    let t = ResolvedTransition::resolve(None, false, &mut rng()).unwrap();
    assert_eq!(t.duration, 0.0);
    assert!(!t.has_program());

    let spec = TransitionSpec::named("fade", 1.0);
    let t = ResolvedTransition::resolve(Some(&spec), true, &mut rng()).unwrap();
    assert_eq!(t.duration, 0.0);
    assert_eq!(t.name, None);
}

#[test]
fn duration_without_name_is_rejected() {
    let spec = TransitionSpec {
        duration: Some(1.0),
        ..TransitionSpec::default()
    };
    let err = ResolvedTransition::resolve(Some(&spec), false, &mut rng()).unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("set duration to 0"));

    let spec = TransitionSpec {
        duration: Some(0.0),
        ..TransitionSpec::default()
    };
    assert!(ResolvedTransition::resolve(Some(&spec), false, &mut rng()).is_ok());
}

#[test]
fn random_picks_from_curated_set() {
    let spec = TransitionSpec::builtin();
    let mut r = rng();
    for _ in 0..50 {
        let t = ResolvedTransition::resolve(Some(&spec), false, &mut r).unwrap();
        let name = t.name.clone().unwrap();
        assert!(
            catalog::RANDOM_SET.contains(&name.as_str()) || name == "directional",
            "{name}"
        );
        assert!(t.has_program());
    }
}

#[test]
fn random_is_deterministic_for_a_seed() {
    let spec = TransitionSpec::builtin();
    let a: Vec<_> = {
        let mut r = rng();
        (0..8)
            .map(|_| ResolvedTransition::resolve(Some(&spec), false, &mut r).unwrap().name)
            .collect()
    };
    let b: Vec<_> = {
        let mut r = rng();
        (0..8)
            .map(|_| ResolvedTransition::resolve(Some(&spec), false, &mut r).unwrap().name)
            .collect()
    };
    assert_eq!(a, b);
}

#[test]
fn directional_alias_sets_direction_and_easing() {
    let spec = TransitionSpec::named("directional-left", 0.5);
    let t = ResolvedTransition::resolve(Some(&spec), false, &mut rng()).unwrap();
    assert_eq!(t.name.as_deref(), Some("directional"));
    assert_eq!(t.easing, Easing::EaseOutExpo);
    assert_eq!(t.params["direction"], serde_json::json!([1.0, 0.0]));
}

#[test]
fn unknown_name_and_bad_param_type_are_fatal() {
    let spec = TransitionSpec::named("nope", 1.0);
    let err = ResolvedTransition::resolve(Some(&spec), false, &mut rng()).unwrap_err();
    assert!(err.to_string().contains("transition not found: nope"));

    let mut spec = TransitionSpec::named("burn", 1.0);
    spec.params = serde_json::json!({ "color": 3 }).as_object().cloned();
    let err = ResolvedTransition::resolve(Some(&spec), false, &mut rng()).unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("vec3"));
}

#[test]
fn curves_default_to_tri() {
    let mut spec = TransitionSpec::named("fade", 1.0);
    spec.audio_out_curve = Some("exp".to_owned());
    let t = ResolvedTransition::resolve(Some(&spec), false, &mut rng()).unwrap();
    assert_eq!(t.audio_out_curve, "exp");
    assert_eq!(t.audio_in_curve, "tri");
}
