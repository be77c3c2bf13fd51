use fluxslot::{
    Ease, FINALIZE_SLACK_MS, GeneratorSpec, MotionPreference, RuntimeInputs, SLOT_ID_ATTR,
    SLOT_INNER_ATTR, SLOT_LAYER_ATTR, SlotNode, SlotPatch, TransitionEngine, TransitionKind,
    advance_slot_playback_state, ensure_inner_wrapper, inner_wrapper_count, parse_refresh_policy,
    parse_transition, render_html,
};

fn slot(id: &str, text: &str) -> SlotNode {
    let mut n = SlotNode::new("span").with_attr(SLOT_ID_ATTR, id);
    n.text = text.to_string();
    n
}

fn layer_count(node: &SlotNode) -> usize {
    let own = usize::from(node.attrs.contains_key(SLOT_LAYER_ATTR));
    own + node.children.iter().map(layer_count).sum::<usize>()
}

#[test]
fn transition_converges_after_duration_plus_slack() {
    for text in [
        "fade(220ms, inOut)",
        "wipe(left, 180ms, out)",
        "wipe(up, 180ms, in)",
        "flash(120ms)",
    ] {
        let transition = parse_transition(text).unwrap();
        let duration = match &transition {
            TransitionKind::Fade { duration_ms, .. }
            | TransitionKind::Wipe { duration_ms, .. }
            | TransitionKind::Flash { duration_ms } => *duration_ms,
            _ => unreachable!(),
        };

        let mut engine = TransitionEngine::new(MotionPreference::Full);
        let mut outer = slot("s1", "old");
        engine.apply(&mut outer, SlotPatch::Text("new".into()), &transition, 0.0, None);
        assert!(engine.is_transitioning("s1"), "{text}");
        assert_eq!(layer_count(&outer), 2, "{text}");

        // A few mid-flight ticks, then one past the deadline.
        engine.advance(&mut outer, duration * 0.25);
        engine.advance(&mut outer, duration * 0.75);
        engine.advance(&mut outer, duration + FINALIZE_SLACK_MS);

        assert!(!engine.is_transitioning("s1"), "{text}");
        assert_eq!(layer_count(&outer), 0, "{text}");
        let html = render_html(&outer);
        assert!(html.contains("new"), "{text}: {html}");
        assert!(!html.contains("old"), "{text}: {html}");
    }
}

#[test]
fn convergence_does_not_require_intermediate_ticks() {
    let transition = parse_transition("fade(200ms, linear)").unwrap();
    let mut engine = TransitionEngine::new(MotionPreference::Full);
    let mut outer = slot("s1", "old");
    engine.apply(&mut outer, SlotPatch::Text("new".into()), &transition, 1000.0, None);
    // The host may drop every frame; the first late tick still finalizes.
    engine.advance(&mut outer, 10_000.0);
    assert!(!engine.is_transitioning("s1"));
    assert_eq!(layer_count(&outer), 0);
    assert!(render_html(&outer).contains("new"));
}

#[test]
fn wrapper_normalization_survives_repeated_patching() {
    let mut engine = TransitionEngine::new(MotionPreference::Full);
    let mut outer = slot("s1", "seed text");
    for (i, now) in (0u32..5).zip([0.0, 50.0, 400.0, 800.0, 1200.0]) {
        engine.apply(
            &mut outer,
            SlotPatch::Text(format!("value {i}")),
            &TransitionKind::Fade {
                duration_ms: 100.0,
                ease: Ease::Linear,
            },
            now,
            None,
        );
        assert_eq!(inner_wrapper_count(&outer), 1);
    }
    engine.advance(&mut outer, 10_000.0);
    assert_eq!(inner_wrapper_count(&outer), 1);
    assert!(render_html(&outer).contains("value 4"));
}

#[test]
fn ensure_inner_wrapper_is_idempotent_across_calls() {
    let mut outer = slot("s1", "hello");
    for _ in 0..3 {
        ensure_inner_wrapper(&mut outer);
        assert_eq!(inner_wrapper_count(&outer), 1);
    }
    let html = render_html(&outer);
    assert_eq!(html.matches(SLOT_INNER_ATTR).count(), 1);
    assert!(html.contains("hello"));
}

#[test]
fn full_pipeline_patches_the_fixture_slot() {
    let raw = include_str!("data/headline_slot.json");
    let doc: serde_json::Value = serde_json::from_str(raw).unwrap();

    let policy = parse_refresh_policy(doc["refresh"].as_str().unwrap()).unwrap();
    let transition = parse_transition(doc["transition"].as_str().unwrap()).unwrap();
    let spec: GeneratorSpec = serde_json::from_value(doc["generator"].clone()).unwrap();
    let slot_id = doc["slot_id"].as_str().unwrap();

    let mut engine = TransitionEngine::new(MotionPreference::Full);
    let mut outer = slot(slot_id, "");

    // Initial paint at t=0, then drive time forward one bucket at a time.
    let mut state = None;
    let mut now_ms = 0.0;
    let mut painted = Vec::new();
    for tick in 0..=40u32 {
        let rt = RuntimeInputs::new(3, f64::from(tick) * 0.1, 0);
        let adv = advance_slot_playback_state(
            state.as_ref(),
            Some(&spec),
            &policy,
            &rt,
            slot_id,
            &[],
        );
        if adv.changed {
            engine.apply(
                &mut outer,
                SlotPatch::from_value(&adv.state.value),
                &transition,
                now_ms,
                None,
            );
            painted.push(adv.state.value.clone());
        }
        engine.advance(&mut outer, now_ms);
        state = Some(adv.state);
        now_ms += 100.0;
    }
    engine.advance(&mut outer, now_ms + 1000.0);

    // every(1s) over 4 seconds: initial paint plus four cycle steps.
    let texts: Vec<String> = painted
        .iter()
        .map(|v| match v {
            fluxslot::SlotValue::Text { text } => text.clone(),
            _ => panic!("cycle produces text"),
        })
        .collect();
    assert_eq!(texts, vec!["alpha", "beta", "gamma", "alpha", "beta"]);

    assert_eq!(inner_wrapper_count(&outer), 1);
    assert!(render_html(&outer).contains("beta"));
}
