//! Property-based tests for panel ordering, visibility and rebuild behaviour.

use proptest::prelude::*;

use parambind::constants::DEFAULT_PRECEDENCE;
use parambind::{ParamConfig, ParamPanel, Parameter, Parameterized, Value};

fn object_with_precedences(precedences: &[Option<i8>]) -> Parameterized {
    let object = Parameterized::new("Props");
    for (i, precedence) in precedences.iter().enumerate() {
        let mut param = Parameter::integer(format!("p{}", i), i as i64);
        if let Some(p) = precedence {
            param = param.with_precedence(f64::from(*p));
        }
        object.add_param(param);
    }
    object
}

fn expected_visible(precedences: &[Option<i8>], threshold: f64) -> Vec<String> {
    let mut indexed: Vec<(usize, f64, bool)> = precedences
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let shown = p.map_or(true, |p| f64::from(p) >= threshold);
            (i, p.map_or(DEFAULT_PRECEDENCE, f64::from), shown)
        })
        .collect();
    indexed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    indexed
        .into_iter()
        .filter(|(_, _, shown)| *shown)
        .map(|(i, _, _)| format!("p{}", i))
        .collect()
}

// =============================================================================
// Ordering
// =============================================================================

proptest! {
    /// Controls appear by ascending precedence, declaration order breaking ties
    #[test]
    fn prop_visible_order_matches_precedence(
        precedences in prop::collection::vec(prop::option::of(-5i8..5), 1..8),
        threshold in -5i8..5,
    ) {
        let object = object_with_precedences(&precedences);
        let config = ParamConfig::new().with_display_threshold(f64::from(threshold));
        let panel = ParamPanel::new(&object, config).unwrap();
        prop_assert_eq!(panel.visible_params(), expected_visible(&precedences, f64::from(threshold)));
    }

    /// Rebuilding never changes the order or the number of links
    #[test]
    fn prop_rebuild_is_idempotent(
        precedences in prop::collection::vec(prop::option::of(-5i8..5), 1..8),
    ) {
        let object = object_with_precedences(&precedences);
        let panel = ParamPanel::new(&object, ParamConfig::new()).unwrap();
        let visible = panel.visible_params();
        let links = panel.link_count();
        let watchers = object.watcher_count();

        panel.rebuild();
        panel.rebuild();
        prop_assert_eq!(panel.visible_params(), visible);
        prop_assert_eq!(panel.link_count(), links);
        prop_assert_eq!(object.watcher_count(), watchers);
    }
}

// =============================================================================
// Visibility
// =============================================================================

proptest! {
    /// Raising and restoring the threshold brings back the same controls
    #[test]
    fn prop_threshold_change_is_reversible(
        precedences in prop::collection::vec(prop::option::of(-5i8..5), 1..8),
        threshold in -5i8..5,
    ) {
        let object = object_with_precedences(&precedences);
        let panel = ParamPanel::new(&object, ParamConfig::new()).unwrap();
        let before = panel.widget_box().objects();

        panel.set_display_threshold(f64::from(threshold));
        panel.set_display_threshold(0.0);
        let after = panel.widget_box().objects();

        prop_assert_eq!(before.len(), after.len());
        for (a, b) in before.iter().zip(after.iter()) {
            prop_assert!(a.ptr_eq(b));
        }
    }

    /// Precedence changes reorder the visible controls without rebuilding them
    #[test]
    fn prop_precedence_change_keeps_controls(
        precedences in prop::collection::vec(prop::option::of(-5i8..5), 2..8),
        target in 0usize..8,
        new_precedence in -5i8..5,
    ) {
        let object = object_with_precedences(&precedences);
        let panel = ParamPanel::new(&object, ParamConfig::new()).unwrap();
        let controls = panel.controls();
        let index = target % precedences.len();

        object.set_precedence(&format!("p{}", index), Some(f64::from(new_precedence))).unwrap();

        let mut updated = precedences.clone();
        updated[index] = Some(new_precedence);
        prop_assert_eq!(panel.visible_params(), expected_visible(&updated, 0.0));
        for ((name_a, a), (name_b, b)) in controls.iter().zip(panel.controls().iter()) {
            prop_assert_eq!(name_a, name_b);
            prop_assert!(a.ptr_eq(b));
        }
    }
}

// =============================================================================
// Propagation
// =============================================================================

proptest! {
    /// The control always shows the last value written to the parameter,
    /// and a control edit always lands on the parameter
    #[test]
    fn prop_values_propagate_both_ways(values in prop::collection::vec(any::<i32>(), 1..10)) {
        let object = Parameterized::new("Props").with_param(Parameter::integer("x", 0));
        let panel = ParamPanel::new(&object, ParamConfig::new()).unwrap();
        let widget = panel.widget("x").unwrap();

        for value in &values {
            object.set_param("x", i64::from(*value)).unwrap();
            prop_assert_eq!(widget.value(), Value::Int(i64::from(*value)));
        }
        for value in &values {
            widget.set_value(i64::from(*value) + 1);
            prop_assert_eq!(object.value("x"), Some(Value::Int(i64::from(*value) + 1)));
        }
    }
}
