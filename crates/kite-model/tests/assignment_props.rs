//! Property tests for the colour assignment model

use kite_model::{Color, ColorAssignmentModel, Product, SelectionDefaults, Variation};
use proptest::prelude::*;

fn kite() -> Product {
    Product::new(
        "kite",
        vec![
            Color::new("Red", "#f00"),
            Color::new("Blue", "#00f"),
            Color::new("Black", "#000"),
        ],
        vec![
            Variation::new("front", "<svg/>"),
            Variation::new("back", "<svg/>"),
        ],
    )
}

#[derive(Debug, Clone)]
enum Op {
    Color(usize),
    Variation(usize),
    Apply(String),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3usize).prop_map(Op::Color),
        (0..2usize).prop_map(Op::Variation),
        "p[0-9]".prop_map(Op::Apply),
    ]
}

fn run(model: &mut ColorAssignmentModel, ops: &[Op]) {
    let product = kite();
    for op in ops {
        match op {
            Op::Color(i) => {
                model.select_color(&product.colors[*i].name);
            }
            Op::Variation(i) => {
                model.select_variation(&product.variations[*i].name);
            }
            Op::Apply(panel) => {
                model.apply_color(panel);
            }
        }
    }
}

proptest! {
    #[test]
    fn prop_apply_merges_into_current_variation(
        ops in proptest::collection::vec(op(), 0..40),
        panel in "p[0-9]",
    ) {
        let mut model = ColorAssignmentModel::new(kite(), &SelectionDefaults::new()).unwrap();
        run(&mut model, &ops);

        let before = model.current_variation_colors().clone();
        let color = model.current_color().clone();
        model.apply_color(&panel);
        let after = model.current_variation_colors().clone();

        prop_assert_eq!(after.get(&panel), Some(&color));
        for (other, c) in before.iter().filter(|(p, _)| *p != panel) {
            prop_assert_eq!(after.get(other), Some(c));
        }

        // Second application is a no-op
        let snapshot = model.snapshot();
        prop_assert!(!model.apply_color(&panel));
        prop_assert_eq!(model.applied_colors(), &snapshot);
    }

    #[test]
    fn prop_switching_variations_preserves_each_map(
        ops in proptest::collection::vec(op(), 0..40),
    ) {
        let mut model = ColorAssignmentModel::new(kite(), &SelectionDefaults::new()).unwrap();
        run(&mut model, &ops);

        let snapshot = model.snapshot();
        let original = model.current_variation().name.clone();
        let other = if original == "front" { "back" } else { "front" };

        model.select_variation(other);
        model.select_variation(&original);

        prop_assert_eq!(model.applied_colors(), &snapshot);
        prop_assert_eq!(&model.current_variation().name, &original);
    }

    #[test]
    fn prop_selection_always_resolves_to_member(
        ops in proptest::collection::vec(op(), 0..40),
        junk in "[a-z ]{0,12}",
    ) {
        let mut model = ColorAssignmentModel::new(kite(), &SelectionDefaults::new()).unwrap();
        run(&mut model, &ops);
        model.select_color(&junk);
        model.select_variation(&junk);

        let product = kite();
        prop_assert!(product.colors.contains(model.current_color()));
        prop_assert!(product.variations.contains(model.current_variation()));
    }
}
