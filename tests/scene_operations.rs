use std::sync::Arc;

use egui::{Pos2, Vec2};
use pretty_assertions::assert_eq;
use shirt_designer::element::{ElementKind, ElementPatch};
use shirt_designer::text::{GROWTH_THRESHOLD, INITIAL_TEXT_PADDING};
use shirt_designer::{EditorConfig, ImageLoader, SceneComposer, SceneIntent, TextMetrics};

fn create_composer() -> SceneComposer {
    let fonts = Arc::new(TextMetrics::from_egui_defaults().unwrap());
    let mut composer = SceneComposer::new(EditorConfig::default(), ImageLoader::manual(), fonts);
    composer.resize_viewport(Vec2::new(700.0, 900.0));
    composer
}

fn assert_invariants(composer: &SceneComposer) {
    let scene = composer.scene();
    let mut ids: Vec<_> = scene.elements().iter().map(|element| element.id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), scene.len(), "duplicate element ids");
    if let Some(selected) = scene.selected() {
        assert!(scene.contains(selected), "selection points at a missing element");
    }
}

#[test]
fn test_add_text_defaults() {
    let mut composer = create_composer();
    let id = composer.add_text_element(None);

    let element = composer.scene().get(id).unwrap();
    let advance = composer.fonts().advance_width("Text", 50.0);
    assert_eq!(element.kind, ElementKind::Text);
    assert_eq!(element.content, "Text");
    assert_eq!(element.height, 50.0);
    assert!((element.width - (advance + INITIAL_TEXT_PADDING)).abs() < 0.01);
    assert_eq!(element.rotation, 0.0);
    assert_eq!(composer.scene().selected(), Some(id));
}

#[test]
fn test_add_image_defaults() {
    let mut composer = create_composer();
    let id = composer.add_image_element("data:image/png;base64,AAAA");

    let element = composer.scene().get(id).unwrap();
    assert_eq!(element.kind, ElementKind::Image);
    assert_eq!(element.position(), Pos2::new(100.0, 100.0));
    assert_eq!(element.size(), Vec2::new(200.0, 200.0));
    assert_eq!(element.rotation, 0.0);
    assert_eq!(composer.scene().selected(), None);
}

#[test]
fn test_undersized_resize_is_rejected() {
    let mut composer = create_composer();
    let id = composer.add_image_element("a.png");
    composer.select(Some(id));

    composer.apply_update(id, &ElementPatch::size(10.0, 10.0));
    let element = composer.scene().get(id).unwrap();
    assert_eq!(element.size(), Vec2::new(200.0, 200.0));

    // Rejection is idempotent
    composer.apply_update(id, &ElementPatch::size(10.0, 10.0));
    assert_eq!(composer.scene().get(id).unwrap().size(), Vec2::new(200.0, 200.0));
}

#[test]
fn test_text_accepts_font_sizes_below_the_box_minimum() {
    let mut composer = create_composer();
    let id = composer.add_text_element(None);

    composer.apply_update(id, &ElementPatch::size(100.0, 12.0));
    assert_eq!(composer.scene().get(id).unwrap().font_size(), 12.0);

    composer.apply_update(id, &ElementPatch::size(100.0, 3.0));
    assert_eq!(composer.scene().get(id).unwrap().font_size(), 12.0);
}

#[test]
fn test_delete_selected_clears_selection() {
    let mut composer = create_composer();
    let id = composer.add_text_element(None);
    assert_eq!(composer.scene().selected(), Some(id));

    composer.apply_intent(SceneIntent::Delete(id));
    assert!(!composer.scene().contains(id));
    assert_eq!(composer.scene().selected(), None);
}

#[test]
fn test_delete_without_selection_is_a_no_op() {
    let mut composer = create_composer();
    composer.add_image_element("a.png");
    composer.delete_selected();
    assert_eq!(composer.scene().len(), 1);
}

#[test]
fn test_update_missing_element_is_ignored() {
    let mut composer = create_composer();
    let id = composer.add_image_element("a.png");
    composer.delete(id);
    assert!(!composer.apply_update(id, &ElementPatch::position(Pos2::new(1.0, 1.0))));
    assert!(composer.scene().is_empty());
}

#[test]
fn test_text_grows_but_never_shrinks() {
    let mut composer = create_composer();
    let id = composer.add_text_element(Some("Hi"));
    let initial_width = composer.scene().get(id).unwrap().width;

    let long = "Hello there, shirt wearer";
    composer.apply_update(id, &ElementPatch::content(long));
    let grown = composer.scene().get(id).unwrap().width;
    let measured = composer.fonts().measure(long, 50.0).width;
    assert_eq!(grown, measured);
    assert!(grown > initial_width + GROWTH_THRESHOLD);

    composer.apply_update(id, &ElementPatch::content("Hi"));
    assert_eq!(composer.scene().get(id).unwrap().width, grown);
}

#[test]
fn test_small_growth_is_ignored() {
    let mut composer = create_composer();
    let id = composer.add_text_element(Some("Hi"));
    let width = composer.scene().get(id).unwrap().width;

    // The initial box already has 40 units of padding, measuring adds 20
    composer.apply_update(id, &ElementPatch::content("Hi!"));
    let element = composer.scene().get(id).unwrap();
    let measured = composer.fonts().measure("Hi!", 50.0).width;
    if measured > width + GROWTH_THRESHOLD {
        assert_eq!(element.width, measured);
    } else {
        assert_eq!(element.width, width);
    }
}

#[test]
fn test_random_operation_sequence_keeps_invariants() {
    let mut composer = create_composer();
    let mut ids = Vec::new();

    for step in 0..60usize {
        match step % 6 {
            0 => ids.push(composer.add_text_element(None)),
            1 => ids.push(composer.add_image_element(&format!("image-{}.png", step))),
            2 => {
                if let Some(id) = ids.get(step % ids.len().max(1)) {
                    composer.apply_intent(SceneIntent::Select(*id));
                }
            }
            3 => {
                if let Some(id) = ids.get(step / 2 % ids.len().max(1)) {
                    composer.apply_intent(SceneIntent::update(
                        *id,
                        ElementPatch::size(step as f32, 30.0),
                    ));
                }
            }
            4 => composer.delete_selected(),
            _ => {
                if let Some(id) = ids.first() {
                    composer.delete(*id);
                }
            }
        }
        assert_invariants(&composer);
        for element in composer.scene().elements() {
            assert!(element.width >= 20.0);
            if element.is_text() {
                assert!(element.font_size() >= 5.0);
            } else {
                assert!(element.height >= 20.0);
            }
        }
    }
}
