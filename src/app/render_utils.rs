use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};
use schematize::appearance::{LinkAppearance, LinkColor};
use schematize::color::Rgb;

pub(super) const BACKGROUND: Color32 = Color32::from_rgb(250, 250, 250);
pub(super) const COMPONENT_OUTLINE: Color32 = Color32::from_rgb(190, 190, 190);
pub(super) const OCCUPANT_FILL: Color32 = Color32::from_rgb(60, 60, 60);
pub(super) const NUCLEOTIDE_TEXT: Color32 = Color32::from_rgb(30, 30, 30);

pub(super) fn rgb_color(rgb: Rgb, opacity: f32) -> Color32 {
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgba_unmultiplied(rgb.r, rgb.g, rgb.b, alpha)
}

pub(super) fn link_fill(appearance: &LinkAppearance) -> Color32 {
    rgb_color(appearance.color.rgb(), appearance.opacity)
}

pub(super) fn link_stroke(appearance: &LinkAppearance, width: f32) -> Stroke {
    match appearance.stroke {
        Some(color) => Stroke::new(width, rgb_color(color.rgb(), 1.0)),
        None => Stroke::NONE,
    }
}

// Faded links stay readable on the light background.
pub(super) fn arrow_stroke(appearance: &LinkAppearance, width: f32) -> Stroke {
    let width = if matches!(appearance.color, LinkColor::Gray) {
        width
    } else {
        width * 1.5
    };
    Stroke::new(width, link_fill(appearance))
}

pub(super) fn draw_background(painter: &Painter, rect: Rect) {
    painter.rect_filled(rect, 0.0, BACKGROUND);
}

pub(super) fn layout_to_screen(origin: Pos2, pan: Vec2, x: f32, y: f32) -> Pos2 {
    origin + pan + Vec2::new(x, y)
}

pub(super) fn span_visible(rect: Rect, left: f32, right: f32) -> bool {
    right >= rect.left() && left <= rect.right()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opacity_maps_to_alpha() {
        let color = rgb_color(Rgb::new(10, 20, 30), 0.3);
        assert_eq!(color.a(), 77);
        assert_eq!(rgb_color(Rgb::new(10, 20, 30), 2.0).a(), 255);
    }

    #[test]
    fn span_visibility_is_inclusive() {
        let rect = Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(100.0, 50.0));
        assert!(span_visible(rect, 100.0, 120.0));
        assert!(!span_visible(rect, -30.0, -1.0));
    }
}
