//! Conversions between Godot builtins and the numeric types ImGui expects.

use godot::builtin::{Color, Rid, Vector2};
use imgui::TextureId;

#[inline]
pub(crate) fn to_array2(v: Vector2) -> [f32; 2] {
    [v.x, v.y]
}

#[inline]
pub(crate) fn to_array4(c: Color) -> [f32; 4] {
    [c.r, c.g, c.b, c.a]
}

#[inline]
pub(crate) fn rid_to_u64(rid: Rid) -> u64 {
    match rid {
        Rid::Valid(id) => id.get(),
        Rid::Invalid => 0,
    }
}

/// ImGui texture ids carry the raw `Rid` of the engine texture, so the
/// renderer can resolve draw commands back to server resources without a
/// registry.
#[inline]
pub(crate) fn texture_id(rid: Rid) -> TextureId {
    TextureId::new(rid_to_u64(rid) as usize)
}

#[inline]
pub(crate) fn rid_from_texture_id(id: TextureId) -> Rid {
    Rid::new(id.id() as u64)
}

/// Optional parameters of `ImGuiGD.Image`. The defaults are the script-facing
/// contract: full UV rectangle, untinted, no border.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ImageParams {
    pub uv0: Vector2,
    pub uv1: Vector2,
    pub tint_col: Color,
    pub border_col: Color,
}

impl Default for ImageParams {
    fn default() -> Self {
        Self {
            uv0: Vector2::ZERO,
            uv1: Vector2::ONE,
            tint_col: Color::WHITE,
            border_col: Color::from_rgba(0.0, 0.0, 0.0, 0.0),
        }
    }
}

/// Optional parameters of `ImGuiGD.ImageButton`: full UV rectangle,
/// transparent background, untinted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ImageButtonParams {
    pub uv0: Vector2,
    pub uv1: Vector2,
    pub bg_col: Color,
    pub tint_col: Color,
}

impl Default for ImageButtonParams {
    fn default() -> Self {
        Self {
            uv0: Vector2::ZERO,
            uv1: Vector2::ONE,
            bg_col: Color::from_rgba(0.0, 0.0, 0.0, 0.0),
            tint_col: Color::WHITE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_defaults_are_full_untinted_opaque() {
        let p = ImageParams::default();
        assert_eq!(to_array2(p.uv0), [0.0, 0.0]);
        assert_eq!(to_array2(p.uv1), [1.0, 1.0]);
        assert_eq!(to_array4(p.tint_col), [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(to_array4(p.border_col), [0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn image_button_defaults_are_full_untinted_transparent_bg() {
        let p = ImageButtonParams::default();
        assert_eq!(to_array2(p.uv0), [0.0, 0.0]);
        assert_eq!(to_array2(p.uv1), [1.0, 1.0]);
        assert_eq!(to_array4(p.bg_col), [0.0, 0.0, 0.0, 0.0]);
        assert_eq!(to_array4(p.tint_col), [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn texture_id_round_trips_through_rid() {
        let rid = Rid::new(0x4242_0001);
        assert_eq!(rid_from_texture_id(texture_id(rid)), rid);
        assert_eq!(rid_to_u64(Rid::Invalid), 0);
    }
}
