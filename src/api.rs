//! `ImGuiGD`, the script-facing helper class.
//!
//! Registered method names are PascalCase, matching the addon API scripts
//! already use (`ImGuiGD.Connect`, `ImGuiGD.Image`, ...). `#[func]` cannot
//! express default argument values, so each widget call has a short form
//! applying the documented defaults and an `Ex` form taking everything.

use godot::classes::Texture2D;
use godot::prelude::*;

use crate::state;
use crate::utils::{ImageButtonParams, ImageParams, texture_id, to_array2, to_array4};

#[derive(GodotClass)]
#[class(init, base=Object)]
pub struct ImGuiGD {
    base: Base<Object>,
}

#[godot_api]
impl ImGuiGD {
    /// Registers a callable invoked every frame during the layout phase.
    /// Draw your UI from it using ImGui bindings or the widgets below.
    #[func(rename = Connect)]
    fn connect_layout(callable: Callable) {
        state::connect(callable);
    }

    /// Draws `tex` at `size` with the full UV rectangle, untinted, without a
    /// border.
    #[func(rename = Image)]
    fn image(tex: Gd<Texture2D>, size: Vector2) {
        Self::draw_image(&tex, size, ImageParams::default());
    }

    #[func(rename = ImageEx)]
    fn image_ex(
        tex: Gd<Texture2D>,
        size: Vector2,
        uv0: Vector2,
        uv1: Vector2,
        tint_col: Color,
        border_col: Color,
    ) {
        Self::draw_image(
            &tex,
            size,
            ImageParams {
                uv0,
                uv1,
                tint_col,
                border_col,
            },
        );
    }

    /// Draws a clickable image. Returns true if it was activated this frame.
    #[func(rename = ImageButton)]
    fn image_button(str_id: GString, tex: Gd<Texture2D>, size: Vector2) -> bool {
        Self::draw_image_button(&str_id, &tex, size, ImageButtonParams::default())
    }

    #[func(rename = ImageButtonEx)]
    fn image_button_ex(
        str_id: GString,
        tex: Gd<Texture2D>,
        size: Vector2,
        uv0: Vector2,
        uv1: Vector2,
        bg_col: Color,
        tint_col: Color,
    ) -> bool {
        Self::draw_image_button(
            &str_id,
            &tex,
            size,
            ImageButtonParams {
                uv0,
                uv1,
                bg_col,
                tint_col,
            },
        )
    }
}

impl ImGuiGD {
    fn draw_image(tex: &Gd<Texture2D>, size: Vector2, params: ImageParams) {
        let tex_id = texture_id(tex.get_rid());
        let drawn = state::with_ui(|ui| {
            imgui::Image::new(tex_id, to_array2(size))
                .uv0(to_array2(params.uv0))
                .uv1(to_array2(params.uv1))
                .tint_col(to_array4(params.tint_col))
                .border_col(to_array4(params.border_col))
                .build(ui);
        });
        if drawn.is_none() {
            log::error!("ImGuiGD.Image called outside the layout phase");
        }
    }

    fn draw_image_button(
        str_id: &GString,
        tex: &Gd<Texture2D>,
        size: Vector2,
        params: ImageButtonParams,
    ) -> bool {
        let tex_id = texture_id(tex.get_rid());
        let label = str_id.to_string();
        let pressed = state::with_ui(|ui| {
            ui.image_button_config(&label, tex_id, to_array2(size))
                .uv0(to_array2(params.uv0))
                .uv1(to_array2(params.uv1))
                .background_col(to_array4(params.bg_col))
                .tint_col(to_array4(params.tint_col))
                .build()
        });
        match pressed {
            Some(pressed) => pressed,
            None => {
                log::error!("ImGuiGD.ImageButton called outside the layout phase");
                false
            }
        }
    }
}
