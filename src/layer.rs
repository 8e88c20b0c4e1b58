//! `ImGuiLayer`, the node that drives a frame per engine tick.
//!
//! Add it (or autoload it) anywhere in the scene; it sits on a high canvas
//! layer so UI draws on top. Hiding the node suspends rendering without
//! losing any state.

use godot::classes::{CanvasLayer, ICanvasLayer, InputEvent};
use godot::prelude::*;

use crate::state;

/// Canvas layer index; well above anything a game scene typically uses.
const LAYER: i32 = 128;

#[derive(GodotClass)]
#[class(base=CanvasLayer)]
pub struct ImGuiLayer {
    viewport: Rid,
    was_visible: bool,
    base: Base<CanvasLayer>,
}

#[godot_api]
impl ICanvasLayer for ImGuiLayer {
    fn init(base: Base<CanvasLayer>) -> Self {
        Self {
            viewport: Rid::Invalid,
            was_visible: true,
            base,
        }
    }

    fn ready(&mut self) {
        self.base_mut().set_layer(LAYER);

        state::init();
        match self.base().get_viewport() {
            Some(vp) => {
                self.viewport = vp.get_viewport_rid();
                state::init_viewport(self.viewport);
            }
            None => log::error!("ImGuiLayer has no viewport, nothing will be drawn"),
        }
    }

    fn process(&mut self, delta: f64) {
        if !self.base().is_visible() {
            if self.was_visible {
                state::on_hide();
                self.was_visible = false;
            }
            return;
        }
        self.was_visible = true;

        let Some(vp) = self.base().get_viewport() else {
            return;
        };

        state::begin_frame(vp.get_visible_rect().size, delta);
        for callable in state::layout_callbacks() {
            callable.call(&[]);
        }
        state::render();
    }

    fn input(&mut self, event: Gd<InputEvent>) {
        if state::process_input(&event) {
            if let Some(mut vp) = self.base().get_viewport() {
                vp.set_input_as_handled();
            }
        }
    }

    fn exit_tree(&mut self) {
        if self.viewport != Rid::Invalid {
            state::close_viewport(self.viewport);
        }
        state::shutdown();
    }
}
