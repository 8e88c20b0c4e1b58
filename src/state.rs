//! Per-session ImGui state.
//!
//! One [`State`] per process, living in a `thread_local`: Godot invokes every
//! entry point of this extension on its main thread, so no locking is needed.
//! The layer node owns the lifecycle (`init` in `ready`, `shutdown` in
//! `exit_tree`); everything else reads through the free functions here.

use std::cell::RefCell;
use std::ptr::NonNull;

use godot::builtin::{Callable, Rid, Vector2};
use godot::classes::InputEvent;
use godot::obj::Gd;
use imgui::BackendFlags;

use crate::platform;
use crate::renderer::{Renderer, create_renderer};

pub struct State {
    context: imgui::Context,
    renderer: Box<dyn Renderer>,
    layout_callbacks: Vec<Callable>,
    // Points into `context` between begin_frame and render. Valid because the
    // state never moves while a frame is open and nothing else touches the
    // context during the layout phase.
    frame: Option<NonNull<imgui::Ui>>,
}

thread_local! {
    static STATE: RefCell<Option<State>> = const { RefCell::new(None) };
}

/// Creates the ImGui context, picks a render backend and stores the session
/// state. Idempotent; a second call is ignored.
pub fn init() {
    STATE.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_some() {
            return;
        }

        let mut context = imgui::Context::create();
        context.set_ini_filename(None);
        context.set_log_filename(None);
        context.set_platform_name(Some("godot4".to_owned()));

        context.io_mut().backend_flags |= BackendFlags::RENDERER_HAS_VTX_OFFSET;
        context
            .fonts()
            .add_font(&[imgui::FontSource::DefaultFontData { config: None }]);

        let renderer = create_renderer(&mut context);
        context.set_renderer_name(Some(renderer.name().to_owned()));
        log::info!("imgui-godot initialized with {} renderer", renderer.name());

        *slot = Some(State {
            context,
            renderer,
            layout_callbacks: Vec::new(),
            frame: None,
        });
    });
}

/// Drops the renderer and the ImGui context.
pub fn shutdown() {
    STATE.with(|cell| {
        *cell.borrow_mut() = None;
    });
}

pub fn is_initialized() -> bool {
    STATE.with(|cell| cell.borrow().is_some())
}

pub fn init_viewport(vp_rid: Rid) {
    with_state(|state| state.renderer.init_viewport(vp_rid));
}

pub fn close_viewport(vp_rid: Rid) {
    with_state(|state| state.renderer.close_viewport(vp_rid));
}

pub fn on_hide() {
    with_state(|state| state.renderer.on_hide());
}

/// Registers a callable invoked once per frame during the layout phase.
pub fn connect(callable: Callable) {
    with_state(|state| state.layout_callbacks.push(callable));
}

/// Starts a new ImGui frame sized to the viewport.
pub fn begin_frame(display_size: Vector2, delta: f64) {
    with_state(|state| {
        let io = state.context.io_mut();
        io.display_size = [display_size.x, display_size.y];
        io.delta_time = delta as f32;

        let ui = state.context.new_frame();
        state.frame = Some(NonNull::from(ui));
    });
}

/// Finishes the frame and hands the draw data to the render backend.
pub fn render() {
    with_state(|state| {
        if state.frame.take().is_none() {
            return;
        }
        let draw_data = state.context.render();
        state.renderer.render(draw_data);
    });
}

/// Routes an input event into ImGui io. Returns true if ImGui consumed it.
pub fn process_input(event: &Gd<InputEvent>) -> bool {
    try_with_state(|state| platform::process_input(state.context.io_mut(), event)).unwrap_or(false)
}

/// Snapshot of the registered layout callables. Cloned out so callers can
/// invoke them without holding the state borrow; a callable is free to call
/// back into `ImGuiGD`.
pub fn layout_callbacks() -> Vec<Callable> {
    try_with_state(|state| state.layout_callbacks.clone()).unwrap_or_default()
}

/// Runs `f` against the active frame's `Ui`. Returns `None` outside the
/// layout phase (between `render` and the next `begin_frame`) or before init.
pub fn with_ui<R>(f: impl FnOnce(&mut imgui::Ui) -> R) -> Option<R> {
    STATE.with(|cell| {
        let mut slot = cell.borrow_mut();
        let state = slot.as_mut()?;
        let mut ui = state.frame?;
        Some(f(unsafe { ui.as_mut() }))
    })
}

fn try_with_state<R>(f: impl FnOnce(&mut State) -> R) -> Option<R> {
    STATE.with(|cell| cell.borrow_mut().as_mut().map(f))
}

// Silently does nothing before `init` or after `shutdown`.
fn with_state(f: impl FnOnce(&mut State)) {
    let _ = try_with_state(f);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::test_sync;

    // State relies on the engine for renderer selection, so these tests only
    // cover the guards that must hold before init.

    #[test]
    fn calls_before_init_are_noops() {
        let _guard = test_sync::lock_context();
        assert!(!is_initialized());
        render();
        on_hide();
        init_viewport(Rid::new(1));
        close_viewport(Rid::new(1));
        assert!(layout_callbacks().is_empty());
        assert!(with_ui(|_| ()).is_none());
    }
}
