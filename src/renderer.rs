//! The render backend contract and backend selection.
//!
//! Godot drives every call here from its main thread: `init` once when the
//! layer enters the tree, `init_viewport`/`close_viewport` as viewports come
//! and go, `render` once per processed frame, `on_hide` when the layer stops
//! being visible. The backend owns whatever server resources it creates and
//! must release them in `close_viewport`.

use godot::builtin::Rid;
use godot::classes::DisplayServer;
use thiserror::Error;

use crate::canvas::CanvasRenderer;

/// Errors that can occur while bringing a render backend up.
#[derive(Debug, Error)]
pub enum InitError {
    /// The font atlas build produced a zero-sized texture.
    #[error("font atlas build produced an empty texture")]
    EmptyFontAtlas,

    /// The rendering server rejected the font atlas image.
    #[error("rendering server rejected the {width}x{height} font atlas image")]
    FontTextureUpload { width: u32, height: u32 },
}

/// Fixed contract between the frame state and a render backend.
pub trait Renderer {
    fn name(&self) -> &'static str;

    /// One-time backend setup. Uploads the font atlas; on failure the caller
    /// abandons this backend.
    fn init(&mut self, imgui: &mut imgui::Context) -> Result<(), InitError>;

    /// Prepares per-viewport resources for `vp_rid` and makes it the render
    /// target for subsequent frames.
    fn init_viewport(&mut self, vp_rid: Rid);

    /// Releases every resource created for `vp_rid`. The handle must have
    /// been passed to `init_viewport` before.
    fn close_viewport(&mut self, vp_rid: Rid);

    /// Draws one frame of ImGui output into the active viewport. A no-op
    /// until `init` has succeeded.
    fn render(&mut self, draw_data: &imgui::DrawData);

    /// Suspends visible output without tearing anything down; the next
    /// `render` resumes normally.
    fn on_hide(&mut self);
}

/// Backend used headless and as the failure fallback. Draws nothing.
pub struct DummyRenderer;

impl Renderer for DummyRenderer {
    fn name(&self) -> &'static str {
        "godot4_dummy"
    }

    fn init(&mut self, _imgui: &mut imgui::Context) -> Result<(), InitError> {
        Ok(())
    }

    fn init_viewport(&mut self, _vp_rid: Rid) {}

    fn close_viewport(&mut self, _vp_rid: Rid) {}

    fn render(&mut self, _draw_data: &imgui::DrawData) {}

    fn on_hide(&mut self) {}
}

/// Picks a backend for the current session and initializes it.
///
/// Headless display servers get the dummy backend. If the canvas backend
/// fails to initialize, we log and fall back to the dummy rather than taking
/// the host down.
pub fn create_renderer(imgui: &mut imgui::Context) -> Box<dyn Renderer> {
    if DisplayServer::singleton().get_name().to_string() == "headless" {
        log::info!("headless display server, ImGui output disabled");
        return Box::new(DummyRenderer);
    }

    let mut renderer = CanvasRenderer::new();
    match renderer.init(imgui) {
        Ok(()) => Box::new(renderer),
        Err(e) => {
            log::error!("failed to init {} renderer: {e}", renderer.name());
            Box::new(DummyRenderer)
        }
    }
}
