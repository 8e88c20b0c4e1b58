//! Dear ImGui integration for Godot 4, as a GDExtension.
//!
//! Two classes are registered with the engine at the scene initialization
//! level:
//!
//! * [`ImGuiLayer`](layer::ImGuiLayer) — a `CanvasLayer` node that owns the
//!   ImGui context, pumps one frame per engine tick and forwards input.
//! * [`ImGuiGD`](api::ImGuiGD) — static helper functions for scripts:
//!   `Connect` to hook the per-frame layout phase, `Image`/`ImageButton` to
//!   draw engine textures as ImGui widgets.
//!
//! Rendering goes through the engine's 2D canvas pipeline (see [`canvas`]),
//! so it works with every Godot rendering driver, including compatibility
//! mode. Headless runs get a no-op backend.

use godot::prelude::*;

pub mod api;
pub mod canvas;
pub mod layer;
pub mod platform;
pub mod renderer;
pub mod state;

mod utils;

#[cfg(test)]
pub(crate) mod test_util;

/// Forwards `log` records to Godot's output console.
struct GodotConsoleLogger;

impl log::Log for GodotConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::Level::Debug
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = format!("{}: {}", record.target(), record.args());
        match record.level() {
            log::Level::Error => godot_error!("{message}"),
            log::Level::Warn => godot_warn!("{message}"),
            _ => godot_print!("{message}"),
        }
    }

    fn flush(&self) {}
}

static LOGGER: GodotConsoleLogger = GodotConsoleLogger;

struct ImGuiGodotExtension;

#[gdextension]
unsafe impl ExtensionLibrary for ImGuiGodotExtension {
    fn min_level() -> InitLevel {
        InitLevel::Scene
    }

    fn on_level_init(level: InitLevel) {
        if level != InitLevel::Scene {
            return;
        }
        // Err only on reload, when a logger is already installed.
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Debug);
        }
        log::debug!("imgui-godot extension loaded");
    }

    fn on_level_deinit(level: InitLevel) {
        if level != InitLevel::Scene {
            return;
        }
        log::debug!("imgui-godot extension unloaded");
    }
}
