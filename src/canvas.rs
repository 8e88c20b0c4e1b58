//! Canvas-item render backend.
//!
//! Draw lists are fed to Godot's 2D canvas pipeline through `RenderingServer`:
//! one canvas per viewport, one canvas item per ImGui draw command (a canvas
//! item carries a single clip rect). Geometry goes in as indexed triangle
//! arrays with per-vertex colors and UVs, textured by the `Rid` packed into
//! the draw command's texture id.
//!
//! Server access is funneled through [`CanvasBackend`] so the lifecycle logic
//! can be exercised against a tracking double instead of a live engine.

use std::collections::HashMap;

use godot::builtin::{
    Color, PackedByteArray, PackedColorArray, PackedInt32Array, PackedVector2Array, Rect2, Rid,
    Vector2,
};
use godot::classes::image::Format;
use godot::classes::{Image, RenderingServer};
use imgui::{DrawCmd, DrawCmdParams};

use crate::renderer::{InitError, Renderer};
use crate::utils::{rid_from_texture_id, rid_to_u64, texture_id};

/// One indexed triangle submission against a single texture.
pub(crate) struct TriangleBatch<'a> {
    pub indices: &'a [i32],
    pub points: &'a [Vector2],
    pub colors: &'a [Color],
    pub uvs: &'a [Vector2],
    pub texture: Rid,
}

/// The slice of `RenderingServer` the canvas renderer needs.
pub(crate) trait CanvasBackend {
    fn create_canvas(&mut self) -> Rid;
    fn create_canvas_item(&mut self, parent: Rid) -> Rid;
    fn attach_canvas(&mut self, viewport: Rid, canvas: Rid);
    fn detach_canvas(&mut self, viewport: Rid, canvas: Rid);
    fn clear_item(&mut self, item: Rid);
    fn set_item_clip(&mut self, item: Rid, rect: Rect2);
    fn add_triangles(&mut self, item: Rid, batch: &TriangleBatch<'_>);
    fn upload_rgba_texture(&mut self, width: u32, height: u32, data: &[u8])
    -> Result<Rid, InitError>;
    fn free(&mut self, rid: Rid);
}

/// Live `RenderingServer` implementation of [`CanvasBackend`].
pub(crate) struct RenderingServerBackend;

impl CanvasBackend for RenderingServerBackend {
    fn create_canvas(&mut self) -> Rid {
        RenderingServer::singleton().canvas_create()
    }

    fn create_canvas_item(&mut self, parent: Rid) -> Rid {
        let mut rs = RenderingServer::singleton();
        let item = rs.canvas_item_create();
        rs.canvas_item_set_parent(item, parent);
        item
    }

    fn attach_canvas(&mut self, viewport: Rid, canvas: Rid) {
        RenderingServer::singleton().viewport_attach_canvas(viewport, canvas);
    }

    fn detach_canvas(&mut self, viewport: Rid, canvas: Rid) {
        RenderingServer::singleton().viewport_remove_canvas(viewport, canvas);
    }

    fn clear_item(&mut self, item: Rid) {
        RenderingServer::singleton().canvas_item_clear(item);
    }

    fn set_item_clip(&mut self, item: Rid, rect: Rect2) {
        let mut rs = RenderingServer::singleton();
        rs.canvas_item_set_clip(item, true);
        rs.canvas_item_set_custom_rect_ex(item, true).rect(rect).done();
    }

    fn add_triangles(&mut self, item: Rid, batch: &TriangleBatch<'_>) {
        let indices = PackedInt32Array::from(batch.indices);
        let points = PackedVector2Array::from(batch.points);
        let colors = PackedColorArray::from(batch.colors);
        let uvs = PackedVector2Array::from(batch.uvs);

        RenderingServer::singleton()
            .canvas_item_add_triangle_array_ex(item, &indices, &points, &colors)
            .uvs(&uvs)
            .texture(batch.texture)
            .done();
    }

    fn upload_rgba_texture(
        &mut self,
        width: u32,
        height: u32,
        data: &[u8],
    ) -> Result<Rid, InitError> {
        let bytes = PackedByteArray::from(data);
        let image = Image::create_from_data(width as i32, height as i32, false, Format::RGBA8, &bytes)
            .ok_or(InitError::FontTextureUpload { width, height })?;
        Ok(RenderingServer::singleton().texture_2d_create(&image))
    }

    fn free(&mut self, rid: Rid) {
        RenderingServer::singleton().free_rid(rid);
    }
}

struct ViewportData {
    viewport: Rid,
    canvas: Rid,
    items: Vec<Rid>,
}

/// Renderer backend for ImGui using Godot canvas items.
///
/// This renderer performs the following tasks:
///
/// * Uploads the ImGui font atlas as an engine texture
/// * Maintains a canvas and a pool of canvas items per viewport
/// * Re-submits ImGui's draw list as triangle arrays every frame
pub struct CanvasRenderer<B: CanvasBackend = RenderingServerBackend> {
    backend: B,
    font_texture: Option<Rid>,
    viewports: HashMap<u64, ViewportData>,
    active: Option<u64>,
}

impl CanvasRenderer<RenderingServerBackend> {
    pub fn new() -> Self {
        Self::with_backend(RenderingServerBackend)
    }
}

impl Default for CanvasRenderer<RenderingServerBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: CanvasBackend> CanvasRenderer<B> {
    pub(crate) fn with_backend(backend: B) -> Self {
        Self {
            backend,
            font_texture: None,
            viewports: HashMap::new(),
            active: None,
        }
    }

    fn release_viewport(&mut self, key: u64) {
        let Some(data) = self.viewports.remove(&key) else {
            return;
        };
        for item in data.items {
            self.backend.free(item);
        }
        self.backend.detach_canvas(data.viewport, data.canvas);
        self.backend.free(data.canvas);
        if self.active == Some(key) {
            self.active = None;
        }
    }

    fn clear_all_items(&mut self) {
        for data in self.viewports.values() {
            for &item in &data.items {
                self.backend.clear_item(item);
            }
        }
    }
}

impl<B: CanvasBackend> Renderer for CanvasRenderer<B> {
    fn name(&self) -> &'static str {
        "godot4_canvas"
    }

    fn init(&mut self, imgui: &mut imgui::Context) -> Result<(), InitError> {
        let rid = {
            let fonts = imgui.fonts();
            let atlas = fonts.build_rgba32_texture();
            if atlas.width == 0 || atlas.height == 0 {
                return Err(InitError::EmptyFontAtlas);
            }
            self.backend
                .upload_rgba_texture(atlas.width, atlas.height, atlas.data)?
        };

        if let Some(old) = self.font_texture.replace(rid) {
            self.backend.free(old);
        }
        imgui.fonts().tex_id = texture_id(rid);
        Ok(())
    }

    fn init_viewport(&mut self, vp_rid: Rid) {
        let key = rid_to_u64(vp_rid);
        if !self.viewports.contains_key(&key) {
            let canvas = self.backend.create_canvas();
            self.backend.attach_canvas(vp_rid, canvas);
            self.viewports.insert(
                key,
                ViewportData {
                    viewport: vp_rid,
                    canvas,
                    items: Vec::new(),
                },
            );
        }
        self.active = Some(key);
    }

    fn close_viewport(&mut self, vp_rid: Rid) {
        self.release_viewport(rid_to_u64(vp_rid));
    }

    fn render(&mut self, draw_data: &imgui::DrawData) {
        // Not initialized, or no viewport to draw into.
        if self.font_texture.is_none() {
            return;
        }
        let Some(key) = self.active else {
            return;
        };

        let [width, height] = draw_data.display_size;
        let [off_x, off_y] = draw_data.display_pos;

        if width <= 0.0 || height <= 0.0 || draw_data.total_vtx_count == 0 {
            // Nothing visible this frame; stale items would linger otherwise.
            self.clear_all_items();
            return;
        }

        let canvas = self.viewports[&key].canvas;
        let mut used = 0usize;

        for draw_list in draw_data.draw_lists() {
            let vtx = draw_list.vtx_buffer();
            let mut points = Vec::with_capacity(vtx.len());
            let mut colors = Vec::with_capacity(vtx.len());
            let mut uvs = Vec::with_capacity(vtx.len());
            for v in vtx {
                points.push(Vector2::new(v.pos[0] - off_x, v.pos[1] - off_y));
                colors.push(Color::from_rgba(
                    v.col[0] as f32 / 255.0,
                    v.col[1] as f32 / 255.0,
                    v.col[2] as f32 / 255.0,
                    v.col[3] as f32 / 255.0,
                ));
                uvs.push(Vector2::new(v.uv[0], v.uv[1]));
            }
            let idx = draw_list.idx_buffer();

            for draw_cmd in draw_list.commands() {
                match draw_cmd {
                    DrawCmd::Elements {
                        count,
                        cmd_params:
                            DrawCmdParams {
                                clip_rect: [x, y, z, w],
                                texture_id,
                                idx_offset,
                                vtx_offset,
                                ..
                            },
                    } => {
                        let clip_w = z - x;
                        let clip_h = w - y;
                        if clip_w <= 0.0 || clip_h <= 0.0 {
                            continue;
                        }

                        // Grow the item pool on demand.
                        if used == self.viewports[&key].items.len() {
                            let item = self.backend.create_canvas_item(canvas);
                            self.viewports.get_mut(&key).unwrap().items.push(item);
                        }
                        let item = self.viewports[&key].items[used];
                        used += 1;

                        self.backend.clear_item(item);
                        self.backend.set_item_clip(
                            item,
                            Rect2::new(
                                Vector2::new(x - off_x, y - off_y),
                                Vector2::new(clip_w, clip_h),
                            ),
                        );

                        let indices: Vec<i32> = idx[idx_offset..idx_offset + count]
                            .iter()
                            .map(|&i| i as i32 + vtx_offset as i32)
                            .collect();

                        self.backend.add_triangles(
                            item,
                            &TriangleBatch {
                                indices: &indices,
                                points: &points,
                                colors: &colors,
                                uvs: &uvs,
                                texture: rid_from_texture_id(texture_id),
                            },
                        );
                    }
                    // Raw callbacks target a GPU command stream we do not
                    // have; there is nothing meaningful to forward them to.
                    _ => {}
                }
            }
        }

        // Shrink the pool to what this frame needed.
        let surplus: Vec<Rid> = {
            let items = &mut self.viewports.get_mut(&key).unwrap().items;
            items.split_off(used)
        };
        for item in surplus {
            self.backend.free(item);
        }
    }

    fn on_hide(&mut self) {
        self.clear_all_items();
    }
}

impl<B: CanvasBackend> Drop for CanvasRenderer<B> {
    fn drop(&mut self) {
        let keys: Vec<u64> = self.viewports.keys().copied().collect();
        for key in keys {
            self.release_viewport(key);
        }
        if let Some(font) = self.font_texture.take() {
            self.backend.free(font);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;

    use imgui::Condition;

    use super::*;
    use crate::test_util::test_sync;

    #[derive(Default)]
    struct Tracker {
        next_rid: u64,
        live: HashSet<u64>,
        clears: usize,
        triangle_calls: usize,
    }

    impl Tracker {
        fn alloc(&mut self) -> Rid {
            self.next_rid += 1;
            self.live.insert(self.next_rid);
            Rid::new(self.next_rid)
        }
    }

    #[derive(Clone, Default)]
    struct TrackingBackend(Rc<RefCell<Tracker>>);

    impl CanvasBackend for TrackingBackend {
        fn create_canvas(&mut self) -> Rid {
            self.0.borrow_mut().alloc()
        }

        fn create_canvas_item(&mut self, _parent: Rid) -> Rid {
            self.0.borrow_mut().alloc()
        }

        fn attach_canvas(&mut self, _viewport: Rid, _canvas: Rid) {}

        fn detach_canvas(&mut self, _viewport: Rid, _canvas: Rid) {}

        fn clear_item(&mut self, _item: Rid) {
            self.0.borrow_mut().clears += 1;
        }

        fn set_item_clip(&mut self, _item: Rid, _rect: Rect2) {}

        fn add_triangles(&mut self, _item: Rid, batch: &TriangleBatch<'_>) {
            assert_eq!(batch.indices.len() % 3, 0);
            self.0.borrow_mut().triangle_calls += 1;
        }

        fn upload_rgba_texture(
            &mut self,
            _width: u32,
            _height: u32,
            _data: &[u8],
        ) -> Result<Rid, InitError> {
            Ok(self.0.borrow_mut().alloc())
        }

        fn free(&mut self, rid: Rid) {
            assert!(
                self.0.borrow_mut().live.remove(&rid_to_u64(rid)),
                "double free or foreign rid"
            );
        }
    }

    fn test_context() -> imgui::Context {
        let mut ctx = imgui::Context::create();
        ctx.set_ini_filename(None);
        ctx.set_log_filename(None);
        ctx.io_mut().display_size = [800.0, 600.0];
        ctx.io_mut().delta_time = 1.0 / 60.0;
        ctx
    }

    fn draw_test_frame(ctx: &mut imgui::Context) -> &imgui::DrawData {
        ctx.io_mut().delta_time = 1.0 / 60.0;
        let ui = ctx.new_frame();
        ui.window("test")
            .position([0.0, 0.0], Condition::Always)
            .size([200.0, 100.0], Condition::Always)
            .build(|| ui.text("hello"));
        ctx.render()
    }

    #[test]
    fn viewport_open_close_frees_everything() {
        let _guard = test_sync::lock_context();
        let mut ctx = test_context();

        let backend = TrackingBackend::default();
        let mut renderer = CanvasRenderer::with_backend(backend.clone());
        renderer.init(&mut ctx).unwrap();

        let vp = Rid::new(7);
        renderer.init_viewport(vp);
        renderer.render(draw_test_frame(&mut ctx));
        renderer.close_viewport(vp);

        // Only the font atlas texture remains.
        assert_eq!(backend.0.borrow().live.len(), 1);

        drop(renderer);
        assert!(backend.0.borrow().live.is_empty());
    }

    #[test]
    fn render_before_init_is_a_noop() {
        let _guard = test_sync::lock_context();
        let mut ctx = test_context();
        // Build the atlas ourselves since init() won't run.
        ctx.fonts().build_rgba32_texture();

        let backend = TrackingBackend::default();
        let mut renderer = CanvasRenderer::with_backend(backend.clone());
        renderer.init_viewport(Rid::new(7));

        renderer.render(draw_test_frame(&mut ctx));

        let t = backend.0.borrow();
        assert_eq!(t.triangle_calls, 0);
        // Viewport canvas exists, but no items were created.
        assert_eq!(t.live.len(), 1);
    }

    #[test]
    fn hide_clears_items_and_render_resumes_without_reinit() {
        let _guard = test_sync::lock_context();
        let mut ctx = test_context();

        let backend = TrackingBackend::default();
        let mut renderer = CanvasRenderer::with_backend(backend.clone());
        renderer.init(&mut ctx).unwrap();
        renderer.init_viewport(Rid::new(9));

        renderer.render(draw_test_frame(&mut ctx));
        let first_pass = backend.0.borrow().triangle_calls;
        assert!(first_pass > 0);

        let before = backend.0.borrow().clears;
        renderer.on_hide();
        assert!(backend.0.borrow().clears > before);

        renderer.render(draw_test_frame(&mut ctx));
        assert!(backend.0.borrow().triangle_calls > first_pass);
    }

    #[test]
    fn empty_frame_clears_stale_output() {
        let _guard = test_sync::lock_context();
        let mut ctx = test_context();

        let backend = TrackingBackend::default();
        let mut renderer = CanvasRenderer::with_backend(backend.clone());
        renderer.init(&mut ctx).unwrap();
        renderer.init_viewport(Rid::new(3));
        renderer.render(draw_test_frame(&mut ctx));

        // A frame with no windows produces no vertices.
        ctx.io_mut().delta_time = 1.0 / 60.0;
        let _ = ctx.new_frame();
        let empty = ctx.render();
        assert_eq!(empty.total_vtx_count, 0);

        let before = backend.0.borrow().clears;
        renderer.render(empty);
        assert!(backend.0.borrow().clears > before);
    }
}
