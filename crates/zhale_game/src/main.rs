//! Zhale -- main loop and application entry point.
//!
//! Architecture: winit drives the event loop via `ApplicationHandler`. All
//! simulation runs inside `RedrawRequested` using a **fixed-timestep** model
//! (see `TimeState`):
//!
//!   1. `begin_frame()` -- measure wall-clock delta, feed accumulator
//!   2. `while should_step()` -- consume fixed-dt slices for deterministic simulation
//!   3. Rebuild the tile mesh when the simulation advanced or the level changed
//!   4. Upload camera uniform, issue one draw call
//!
//! Hot reload: the level layer PNGs are watched via mtime polling and reloaded
//! at frame boundaries (between fixed steps). R forces a reload; if loading
//! fails the previous grid stays live.

mod controller;
mod geometry;
mod level;
mod motion;
mod palette;
#[cfg(test)]
mod replay;
mod tilemap;

use std::path::PathBuf;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use controller::{PlayerController, PlayerInput};
use glam::Vec2;
use level::{fallback_grid, load_grid_from_path, LevelWatcher};
use motion::Aabb;
use palette::{load_palette_from_path, Palette};
use tilemap::{Tile, TileGrid};
use zhale_core::input::{InputState, Key};
use zhale_core::time::TimeState;
use zhale_render::{Camera2D, GpuContext, QuadPipeline, QuadVertex};

const MAP_BASE_PATH: &str = "assets/maps/level";
const PALETTE_PATH: &str = "assets/maps/palette.json";
const TILE_SIZE: f32 = 32.0;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.05,
    g: 0.05,
    b: 0.07,
    a: 1.0,
};

const FLOOR_COLOR: [f32; 4] = [0.75, 0.75, 0.72, 1.0];
const WALL_COLOR: [f32; 4] = [0.2, 0.22, 0.25, 1.0];
const STAIRCASE_DOWN_COLOR: [f32; 4] = [0.85, 0.1, 0.85, 1.0];
const STAIRCASE_UP_COLOR: [f32; 4] = [0.1, 0.8, 0.8, 1.0];
const PLAYER_COLOR: [f32; 4] = [0.9, 0.25, 0.2, 1.0];

/// All mutable engine state lives here. Constructed lazily in
/// `ApplicationHandler::resumed` once the window and GPU surface exist.
///
/// Ownership is split into three conceptual groups:
///  - **Core systems** (time, input, camera) -- updated every frame
///  - **Content** (palette, grid, player) -- loaded from disk, hot-reloadable
///  - **GPU resources** (vertex/index/camera buffers) -- rebuilt when content changes
struct EngineState {
    window: Arc<Window>,
    gpu: GpuContext,
    time: TimeState,
    input: InputState,
    camera: Camera2D,
    quad_pipeline: QuadPipeline,

    map_base: PathBuf,
    level_watcher: LevelWatcher,
    palette: Palette,
    grid: TileGrid,
    player: PlayerController,

    // The tile mesh is rebuilt on the CPU when the simulation advances, then
    // streamed into these GPU buffers. Buffers grow (power-of-two) but never
    // shrink.
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    mesh_vertex_capacity: usize,
    mesh_index_capacity: usize,
    index_count: u32,
}

impl EngineState {
    fn new(window: Arc<Window>) -> Self {
        let gpu = GpuContext::new(window.clone())
            .unwrap_or_else(|err| panic!("Failed to initialize GPU: {err}"));
        let time = TimeState::new();
        let input = InputState::new();
        let quad_pipeline = QuadPipeline::new(&gpu.device, gpu.surface_format);

        let palette = match load_palette_from_path(std::path::Path::new(PALETTE_PATH)) {
            Ok(palette) => palette,
            Err(err) => {
                log::warn!("Using default palette: {err}");
                Palette::default()
            }
        };

        let map_base = PathBuf::from(MAP_BASE_PATH);
        let level_watcher = LevelWatcher::new(map_base.clone());
        let grid = match load_grid_from_path(&map_base, &palette, TILE_SIZE, Vec2::ZERO) {
            Ok(grid) => grid,
            Err(err) => {
                log::warn!("Falling back to built-in level: {err}");
                fallback_grid(TILE_SIZE)
            }
        };

        let player = PlayerController::new(
            Aabb::new(spawn_point(&grid), Vec2::splat(grid.tile_size() * 0.35)),
            0,
        );

        let mut camera = Camera2D::new(gpu.size.0, gpu.size.1);
        camera.position = player.aabb.center;

        let camera_uniform = camera.build_uniform();
        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[camera_uniform]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group = quad_pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);
        let vertex_buffer = create_vertex_buffer(&gpu.device, 1);
        let index_buffer = create_index_buffer(&gpu.device, 1);

        let mut state = Self {
            window,
            gpu,
            time,
            input,
            camera,
            quad_pipeline,
            map_base,
            level_watcher,
            palette,
            grid,
            player,
            vertex_buffer,
            index_buffer,
            camera_buffer,
            camera_bind_group,
            mesh_vertex_capacity: 0,
            mesh_index_capacity: 0,
            index_count: 0,
        };
        state.rebuild_tile_mesh();
        state
    }

    fn reload_level(&mut self, reason: &str) {
        match load_grid_from_path(&self.map_base, &self.palette, TILE_SIZE, Vec2::ZERO) {
            Ok(grid) => {
                self.grid = grid;
                if self.player.z >= self.grid.depth() {
                    self.player.z = self.grid.depth() - 1;
                }
                // Respawn if the reloaded level left the player inside a wall.
                if self
                    .grid
                    .is_solid(
                        self.grid.world_to_cell_x(self.player.aabb.center.x),
                        self.grid.world_to_cell_y(self.player.aabb.center.y),
                        self.player.z,
                    )
                {
                    self.player.aabb.center = spawn_point(&self.grid);
                    self.player.z = 0;
                }
                log::info!(
                    "Level reloaded ({reason}): {} layer(s)",
                    self.grid.depth()
                );
            }
            Err(err) => {
                log::error!("Level reload failed ({reason}): {err}");
            }
        }
    }

    /// Build a CPU-side mesh of the visible z-level plus the player quad,
    /// then stream it into the GPU buffers.
    fn rebuild_tile_mesh(&mut self) {
        let tile_estimate = (self.grid.width() as usize) * (self.grid.height() as usize) + 1;
        let mut vertices = Vec::with_capacity(tile_estimate * 4);
        let mut indices = Vec::with_capacity(tile_estimate * 6);

        let tile = self.grid.tile_size();
        for y in 0..self.grid.height() as i32 {
            for x in 0..self.grid.width() as i32 {
                let color = match self.grid.get(x, y, self.player.z) {
                    Tile::Void => continue,
                    Tile::Wall => WALL_COLOR,
                    Tile::Floor => FLOOR_COLOR,
                    Tile::StaircaseUp => STAIRCASE_UP_COLOR,
                    Tile::StaircaseDown => STAIRCASE_DOWN_COLOR,
                };
                let center = Vec2::new(
                    (self.grid.cell_left_world(x) + self.grid.cell_right_world(x)) * 0.5,
                    (self.grid.cell_top_world(y) + self.grid.cell_bottom_world(y)) * 0.5,
                );
                add_quad(&mut vertices, &mut indices, center, Vec2::splat(tile * 0.5), color);
            }
        }

        add_quad(
            &mut vertices,
            &mut indices,
            self.player.aabb.center,
            self.player.aabb.half,
            PLAYER_COLOR,
        );

        self.ensure_mesh_capacity(vertices.len(), indices.len());
        self.index_count = indices.len() as u32;
        if !vertices.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
        }
        if !indices.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&indices));
        }
    }

    fn ensure_mesh_capacity(&mut self, vertex_count: usize, index_count: usize) {
        let needed_vertices = vertex_count.max(1);
        if needed_vertices > self.mesh_vertex_capacity {
            self.mesh_vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.gpu.device, self.mesh_vertex_capacity);
        }

        let needed_indices = index_count.max(1);
        if needed_indices > self.mesh_index_capacity {
            self.mesh_index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(&self.gpu.device, self.mesh_index_capacity);
        }
    }
}

struct App {
    config: zhale_platform::window::PlatformConfig,
    state: Option<EngineState>,
}

impl App {
    fn new() -> Self {
        Self {
            config: zhale_platform::window::PlatformConfig::default(),
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window = zhale_platform::window::create_window(event_loop, &self.config);
        log::info!(
            "Window created: {}x{}",
            self.config.width,
            self.config.height
        );
        self.state = Some(EngineState::new(window));
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    state.camera.viewport = (w, h);
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(engine_key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.input.key_down(engine_key),
                            ElementState::Released => state.input.key_up(engine_key),
                        }
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }

                // Fixed-step simulation phase.
                state.time.begin_frame();
                let mut level_changed = false;

                while state.time.should_step() {
                    if state.input.is_pressed(Key::Escape) {
                        event_loop.exit();
                        return;
                    }

                    if state.input.is_pressed(Key::R) {
                        state.reload_level("manual trigger (R)");
                        level_changed = true;
                    } else if state.level_watcher.should_reload() {
                        state.reload_level("file watcher");
                        level_changed = true;
                    }

                    let mut player_input = PlayerInput::default();
                    if state.input.is_down(Key::Left) || state.input.is_down(Key::A) {
                        player_input.move_x -= 1.0;
                    }
                    if state.input.is_down(Key::Right) || state.input.is_down(Key::D) {
                        player_input.move_x += 1.0;
                    }
                    if state.input.is_down(Key::Up) || state.input.is_down(Key::W) {
                        player_input.move_y -= 1.0;
                    }
                    if state.input.is_down(Key::Down) || state.input.is_down(Key::S) {
                        player_input.move_y += 1.0;
                    }
                    player_input.interact_pressed = state.input.is_pressed(Key::E);

                    let dt = state.time.fixed_dt as f32;
                    state.player.step(player_input, dt, &state.grid);
                    state.camera.position = state.player.aabb.center;
                }

                if level_changed || state.time.steps_this_frame > 0 {
                    state.rebuild_tile_mesh();
                }

                // Render phase reads finalized simulation state from this frame.
                let camera_uniform = state.camera.build_uniform();
                state.gpu.queue.write_buffer(
                    &state.camera_buffer,
                    0,
                    bytemuck::cast_slice(&[camera_uniform]),
                );

                let Some((output, view)) = state.gpu.begin_frame() else {
                    return;
                };

                let mut encoder =
                    state
                        .gpu
                        .device
                        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                            label: Some("Render Encoder"),
                        });

                {
                    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Tile Render Pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        ..Default::default()
                    });

                    render_pass.set_pipeline(&state.quad_pipeline.render_pipeline);
                    render_pass.set_bind_group(0, &state.camera_bind_group, &[]);
                    render_pass.set_vertex_buffer(0, state.vertex_buffer.slice(..));
                    render_pass
                        .set_index_buffer(state.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..state.index_count, 0, 0..1);
                }

                state.gpu.queue.submit(std::iter::once(encoder.finish()));
                output.present();

                // Only clear edge-triggered input (pressed / released) after at
                // least one fixed step consumed it. Otherwise a press that
                // lands on a frame with 0 simulation steps is silently lost.
                if state.time.steps_this_frame > 0 {
                    state.input.end_frame();
                }
            }

            _ => {}
        }
    }
}

/// Center of the first floor tile on layer 0, or the grid center when the
/// level has no floor at all.
fn spawn_point(grid: &TileGrid) -> Vec2 {
    for y in 0..grid.height() as i32 {
        for x in 0..grid.width() as i32 {
            if grid.get(x, y, 0) == Tile::Floor {
                return Vec2::new(
                    (grid.cell_left_world(x) + grid.cell_right_world(x)) * 0.5,
                    (grid.cell_top_world(y) + grid.cell_bottom_world(y)) * 0.5,
                );
            }
        }
    }
    log::warn!("Level has no floor tile; spawning at grid center");
    Vec2::new(
        grid.origin().x + grid.width() as f32 * grid.tile_size() * 0.5,
        grid.origin().y + grid.height() as f32 * grid.tile_size() * 0.5,
    )
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<QuadVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Tile Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Tile Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn add_quad(
    vertices: &mut Vec<QuadVertex>,
    indices: &mut Vec<u32>,
    center: Vec2,
    half: Vec2,
    color: [f32; 4],
) {
    let base_index = vertices.len() as u32;

    vertices.push(QuadVertex {
        position: [center.x - half.x, center.y - half.y],
        color,
    });
    vertices.push(QuadVertex {
        position: [center.x + half.x, center.y - half.y],
        color,
    });
    vertices.push(QuadVertex {
        position: [center.x + half.x, center.y + half.y],
        color,
    });
    vertices.push(QuadVertex {
        position: [center.x - half.x, center.y + half.y],
        color,
    });

    indices.extend_from_slice(&[
        base_index,
        base_index + 1,
        base_index + 2,
        base_index,
        base_index + 2,
        base_index + 3,
    ]);
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::ArrowDown => Some(Key::Down),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::KeyW => Some(Key::W),
        KeyCode::KeyA => Some(Key::A),
        KeyCode::KeyS => Some(Key::S),
        KeyCode::KeyD => Some(Key::D),
        KeyCode::KeyE => Some(Key::E),
        KeyCode::KeyR => Some(Key::R),
        _ => None,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Zhale starting...");

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app).expect("Event loop error");
}
