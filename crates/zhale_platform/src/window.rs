use std::sync::Arc;
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

pub struct PlatformConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Desktop position of the top-left corner.
    pub position: (i32, i32),
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            title: "Zhale".to_string(),
            width: 1280,
            height: 720,
            position: (0, 0),
        }
    }
}

pub fn create_window(event_loop: &ActiveEventLoop, config: &PlatformConfig) -> Arc<Window> {
    let attrs = WindowAttributes::default()
        .with_title(&config.title)
        .with_inner_size(LogicalSize::new(config.width, config.height))
        .with_position(PhysicalPosition::new(config.position.0, config.position.1));

    let window = event_loop
        .create_window(attrs)
        .expect("Failed to create window");
    log::debug!("Window attributes applied: {}", config.title);
    Arc::new(window)
}
