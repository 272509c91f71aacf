// Library crate: the builder's model, picking, export and scripting interface.
// Windowing and painting (app, ui, viewport panel) stay in the binary crate.

pub mod command;
pub mod export;
pub mod harness;
pub mod render;
pub mod state;
pub mod texture;
pub mod validation;

/// Viewport math shared by the desktop painter and the web host.
pub mod viewport {
    pub mod camera;
    pub mod mesh;
    pub mod picking;
}
