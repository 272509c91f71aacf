//! Seams to the renderer: disposable resource handles, the backend that owns
//! them, and the camera navigation switch.

use std::collections::HashMap;

use shared::{Material, ShapeKind};

use crate::texture::TextureRef;

/// Handle to a geometry buffer owned by a [`RenderBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryHandle(pub u64);

/// Handle to a material owned by a [`RenderBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialHandle(pub u64);

/// What a geometry buffer holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeometrySpec {
    Shape(ShapeKind),
    Plane { size: f32 },
    Grid { size: f32, divisions: u32 },
}

/// Live and released resource totals of a backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCounts {
    pub live_geometries: usize,
    pub live_materials: usize,
    pub disposed_geometries: usize,
    pub disposed_materials: usize,
}

/// GPU-side resources for scene nodes.
///
/// Every handle returned by a `create_*` call is disposed exactly once by the
/// scene graph. Disposing an unknown handle must be a no-op.
pub trait RenderBackend {
    fn create_geometry(&mut self, spec: GeometrySpec) -> GeometryHandle;
    fn create_material(&mut self, material: &Material) -> MaterialHandle;
    fn update_material(&mut self, handle: MaterialHandle, material: &Material, texture: Option<&TextureRef>);
    fn dispose_geometry(&mut self, handle: GeometryHandle);
    fn dispose_material(&mut self, handle: MaterialHandle);
    fn resources(&self) -> ResourceCounts;
}

/// Enable/disable switch of the camera navigation controller.
pub trait NavigationControl {
    fn set_enabled(&mut self, enabled: bool);
    fn is_enabled(&self) -> bool;
}

/// Plain navigation flag for hosts that run their own camera controls.
#[derive(Debug, Clone, Copy)]
pub struct NavigationSwitch {
    enabled: bool,
}

impl Default for NavigationSwitch {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl NavigationControl for NavigationSwitch {
    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Handle bookkeeping without a GPU.
///
/// The desktop painter draws straight from the scene graph, so it only needs
/// handle lifetimes tracked; tests use the counters to check disposal.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_id: u64,
    geometries: HashMap<GeometryHandle, GeometrySpec>,
    materials: HashMap<MaterialHandle, Material>,
    disposed_geometries: usize,
    disposed_materials: usize,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Current material parameters behind a handle.
    pub fn material(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(&handle)
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_geometry(&mut self, spec: GeometrySpec) -> GeometryHandle {
        let handle = GeometryHandle(self.next());
        self.geometries.insert(handle, spec);
        handle
    }

    fn create_material(&mut self, material: &Material) -> MaterialHandle {
        let handle = MaterialHandle(self.next());
        self.materials.insert(handle, *material);
        handle
    }

    fn update_material(&mut self, handle: MaterialHandle, material: &Material, _texture: Option<&TextureRef>) {
        if let Some(m) = self.materials.get_mut(&handle) {
            *m = *material;
        }
    }

    fn dispose_geometry(&mut self, handle: GeometryHandle) {
        if self.geometries.remove(&handle).is_some() {
            self.disposed_geometries += 1;
        } else {
            tracing::warn!("Ignoring dispose of unknown geometry {:?}", handle);
        }
    }

    fn dispose_material(&mut self, handle: MaterialHandle) {
        if self.materials.remove(&handle).is_some() {
            self.disposed_materials += 1;
        } else {
            tracing::warn!("Ignoring dispose of unknown material {:?}", handle);
        }
    }

    fn resources(&self) -> ResourceCounts {
        ResourceCounts {
            live_geometries: self.geometries.len(),
            live_materials: self.materials.len(),
            disposed_geometries: self.disposed_geometries,
            disposed_materials: self.disposed_materials,
        }
    }
}
