use glam::Vec3;
use std::rc::Rc;

/// Shared, hidden mesh data for one vegetation model
///
/// All sub-meshes of the source asset are merged into a single buffer set.
/// Instances reference the template instead of copying it.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelTemplate {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl ModelTemplate {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Create a cheap instance sharing this template's buffers
    pub fn create_instance(self: &Rc<Self>, id: impl Into<String>) -> ModelInstance {
        ModelInstance {
            id: id.into(),
            template: Rc::clone(self),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
        }
    }
}

/// A placed copy of a [`ModelTemplate`] with its own transform
#[derive(Debug, Clone)]
pub struct ModelInstance {
    pub id: String,
    pub template: Rc<ModelTemplate>,
    pub position: Vec3,
    /// Euler angles in radians
    pub rotation: Vec3,
}
