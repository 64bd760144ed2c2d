use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::error::TerrainError;
use crate::river::River;

/// GPU-ready terrain vertex
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Explicit mesh buffers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

/// Flat-colored material
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceMaterial {
    pub name: String,
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub emissive: [f32; 3],
    pub ambient: [f32; 3],
}

impl SurfaceMaterial {
    pub fn grass() -> Self {
        Self {
            name: "grass".to_string(),
            diffuse: [0.0, 1.0, 0.0],
            specular: [0.0, 0.0, 0.0],
            emissive: [0.0, 0.0, 0.0],
            ambient: [1.0, 1.0, 1.0],
        }
    }

    pub fn water() -> Self {
        Self {
            name: "water".to_string(),
            diffuse: [0.34, 0.79, 1.0],
            specular: [0.5, 0.5, 0.5],
            emissive: [0.0, 0.0, 0.0],
            ambient: [1.0, 1.0, 1.0],
        }
    }
}

/// Whatever turns terrain geometry into renderable meshes
pub trait RenderSurface {
    type Handle;

    /// Flat-shaded strip surface through parallel paths of equal length
    fn create_ribbon(&mut self, name: &str, paths: &[&[Vec3]]) -> Self::Handle;

    fn create_mesh(&mut self, name: &str, data: MeshData) -> Self::Handle;

    fn assign_material(&mut self, handle: &Self::Handle, material: &SurfaceMaterial);
}

/// A finished mesh held by [`MeshCollector`]
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceMesh {
    pub name: String,
    pub vertices: Vec<TerrainVertex>,
    pub indices: Vec<u32>,
    pub material: Option<SurfaceMaterial>,
}

impl SurfaceMesh {
    fn from_data(name: &str, data: MeshData) -> Self {
        let vertices = data
            .positions
            .iter()
            .zip(&data.normals)
            .map(|(&position, &normal)| TerrainVertex { position, normal })
            .collect();
        Self {
            name: name.to_string(),
            vertices,
            indices: data.indices,
            material: None,
        }
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// In-memory [`RenderSurface`]: triangulates everything into [`SurfaceMesh`]es
#[derive(Debug, Default)]
pub struct MeshCollector {
    pub meshes: Vec<SurfaceMesh>,
}

impl MeshCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&SurfaceMesh> {
        self.meshes.iter().find(|m| m.name == name)
    }
}

impl RenderSurface for MeshCollector {
    type Handle = usize;

    fn create_ribbon(&mut self, name: &str, paths: &[&[Vec3]]) -> usize {
        self.create_mesh(name, ribbon_mesh(paths))
    }

    fn create_mesh(&mut self, name: &str, data: MeshData) -> usize {
        self.meshes.push(SurfaceMesh::from_data(name, data));
        self.meshes.len() - 1
    }

    fn assign_material(&mut self, handle: &usize, material: &SurfaceMaterial) {
        if let Some(mesh) = self.meshes.get_mut(*handle) {
            mesh.material = Some(material.clone());
        }
    }
}

/// Handles of the five meshes making up a tile
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainMeshes<H> {
    pub river_left: H,
    pub river_bed: H,
    pub river_right: H,
    pub left_ground: H,
    pub right_ground: H,
}

/// Builds the river ribbons and the flat ground on both sides
#[derive(Debug, Clone)]
pub struct TerrainMeshBuilder {
    pub grass: SurfaceMaterial,
    pub water: SurfaceMaterial,
}

impl Default for TerrainMeshBuilder {
    fn default() -> Self {
        Self {
            grass: SurfaceMaterial::grass(),
            water: SurfaceMaterial::water(),
        }
    }
}

impl TerrainMeshBuilder {
    pub fn build<S: RenderSurface>(
        &self,
        river: &River,
        half: f32,
        surface: &mut S,
    ) -> Result<TerrainMeshes<S::Handle>, TerrainError> {
        if river.path.len() < 2 {
            return Err(TerrainError::DegenerateRiver { points: river.path.len() });
        }

        let g = &river.geometry;
        let bed_paths = [g.bed_left.as_slice(), g.bed_right.as_slice()];
        let left_paths = [g.edge_left.as_slice(), g.bank_left.as_slice(), g.bed_left.as_slice()];
        let right_paths = [g.bed_right.as_slice(), g.bank_right.as_slice(), g.edge_right.as_slice()];

        // Validate everything before touching the surface
        check_ribbon("riverBed", &bed_paths)?;
        check_ribbon("riverLeft", &left_paths)?;
        check_ribbon("riverRight", &right_paths)?;

        let river_bed = surface.create_ribbon("riverBed", &bed_paths);
        surface.assign_material(&river_bed, &self.water);

        let river_left = surface.create_ribbon("riverLeft", &left_paths);
        surface.assign_material(&river_left, &self.grass);

        let river_right = surface.create_ribbon("riverRight", &right_paths);
        surface.assign_material(&river_right, &self.grass);

        let left_ground = surface.create_mesh("leftTerrain", ground_panel(-half, river.bounds.left, half));
        surface.assign_material(&left_ground, &self.grass);

        let right_ground = surface.create_mesh("rightTerrain", ground_panel(river.bounds.right, half, half));
        surface.assign_material(&right_ground, &self.grass);

        log::info!(
            "Built terrain meshes: river ribbons of {} samples, ground split at [{:.2}, {:.2}]",
            river.path.len(),
            river.bounds.left,
            river.bounds.right
        );

        Ok(TerrainMeshes {
            river_left,
            river_bed,
            river_right,
            left_ground,
            right_ground,
        })
    }
}

fn check_ribbon(name: &str, paths: &[&[Vec3]]) -> Result<(), TerrainError> {
    let len = paths.first().map_or(0, |p| p.len());
    if len < 2 {
        return Err(TerrainError::DegenerateRiver { points: len });
    }
    if paths.iter().any(|p| p.len() != len) {
        return Err(TerrainError::RaggedRibbon { name: name.to_string() });
    }
    Ok(())
}

/// Flat quad on y = 0 spanning `[x_min, x_max] × [-half, half]`
pub fn ground_panel(x_min: f32, x_max: f32, half: f32) -> MeshData {
    let positions = vec![
        [x_min, 0.0, half],
        [x_max, 0.0, half],
        [x_max, 0.0, -half],
        [x_min, 0.0, -half],
    ];
    // Wound so the face normal is +y
    let indices = vec![0, 1, 2, 0, 2, 3];
    let normals = calculate_smooth_normals(&positions, &indices);

    MeshData {
        positions,
        normals,
        indices,
    }
}

/// Triangulate parallel paths into a flat-shaded strip
///
/// Paths are expected left to right and their points in increasing z, which
/// gives upward-facing triangles. Every triangle gets its own three vertices
/// carrying the face normal.
pub fn ribbon_mesh(paths: &[&[Vec3]]) -> MeshData {
    let mut data = MeshData::default();

    for pair in paths.windows(2) {
        let (near, far) = (pair[0], pair[1]);
        let len = near.len().min(far.len());

        for j in 0..len.saturating_sub(1) {
            let a = near[j];
            let b = near[j + 1];
            let c = far[j];
            let d = far[j + 1];

            push_flat_triangle(&mut data, a, b, c);
            push_flat_triangle(&mut data, b, d, c);
        }
    }

    data
}

fn push_flat_triangle(data: &mut MeshData, p0: Vec3, p1: Vec3, p2: Vec3) {
    let normal = (p1 - p0).cross(p2 - p0).normalize_or_zero();
    let base = data.positions.len() as u32;

    for p in [p0, p1, p2] {
        data.positions.push(p.to_array());
        data.normals.push(normal.to_array());
    }
    data.indices.extend_from_slice(&[base, base + 1, base + 2]);
}

/// Calculate smooth vertex normals by averaging face normals
pub fn calculate_smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut normals = vec![Vec3::ZERO; positions.len()];

    // Accumulate face normals for each vertex
    for triangle in indices.chunks_exact(3) {
        let i0 = triangle[0] as usize;
        let i1 = triangle[1] as usize;
        let i2 = triangle[2] as usize;

        let p0 = Vec3::from_array(positions[i0]);
        let p1 = Vec3::from_array(positions[i1]);
        let p2 = Vec3::from_array(positions[i2]);

        let face_normal = (p1 - p0).cross(p2 - p0);

        normals[i0] += face_normal;
        normals[i1] += face_normal;
        normals[i2] += face_normal;
    }

    normals
        .into_iter()
        .map(|n| n.normalize_or_zero().to_array())
        .collect()
}
