use std::io::Cursor;
use std::path::PathBuf;

use crate::catalog::ModelEntry;
use crate::error::LoadError;
use crate::source::ModelSource;
use crate::template::ModelTemplate;

/// Loads Wavefront OBJ files from a directory
#[derive(Debug, Clone)]
pub struct ObjModelSource {
    root: PathBuf,
}

impl ObjModelSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ModelSource for ObjModelSource {
    async fn load(&self, entry: &ModelEntry) -> Result<ModelTemplate, LoadError> {
        let path = self.root.join(&entry.file_name);
        log::info!("[ASSET] Loading model: {}", path.display());

        let bytes = tokio::fs::read(&path).await.map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;

        let template = parse_obj(&entry.name, bytes)
            .map_err(|source| LoadError::Parse { path: path.clone(), source })?;

        if template.indices.is_empty() {
            return Err(LoadError::Empty { path });
        }

        log::info!(
            "[ASSET] Model {}: {} vertices, {} triangles",
            entry.name,
            template.vertex_count(),
            template.triangle_count()
        );

        Ok(template)
    }
}

/// Parse an OBJ buffer and merge every sub-mesh into one template
///
/// Materials are not needed by the templates; any `mtllib` reference is
/// answered with an empty material set.
pub fn parse_obj(name: &str, bytes: Vec<u8>) -> Result<ModelTemplate, tobj::LoadError> {
    let load_options = tobj::LoadOptions {
        single_index: true,
        triangulate: true,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    };

    let mut reader = Cursor::new(bytes);
    let (models, _materials) =
        tobj::load_obj_buf(&mut reader, &load_options, |_| Ok(Default::default()))?;

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();
    let mut indices = Vec::new();
    let mut vertex_offset = 0;

    for (i, m) in models.iter().enumerate() {
        let mesh = &m.mesh;
        let vertex_count = mesh.positions.len() / 3;
        log::debug!("[ASSET] Mesh {} ({}): {} vertices, {} indices", i, m.name, vertex_count, mesh.indices.len());

        positions.extend(mesh.positions.chunks_exact(3).map(|p| [p[0], p[1], p[2]]));

        if mesh.normals.len() == mesh.positions.len() {
            normals.extend(mesh.normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]));
        } else {
            // Up-facing placeholder when the file has no normals
            normals.extend(std::iter::repeat([0.0, 1.0, 0.0]).take(vertex_count));
        }

        if mesh.texcoords.len() / 2 == vertex_count {
            // Flip V
            uvs.extend(mesh.texcoords.chunks_exact(2).map(|t| [t[0], 1.0 - t[1]]));
        } else {
            uvs.extend(std::iter::repeat([0.0, 0.0]).take(vertex_count));
        }

        indices.extend(mesh.indices.iter().map(|idx| idx + vertex_offset));
        vertex_offset += vertex_count as u32;
    }

    Ok(ModelTemplate {
        name: name.to_string(),
        positions,
        normals,
        uvs,
        indices,
    })
}
