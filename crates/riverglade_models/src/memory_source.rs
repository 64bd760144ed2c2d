use std::cell::Cell;
use std::collections::HashMap;

use crate::catalog::ModelEntry;
use crate::error::LoadError;
use crate::source::ModelSource;
use crate::template::ModelTemplate;

/// Serves templates that already live in memory
///
/// Used for headless previews (placeholder cones instead of real assets) and
/// in tests. Counts how many loads were issued.
#[derive(Debug)]
pub struct MemoryModelSource {
    templates: HashMap<String, ModelTemplate>,
    loads: Cell<usize>,
}

impl MemoryModelSource {
    /// One placeholder cone per catalog entry, sized by its bounding radius
    pub fn placeholders<'a>(entries: impl IntoIterator<Item = &'a ModelEntry>) -> Self {
        let templates = entries
            .into_iter()
            .map(|entry| (entry.name.clone(), placeholder_cone(&entry.name, entry.bounding_radius, 6)))
            .collect();
        Self {
            templates,
            loads: Cell::new(0),
        }
    }

    pub fn without(mut self, name: &str) -> Self {
        self.templates.remove(name);
        self
    }

    /// Number of loads served so far, successful or not
    pub fn load_count(&self) -> usize {
        self.loads.get()
    }
}

impl ModelSource for MemoryModelSource {
    async fn load(&self, entry: &ModelEntry) -> Result<ModelTemplate, LoadError> {
        self.loads.set(self.loads.get() + 1);
        // Behave like real I/O and give other tasks a turn
        tokio::task::yield_now().await;

        self.templates
            .get(&entry.name)
            .cloned()
            .ok_or_else(|| LoadError::Missing {
                name: entry.name.clone(),
            })
    }
}

/// Build a closed cone: apex above the origin, base ring on y = 0
fn placeholder_cone(name: &str, radius: f32, segments: u32) -> ModelTemplate {
    let height = radius * 2.5;
    let mut positions = vec![[0.0, height, 0.0], [0.0, 0.0, 0.0]];
    let mut normals = vec![[0.0, 1.0, 0.0], [0.0, -1.0, 0.0]];
    let mut uvs = vec![[0.5, 0.0], [0.5, 1.0]];
    let mut indices = Vec::with_capacity(segments as usize * 6);

    for i in 0..segments {
        let angle = (i as f32 / segments as f32) * std::f32::consts::TAU;
        let (z, x) = angle.sin_cos();
        positions.push([x * radius, 0.0, z * radius]);
        normals.push([x, 0.0, z]);
        uvs.push([i as f32 / segments as f32, 1.0]);
    }

    for i in 0..segments {
        let current = 2 + i;
        let next = 2 + (i + 1) % segments;
        // Side
        indices.extend_from_slice(&[0, next, current]);
        // Base
        indices.extend_from_slice(&[1, current, next]);
    }

    ModelTemplate {
        name: name.to_string(),
        positions,
        normals,
        uvs,
        indices,
    }
}
