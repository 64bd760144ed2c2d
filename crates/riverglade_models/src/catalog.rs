use std::path::PathBuf;

/// Static description of a loadable vegetation model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelEntry {
    pub name: String,
    /// File name relative to the model source root
    pub file_name: PathBuf,
    /// Minimum clearance around an instance, used for placement only
    pub bounding_radius: f32,
}

impl ModelEntry {
    pub fn new(name: impl Into<String>, file_name: impl Into<PathBuf>, bounding_radius: f32) -> Self {
        Self {
            name: name.into(),
            file_name: file_name.into(),
            bounding_radius,
        }
    }

    pub fn metadata(&self) -> ModelMetadata {
        ModelMetadata {
            bounding_radius: self.bounding_radius,
        }
    }
}

/// Metadata available synchronously, before any asset is loaded
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelMetadata {
    pub bounding_radius: f32,
}

/// The vegetation models shipped with the game
///
/// Radii are tuned by hand against the meshes: pines get wider as they get
/// taller, broadleaf trees are a bit more compact.
pub fn vegetation_catalog() -> Vec<ModelEntry> {
    vec![
        ModelEntry::new("PineS", "PineS.obj", 1.7),
        ModelEntry::new("PineM", "PineM.obj", 3.0),
        ModelEntry::new("PineL", "PineL.obj", 4.2),
        ModelEntry::new("TreeM", "TreeM.obj", 3.2),
        ModelEntry::new("TreeL", "TreeL.obj", 2.7),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_names_unique() {
        let catalog = vegetation_catalog();
        let mut names: Vec<&str> = catalog.iter().map(|e| e.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), catalog.len());
    }

    #[test]
    fn test_catalog_radii_positive() {
        for entry in vegetation_catalog() {
            assert!(entry.bounding_radius > 0.0, "{} has no clearance", entry.name);
            assert_eq!(entry.metadata().bounding_radius, entry.bounding_radius);
        }
    }
}
