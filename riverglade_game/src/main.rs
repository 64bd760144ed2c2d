use std::error::Error;
use std::path::Path;
use std::rc::Rc;

use riverglade_models::{vegetation_catalog, MemoryModelSource, ModelRegistry, ModelSource, ObjModelSource};
use riverglade_terrain::{MeshCollector, Terrain, TerrainConfig, TileSeed, TileSummary};
use tokio::task::LocalSet;

const MODELS_DIR: &str = "models";

/// Usage: riverglade_game [seed] [config.json]
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let seed = match args.get(1) {
        Some(arg) => TileSeed::new(arg.parse()?),
        None => TileSeed::random(),
    };
    let config = match args.get(2) {
        Some(path) => load_config(Path::new(path))?,
        None => TerrainConfig::default(),
    };

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let local = LocalSet::new();

    let summary = local.block_on(&runtime, async move {
        let catalog = vegetation_catalog();
        if Path::new(MODELS_DIR).is_dir() {
            let registry = ModelRegistry::new(ObjModelSource::new(MODELS_DIR), catalog);
            build_tile(Rc::new(registry), config, seed).await
        } else {
            log::warn!("No `{}` directory, trees get placeholder cones", MODELS_DIR);
            let source = MemoryModelSource::placeholders(&catalog);
            build_tile(Rc::new(ModelRegistry::new(source, catalog)), config, seed).await
        }
    })?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn load_config(path: &Path) -> Result<TerrainConfig, Box<dyn Error>> {
    let text = std::fs::read_to_string(path)?;
    let config = serde_json::from_str(&text)?;
    log::info!("Loaded terrain config from {}", path.display());
    Ok(config)
}

async fn build_tile<S: ModelSource + 'static>(
    registry: Rc<ModelRegistry<S>>,
    config: TerrainConfig,
    seed: TileSeed,
) -> Result<TileSummary, Box<dyn Error>> {
    let mut terrain = Terrain::new(config, registry)?;
    let mut surface = MeshCollector::new();
    terrain.generate(seed, &mut surface)?;

    for mesh in &surface.meshes {
        log::info!(
            "Mesh {}: {} vertices, {} triangles, {} bytes",
            mesh.name,
            mesh.vertices.len(),
            mesh.indices.len() / 3,
            mesh.vertex_bytes().len() + mesh.index_bytes().len()
        );
    }

    terrain.wait_for_visuals().await;
    terrain
        .summary()
        .ok_or_else(|| "tile was not generated".into())
}
