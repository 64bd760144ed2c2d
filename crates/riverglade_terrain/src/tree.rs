use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use riverglade_models::{ModelInstance, ModelMetadata, ModelRegistry, ModelSource};
use tokio::task::JoinHandle;

/// Visual side of a tree
#[derive(Debug)]
pub enum TreeVisual {
    /// No instance yet (or the model failed to load); the transform lives here
    Pending { position: Vec3, rotation: Vec3 },
    /// The instance carries the transform
    Attached(ModelInstance),
}

impl TreeVisual {
    pub fn position(&self) -> Vec3 {
        match self {
            TreeVisual::Pending { position, .. } => *position,
            TreeVisual::Attached(instance) => instance.position,
        }
    }

    pub fn rotation(&self) -> Vec3 {
        match self {
            TreeVisual::Pending { rotation, .. } => *rotation,
            TreeVisual::Attached(instance) => instance.rotation,
        }
    }
}

/// A placed piece of vegetation
///
/// The logical transform is fixed at creation. The visual instance arrives
/// later, once the model registry has the template; it then takes over the
/// same transform.
#[derive(Debug)]
pub struct Tree {
    kind: String,
    bounding_radius: f32,
    visual: Rc<RefCell<TreeVisual>>,
}

impl Tree {
    pub fn new(kind: impl Into<String>, metadata: ModelMetadata, position: Vec3, rotation: Vec3) -> Self {
        Self {
            kind: kind.into(),
            bounding_radius: metadata.bounding_radius,
            visual: Rc::new(RefCell::new(TreeVisual::Pending { position, rotation })),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn bounding_radius(&self) -> f32 {
        self.bounding_radius
    }

    pub fn position(&self) -> Vec3 {
        self.visual.borrow().position()
    }

    pub fn rotation(&self) -> Vec3 {
        self.visual.borrow().rotation()
    }

    /// Rotation around the vertical axis, radians
    pub fn yaw(&self) -> f32 {
        self.rotation().y
    }

    pub fn is_attached(&self) -> bool {
        matches!(*self.visual.borrow(), TreeVisual::Attached(_))
    }

    pub fn instance_id(&self) -> Option<String> {
        match &*self.visual.borrow() {
            TreeVisual::Attached(instance) => Some(instance.id.clone()),
            TreeVisual::Pending { .. } => None,
        }
    }

    /// Ask the registry for this tree's model and attach an instance when it arrives
    ///
    /// Spawns a local task, so it must run inside a `LocalSet`. The task
    /// resolves to whether an instance was attached. A failed load is logged
    /// and leaves the tree pending for good.
    pub fn request_visual<S: ModelSource + 'static>(&self, registry: &Rc<ModelRegistry<S>>) -> JoinHandle<bool> {
        let registry = Rc::clone(registry);
        let visual = Rc::clone(&self.visual);
        let kind = self.kind.clone();

        tokio::task::spawn_local(async move {
            if matches!(*visual.borrow(), TreeVisual::Attached(_)) {
                return true;
            }

            match registry.materialize(&kind).await {
                Ok(template) => {
                    let mut instance = template.create_instance(format!("tree{}", registry.next_instance_id()));
                    let mut slot = visual.borrow_mut();
                    instance.position = slot.position();
                    instance.rotation = slot.rotation();
                    *slot = TreeVisual::Attached(instance);
                    true
                }
                Err(e) => {
                    log::error!("Tree {} stays without a visual: {}", kind, e);
                    false
                }
            }
        })
    }
}
