//! GPU scene synchronization.
//!
//! - [`GpuScene`] mirrors every registered [`Drawable`] in dense GPU arrays
//!   and uploads changed transforms once per frame
//! - [`TransformChangeNotifier`] turns entity transform changes into dirty
//!   flags on the scene
//! - [`CameraRegistry`] owns cameras and their render targets
//! - [`Displayer`] copies the selected camera's target to the output
//!
//! # Frame flow
//!
//! ```text
//! World::patch::<Transform>   -> notifier marks drawables dirty
//! notifier.sync_world_transforms -> world matrices written to drawables
//! scene.update()              -> history + current transforms uploaded
//! displayer.display()         -> camera target copied to the output
//! ```

mod camera;
mod displayer;
mod drawable;
mod gpu_scene;
mod material_slots;
mod transform_notifier;

pub use camera::{Camera, CameraDescriptor, CameraHandle, CameraRegistry};
pub use displayer::{DisplayOutcome, Displayer};
pub use drawable::Drawable;
pub use gpu_scene::{
    DirtyTracker, DrawableId, DrawableOffsets, GpuScene, GpuSceneData, HISTORY_TRANSFORMS_LABEL,
    SceneMaterial, TRANSFORMS_LABEL,
};
pub use material_slots::MATERIAL_SLOT_CAPACITY;
pub use transform_notifier::TransformChangeNotifier;
