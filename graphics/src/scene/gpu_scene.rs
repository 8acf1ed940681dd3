//! GPU-resident mirror of every registered drawable.
//!
//! Geometry lives in one dense array per vertex attribute plus an index
//! array; each drawable owns a contiguous range in them. Every drawable also
//! owns a transform slot holding its current world matrix and, in a parallel
//! history array, the matrix uploaded the frame before (for motion vectors).
//!
//! Ranges never move. When an array runs out of room it is reallocated and
//! the old contents copied over on the GPU, so offsets handed out earlier
//! stay valid. Freed ranges are reused by later registrations, which always
//! overwrite the whole range.

use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::Arc;

use parking_lot::Mutex;
use vellum_core::bounds::BoundingBox;
use vellum_core::material::{MaterialParams, PARAMS_BLOCK_ALIGNMENT};
use vellum_core::math::{Mat4, mat4_to_cols_array};

use crate::descriptor::DescriptorHandle;
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::resources::{Buffer, GrowableBuffer, RangeAllocator, Sampler, Texture};
use crate::types::{BufferDescriptor, BufferUsage};

use super::drawable::Drawable;
use super::material_slots::{MATERIAL_SLOT_CAPACITY, MaterialSlotArray};

/// Label of the current-transform buffer.
pub const TRANSFORMS_LABEL: &str = "scene.transforms";
/// Label of the history-transform buffer.
pub const HISTORY_TRANSFORMS_LABEL: &str = "scene.history_transforms";

const MATRIX_STRIDE: u64 = 64;
const HANDLE_STRIDE: u64 = 8;

/// Generational id of a drawable registered in a [`GpuScene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DrawableId {
    index: u32,
    generation: u32,
}

impl DrawableId {
    /// Slot index, also the drawable's transform slot.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot when this id was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl std::fmt::Display for DrawableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Shared set of drawables whose transforms need uploading.
///
/// Cloning yields another handle to the same set, so observers can mark
/// drawables without borrowing the scene. Marking twice is the same as
/// marking once.
#[derive(Clone, Default)]
pub struct DirtyTracker(Arc<Mutex<BTreeSet<DrawableId>>>);

impl DirtyTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` dirty. Returns `false` if it already was.
    pub fn mark(&self, id: DrawableId) -> bool {
        self.0.lock().insert(id)
    }

    /// Whether `id` is marked.
    pub fn contains(&self, id: DrawableId) -> bool {
        self.0.lock().contains(&id)
    }

    /// Number of marked drawables.
    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    /// Returns `true` if nothing is marked.
    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    /// Unmark everything, returning what was marked in id order.
    pub fn take(&self) -> Vec<DrawableId> {
        std::mem::take(&mut *self.0.lock()).into_iter().collect()
    }

    fn remove(&self, id: DrawableId) {
        self.0.lock().remove(&id);
    }
}

impl std::fmt::Debug for DirtyTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.0.lock().iter()).finish()
    }
}

/// Where a drawable's data lives in the scene arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawableOffsets {
    /// Range in every vertex attribute array.
    pub vertices: Range<u32>,
    /// Range in the index array. Stored indices are absolute vertex indices.
    pub indices: Range<u32>,
    /// Slot in the current and history transform arrays.
    pub transform: u32,
    /// Range of 16-byte blocks in the material parameter array.
    pub material_params: Range<u32>,
    /// Slots in the material texture array, in material order.
    pub texture_slots: Vec<u32>,
    /// Slots in the material sampler array, in material order.
    pub sampler_slots: Vec<u32>,
}

/// Material data assigned to a drawable.
#[derive(Debug, Clone, Default)]
pub struct SceneMaterial {
    /// Parameter block packed into the material parameter array.
    pub params: MaterialParams,
    /// Textures referenced through the material texture array.
    pub textures: Vec<Arc<Texture>>,
    /// Samplers referenced through the material sampler array.
    pub samplers: Vec<Arc<Sampler>>,
}

impl SceneMaterial {
    /// Material with parameters only.
    pub fn new(params: MaterialParams) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    /// Add a texture.
    #[must_use]
    pub fn with_texture(mut self, texture: Arc<Texture>) -> Self {
        self.textures.push(texture);
        self
    }

    /// Add a sampler.
    #[must_use]
    pub fn with_sampler(mut self, sampler: Arc<Sampler>) -> Self {
        self.samplers.push(sampler);
        self
    }
}

/// The GPU arrays backing a [`GpuScene`].
#[derive(Debug)]
pub struct GpuSceneData {
    positions: GrowableBuffer,
    normals: GrowableBuffer,
    tangents: GrowableBuffer,
    colors: GrowableBuffer,
    texcoords: GrowableBuffer,
    texcoords2: GrowableBuffer,
    indices: GrowableBuffer,
    transforms: GrowableBuffer,
    history_transforms: GrowableBuffer,
    material_params: GrowableBuffer,
    material_textures: Arc<Buffer>,
    material_samplers: Arc<Buffer>,
}

impl GpuSceneData {
    fn new(device: &Arc<GraphicsDevice>) -> Result<Self, GraphicsError> {
        let caps = device.config().scene;
        let vertex = |label: &str, stride: u64| {
            GrowableBuffer::new(device, label, stride, caps.vertices, BufferUsage::STORAGE)
        };
        let handles = |label: &str| {
            device.create_buffer(
                &BufferDescriptor::new(
                    HANDLE_STRIDE * u64::from(MATERIAL_SLOT_CAPACITY),
                    BufferUsage::STORAGE | BufferUsage::COPY_DST,
                )
                .with_label(label),
            )
        };

        Ok(Self {
            positions: vertex("scene.positions", 12)?,
            normals: vertex("scene.normals", 12)?,
            tangents: vertex("scene.tangents", 16)?,
            colors: vertex("scene.colors", 16)?,
            texcoords: vertex("scene.texcoords", 8)?,
            texcoords2: vertex("scene.texcoords2", 8)?,
            indices: GrowableBuffer::new(
                device,
                "scene.indices",
                4,
                caps.indices,
                BufferUsage::STORAGE | BufferUsage::INDEX,
            )?,
            transforms: GrowableBuffer::new(
                device,
                TRANSFORMS_LABEL,
                MATRIX_STRIDE,
                caps.drawables,
                BufferUsage::STORAGE,
            )?,
            history_transforms: GrowableBuffer::new(
                device,
                HISTORY_TRANSFORMS_LABEL,
                MATRIX_STRIDE,
                caps.drawables,
                BufferUsage::STORAGE,
            )?,
            material_params: GrowableBuffer::new(
                device,
                "scene.material_params",
                PARAMS_BLOCK_ALIGNMENT as u64,
                caps.material_param_bytes.div_ceil(PARAMS_BLOCK_ALIGNMENT as u32),
                BufferUsage::STORAGE,
            )?,
            material_textures: handles("scene.material_textures")?,
            material_samplers: handles("scene.material_samplers")?,
        })
    }

    /// Vertex positions (`[f32; 3]`).
    pub fn positions(&self) -> &GrowableBuffer {
        &self.positions
    }

    /// Vertex normals (`[f32; 3]`).
    pub fn normals(&self) -> &GrowableBuffer {
        &self.normals
    }

    /// Vertex tangents (`[f32; 4]`).
    pub fn tangents(&self) -> &GrowableBuffer {
        &self.tangents
    }

    /// Vertex colors (`[f32; 4]`).
    pub fn colors(&self) -> &GrowableBuffer {
        &self.colors
    }

    /// Primary UVs (`[f32; 2]`).
    pub fn texcoords(&self) -> &GrowableBuffer {
        &self.texcoords
    }

    /// Secondary UVs (`[f32; 2]`).
    pub fn texcoords2(&self) -> &GrowableBuffer {
        &self.texcoords2
    }

    /// Index stream (`u32`).
    pub fn indices(&self) -> &GrowableBuffer {
        &self.indices
    }

    /// Current world transforms, one column-major matrix per slot.
    pub fn transforms(&self) -> &GrowableBuffer {
        &self.transforms
    }

    /// Previous-frame world transforms, parallel to [`transforms`](Self::transforms).
    pub fn history_transforms(&self) -> &GrowableBuffer {
        &self.history_transforms
    }

    /// Packed material parameter blocks.
    pub fn material_params(&self) -> &GrowableBuffer {
        &self.material_params
    }

    /// GPU descriptor addresses of material textures (`u64` per slot).
    pub fn material_textures(&self) -> &Arc<Buffer> {
        &self.material_textures
    }

    /// GPU descriptor addresses of material samplers (`u64` per slot).
    pub fn material_samplers(&self) -> &Arc<Buffer> {
        &self.material_samplers
    }
}

struct Entry {
    drawable: Drawable,
    offsets: DrawableOffsets,
    /// Matrix most recently written to the current-transform array.
    uploaded: Mat4,
    material: Option<SceneMaterial>,
}

#[derive(Default)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// Mirror of all live drawables in GPU arrays.
///
/// # Frame flow
///
/// Mutations (`set_world_transform`, or a
/// [`TransformChangeNotifier`](super::TransformChangeNotifier) marking the
/// [`DirtyTracker`]) only record intent. [`update`](Self::update) runs once
/// per frame and uploads every dirty transform.
pub struct GpuScene {
    device: Arc<GraphicsDevice>,
    data: GpuSceneData,
    vertex_alloc: RangeAllocator,
    index_alloc: RangeAllocator,
    param_alloc: RangeAllocator,
    slots: Vec<Slot>,
    free_slots: Vec<u32>,
    len: usize,
    texture_slots: MaterialSlotArray,
    sampler_slots: MaterialSlotArray,
    dirty: DirtyTracker,
}

fn matrix_bytes(m: &Mat4) -> [u8; 64] {
    bytemuck::cast(mat4_to_cols_array(m))
}

/// Allocate `count` elements, growing every buffer sharing the allocator if needed.
fn allocate_range(
    alloc: &mut RangeAllocator,
    count: u32,
    buffers: &mut [&mut GrowableBuffer],
) -> Result<Range<u32>, GraphicsError> {
    if let Some(range) = alloc.allocate(count) {
        return Ok(range);
    }
    let required = alloc.capacity() + count;
    for buffer in buffers.iter_mut() {
        buffer.ensure_capacity(required)?;
    }
    let capacity = buffers
        .iter()
        .map(|b| b.capacity())
        .min()
        .unwrap_or(required);
    alloc.grow(capacity);
    alloc.allocate(count).ok_or_else(|| {
        GraphicsError::ResourceCreationFailed(format!("no room for {count} elements after growth"))
    })
}

/// Upload `source[range]`, or `default` repeated when the stream is absent.
fn upload_stream<T: bytemuck::Pod>(
    buffer: &GrowableBuffer,
    first: u32,
    source: &[T],
    range: Range<usize>,
    default: T,
) -> Result<(), GraphicsError> {
    if source.is_empty() {
        buffer.write(first, bytemuck::cast_slice(&vec![default; range.len()]))
    } else {
        let data = source.get(range.clone()).ok_or_else(|| {
            GraphicsError::InvalidParameter(format!(
                "{} stream of {} elements does not cover {range:?}",
                buffer.label(),
                source.len()
            ))
        })?;
        buffer.write(first, bytemuck::cast_slice(data))
    }
}

fn descriptor_handles<R>(
    resources: &[Arc<R>],
    handle: impl Fn(&R) -> DescriptorHandle,
) -> Result<Vec<DescriptorHandle>, GraphicsError> {
    resources
        .iter()
        .map(|r| {
            let h = handle(r.as_ref());
            if h.is_null() {
                Err(GraphicsError::InvalidParameter(
                    "material resource has been reset".to_string(),
                ))
            } else {
                Ok(h)
            }
        })
        .collect()
}

impl GpuScene {
    /// Create an empty scene with arrays sized from the device configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing buffers cannot be created.
    pub fn new(device: &Arc<GraphicsDevice>) -> Result<Self, GraphicsError> {
        let data = GpuSceneData::new(device)?;
        Ok(Self {
            device: Arc::clone(device),
            vertex_alloc: RangeAllocator::new(data.positions.capacity()),
            index_alloc: RangeAllocator::new(data.indices.capacity()),
            param_alloc: RangeAllocator::new(data.material_params.capacity()),
            data,
            slots: Vec::new(),
            free_slots: Vec::new(),
            len: 0,
            texture_slots: MaterialSlotArray::new("texture", MATERIAL_SLOT_CAPACITY),
            sampler_slots: MaterialSlotArray::new("sampler", MATERIAL_SLOT_CAPACITY),
            dirty: DirtyTracker::new(),
        })
    }

    fn entry(&self, id: DrawableId) -> Option<&Entry> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?
            .entry
            .as_ref()
    }

    fn entry_in(slots: &mut [Slot], id: DrawableId) -> Option<&mut Entry> {
        slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?
            .entry
            .as_mut()
    }

    /// Register a drawable and upload its geometry and transform.
    ///
    /// Arrays grow as needed. The history transform starts equal to the
    /// current one.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh streams do not cover the submesh or a
    /// buffer cannot be grown; nothing stays allocated in that case.
    pub fn register(&mut self, drawable: Drawable) -> Result<DrawableId, GraphicsError> {
        let submesh = drawable.submesh().clone();
        let index = self.free_slots.pop().unwrap_or_else(|| {
            self.slots.push(Slot::default());
            self.slots.len() as u32 - 1
        });

        let offsets = match self.allocate_geometry(index, submesh.vertex_count(), submesh.index_count()) {
            Ok(offsets) => offsets,
            Err(e) => {
                self.free_slots.push(index);
                return Err(e);
            }
        };

        let transform = *drawable.world_transform();
        if let Err(e) = self.upload_geometry(&drawable, &offsets) {
            self.vertex_alloc.free(offsets.vertices);
            self.index_alloc.free(offsets.indices);
            self.free_slots.push(index);
            return Err(e);
        }

        let slot = &mut self.slots[index as usize];
        slot.entry = Some(Entry {
            drawable,
            offsets,
            uploaded: transform,
            material: None,
        });
        self.len += 1;
        let id = DrawableId {
            index,
            generation: slot.generation,
        };
        log::trace!("GpuScene: registered drawable {id}");
        Ok(id)
    }

    fn allocate_geometry(
        &mut self,
        transform: u32,
        vertex_count: u32,
        index_count: u32,
    ) -> Result<DrawableOffsets, GraphicsError> {
        let data = &mut self.data;
        data.transforms.ensure_capacity(transform + 1)?;
        data.history_transforms.ensure_capacity(transform + 1)?;

        let vertices = allocate_range(
            &mut self.vertex_alloc,
            vertex_count,
            &mut [
                &mut data.positions,
                &mut data.normals,
                &mut data.tangents,
                &mut data.colors,
                &mut data.texcoords,
                &mut data.texcoords2,
            ],
        )?;
        let indices =
            match allocate_range(&mut self.index_alloc, index_count, &mut [&mut data.indices]) {
                Ok(indices) => indices,
                Err(e) => {
                    self.vertex_alloc.free(vertices);
                    return Err(e);
                }
            };

        Ok(DrawableOffsets {
            vertices,
            indices,
            transform,
            ..Default::default()
        })
    }

    fn upload_geometry(
        &self,
        drawable: &Drawable,
        offsets: &DrawableOffsets,
    ) -> Result<(), GraphicsError> {
        let mesh = drawable.mesh();
        let submesh = drawable.submesh();
        let data = &self.data;
        let vr = submesh.vertices.start as usize..submesh.vertices.end as usize;
        let first = offsets.vertices.start;

        upload_stream(&data.positions, first, mesh.positions(), vr.clone(), [0.0; 3])?;
        upload_stream(&data.normals, first, mesh.normals(), vr.clone(), [0.0, 0.0, 1.0])?;
        upload_stream(&data.tangents, first, mesh.tangents(), vr.clone(), [1.0, 0.0, 0.0, 1.0])?;
        upload_stream(&data.colors, first, mesh.colors(), vr.clone(), [1.0; 4])?;
        upload_stream(&data.texcoords, first, mesh.texcoords(), vr.clone(), [0.0; 2])?;
        upload_stream(&data.texcoords2, first, mesh.texcoords2(), vr, [0.0; 2])?;

        let ir = submesh.indices.start as usize..submesh.indices.end as usize;
        let indices: Vec<u32> = mesh
            .indices()
            .get(ir.clone())
            .ok_or_else(|| {
                GraphicsError::InvalidParameter(format!(
                    "index stream of {} elements does not cover {ir:?}",
                    mesh.indices().len()
                ))
            })?
            .iter()
            .map(|i| i + first)
            .collect();
        data.indices
            .write(offsets.indices.start, bytemuck::cast_slice(&indices))?;

        let matrix = matrix_bytes(drawable.world_transform());
        data.transforms.write(offsets.transform, &matrix)?;
        data.history_transforms.write(offsets.transform, &matrix)
    }

    /// Flag a drawable for transform upload on the next [`update`](Self::update).
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::UnknownDrawable`] for a stale id.
    pub fn mark_dirty(&mut self, id: DrawableId) -> Result<(), GraphicsError> {
        if self.entry(id).is_none() {
            return Err(GraphicsError::UnknownDrawable(id));
        }
        self.dirty.mark(id);
        Ok(())
    }

    /// Store a new world transform and flag the drawable dirty.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::UnknownDrawable`] for a stale id.
    pub fn set_world_transform(&mut self, id: DrawableId, transform: Mat4) -> Result<(), GraphicsError> {
        let entry = Self::entry_in(&mut self.slots, id).ok_or(GraphicsError::UnknownDrawable(id))?;
        entry.drawable.set_world_transform(transform);
        self.dirty.mark(id);
        Ok(())
    }

    /// Upload transforms of every drawable dirty at the start of the call.
    ///
    /// For each one the previously uploaded matrix is written to the history
    /// array, then the pending matrix to the current array: exactly one write
    /// of each per drawable. Stale ids in the tracker are skipped. Returns
    /// the number of drawables uploaded.
    ///
    /// # Errors
    ///
    /// On a write failure the drawables not yet uploaded stay dirty.
    pub fn update(&mut self) -> Result<usize, GraphicsError> {
        let dirty = self.dirty.take();
        let mut written = 0;
        for (n, &id) in dirty.iter().enumerate() {
            let Some(entry) = Self::entry_in(&mut self.slots, id) else {
                continue;
            };
            let pending = *entry.drawable.world_transform();
            let slot = entry.offsets.transform;
            let result = self
                .data
                .history_transforms
                .write(slot, &matrix_bytes(&entry.uploaded))
                .and_then(|()| self.data.transforms.write(slot, &matrix_bytes(&pending)));
            if let Err(e) = result {
                for &rest in &dirty[n..] {
                    self.dirty.mark(rest);
                }
                return Err(e);
            }
            entry.uploaded = pending;
            written += 1;
        }
        if written > 0 {
            log::trace!("GpuScene: uploaded {written} transforms");
        }
        Ok(written)
    }

    /// Remove a drawable, releasing its ranges, transform slot and material slots.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::UnknownDrawable`] for a stale id.
    pub fn unregister(&mut self, id: DrawableId) -> Result<Drawable, GraphicsError> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .ok_or(GraphicsError::UnknownDrawable(id))?;
        let entry = slot.entry.take().ok_or(GraphicsError::UnknownDrawable(id))?;
        slot.generation = slot.generation.wrapping_add(1);

        self.vertex_alloc.free(entry.offsets.vertices.clone());
        self.index_alloc.free(entry.offsets.indices.clone());
        self.release_material(&entry.offsets);
        self.free_slots.push(id.index);
        self.dirty.remove(id);
        self.len -= 1;
        log::trace!("GpuScene: unregistered drawable {id}");
        Ok(entry.drawable)
    }

    fn release_material(&mut self, offsets: &DrawableOffsets) {
        self.param_alloc.free(offsets.material_params.clone());
        for &slot in &offsets.texture_slots {
            self.texture_slots.release(slot);
        }
        for &slot in &offsets.sampler_slots {
            self.sampler_slots.release(slot);
        }
    }

    /// Upload a material's parameters and claim array slots for its textures
    /// and samplers, replacing any previous material of the drawable.
    ///
    /// # Errors
    ///
    /// - [`GraphicsError::UnknownDrawable`] for a stale id.
    /// - [`GraphicsError::SlotArrayFull`] if the texture or sampler array
    ///   cannot hold the new references. Nothing is claimed in that case.
    /// - [`GraphicsError::InvalidParameter`] if a resource has been reset.
    pub fn assign_material(
        &mut self,
        id: DrawableId,
        material: &SceneMaterial,
    ) -> Result<(), GraphicsError> {
        if self.entry(id).is_none() {
            return Err(GraphicsError::UnknownDrawable(id));
        }
        let texture_handles = descriptor_handles(&material.textures, Texture::descriptor_handle)?;
        let sampler_handles = descriptor_handles(&material.samplers, Sampler::descriptor_handle)?;
        self.texture_slots.check_room(&texture_handles)?;
        self.sampler_slots.check_room(&sampler_handles)?;

        let bytes = material.params.to_bytes();
        let blocks = (bytes.len() / PARAMS_BLOCK_ALIGNMENT) as u32;
        let params = allocate_range(
            &mut self.param_alloc,
            blocks,
            &mut [&mut self.data.material_params],
        )?;
        if let Err(e) = self.data.material_params.write(params.start, &bytes) {
            self.param_alloc.free(params);
            return Err(e);
        }

        let mut texture_slots = Vec::with_capacity(texture_handles.len());
        let mut sampler_slots = Vec::with_capacity(sampler_handles.len());
        let mut result = Ok(());
        for (handles, slots, claimed, buffer) in [
            (
                &texture_handles,
                &mut self.texture_slots,
                &mut texture_slots,
                &self.data.material_textures,
            ),
            (
                &sampler_handles,
                &mut self.sampler_slots,
                &mut sampler_slots,
                &self.data.material_samplers,
            ),
        ] {
            for &handle in handles {
                result = slots.claim(handle).and_then(|(slot, fresh)| {
                    claimed.push(slot);
                    if fresh {
                        self.device.write_buffer(
                            buffer,
                            HANDLE_STRIDE * u64::from(slot),
                            &handle.gpu.to_le_bytes(),
                        )
                    } else {
                        Ok(())
                    }
                });
                if result.is_err() {
                    break;
                }
            }
            if result.is_err() {
                break;
            }
        }

        let new_offsets = DrawableOffsets {
            material_params: params,
            texture_slots,
            sampler_slots,
            ..Default::default()
        };
        if let Err(e) = result {
            self.release_material(&new_offsets);
            return Err(e);
        }

        let Some(entry) = Self::entry_in(&mut self.slots, id) else {
            self.release_material(&new_offsets);
            return Err(GraphicsError::UnknownDrawable(id));
        };
        let old = DrawableOffsets {
            material_params: std::mem::replace(
                &mut entry.offsets.material_params,
                new_offsets.material_params,
            ),
            texture_slots: std::mem::replace(
                &mut entry.offsets.texture_slots,
                new_offsets.texture_slots,
            ),
            sampler_slots: std::mem::replace(
                &mut entry.offsets.sampler_slots,
                new_offsets.sampler_slots,
            ),
            ..Default::default()
        };
        entry.material = Some(material.clone());
        self.release_material(&old);
        Ok(())
    }

    /// The drawable registered under `id`.
    pub fn drawable(&self, id: DrawableId) -> Option<&Drawable> {
        self.entry(id).map(|e| &e.drawable)
    }

    /// Array offsets of the drawable registered under `id`.
    pub fn offsets(&self, id: DrawableId) -> Option<&DrawableOffsets> {
        self.entry(id).map(|e| &e.offsets)
    }

    /// Material assigned to `id`, if any.
    pub fn material(&self, id: DrawableId) -> Option<&SceneMaterial> {
        self.entry(id)?.material.as_ref()
    }

    /// World-space bounds of the drawable registered under `id`.
    pub fn bounding_box(&self, id: DrawableId) -> Option<BoundingBox> {
        self.drawable(id).map(Drawable::bounding_box)
    }

    /// Union of every drawable's world-space bounds.
    pub fn bounds(&self) -> BoundingBox {
        self.iter()
            .fold(BoundingBox::empty(), |bb, (_, d)| bb.union(&d.bounding_box()))
    }

    /// Every live drawable with its id, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (DrawableId, &Drawable)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.entry.as_ref().map(|e| {
                (
                    DrawableId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    &e.drawable,
                )
            })
        })
    }

    /// Number of live drawables.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no drawable is registered.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of drawables waiting for [`update`](Self::update).
    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    /// Handle to the scene's dirty set.
    pub fn dirty_tracker(&self) -> DirtyTracker {
        self.dirty.clone()
    }

    /// The GPU arrays.
    pub fn data(&self) -> &GpuSceneData {
        &self.data
    }

    /// Live entries in the material texture array.
    pub fn texture_slot_count(&self) -> u32 {
        self.texture_slots.live()
    }

    /// Live entries in the material sampler array.
    pub fn sampler_slot_count(&self) -> u32 {
        self.sampler_slots.live()
    }
}

impl std::fmt::Debug for GpuScene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuScene")
            .field("drawables", &self.len)
            .field("dirty", &self.dirty.len())
            .field("vertex_capacity", &self.vertex_alloc.capacity())
            .field("index_capacity", &self.index_alloc.capacity())
            .finish()
    }
}
