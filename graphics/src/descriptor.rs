//! Descriptor heap allocation.
//!
//! Each [`DescriptorHeapKind`] owns a fixed-capacity heap sized from
//! [`DescriptorHeapCapacities`] at device creation. A slot is handed out as
//! a [`DescriptorHandle`] carrying its CPU address and, for shader-visible
//! heaps, its GPU address. Heaps never grow and never wrap: a full heap
//! fails the allocation.
//!
//! Addresses are synthetic but stable: every heap occupies its own
//! address window, so handles from different heaps never compare equal.

use fixedbitset::FixedBitSet;

use crate::config::DescriptorHeapCapacities;
use crate::error::GraphicsError;

/// Byte stride between consecutive descriptors in a heap.
const DESCRIPTOR_STRIDE: u64 = 32;
/// Bit position of the heap window in a CPU address.
const HEAP_WINDOW_SHIFT: u32 = 40;
/// Tag distinguishing GPU addresses from CPU addresses.
const GPU_ADDRESS_TAG: u64 = 1 << 63;

/// Kind of descriptor heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DescriptorHeapKind {
    /// Shader-visible buffer and texture descriptors.
    Resource,
    /// Shader-visible sampler descriptors.
    Sampler,
    /// Render target views (CPU only).
    RenderTarget,
    /// Depth-stencil views (CPU only).
    DepthStencil,
}

impl DescriptorHeapKind {
    /// Every heap kind, in declaration order.
    pub const ALL: [DescriptorHeapKind; 4] = [
        DescriptorHeapKind::Resource,
        DescriptorHeapKind::Sampler,
        DescriptorHeapKind::RenderTarget,
        DescriptorHeapKind::DepthStencil,
    ];

    /// Whether descriptors of this kind get a GPU address.
    pub fn is_shader_visible(self) -> bool {
        matches!(self, Self::Resource | Self::Sampler)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for DescriptorHeapKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// CPU and GPU address of one descriptor slot.
///
/// `cpu == 0` means "not allocated"; see [`DescriptorHandle::NULL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct DescriptorHandle {
    /// CPU address of the descriptor.
    pub cpu: u64,
    /// GPU address, or 0 for heaps that are not shader visible.
    pub gpu: u64,
}

impl DescriptorHandle {
    /// The unallocated handle.
    pub const NULL: Self = Self { cpu: 0, gpu: 0 };

    /// Returns `true` for the unallocated handle.
    pub fn is_null(&self) -> bool {
        self.cpu == 0
    }
}

struct DescriptorHeap {
    kind: DescriptorHeapKind,
    cpu_base: u64,
    occupied: FixedBitSet,
    live: u32,
}

impl DescriptorHeap {
    fn new(kind: DescriptorHeapKind, capacity: u32) -> Self {
        Self {
            kind,
            cpu_base: (kind.index() as u64 + 1) << HEAP_WINDOW_SHIFT,
            occupied: FixedBitSet::with_capacity(capacity as usize),
            live: 0,
        }
    }

    fn capacity(&self) -> u32 {
        self.occupied.len() as u32
    }

    fn handle(&self, slot: usize) -> DescriptorHandle {
        let cpu = self.cpu_base + slot as u64 * DESCRIPTOR_STRIDE;
        let gpu = if self.kind.is_shader_visible() {
            cpu | GPU_ADDRESS_TAG
        } else {
            0
        };
        DescriptorHandle { cpu, gpu }
    }

    fn slot_of(&self, handle: DescriptorHandle) -> Option<usize> {
        let offset = handle.cpu.checked_sub(self.cpu_base)?;
        if offset % DESCRIPTOR_STRIDE != 0 {
            return None;
        }
        let slot = (offset / DESCRIPTOR_STRIDE) as usize;
        (slot < self.occupied.len()).then_some(slot)
    }
}

/// Allocator over the four descriptor heaps of a device.
///
/// Not internally synchronized; [`GraphicsDevice`](crate::GraphicsDevice)
/// keeps it behind a mutex.
pub struct DescriptorAllocator {
    heaps: [DescriptorHeap; 4],
}

impl DescriptorAllocator {
    /// Create heaps with the given capacities.
    pub fn new(capacities: &DescriptorHeapCapacities) -> Self {
        Self {
            heaps: DescriptorHeapKind::ALL.map(|kind| DescriptorHeap::new(kind, capacities.get(kind))),
        }
    }

    /// Allocate a descriptor from the heap for `kind`.
    ///
    /// The lowest free slot is used, so a freed slot is handed out again
    /// before untouched ones.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::DescriptorHeapExhausted`] if every slot of
    /// the heap is live.
    pub fn allocate(&mut self, kind: DescriptorHeapKind) -> Result<DescriptorHandle, GraphicsError> {
        let heap = &mut self.heaps[kind.index()];
        let Some(slot) = heap.occupied.zeroes().next() else {
            let capacity = heap.capacity();
            log::error!("Descriptor heap {kind} exhausted ({capacity} slots)");
            return Err(GraphicsError::DescriptorHeapExhausted { kind, capacity });
        };
        heap.occupied.insert(slot);
        heap.live += 1;
        let handle = heap.handle(slot);
        log::trace!("Allocated {kind} descriptor slot {slot} ({:#x})", handle.cpu);
        Ok(handle)
    }

    /// Return a descriptor to its heap.
    ///
    /// Freeing [`DescriptorHandle::NULL`], an already free handle, or a
    /// handle this allocator never produced does nothing.
    pub fn free(&mut self, handle: DescriptorHandle) {
        if handle.is_null() {
            return;
        }
        let Some((heap, slot)) = self
            .heaps
            .iter_mut()
            .find_map(|heap| heap.slot_of(handle).map(|slot| (heap, slot)))
        else {
            log::trace!("Ignoring free of foreign descriptor {:#x}", handle.cpu);
            return;
        };
        if !heap.occupied.contains(slot) {
            log::trace!("Ignoring double free of {} slot {slot}", heap.kind);
            return;
        }
        heap.occupied.set(slot, false);
        heap.live -= 1;
        log::trace!("Freed {} descriptor slot {slot}", heap.kind);
    }

    /// Returns `true` if `handle` is currently allocated.
    pub fn is_live(&self, handle: DescriptorHandle) -> bool {
        self.heaps
            .iter()
            .find_map(|heap| heap.slot_of(handle).map(|slot| heap.occupied.contains(slot)))
            .unwrap_or(false)
    }

    /// Number of live descriptors in the heap for `kind`.
    pub fn live_count(&self, kind: DescriptorHeapKind) -> u32 {
        self.heaps[kind.index()].live
    }

    /// Fixed capacity of the heap for `kind`.
    pub fn capacity(&self, kind: DescriptorHeapKind) -> u32 {
        self.heaps[kind.index()].capacity()
    }
}

impl std::fmt::Debug for DescriptorAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("DescriptorAllocator");
        for heap in &self.heaps {
            s.field(
                &format!("{:?}", heap.kind),
                &format_args!("{}/{}", heap.live, heap.capacity()),
            );
        }
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn allocator(resource: u32, sampler: u32) -> DescriptorAllocator {
        DescriptorAllocator::new(&DescriptorHeapCapacities {
            resource,
            sampler,
            render_target: 2,
            depth_stencil: 2,
        })
    }

    #[test]
    fn live_handles_are_unique_across_heaps() {
        let mut alloc = allocator(8, 8);
        let mut seen = HashSet::new();
        for kind in DescriptorHeapKind::ALL {
            for _ in 0..2 {
                let handle = alloc.allocate(kind).unwrap();
                assert!(!handle.is_null());
                assert!(seen.insert(handle), "duplicate handle {handle:?}");
            }
        }
    }

    #[test]
    fn only_shader_visible_heaps_get_gpu_addresses() {
        let mut alloc = allocator(1, 1);
        assert_ne!(alloc.allocate(DescriptorHeapKind::Resource).unwrap().gpu, 0);
        assert_ne!(alloc.allocate(DescriptorHeapKind::Sampler).unwrap().gpu, 0);
        assert_eq!(alloc.allocate(DescriptorHeapKind::RenderTarget).unwrap().gpu, 0);
        assert_eq!(alloc.allocate(DescriptorHeapKind::DepthStencil).unwrap().gpu, 0);
    }

    #[test]
    fn exhaustion_is_an_error_and_free_makes_room() {
        let mut alloc = allocator(2, 1);
        let a = alloc.allocate(DescriptorHeapKind::Resource).unwrap();
        let b = alloc.allocate(DescriptorHeapKind::Resource).unwrap();
        assert_eq!(
            alloc.allocate(DescriptorHeapKind::Resource),
            Err(GraphicsError::DescriptorHeapExhausted {
                kind: DescriptorHeapKind::Resource,
                capacity: 2,
            })
        );

        alloc.free(a);
        let c = alloc.allocate(DescriptorHeapKind::Resource).unwrap();
        assert_eq!(c, a);
        assert_ne!(c, b);
        assert_eq!(alloc.live_count(DescriptorHeapKind::Resource), 2);
    }

    #[test]
    fn free_is_idempotent() {
        let mut alloc = allocator(4, 4);
        let handle = alloc.allocate(DescriptorHeapKind::Sampler).unwrap();
        alloc.free(handle);
        alloc.free(handle);
        alloc.free(DescriptorHandle::NULL);
        alloc.free(DescriptorHandle { cpu: 3, gpu: 0 });
        assert_eq!(alloc.live_count(DescriptorHeapKind::Sampler), 0);
        assert!(!alloc.is_live(handle));
    }

    #[test]
    fn zero_capacity_heap_always_fails() {
        let mut alloc = allocator(0, 0);
        assert!(alloc.allocate(DescriptorHeapKind::Sampler).is_err());
        assert_eq!(alloc.capacity(DescriptorHeapKind::Sampler), 0);
    }

    #[test]
    fn null_handle_is_default() {
        assert_eq!(DescriptorHandle::default(), DescriptorHandle::NULL);
        assert!(DescriptorHandle::NULL.is_null());
    }
}
