//! Bounded, reference-counted arrays of bindless descriptor slots.

use std::collections::HashMap;

use crate::descriptor::DescriptorHandle;
use crate::error::GraphicsError;

/// Number of entries in each material texture/sampler array.
pub const MATERIAL_SLOT_CAPACITY: u32 = 1024;

/// Maps descriptor handles to indices in a fixed-size shader array.
///
/// A handle claimed several times shares one slot; the slot is released
/// when its last claim is.
#[derive(Debug)]
pub(crate) struct MaterialSlotArray {
    name: &'static str,
    slots: Vec<Option<(DescriptorHandle, u32)>>,
    lookup: HashMap<DescriptorHandle, u32>,
}

impl MaterialSlotArray {
    pub fn new(name: &'static str, capacity: u32) -> Self {
        Self {
            name,
            slots: vec![None; capacity as usize],
            lookup: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    pub fn live(&self) -> u32 {
        self.lookup.len() as u32
    }

    /// Fail unless claiming every handle in `handles` would succeed.
    pub fn check_room(&self, handles: &[DescriptorHandle]) -> Result<(), GraphicsError> {
        let mut fresh: Vec<DescriptorHandle> = handles
            .iter()
            .copied()
            .filter(|h| !self.lookup.contains_key(h))
            .collect();
        fresh.sort_unstable();
        fresh.dedup();
        if fresh.len() as u32 > self.capacity() - self.live() {
            log::error!(
                "Material {} array full: {} live, {} more requested",
                self.name,
                self.live(),
                fresh.len()
            );
            return Err(GraphicsError::SlotArrayFull {
                array: self.name,
                capacity: self.capacity(),
            });
        }
        Ok(())
    }

    /// Claim a slot for `handle`. Returns the slot and whether it is new.
    pub fn claim(&mut self, handle: DescriptorHandle) -> Result<(u32, bool), GraphicsError> {
        if let Some(&slot) = self.lookup.get(&handle) {
            if let Some((_, refs)) = &mut self.slots[slot as usize] {
                *refs += 1;
            }
            return Ok((slot, false));
        }
        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(GraphicsError::SlotArrayFull {
                array: self.name,
                capacity: self.capacity(),
            })?;
        self.slots[slot] = Some((handle, 1));
        self.lookup.insert(handle, slot as u32);
        Ok((slot as u32, true))
    }

    /// Drop one claim on `slot`.
    pub fn release(&mut self, slot: u32) {
        let Some(Some((handle, refs))) = self.slots.get_mut(slot as usize) else {
            return;
        };
        *refs -= 1;
        if *refs == 0 {
            let handle = *handle;
            self.lookup.remove(&handle);
            self.slots[slot as usize] = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(n: u64) -> DescriptorHandle {
        DescriptorHandle { cpu: n, gpu: n }
    }

    #[test]
    fn shared_handles_share_a_slot() {
        let mut slots = MaterialSlotArray::new("texture", 4);
        assert_eq!(slots.claim(handle(1)).unwrap(), (0, true));
        assert_eq!(slots.claim(handle(1)).unwrap(), (0, false));
        slots.release(0);
        assert_eq!(slots.live(), 1);
        slots.release(0);
        assert_eq!(slots.live(), 0);
    }

    #[test]
    fn check_room_counts_only_new_distinct_handles() {
        let mut slots = MaterialSlotArray::new("sampler", 2);
        slots.claim(handle(1)).unwrap();
        assert!(slots.check_room(&[handle(1), handle(2), handle(2)]).is_ok());
        assert_eq!(
            slots.check_room(&[handle(2), handle(3)]),
            Err(GraphicsError::SlotArrayFull {
                array: "sampler",
                capacity: 2
            })
        );
    }
}
