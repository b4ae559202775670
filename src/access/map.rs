//! A sparse address space assembled from several buffers mapped at distinct base addresses.
//! Lookups resolve an address to the region whose span contains it; an access must fit inside
//! one region.
use std::collections::BTreeMap;

use log::debug;

use super::{AccessError, AccessResult, MemoryAccess, RamMemory};

#[derive(Clone, Debug, Default)]
pub struct MemoryMap {
    // Key: region base address
    regions: BTreeMap<u64, RamMemory>,
}

impl MemoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `region` at its own base address. Overlapping an existing region is an error.
    pub fn map(&mut self, region: RamMemory) -> AccessResult<()> {
        let start = region.base();
        let end = region.end();
        if region.is_empty() {
            return Err(AccessError::Overlap {
                address: start,
                details: format!("region '{}' is empty", region.name()),
            });
        }
        if let Some(existing) = self
            .regions
            .range(..end)
            .next_back()
            .map(|(_, existing)| existing)
            .filter(|existing| existing.end() > start)
        {
            return Err(AccessError::Overlap {
                address: start,
                details: format!(
                    "'{}' already spans 0x{:016X}..0x{:016X}",
                    existing.name(),
                    existing.base(),
                    existing.end()
                ),
            });
        }
        debug!(
            "mapped '{}' at 0x{start:016X}..0x{end:016X}",
            region.name()
        );
        self.regions.insert(start, region);
        Ok(())
    }

    /// Removes and returns the region containing `address`.
    pub fn unmap(&mut self, address: u64) -> AccessResult<RamMemory> {
        let key = self
            .region_key(address)
            .ok_or(AccessError::NotMapped { address })?;
        self.regions
            .remove(&key)
            .ok_or(AccessError::NotMapped { address })
    }

    pub fn region(&self, address: u64) -> Option<&RamMemory> {
        self.region_key(address).and_then(|key| self.regions.get(&key))
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    fn region_key(&self, address: u64) -> Option<u64> {
        self.regions
            .range(..=address)
            .next_back()
            .and_then(|(start, region)| region.contains(address).then_some(*start))
    }

    fn region_mut(&mut self, address: u64) -> AccessResult<&mut RamMemory> {
        let key = self
            .region_key(address)
            .ok_or(AccessError::NotMapped { address })?;
        self.regions
            .get_mut(&key)
            .ok_or(AccessError::NotMapped { address })
    }
}

impl MemoryAccess for MemoryMap {
    fn read_into(&mut self, address: u64, out: &mut [u8]) -> AccessResult<()> {
        if out.is_empty() {
            return Ok(());
        }
        self.region_mut(address)?.read_into(address, out)
    }

    fn write_bytes(&mut self, address: u64, data: &[u8]) -> AccessResult<()> {
        if data.is_empty() {
            return Ok(());
        }
        self.region_mut(address)?.write_bytes(address, data)
    }
}
