use crate::view::frame_graph::TextureDesc;

/// Frames a free texture may sit unused before it is dropped.
const MAX_IDLE_FRAMES: u64 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct PoolKey {
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    dimension: wgpu::TextureDimension,
}

impl PoolKey {
    fn of(desc: &TextureDesc) -> Self {
        Self {
            width: desc.width().max(1),
            height: desc.height().max(1),
            format: desc.format(),
            dimension: desc.dimension(),
        }
    }
}

struct PoolEntry<T> {
    key: PoolKey,
    value: T,
    in_use: bool,
    last_used_frame: u64,
}

/// Reuse bookkeeping for pooled values, independent of how they are
/// allocated.
struct PoolSlots<T> {
    entries: Vec<PoolEntry<T>>,
    frame: u64,
}

impl<T> Default for PoolSlots<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            frame: 0,
        }
    }
}

impl<T: Clone> PoolSlots<T> {
    /// Marks a free entry with `key` as used and returns its value.
    fn checkout(&mut self, key: PoolKey) -> Option<T> {
        let frame = self.frame;
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| !entry.in_use && entry.key == key)?;
        entry.in_use = true;
        entry.last_used_frame = frame;
        Some(entry.value.clone())
    }

    fn insert(&mut self, key: PoolKey, value: T) {
        self.entries.push(PoolEntry {
            key,
            value,
            in_use: true,
            last_used_frame: self.frame,
        });
    }

    fn release_all(&mut self) {
        for entry in &mut self.entries {
            entry.in_use = false;
        }
    }

    /// Returns how many entries were evicted.
    fn end_frame(&mut self) -> usize {
        self.release_all();
        let frame = self.frame;
        let before = self.entries.len();
        self.entries
            .retain(|entry| frame.saturating_sub(entry.last_used_frame) < MAX_IDLE_FRAMES);
        self.frame += 1;
        before - self.entries.len()
    }

    fn in_use(&self) -> usize {
        self.entries.iter().filter(|entry| entry.in_use).count()
    }
}

/// Transient render targets shared by every graph the host executes.
///
/// A graph acquires its textures right before running and hands them all
/// back when it is done, so two views recorded one after the other reuse the
/// same allocations.
#[derive(Default)]
pub struct TexturePool {
    slots: PoolSlots<wgpu::Texture>,
}

impl TexturePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&mut self, device: &wgpu::Device, desc: &TextureDesc) -> wgpu::Texture {
        let key = PoolKey::of(desc);
        if let Some(texture) = self.slots.checkout(key) {
            return texture;
        }

        let usage = if key.format.is_depth_stencil_format() {
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING
        } else {
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.label()),
            size: wgpu::Extent3d {
                width: key.width,
                height: key.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: key.dimension,
            format: key.format,
            usage,
            view_formats: &[],
        });
        tracing::trace!(
            texture = desc.label(),
            width = key.width,
            height = key.height,
            format = ?key.format,
            "allocated pooled texture"
        );
        self.slots.insert(key, texture.clone());
        texture
    }

    pub fn release_all(&mut self) {
        self.slots.release_all();
    }

    /// Advances the pool's frame counter and frees textures nobody acquired
    /// for a few frames.
    pub fn end_frame(&mut self) {
        let evicted = self.slots.end_frame();
        if evicted > 0 {
            tracing::debug!(
                evicted,
                remaining = self.slots.entries.len(),
                "evicted idle pooled textures"
            );
        }
    }

    pub fn len(&self) -> usize {
        self.slots.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.entries.is_empty()
    }

    pub fn in_use(&self) -> usize {
        self.slots.in_use()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mask_key(width: u32, height: u32) -> PoolKey {
        PoolKey::of(&TextureDesc::mask("mask", width, height))
    }

    fn acquire(slots: &mut PoolSlots<u32>, key: PoolKey, next: &mut u32) -> u32 {
        slots.checkout(key).unwrap_or_else(|| {
            *next += 1;
            slots.insert(key, *next);
            *next
        })
    }

    #[test]
    fn key_ignores_label_and_clamps_size() {
        assert_eq!(
            PoolKey::of(&TextureDesc::mask("a", 640, 480)),
            PoolKey::of(&TextureDesc::mask("b", 640, 480))
        );
        assert_ne!(mask_key(640, 480), PoolKey::of(&TextureDesc::depth("d", 640, 480)));
        assert_eq!(mask_key(0, 0), mask_key(1, 1));
    }

    #[test]
    fn textures_in_use_are_not_handed_out_twice() {
        let mut slots = PoolSlots::default();
        let mut next = 0;
        let key = mask_key(640, 480);

        let a = acquire(&mut slots, key, &mut next);
        let b = acquire(&mut slots, key, &mut next);
        assert_ne!(a, b);
        assert_eq!(slots.in_use(), 2);

        slots.release_all();
        assert_eq!(slots.in_use(), 0);
        assert_eq!(acquire(&mut slots, key, &mut next), a);
        assert_eq!(acquire(&mut slots, key, &mut next), b);
        assert_eq!(slots.entries.len(), 2);
    }

    #[test]
    fn different_keys_do_not_share() {
        let mut slots = PoolSlots::default();
        let mut next = 0;
        let small = acquire(&mut slots, mask_key(640, 480), &mut next);
        slots.release_all();
        let large = acquire(&mut slots, mask_key(1920, 1080), &mut next);
        assert_ne!(small, large);
        assert_eq!(slots.entries.len(), 2);
    }

    #[test]
    fn idle_entries_are_evicted_after_three_frames() {
        let mut slots = PoolSlots::default();
        let mut next = 0;
        let idle = mask_key(640, 480);
        let busy = mask_key(1920, 1080);
        acquire(&mut slots, idle, &mut next);
        let kept = acquire(&mut slots, busy, &mut next);

        assert_eq!(slots.end_frame(), 0);
        assert_eq!(acquire(&mut slots, busy, &mut next), kept);
        assert_eq!(slots.end_frame(), 0);
        assert_eq!(acquire(&mut slots, busy, &mut next), kept);
        assert_eq!(slots.end_frame(), 0);
        assert_eq!(slots.entries.len(), 2);

        // Frame 3 has gone by without `idle` being acquired.
        assert_eq!(acquire(&mut slots, busy, &mut next), kept);
        assert_eq!(slots.end_frame(), 1);
        assert_eq!(slots.entries.len(), 1);
        assert_eq!(slots.in_use(), 0);
        assert_eq!(acquire(&mut slots, busy, &mut next), kept);
    }
}
