//! Frame synchronization
//!
//! Each frame slot owns an image-acquired semaphore, a render-finished
//! semaphore and a fence created signalled. A second table remembers which
//! slot fence last rendered into each swap chain image so an image is never
//! reused while a previous frame still targets it.

use ash::vk;
use std::rc::Rc;

use crate::render::backends::vulkan::{DeviceProvider, VulkanResult};

/// Synchronization objects of one frame slot
#[derive(Debug, Clone, Copy)]
pub struct FrameSync {
    /// Signalled when the acquired image is ready to be rendered to
    pub image_available: vk::Semaphore,
    /// Signalled when rendering finished, waited by presentation
    pub render_finished: vk::Semaphore,
    /// Signalled when the slot's submission completed
    pub in_flight: vk::Fence,
}

/// Frame slots, per-image fence ownership and the current slot index
pub struct FrameSyncState {
    device: Rc<dyn DeviceProvider>,
    frames: Vec<FrameSync>,
    images_in_flight: Vec<vk::Fence>,
    current_frame: usize,
}

impl FrameSyncState {
    /// Create `frames_in_flight` slots and an empty table for `image_count` images
    pub fn new(device: Rc<dyn DeviceProvider>, frames_in_flight: usize, image_count: usize) -> VulkanResult<Self> {
        let mut state = Self {
            device,
            frames: Vec::with_capacity(frames_in_flight),
            images_in_flight: vec![vk::Fence::null(); image_count],
            current_frame: 0,
        };
        // Objects created so far are released by Drop if a later one fails
        for _ in 0..frames_in_flight {
            let image_available = state.device.create_semaphore()?;
            let render_finished = match state.device.create_semaphore() {
                Ok(semaphore) => semaphore,
                Err(e) => {
                    state.device.destroy_semaphore(image_available);
                    return Err(e);
                }
            };
            let in_flight = match state.device.create_fence(true) {
                Ok(fence) => fence,
                Err(e) => {
                    state.device.destroy_semaphore(image_available);
                    state.device.destroy_semaphore(render_finished);
                    return Err(e);
                }
            };
            state.frames.push(FrameSync {
                image_available,
                render_finished,
                in_flight,
            });
        }
        log::debug!(
            "Created sync objects for {} frames in flight, {} images",
            frames_in_flight,
            image_count
        );
        Ok(state)
    }

    /// Number of frame slots
    pub fn frames_in_flight(&self) -> usize {
        self.frames.len()
    }

    /// Index of the current slot
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Objects of the current slot
    pub fn current(&self) -> FrameSync {
        self.frames[self.current_frame]
    }

    /// Block until the current slot's previous submission completed
    pub fn wait_for_current_frame(&self) -> VulkanResult<()> {
        self.device.wait_for_fence(self.current().in_flight, u64::MAX)
    }

    /// Wait for whichever slot last rendered into `image_index`, then record
    /// the current slot as its owner
    pub fn claim_image(&mut self, image_index: usize) -> VulkanResult<()> {
        if image_index >= self.images_in_flight.len() {
            self.images_in_flight.resize(image_index + 1, vk::Fence::null());
        }
        let previous = self.images_in_flight[image_index];
        if previous != vk::Fence::null() {
            self.device.wait_for_fence(previous, u64::MAX)?;
        }
        self.images_in_flight[image_index] = self.current().in_flight;
        Ok(())
    }

    /// Unsignal the current slot's fence right before submission
    pub fn reset_current_fence(&self) -> VulkanResult<()> {
        self.device.reset_fence(self.current().in_flight)
    }

    /// Move to the next slot
    pub fn advance(&mut self) {
        if !self.frames.is_empty() {
            self.current_frame = (self.current_frame + 1) % self.frames.len();
        }
    }

    /// Fence that last rendered into an image, null when none
    pub fn image_fence(&self, image_index: usize) -> vk::Fence {
        self.images_in_flight.get(image_index).copied().unwrap_or_default()
    }

    /// Forget image ownership and size the table for a new swap chain
    pub fn reset_images(&mut self, image_count: usize) {
        self.images_in_flight.clear();
        self.images_in_flight.resize(image_count, vk::Fence::null());
    }

    /// Destroy every semaphore and fence
    pub fn destroy(&mut self) {
        for frame in self.frames.drain(..) {
            self.device.destroy_semaphore(frame.render_finished);
            self.device.destroy_semaphore(frame.image_available);
            self.device.destroy_fence(frame.in_flight);
        }
        self.images_in_flight.clear();
    }
}

impl Drop for FrameSyncState {
    fn drop(&mut self) {
        self.destroy();
    }
}
