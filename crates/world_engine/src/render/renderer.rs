//! Frame loop and swap chain recreation
//!
//! The [`Renderer`] owns everything sized by the surface (swap chain, render
//! pass, pipeline, attachments, framebuffers) plus the frame slots, and
//! drives a loaded [`Graph`] through acquire, record, submit and present.

use ash::vk;
use std::rc::Rc;

use crate::assets::ImageLoader;
use crate::core::config::RendererConfig;
use crate::render::backends::vulkan::rendering::{GraphicsPipeline, RenderPass, RenderPassFeatures, RenderPassLayout};
use crate::render::backends::vulkan::state::{FrameSyncState, RenderTargets, Swapchain, SwapchainManager};
use crate::render::backends::vulkan::{
    AcquireOutcome, DeviceProvider, PresentOutcome, ResourceFactory, SubmitRequest, VulkanError, VulkanResult,
};
use crate::render::overlay::{OverlayContext, UiOverlay};
use crate::scene::{CameraUniform, Graph, GraphSource};

/// Window size queries the renderer needs while (re)creating the swap chain
pub trait FrameSizeSource {
    /// Current framebuffer size in pixels
    fn framebuffer_size(&self) -> (u32, u32);

    /// Block until the windowing system delivers new events
    fn wait_events(&mut self);
}

/// What happened to a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was submitted and presented
    Presented {
        /// Swap chain image the frame went to
        image_index: u32,
    },
    /// The swap chain was recreated; the frame may or may not have been shown
    SwapchainRecreated,
}

/// Everything that is rebuilt when the surface changes
struct SurfaceResources {
    command_pool: vk::CommandPool,
    swapchain: Swapchain,
    render_pass: RenderPass,
    attachments: SwapchainManager,
    pipeline: Option<GraphicsPipeline>,
    clear_values: Vec<vk::ClearValue>,
}

impl SurfaceResources {
    fn new(
        factory: &ResourceFactory,
        command_pool: vk::CommandPool,
        config: &RendererConfig,
        framebuffer_size: (u32, u32),
        descriptor_set_layout: Option<vk::DescriptorSetLayout>,
    ) -> VulkanResult<Self> {
        let device = factory.device();
        let swapchain = Swapchain::new(Rc::clone(device), framebuffer_size)?;

        let features = RenderPassFeatures::from_flags(config.enable_depth, config.enable_msaa);
        let layout = RenderPassLayout::new(&**device, features, swapchain.format())?;
        let render_pass = RenderPass::new(Rc::clone(device), layout)?;

        let pipeline = match descriptor_set_layout {
            Some(set_layout) => Some(GraphicsPipeline::new(
                Rc::clone(device),
                &render_pass,
                swapchain.extent(),
                set_layout,
                &config.shaders,
            )?),
            None => None,
        };

        let attachments = SwapchainManager::new(factory, &layout, render_pass.handle(), &swapchain)?;

        Ok(Self {
            command_pool,
            clear_values: layout.clear_values(config.clear_color),
            swapchain,
            render_pass,
            attachments,
            pipeline,
        })
    }

    fn targets(&self) -> Option<RenderTargets<'_>> {
        let pipeline = self.pipeline.as_ref()?;
        Some(RenderTargets {
            command_pool: self.command_pool,
            render_pass: self.render_pass.handle(),
            framebuffers: self.attachments.framebuffers(),
            extent: self.swapchain.extent(),
            clear_values: &self.clear_values,
            pipeline: pipeline.handle(),
            pipeline_layout: pipeline.layout(),
        })
    }

    /// Framebuffers, pipeline, attachments, render pass, views, swap chain
    fn destroy(&mut self) {
        self.attachments.destroy_framebuffers();
        if let Some(mut pipeline) = self.pipeline.take() {
            pipeline.destroy();
        }
        self.attachments.destroy_attachments();
        self.render_pass.destroy();
        self.swapchain.destroy_views();
        self.swapchain.destroy();
    }
}

fn overlay_mut(overlay: &mut Option<Box<dyn UiOverlay>>) -> Option<&mut dyn UiOverlay> {
    match overlay {
        Some(overlay) => Some(&mut **overlay),
        None => None,
    }
}

/// Swap chain, frame slots and the graph they draw
pub struct Renderer {
    device: Rc<dyn DeviceProvider>,
    factory: ResourceFactory,
    config: RendererConfig,
    command_pool: vk::CommandPool,
    surface: SurfaceResources,
    sync: FrameSyncState,
    graph: Option<Graph>,
    overlay: Option<Box<dyn UiOverlay>>,
    framebuffer_resized: bool,
}

impl Renderer {
    /// Create the command pool, swap chain, render pass, attachments,
    /// framebuffers and frame slots
    pub fn new(device: Rc<dyn DeviceProvider>, window: &dyn FrameSizeSource, config: &RendererConfig) -> VulkanResult<Self> {
        log::debug!("Creating renderer...");
        config.validate()?;

        let factory = ResourceFactory::new(Rc::clone(&device))?;
        let command_pool = device.create_command_pool(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)?;

        let surface = match SurfaceResources::new(&factory, command_pool, config, window.framebuffer_size(), None) {
            Ok(surface) => surface,
            Err(e) => {
                device.destroy_command_pool(command_pool);
                return Err(e);
            }
        };

        let sync = match FrameSyncState::new(
            Rc::clone(&device),
            config.max_frames_in_flight,
            surface.swapchain.image_count(),
        ) {
            Ok(sync) => sync,
            Err(e) => {
                drop(surface);
                device.destroy_command_pool(command_pool);
                return Err(e);
            }
        };

        log::info!(
            "Renderer created: {}x{}, {} images, {} frames in flight",
            surface.swapchain.extent().width,
            surface.swapchain.extent().height,
            surface.swapchain.image_count(),
            config.max_frames_in_flight
        );
        Ok(Self {
            device,
            factory,
            config: config.clone(),
            command_pool,
            surface,
            sync,
            graph: None,
            overlay: None,
            framebuffer_resized: false,
        })
    }

    /// Build a graph sized for the current swap chain and load it
    pub fn create_graph(&mut self, source: GraphSource, loader: &dyn ImageLoader) -> VulkanResult<()> {
        let graph = Graph::new(Rc::clone(&self.device), source, loader, self.image_count())?;
        self.load_graph(graph)
    }

    /// Replace the drawn graph, build the pipeline against its descriptor
    /// layout and record its command buffers
    pub fn load_graph(&mut self, mut graph: Graph) -> VulkanResult<()> {
        if let Some(mut previous) = self.graph.take() {
            self.device.device_wait_idle()?;
            previous.destroy();
        }
        if let Some(mut pipeline) = self.surface.pipeline.take() {
            pipeline.destroy();
        }

        self.surface.pipeline = Some(GraphicsPipeline::new(
            Rc::clone(&self.device),
            &self.surface.render_pass,
            self.surface.swapchain.extent(),
            graph.descriptor_set_layout(),
            &self.config.shaders,
        )?);

        let targets = self.surface.targets().ok_or_else(|| VulkanError::InvalidOperation {
            reason: "pipeline missing after creation".to_string(),
        })?;
        let image_count = self.surface.swapchain.image_count();
        let overlay = overlay_mut(&mut self.overlay);
        if graph.image_count() == image_count {
            graph.create_render_command_buffers(&targets, overlay)?;
        } else {
            graph.on_frame_size_change_start();
            graph.on_frame_size_change_end(image_count, &targets, overlay)?;
        }

        log::info!("Graph loaded with {} meshes", graph.meshes().len());
        self.graph = Some(graph);
        Ok(())
    }

    /// Attach or remove the overlay recorded at the end of every frame
    pub fn set_overlay(&mut self, overlay: Option<Box<dyn UiOverlay>>) {
        self.overlay = overlay;
    }

    /// Render state an overlay needs for its own pipeline
    pub fn overlay_context(&self) -> OverlayContext {
        OverlayContext {
            render_pass: self.surface.render_pass.handle(),
            image_count: self.surface.swapchain.image_count(),
            msaa_samples: self.surface.render_pass.layout().samples,
        }
    }

    /// Ask for a swap chain recreation after the next present
    pub fn notify_resized(&mut self) {
        self.framebuffer_resized = true;
    }

    /// Render and present one frame.
    ///
    /// `update` fills the camera block for the acquired image; it receives
    /// the current swap chain extent for the projection's aspect ratio.
    pub fn draw_frame<F>(&mut self, window: &mut dyn FrameSizeSource, update: F) -> VulkanResult<FrameOutcome>
    where
        F: FnOnce(&mut CameraUniform, vk::Extent2D),
    {
        if self.graph.is_none() {
            return Err(VulkanError::InvalidOperation {
                reason: "draw_frame called before a graph was loaded".to_string(),
            });
        }

        self.sync.wait_for_current_frame()?;
        let frame = self.sync.current();

        let (image_index, suboptimal) =
            match self.device.acquire_next_image(self.surface.swapchain.handle(), frame.image_available)? {
                AcquireOutcome::Acquired { index, suboptimal } => (index, suboptimal),
                AcquireOutcome::OutOfDate => {
                    log::warn!("Swapchain out of date on acquire, recreating");
                    self.recreate_swapchain(window)?;
                    return Ok(FrameOutcome::SwapchainRecreated);
                }
            };
        let image = image_index as usize;

        self.sync.claim_image(image)?;

        let command_buffer = {
            let graph = self.graph.as_mut().ok_or_else(|| VulkanError::InvalidOperation {
                reason: "graph unloaded during frame".to_string(),
            })?;
            let extent = self.surface.swapchain.extent();
            let mut camera = CameraUniform::default();
            update(&mut camera, extent);
            graph.write_camera_uniform(image, &camera)?;
            graph.write_node_uniforms(image)?;

            if let Some(overlay) = overlay_mut(&mut self.overlay) {
                let targets = self.surface.targets().ok_or_else(|| VulkanError::InvalidOperation {
                    reason: "no pipeline for overlay recording".to_string(),
                })?;
                graph.record_command_buffer(image, &targets, Some(overlay))?;
            }
            graph
                .command_buffer(image)
                .ok_or(VulkanError::ResourceNotFound { id: u64::from(image_index) })?
        };

        self.sync.reset_current_fence()?;
        self.device.queue_submit(&SubmitRequest {
            command_buffer,
            wait_semaphore: Some((frame.image_available, vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)),
            signal_semaphore: Some(frame.render_finished),
            fence: frame.in_flight,
        })?;

        let presented = self
            .device
            .queue_present(self.surface.swapchain.handle(), image_index, frame.render_finished)?;

        let outcome = if presented != PresentOutcome::Presented || suboptimal || self.framebuffer_resized {
            log::warn!(
                "Recreating swapchain after present ({:?}, suboptimal acquire: {}, resized: {})",
                presented,
                suboptimal,
                self.framebuffer_resized
            );
            self.framebuffer_resized = false;
            self.recreate_swapchain(window)?;
            FrameOutcome::SwapchainRecreated
        } else {
            FrameOutcome::Presented { image_index }
        };

        self.sync.advance();
        Ok(outcome)
    }

    /// Rebuild every surface-sized resource for the window's current size
    pub fn recreate_swapchain(&mut self, window: &mut dyn FrameSizeSource) -> VulkanResult<()> {
        let mut size = window.framebuffer_size();
        while size.0 == 0 || size.1 == 0 {
            log::debug!("Framebuffer is {}x{}, waiting for events", size.0, size.1);
            window.wait_events();
            size = window.framebuffer_size();
        }

        self.device.device_wait_idle()?;

        if let Some(graph) = self.graph.as_mut() {
            graph.on_frame_size_change_start();
        }

        self.surface.destroy();
        let set_layout = self.graph.as_ref().map(Graph::descriptor_set_layout);
        self.surface = SurfaceResources::new(&self.factory, self.command_pool, &self.config, size, set_layout)?;

        let image_count = self.surface.swapchain.image_count();
        self.sync.reset_images(image_count);

        if let Some(graph) = self.graph.as_mut() {
            let targets = self.surface.targets().ok_or_else(|| VulkanError::InvalidOperation {
                reason: "no pipeline for a loaded graph".to_string(),
            })?;
            graph.on_frame_size_change_end(image_count, &targets, overlay_mut(&mut self.overlay))?;
        }

        let extent = self.surface.swapchain.extent();
        log::info!(
            "Swapchain recreated: {}x{}, {} images",
            extent.width,
            extent.height,
            image_count
        );
        Ok(())
    }

    /// Block until the device is idle
    pub fn wait_idle(&self) -> VulkanResult<()> {
        self.device.device_wait_idle()
    }

    /// Current swap chain extent
    pub fn extent(&self) -> vk::Extent2D {
        self.surface.swapchain.extent()
    }

    /// Current swap chain image count
    pub fn image_count(&self) -> usize {
        self.surface.swapchain.image_count()
    }

    /// Index of the frame slot the next frame uses
    pub fn current_frame(&self) -> usize {
        self.sync.current_frame()
    }

    /// The loaded graph
    pub fn graph(&self) -> Option<&Graph> {
        self.graph.as_ref()
    }

    /// The loaded graph, for node transform updates between frames
    pub fn graph_mut(&mut self) -> Option<&mut Graph> {
        self.graph.as_mut()
    }

    /// Device every resource was created on
    pub fn device(&self) -> &Rc<dyn DeviceProvider> {
        &self.device
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        if let Err(e) = self.device.device_wait_idle() {
            log::warn!("Device wait idle failed during renderer shutdown: {}", e);
        }
        // Graph command buffers come from our pool
        self.graph = None;
        self.surface.destroy();
        self.sync.destroy();
        self.device.destroy_command_pool(self.command_pool);
        log::debug!("Renderer destroyed");
    }
}
