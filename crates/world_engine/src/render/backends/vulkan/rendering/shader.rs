//! Shader loading and graphics pipeline creation
//!
//! SPIR-V modules are read from the files listed in [`ShaderSourceDetails`]
//! and only live until the pipeline is built. The pipeline itself bakes the
//! viewport of the current extent, so it is rebuilt on every resize.

use ash::vk;
use std::ffi::CStr;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::rc::Rc;

use crate::core::config::{ShaderKind, ShaderSourceDetails};
use crate::render::backends::vulkan::rendering::{RenderPass, VulkanVertexLayout};
use crate::render::backends::vulkan::{DeviceProvider, VulkanError, VulkanResult};
use crate::scene::MeshConstantData;

const ENTRY_POINT: &CStr = c"main";

/// Pipeline stage of a shader kind
pub fn shader_stage(kind: ShaderKind) -> vk::ShaderStageFlags {
    match kind {
        ShaderKind::Vertex => vk::ShaderStageFlags::VERTEX,
        ShaderKind::Fragment => vk::ShaderStageFlags::FRAGMENT,
        ShaderKind::Geometry => vk::ShaderStageFlags::GEOMETRY,
    }
}

/// Push constant range of the per-mesh constant block
pub fn mesh_constant_range() -> vk::PushConstantRange {
    vk::PushConstantRange {
        stage_flags: vk::ShaderStageFlags::FRAGMENT,
        offset: 0,
        size: std::mem::size_of::<MeshConstantData>() as u32,
    }
}

/// SPIR-V shader module wrapper with automatic resource management
pub struct ShaderModule {
    device: Rc<dyn DeviceProvider>,
    module: vk::ShaderModule,
    stage: vk::ShaderStageFlags,
}

impl ShaderModule {
    /// Create shader module from SPIR-V bytecode
    pub fn from_bytes(device: Rc<dyn DeviceProvider>, stage: vk::ShaderStageFlags, bytes: &[u8]) -> VulkanResult<Self> {
        let code = ash::util::read_spv(&mut std::io::Cursor::new(bytes))
            .map_err(|e| VulkanError::InitializationFailed(format!("Invalid SPIR-V: {e}")))?;
        let module = device.create_shader_module(&code)?;
        log::debug!("Created {:?} shader module from {} words", stage, code.len());
        Ok(Self { device, module, stage })
    }

    /// Load shader from SPIR-V file
    pub fn from_file(device: Rc<dyn DeviceProvider>, stage: vk::ShaderStageFlags, path: &Path) -> VulkanResult<Self> {
        let file = File::open(path).map_err(|e| {
            VulkanError::InitializationFailed(format!("Failed to open shader file {}: {e}", path.display()))
        })?;
        let code = ash::util::read_spv(&mut BufReader::new(file)).map_err(|e| {
            VulkanError::InitializationFailed(format!("Failed to read shader file {}: {e}", path.display()))
        })?;
        let module = device.create_shader_module(&code)?;
        log::debug!("Loaded {:?} shader from {}", stage, path.display());
        Ok(Self { device, module, stage })
    }

    /// Get shader module handle
    pub fn handle(&self) -> vk::ShaderModule {
        self.module
    }

    /// Create shader stage create info
    pub fn stage_info(&self) -> vk::PipelineShaderStageCreateInfo {
        vk::PipelineShaderStageCreateInfo::builder()
            .stage(self.stage)
            .module(self.module)
            .name(ENTRY_POINT)
            .build()
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        self.device.destroy_shader_module(self.module);
    }
}

/// Graphics pipeline wrapper with RAII cleanup
pub struct GraphicsPipeline {
    device: Rc<dyn DeviceProvider>,
    pipeline: vk::Pipeline,
    layout: vk::PipelineLayout,
}

impl GraphicsPipeline {
    /// Build the scene pipeline for `render_pass` at `extent`
    pub fn new(
        device: Rc<dyn DeviceProvider>,
        render_pass: &RenderPass,
        extent: vk::Extent2D,
        descriptor_set_layout: vk::DescriptorSetLayout,
        shaders: &ShaderSourceDetails,
    ) -> VulkanResult<Self> {
        let modules = shaders
            .resolve()?
            .into_iter()
            .map(|(kind, path)| ShaderModule::from_file(device.clone(), shader_stage(kind), &path))
            .collect::<VulkanResult<Vec<_>>>()?;
        let shader_stages: Vec<vk::PipelineShaderStageCreateInfo> = modules.iter().map(ShaderModule::stage_info).collect();

        let binding_descriptions = [VulkanVertexLayout::get_binding_description()];
        let attribute_descriptions = VulkanVertexLayout::get_attribute_descriptions();
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::builder()
            .vertex_binding_descriptions(&binding_descriptions)
            .vertex_attribute_descriptions(&attribute_descriptions);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        let viewports = [vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }];
        let scissors = [vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        }];
        let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
            .viewports(&viewports)
            .scissors(&scissors);

        let rasterizer = vk::PipelineRasterizationStateCreateInfo::builder()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(vk::CullModeFlags::BACK)
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            .depth_bias_enable(false);

        let pass_layout = render_pass.layout();
        let multisampling = vk::PipelineMultisampleStateCreateInfo::builder()
            .sample_shading_enable(false)
            .rasterization_samples(pass_layout.samples);

        let depth_enabled = pass_layout.has_depth();
        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::builder()
            .depth_test_enable(depth_enabled)
            .depth_write_enable(depth_enabled)
            .depth_compare_op(vk::CompareOp::LESS)
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let color_blend_attachments = [vk::PipelineColorBlendAttachmentState::builder()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(false)
            .build()];
        let color_blending = vk::PipelineColorBlendStateCreateInfo::builder()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let set_layouts = [descriptor_set_layout];
        let push_constant_ranges = [mesh_constant_range()];
        let layout = device.create_pipeline_layout(&set_layouts, &push_constant_ranges)?;

        let pipeline_info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterizer)
            .multisample_state(&multisampling)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blending)
            .layout(layout)
            .render_pass(render_pass.handle())
            .subpass(0);

        let pipeline = match device.create_graphics_pipeline(&pipeline_info) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                device.destroy_pipeline_layout(layout);
                return Err(e);
            }
        };
        // Shader modules drop here, after the pipeline exists
        drop(modules);

        log::debug!(
            "Created graphics pipeline {}x{} (depth: {}, samples: {:?})",
            extent.width,
            extent.height,
            depth_enabled,
            pass_layout.samples
        );
        Ok(Self {
            device,
            pipeline,
            layout,
        })
    }

    /// Get pipeline handle
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    /// Get layout handle
    pub fn layout(&self) -> vk::PipelineLayout {
        self.layout
    }

    /// Destroy the pipeline and its layout; later calls do nothing
    pub fn destroy(&mut self) {
        if self.pipeline != vk::Pipeline::null() {
            self.device.destroy_pipeline(self.pipeline);
            self.pipeline = vk::Pipeline::null();
        }
        if self.layout != vk::PipelineLayout::null() {
            self.device.destroy_pipeline_layout(self.layout);
            self.layout = vk::PipelineLayout::null();
        }
    }
}

impl Drop for GraphicsPipeline {
    fn drop(&mut self) {
        self.destroy();
    }
}
