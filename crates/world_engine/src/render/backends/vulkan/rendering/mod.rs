//! Render pass, pipeline and vertex input state

/// Forward render pass with optional depth and MSAA
pub mod render_pass;

/// SPIR-V loading and the scene pipeline
pub mod shader;

/// Vertex format and its input description
pub mod vertex_layout;

pub use render_pass::{RenderPass, RenderPassFeatures, RenderPassLayout, DEPTH_FORMAT_CANDIDATES};
pub use shader::{mesh_constant_range, shader_stage, GraphicsPipeline, ShaderModule};
pub use vertex_layout::{Vertex, VulkanVertexLayout};
