//! Scene graph and its GPU resources
//!
//! A [`Graph`] flattens its input into one shared vertex buffer, one shared
//! index buffer and a list of [`Mesh`] draw records owned by nodes. Uniform
//! buffers, descriptor sets and command buffers exist once per swap chain
//! image and are rebuilt on resize; geometry, textures and the descriptor
//! layout survive it.

use ash::vk;
use std::mem::size_of;
use std::rc::Rc;

use crate::assets::{ImageLoader, ModelData};
use crate::foundation::math::Mat4;
use crate::render::backends::vulkan::resources::{
    scene_layout, scene_pool_sizes, Buffer, DescriptorSetWriter, ResourceFactory, Texture, TextureSet, CAMERA_BINDING,
    FIRST_TEXTURE_BINDING, NODE_BINDING,
};
use crate::render::backends::vulkan::{DeviceProvider, RenderTargets, Vertex, VulkanError, VulkanResult};
use crate::render::overlay::{self, UiOverlay};
use crate::scene::{CameraUniform, Mesh, MeshTextures, NodeTree, NodeUniform, PLACEHOLDER_TEXTURE};

/// One mesh of a [`GraphSource::Meshes`] input
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshInput {
    /// Vertices of this mesh
    pub vertices: Vec<Vertex>,
    /// Indices relative to this mesh's first vertex, empty for non-indexed draws
    pub indices: Vec<u32>,
    /// Base color texture
    pub texture_path: Option<String>,
}

impl MeshInput {
    /// Untextured mesh
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            texture_path: None,
        }
    }

    /// Use `path` as the base color texture
    pub fn with_texture(mut self, path: impl Into<String>) -> Self {
        self.texture_path = Some(path.into());
        self
    }

    /// Unit cube centred on the origin, one quad per face
    pub fn cube() -> Self {
        const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ];
        const CORNERS: [(f32, f32, [f32; 2]); 4] = [
            (-1.0, -1.0, [0.0, 1.0]),
            (1.0, -1.0, [1.0, 1.0]),
            (1.0, 1.0, [1.0, 0.0]),
            (-1.0, 1.0, [0.0, 0.0]),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in FACES {
            let base = vertices.len() as u32;
            for (su, sv, tex_coord) in CORNERS {
                let position = [0, 1, 2].map(|axis| 0.5 * (normal[axis] + su * u[axis] + sv * v[axis]));
                vertices.push(Vertex::new(position, normal, tex_coord));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        Self::new(vertices, indices)
    }
}

/// Geometry a graph is built from
#[derive(Debug, Clone)]
pub enum GraphSource {
    /// Independent meshes, each under its own root node
    Meshes(Vec<MeshInput>),
    /// Node hierarchy with decoded images from the glTF loader
    Model(ModelData),
}

#[derive(Default)]
struct Geometry {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

fn to_u32(value: usize, what: &str) -> VulkanResult<u32> {
    u32::try_from(value).map_err(|_| VulkanError::InvalidOperation {
        reason: format!("{what} count {value} exceeds u32"),
    })
}

/// `vertex_start` as the signed offset `vkCmdDrawIndexed` takes
fn vertex_offset(mesh: &Mesh) -> VulkanResult<i32> {
    i32::try_from(mesh.vertex_start).map_err(|_| VulkanError::InvalidOperation {
        reason: format!("mesh {} vertex offset {} exceeds i32", mesh.mesh_id, mesh.vertex_start),
    })
}

/// Meshes, nodes, textures and everything needed to draw them
pub struct Graph {
    device: Rc<dyn DeviceProvider>,
    factory: ResourceFactory,
    textures: TextureSet,
    nodes: NodeTree,
    meshes: Vec<Mesh>,
    world_transforms: Vec<Mat4>,
    vertex_count: u32,
    index_count: u32,
    vertex_buffer: Option<Buffer>,
    index_buffer: Option<Buffer>,
    camera_buffers: Vec<Buffer>,
    node_buffers: Vec<Vec<Buffer>>,
    descriptor_set_layout: vk::DescriptorSetLayout,
    descriptor_pool: vk::DescriptorPool,
    descriptor_sets_per_mesh: Vec<Vec<vk::DescriptorSet>>,
    camera_descriptor_sets: Vec<vk::DescriptorSet>,
    command_pool: vk::CommandPool,
    command_buffers: Vec<vk::CommandBuffer>,
    image_count: usize,
}

impl Graph {
    /// Build textures, shared buffers, uniform buffers and descriptor sets
    /// for `image_count` swap chain images
    pub fn new(
        device: Rc<dyn DeviceProvider>,
        source: GraphSource,
        loader: &dyn ImageLoader,
        image_count: usize,
    ) -> VulkanResult<Self> {
        let factory = ResourceFactory::new(Rc::clone(&device))?;
        let textures = TextureSet::new(&factory)?;

        // Anything created below is released by Drop if a later step fails
        let mut graph = Self {
            device,
            factory,
            textures,
            nodes: NodeTree::new(),
            meshes: Vec::new(),
            world_transforms: Vec::new(),
            vertex_count: 0,
            index_count: 0,
            vertex_buffer: None,
            index_buffer: None,
            camera_buffers: Vec::new(),
            node_buffers: Vec::new(),
            descriptor_set_layout: vk::DescriptorSetLayout::null(),
            descriptor_pool: vk::DescriptorPool::null(),
            descriptor_sets_per_mesh: Vec::new(),
            camera_descriptor_sets: Vec::new(),
            command_pool: vk::CommandPool::null(),
            command_buffers: Vec::new(),
            image_count,
        };

        let geometry = match source {
            GraphSource::Meshes(inputs) => graph.flatten_meshes(inputs, loader)?,
            GraphSource::Model(model) => graph.flatten_model(model)?,
        };
        graph.upload_geometry(&geometry)?;
        graph.world_transforms = graph.nodes.world_transforms();
        graph.create_uniform_buffers()?;
        graph.create_descriptor_sets()?;

        log::info!(
            "Graph ready: {} nodes, {} meshes, {} textures, {} vertices, {} indices",
            graph.nodes.len(),
            graph.meshes.len(),
            graph.textures.len(),
            graph.vertex_count,
            graph.index_count
        );
        Ok(graph)
    }

    fn flatten_meshes(&mut self, inputs: Vec<MeshInput>, loader: &dyn ImageLoader) -> VulkanResult<Geometry> {
        let paths: Vec<String> = inputs.iter().filter_map(|input| input.texture_path.clone()).collect();
        let mut texture_ids = self
            .textures
            .create_textures_from_paths(&self.factory, loader, &paths)?
            .into_iter();

        let mut geometry = Geometry::default();
        for input in inputs {
            let base = match input.texture_path {
                Some(_) => texture_ids.next().unwrap_or(PLACEHOLDER_TEXTURE),
                None => PLACEHOLDER_TEXTURE,
            };
            let node_id = self.push_node(None, Mat4::identity())?;
            let textures = MeshTextures {
                base,
                ..MeshTextures::default()
            };
            self.push_mesh(&mut geometry, node_id, input.vertices, input.indices, textures)?;
        }
        Ok(geometry)
    }

    fn flatten_model(&mut self, model: ModelData) -> VulkanResult<Geometry> {
        for node in &model.nodes {
            self.push_node(node.parent, node.local_transform)?;
        }

        let texture_ids = self.textures.create_textures_from_images(&self.factory, &model.textures)?;
        let remap = |slot: u32| match slot {
            PLACEHOLDER_TEXTURE => PLACEHOLDER_TEXTURE,
            slot => texture_ids
                .get(slot as usize - 1)
                .copied()
                .unwrap_or(PLACEHOLDER_TEXTURE),
        };

        let mut geometry = Geometry::default();
        for mesh in model.meshes {
            if self.nodes.get(mesh.node_id).is_none() {
                return Err(VulkanError::InvalidOperation {
                    reason: format!("mesh refers to missing node {}", mesh.node_id),
                });
            }
            let slots = mesh.textures;
            let textures = MeshTextures {
                base: remap(slots.base),
                rough: remap(slots.rough),
                normal: remap(slots.normal),
                occlusion: remap(slots.occlusion),
                emissive: remap(slots.emissive),
            };
            self.push_mesh(&mut geometry, mesh.node_id, mesh.vertices, mesh.indices, textures)?;
        }
        Ok(geometry)
    }

    fn push_node(&mut self, parent: Option<usize>, local_transform: Mat4) -> VulkanResult<usize> {
        self.nodes
            .push(parent, local_transform)
            .ok_or_else(|| VulkanError::InvalidOperation {
                reason: format!("parent node {parent:?} does not precede its child"),
            })
    }

    fn push_mesh(
        &mut self,
        geometry: &mut Geometry,
        node_id: usize,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        textures: MeshTextures,
    ) -> VulkanResult<()> {
        let mesh_id = self.meshes.len();
        if let Some(&index) = indices.iter().find(|&&index| index as usize >= vertices.len()) {
            return Err(VulkanError::InvalidOperation {
                reason: format!("mesh {mesh_id} index {index} out of range for {} vertices", vertices.len()),
            });
        }
        let mesh = Mesh {
            mesh_id,
            node_id,
            vertex_start: to_u32(geometry.vertices.len(), "vertex")?,
            vertex_count: to_u32(vertices.len(), "vertex")?,
            index_start: to_u32(geometry.indices.len(), "index")?,
            index_count: to_u32(indices.len(), "index")?,
            textures,
        };
        geometry.vertices.extend(vertices);
        geometry.indices.extend(indices);
        self.nodes.attach_mesh(node_id, mesh_id);
        self.meshes.push(mesh);
        Ok(())
    }

    fn upload_geometry(&mut self, geometry: &Geometry) -> VulkanResult<()> {
        self.vertex_count = to_u32(geometry.vertices.len(), "vertex")?;
        self.index_count = to_u32(geometry.indices.len(), "index")?;

        if !geometry.vertices.is_empty() {
            self.vertex_buffer = Some(
                self.factory
                    .create_buffer_with_data(vk::BufferUsageFlags::VERTEX_BUFFER, bytemuck::cast_slice(&geometry.vertices))?,
            );
        }
        if !geometry.indices.is_empty() {
            self.index_buffer = Some(
                self.factory
                    .create_buffer_with_data(vk::BufferUsageFlags::INDEX_BUFFER, bytemuck::cast_slice(&geometry.indices))?,
            );
        }
        Ok(())
    }

    fn create_uniform_buffers(&mut self) -> VulkanResult<()> {
        let camera_size = size_of::<CameraUniform>() as vk::DeviceSize;
        let node_size = size_of::<NodeUniform>() as vk::DeviceSize;

        for _ in 0..self.image_count {
            let buffer = self
                .factory
                .create_host_buffer(camera_size, vk::BufferUsageFlags::UNIFORM_BUFFER)?;
            self.camera_buffers.push(buffer);
        }

        for world in &self.world_transforms {
            let uniform = NodeUniform::from_world(world);
            let mut per_image = Vec::with_capacity(self.image_count);
            for _ in 0..self.image_count {
                let buffer = self
                    .factory
                    .create_host_buffer(node_size, vk::BufferUsageFlags::UNIFORM_BUFFER)?;
                buffer.write(bytemuck::bytes_of(&uniform))?;
                per_image.push(buffer);
            }
            self.node_buffers.push(per_image);
        }
        Ok(())
    }

    fn create_descriptor_sets(&mut self) -> VulkanResult<()> {
        let set_count = to_u32((self.meshes.len() + 1) * self.image_count, "descriptor set")?;
        self.descriptor_pool = self
            .device
            .create_descriptor_pool(set_count, &scene_pool_sizes(set_count))?;
        if self.descriptor_set_layout == vk::DescriptorSetLayout::null() {
            self.descriptor_set_layout = scene_layout().build(&*self.device)?;
        }

        let camera_size = size_of::<CameraUniform>() as vk::DeviceSize;
        let node_size = size_of::<NodeUniform>() as vk::DeviceSize;
        let layouts = vec![self.descriptor_set_layout; self.image_count];
        let mut writer = DescriptorSetWriter::new();

        for mesh in &self.meshes {
            let sets = self.device.allocate_descriptor_sets(self.descriptor_pool, &layouts)?;
            for (image, &set) in sets.iter().enumerate() {
                writer = writer
                    .write_buffer(set, CAMERA_BINDING, self.camera_buffers[image].handle(), camera_size)
                    .write_buffer(set, NODE_BINDING, self.node_buffers[mesh.node_id][image].handle(), node_size);
                for (slot, &texture) in (0u32..).zip(mesh.textures.slots().iter()) {
                    writer = writer.write_image(set, FIRST_TEXTURE_BINDING + slot, self.texture_info(texture)?);
                }
            }
            self.descriptor_sets_per_mesh.push(sets);
        }

        // Camera sets are bound before any mesh set, so they only need
        // valid contents: the camera block twice and the placeholder
        let placeholder = self.texture_info(PLACEHOLDER_TEXTURE)?;
        self.camera_descriptor_sets = self.device.allocate_descriptor_sets(self.descriptor_pool, &layouts)?;
        for (image, &set) in self.camera_descriptor_sets.iter().enumerate() {
            let camera = self.camera_buffers[image].handle();
            writer = writer
                .write_buffer(set, CAMERA_BINDING, camera, camera_size)
                .write_buffer(set, NODE_BINDING, camera, node_size);
            for slot in 0..5 {
                writer = writer.write_image(set, FIRST_TEXTURE_BINDING + slot, placeholder);
            }
        }

        writer.update(&*self.device);
        log::debug!(
            "Allocated {} descriptor sets for {} meshes x {} images",
            set_count,
            self.meshes.len(),
            self.image_count
        );
        Ok(())
    }

    fn texture_info(&self, index: u32) -> VulkanResult<vk::DescriptorImageInfo> {
        self.textures
            .get_or_placeholder(index)
            .map(Texture::descriptor_info)
            .ok_or(VulkanError::ResourceNotFound { id: u64::from(index) })
    }

    /// Allocate and record one primary command buffer per swap chain image
    pub fn create_render_command_buffers(
        &mut self,
        targets: &RenderTargets<'_>,
        mut overlay: Option<&mut dyn UiOverlay>,
    ) -> VulkanResult<()> {
        self.free_command_buffers();
        let count = to_u32(targets.image_count(), "command buffer")?;
        self.command_buffers = self.device.allocate_command_buffers(targets.command_pool, count)?;
        self.command_pool = targets.command_pool;

        for image in 0..self.command_buffers.len() {
            self.record_command_buffer(image, targets, overlay::reborrow(&mut overlay))?;
        }
        log::debug!("Recorded {} render command buffers", self.command_buffers.len());
        Ok(())
    }

    /// Re-record the command buffer of one swap chain image
    pub fn record_command_buffer(
        &self,
        image: usize,
        targets: &RenderTargets<'_>,
        overlay: Option<&mut dyn UiOverlay>,
    ) -> VulkanResult<()> {
        let command_buffer = self.command_buffer(image).ok_or(VulkanError::ResourceNotFound { id: image as u64 })?;
        let framebuffer = targets
            .framebuffers
            .get(image)
            .copied()
            .ok_or(VulkanError::ResourceNotFound { id: image as u64 })?;
        let device = &*self.device;

        device.begin_command_buffer(command_buffer, vk::CommandBufferUsageFlags::empty())?;

        let render_pass_info = vk::RenderPassBeginInfo::builder()
            .render_pass(targets.render_pass)
            .framebuffer(framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: targets.extent,
            })
            .clear_values(targets.clear_values);
        device.cmd_begin_render_pass(command_buffer, &render_pass_info);
        device.cmd_bind_pipeline(command_buffer, targets.pipeline);

        if let Some(vertex_buffer) = &self.vertex_buffer {
            device.cmd_bind_vertex_buffer(command_buffer, vertex_buffer.handle());
        }
        if let Some(index_buffer) = &self.index_buffer {
            device.cmd_bind_index_buffer(command_buffer, index_buffer.handle(), vk::IndexType::UINT32);
        }
        if let Some(&camera_set) = self.camera_descriptor_sets.get(image) {
            device.cmd_bind_descriptor_set(command_buffer, targets.pipeline_layout, camera_set);
        }

        for node in self.nodes.iter() {
            for &mesh_id in &node.mesh_ids {
                let mesh = &self.meshes[mesh_id];
                let set = self
                    .descriptor_sets_per_mesh
                    .get(mesh_id)
                    .and_then(|sets| sets.get(image))
                    .copied()
                    .ok_or(VulkanError::ResourceNotFound { id: mesh_id as u64 })?;
                device.cmd_bind_descriptor_set(command_buffer, targets.pipeline_layout, set);
                device.cmd_push_constants(
                    command_buffer,
                    targets.pipeline_layout,
                    vk::ShaderStageFlags::FRAGMENT,
                    0,
                    bytemuck::bytes_of(&mesh.textures.constants()),
                );
                if mesh.is_indexed() {
                    device.cmd_draw_indexed(command_buffer, mesh.index_count, mesh.index_start, vertex_offset(mesh)?);
                } else {
                    device.cmd_draw(command_buffer, mesh.vertex_count, mesh.vertex_start);
                }
            }
        }

        if let Some(overlay) = overlay {
            overlay.record(device, command_buffer, image)?;
        }

        device.cmd_end_render_pass(command_buffer);
        device.end_command_buffer(command_buffer)
    }

    /// Write the camera block of one swap chain image
    pub fn write_camera_uniform(&self, image: usize, camera: &CameraUniform) -> VulkanResult<()> {
        self.camera_buffers
            .get(image)
            .ok_or(VulkanError::ResourceNotFound { id: image as u64 })?
            .write(bytemuck::bytes_of(camera))
    }

    /// Write every node's world transform for one swap chain image
    pub fn write_node_uniforms(&self, image: usize) -> VulkanResult<()> {
        for (node_id, world) in self.world_transforms.iter().enumerate() {
            let buffer = self
                .node_buffers
                .get(node_id)
                .and_then(|per_image| per_image.get(image))
                .ok_or(VulkanError::ResourceNotFound { id: image as u64 })?;
            buffer.write(bytemuck::bytes_of(&NodeUniform::from_world(world)))?;
        }
        Ok(())
    }

    /// Replace a node's local transform; its subtree picks the change up on
    /// the next [`write_node_uniforms`](Self::write_node_uniforms)
    pub fn set_node_transform(&mut self, node_id: usize, transform: Mat4) -> VulkanResult<()> {
        if !self.nodes.set_local_transform(node_id, transform) {
            return Err(VulkanError::ResourceNotFound { id: node_id as u64 });
        }
        self.world_transforms = self.nodes.world_transforms();
        Ok(())
    }

    /// First half of a resize: release everything sized by the image count
    pub fn on_frame_size_change_start(&mut self) {
        self.free_command_buffers();
        self.free_descriptor_sets();
        self.destroy_descriptor_pool();
        self.destroy_uniform_buffers();
        log::debug!("Graph released per-image resources");
    }

    /// Second half of a resize: rebuild per-image resources and re-record
    pub fn on_frame_size_change_end(
        &mut self,
        image_count: usize,
        targets: &RenderTargets<'_>,
        overlay: Option<&mut dyn UiOverlay>,
    ) -> VulkanResult<()> {
        if targets.image_count() != image_count {
            return Err(VulkanError::InvalidOperation {
                reason: format!("{} framebuffers for {image_count} images", targets.image_count()),
            });
        }
        self.image_count = image_count;
        self.create_uniform_buffers()?;
        self.create_descriptor_sets()?;
        self.create_render_command_buffers(targets, overlay)?;
        log::debug!("Graph rebuilt for {} images", image_count);
        Ok(())
    }

    fn free_command_buffers(&mut self) {
        if !self.command_buffers.is_empty() {
            self.device.free_command_buffers(self.command_pool, &self.command_buffers);
            self.command_buffers.clear();
        }
    }

    fn free_descriptor_sets(&mut self) {
        let sets: Vec<vk::DescriptorSet> = self
            .descriptor_sets_per_mesh
            .drain(..)
            .flatten()
            .chain(self.camera_descriptor_sets.drain(..))
            .collect();
        if !sets.is_empty() && self.descriptor_pool != vk::DescriptorPool::null() {
            if let Err(e) = self.device.free_descriptor_sets(self.descriptor_pool, &sets) {
                log::warn!("Failed to free {} descriptor sets: {}", sets.len(), e);
            }
        }
    }

    fn destroy_descriptor_pool(&mut self) {
        if self.descriptor_pool != vk::DescriptorPool::null() {
            self.device.destroy_descriptor_pool(self.descriptor_pool);
            self.descriptor_pool = vk::DescriptorPool::null();
        }
    }

    fn destroy_uniform_buffers(&mut self) {
        for mut buffer in self.node_buffers.drain(..).flatten() {
            buffer.destroy();
        }
        for mut buffer in self.camera_buffers.drain(..) {
            buffer.destroy();
        }
    }

    /// Release everything in reverse construction order; later calls do nothing
    pub fn destroy(&mut self) {
        self.free_command_buffers();
        self.free_descriptor_sets();
        self.destroy_descriptor_pool();
        if self.descriptor_set_layout != vk::DescriptorSetLayout::null() {
            self.device.destroy_descriptor_set_layout(self.descriptor_set_layout);
            self.descriptor_set_layout = vk::DescriptorSetLayout::null();
        }
        self.destroy_uniform_buffers();
        if let Some(mut buffer) = self.index_buffer.take() {
            buffer.destroy();
        }
        if let Some(mut buffer) = self.vertex_buffer.take() {
            buffer.destroy();
        }
        self.textures.destroy();
        self.nodes.clear();
        self.world_transforms.clear();
        self.meshes.clear();
    }

    /// Descriptor layout the scene pipeline is built against
    pub fn descriptor_set_layout(&self) -> vk::DescriptorSetLayout {
        self.descriptor_set_layout
    }

    /// Per-mesh descriptor sets, one per swap chain image
    pub fn descriptor_sets_per_mesh(&self) -> &[Vec<vk::DescriptorSet>] {
        &self.descriptor_sets_per_mesh
    }

    /// Camera descriptor set of every swap chain image
    pub fn camera_descriptor_sets(&self) -> &[vk::DescriptorSet] {
        &self.camera_descriptor_sets
    }

    /// Recorded command buffer of one swap chain image
    pub fn command_buffer(&self, image: usize) -> Option<vk::CommandBuffer> {
        self.command_buffers.get(image).copied()
    }

    /// Number of recorded command buffers
    pub fn command_buffer_count(&self) -> usize {
        self.command_buffers.len()
    }

    /// Swap chain image count the per-image resources are sized for
    pub fn image_count(&self) -> usize {
        self.image_count
    }

    /// Draw records
    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    /// Node hierarchy
    pub fn nodes(&self) -> &NodeTree {
        &self.nodes
    }

    /// Cached world transform of a node
    pub fn world_transform(&self, node_id: usize) -> Option<Mat4> {
        self.world_transforms.get(node_id).copied()
    }

    /// Loaded textures, placeholder included
    pub fn textures(&self) -> &TextureSet {
        &self.textures
    }

    /// Total vertices in the shared vertex buffer
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Total indices in the shared index buffer
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Shared vertex buffer, absent for an empty graph
    pub fn vertex_buffer(&self) -> Option<&Buffer> {
        self.vertex_buffer.as_ref()
    }

    /// Shared index buffer, absent when no mesh is indexed
    pub fn index_buffer(&self) -> Option<&Buffer> {
        self.index_buffer.as_ref()
    }

    /// Camera uniform buffers, one per swap chain image
    pub fn camera_buffers(&self) -> &[Buffer] {
        &self.camera_buffers
    }

    /// Node uniform buffers of one node, one per swap chain image
    pub fn node_buffers(&self, node_id: usize) -> Option<&[Buffer]> {
        self.node_buffers.get(node_id).map(Vec::as_slice)
    }
}

impl Drop for Graph {
    fn drop(&mut self) {
        self.destroy();
    }
}
