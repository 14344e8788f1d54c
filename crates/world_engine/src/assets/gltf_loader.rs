//! glTF 2.0 model import
//!
//! Flattens the default scene into a node list (parents before children), one
//! mesh record per primitive, and one decoded image per glTF texture. Texture
//! slot `t + 1` refers to glTF texture `t`; slot 0 is left for the placeholder.

use std::path::Path;

use crate::assets::{AssetError, AssetResult, ImageData};
use crate::foundation::math::{mat4_from_columns, Mat4, Transform};
use crate::render::Vertex;
use crate::scene::MeshTextures;

/// Node of an imported model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelNode {
    /// Index of the parent in [`ModelData::nodes`]
    pub parent: Option<usize>,
    /// Transform relative to the parent
    pub local_transform: Mat4,
    /// Meshes owned by this node
    pub mesh_ids: Vec<usize>,
}

/// Geometry of one primitive
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMesh {
    /// Owning node
    pub node_id: usize,
    /// Vertices of the primitive
    pub vertices: Vec<Vertex>,
    /// Indices widened to u32, empty for non-indexed primitives
    pub indices: Vec<u32>,
    /// Material texture slots
    pub textures: MeshTextures,
}

/// Imported model ready for the scene graph
#[derive(Debug, Clone, Default)]
pub struct ModelData {
    /// Nodes, every parent before its children
    pub nodes: Vec<ModelNode>,
    /// One record per primitive
    pub meshes: Vec<ModelMesh>,
    /// Decoded image of each glTF texture
    pub textures: Vec<ImageData>,
}

/// Load a `.gltf` or `.glb` file
pub fn load_model(path: impl AsRef<Path>) -> AssetResult<ModelData> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if extension != "gltf" && extension != "glb" {
        return Err(AssetError::UnsupportedModel(path.display().to_string()));
    }

    let (document, buffers, images) = gltf::import(path)?;
    let model = ModelData::from_gltf(&document, &buffers, &images, &path.display().to_string())?;

    log::info!(
        "Loaded glTF model {:?}: {} nodes, {} meshes, {} textures",
        path,
        model.nodes.len(),
        model.meshes.len(),
        model.textures.len()
    );
    Ok(model)
}

impl ModelData {
    /// Convert an imported document. `source` names the model in errors.
    pub fn from_gltf(
        document: &gltf::Document,
        buffers: &[gltf::buffer::Data],
        images: &[gltf::image::Data],
        source: &str,
    ) -> AssetResult<Self> {
        let mut model = Self {
            textures: document
                .textures()
                .map(|texture| {
                    images
                        .get(texture.source().index())
                        .map(image_data)
                        .ok_or_else(|| AssetError::Gltf(format!("texture {} has no image", texture.index())))
                })
                .collect::<AssetResult<Vec<_>>>()?,
            ..Self::default()
        };
        log::debug!("glTF textures loaded: {}", model.textures.len());

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or_else(|| AssetError::Gltf(format!("{source} has no scene")))?;

        for node in scene.nodes() {
            model.load_node(&node, None, buffers, source)?;
        }
        Ok(model)
    }

    fn load_node(
        &mut self,
        node: &gltf::Node,
        parent: Option<usize>,
        buffers: &[gltf::buffer::Data],
        source: &str,
    ) -> AssetResult<()> {
        let node_id = self.nodes.len();
        self.nodes.push(ModelNode {
            parent,
            local_transform: local_transform(node.transform()),
            mesh_ids: Vec::new(),
        });

        if let Some(mesh) = node.mesh() {
            for primitive in mesh.primitives() {
                let mesh_id = self.meshes.len();
                let record = load_primitive(&primitive, node_id, buffers, source)?;
                self.meshes.push(record);
                self.nodes[node_id].mesh_ids.push(mesh_id);
            }
        }

        for child in node.children() {
            self.load_node(&child, Some(node_id), buffers, source)?;
        }
        Ok(())
    }
}

fn local_transform(transform: gltf::scene::Transform) -> Mat4 {
    match transform {
        gltf::scene::Transform::Matrix { matrix } => mat4_from_columns(matrix),
        gltf::scene::Transform::Decomposed {
            translation,
            rotation,
            scale,
        } => Transform::from_trs(translation, rotation, scale).to_matrix(),
    }
}

fn load_primitive(
    primitive: &gltf::Primitive,
    node_id: usize,
    buffers: &[gltf::buffer::Data],
    source: &str,
) -> AssetResult<ModelMesh> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or_else(|| AssetError::MissingPositions(source.to_string()))?
        .collect();
    let mut normals = reader.read_normals();
    let mut tangents = reader.read_tangents();
    let mut tex_coords = reader.read_tex_coords(0).map(|t| t.into_f32());
    let mut colors = reader.read_colors(0).map(|c| c.into_rgba_f32());

    let vertices: Vec<Vertex> = positions
        .into_iter()
        .map(|position| Vertex {
            position,
            normal: normals.as_mut().and_then(Iterator::next).map_or([0.0; 3], normalize),
            tangent: tangents.as_mut().and_then(Iterator::next).unwrap_or([0.0; 4]),
            tex_coord: tex_coords.as_mut().and_then(Iterator::next).unwrap_or([0.0; 2]),
            color: colors.as_mut().and_then(Iterator::next).unwrap_or([0.0; 4]),
        })
        .collect();

    let indices = match primitive.indices() {
        Some(accessor) => {
            if !matches!(
                accessor.data_type(),
                gltf::accessor::DataType::U8 | gltf::accessor::DataType::U16 | gltf::accessor::DataType::U32
            ) {
                return Err(AssetError::UnsupportedIndexType(source.to_string()));
            }
            reader
                .read_indices()
                .map(|indices| indices.into_u32().collect())
                .unwrap_or_default()
        }
        None => Vec::new(),
    };
    if let Some(&index) = indices.iter().find(|&&index| index as usize >= vertices.len()) {
        return Err(AssetError::IndexOutOfRange {
            source_name: source.to_string(),
            index,
            vertex_count: vertices.len(),
        });
    }

    Ok(ModelMesh {
        node_id,
        vertices,
        indices,
        textures: material_textures(&primitive.material()),
    })
}

fn material_textures(material: &gltf::Material) -> MeshTextures {
    let slot = |index: Option<usize>| index.and_then(|i| u32::try_from(i + 1).ok()).unwrap_or(0);
    let pbr = material.pbr_metallic_roughness();
    MeshTextures {
        base: slot(pbr.base_color_texture().map(|info| info.texture().index())),
        rough: slot(pbr.metallic_roughness_texture().map(|info| info.texture().index())),
        normal: slot(material.normal_texture().map(|info| info.texture().index())),
        occlusion: slot(material.occlusion_texture().map(|info| info.texture().index())),
        emissive: slot(material.emissive_texture().map(|info| info.texture().index())),
    }
}

fn normalize(normal: [f32; 3]) -> [f32; 3] {
    let [x, y, z] = normal;
    let length = (x * x + y * y + z * z).sqrt();
    if length > 0.0 {
        [x / length, y / length, z / length]
    } else {
        [0.0; 3]
    }
}

fn image_data(image: &gltf::image::Data) -> ImageData {
    use gltf::image::Format;

    let (components, bits) = match image.format {
        Format::R8 => (1, 8),
        Format::R8G8 => (2, 8),
        Format::R8G8B8 => (3, 8),
        Format::R8G8B8A8 => (4, 8),
        Format::R16 => (1, 16),
        Format::R16G16 => (2, 16),
        Format::R16G16B16 => (3, 16),
        Format::R16G16B16A16 => (4, 16),
        Format::R32G32B32FLOAT => (3, 32),
        Format::R32G32B32A32FLOAT => (4, 32),
    };
    ImageData {
        pixels: image.pixels.clone(),
        width: image.width,
        height: image.height,
        components,
        bits,
    }
    .widen_rgb()
}
