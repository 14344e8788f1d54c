//! Scene data and the graph that draws it
//!
//! ## Architecture
//!
//! ```text
//! GraphSource (meshes or glTF model)
//!      ↓
//! Graph: NodeTree + Mesh records + TextureSet
//!      ↓
//! Per-image uniforms, descriptor sets, command buffers
//! ```

mod graph;
mod mesh;
mod node;
mod uniforms;

pub use graph::{Graph, GraphSource, MeshInput};
pub use mesh::{Mesh, MeshConstantData, MeshTextures, PLACEHOLDER_TEXTURE};
pub use node::{Node, NodeTree};
pub use uniforms::{CameraUniform, NodeUniform};
