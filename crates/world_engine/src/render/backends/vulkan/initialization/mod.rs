//! Instance, physical device selection and logical device bootstrap

pub mod context;

pub use context::*;
