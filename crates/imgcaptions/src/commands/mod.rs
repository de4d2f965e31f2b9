//! CLI command implementations.

pub(crate) mod patterns;
pub(crate) mod render;

pub(crate) use patterns::PatternsArgs;
pub(crate) use render::RenderArgs;
