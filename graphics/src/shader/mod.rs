//! Shader compilation environment configuration.
//!
//! The shader compiler itself is external. This module only decides which
//! preprocessor defines a pipeline needs and hands them to whatever
//! [`ShaderEnvironment`] the compiler exposes.
//!
//! # Example
//!
//! ```ignore
//! use vellum_graphics::shader::{DefineSet, VertexAttributeMode, configure_environment};
//!
//! let mut defines = DefineSet::new();
//! configure_environment(
//!     &mut defines,
//!     VertexAttributeMode::PositionOnly,
//!     Some(&|env| env.set_define("ALPHA_TEST", "1")),
//! );
//! ```

use std::collections::BTreeMap;

/// Which vertex attribute streams a pipeline reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttributeMode {
    /// Every attribute stream: positions, normals, tangents, colors and UVs.
    Full,
    /// Positions only (depth prepass, shadow maps).
    PositionOnly,
}

impl VertexAttributeMode {
    /// Every mode, in declaration order.
    pub const ALL: [VertexAttributeMode; 2] =
        [VertexAttributeMode::Full, VertexAttributeMode::PositionOnly];

    /// Preprocessor define selecting this mode in shader source.
    pub fn define_name(self) -> &'static str {
        match self {
            VertexAttributeMode::Full => "VERTEX_ATTRIBUTES_FULL",
            VertexAttributeMode::PositionOnly => "VERTEX_ATTRIBUTES_POSITION_ONLY",
        }
    }
}

/// Preprocessor environment of a shader compilation.
pub trait ShaderEnvironment {
    /// Define `name` with `value`. An empty value defines a flag.
    fn set_define(&mut self, name: &str, value: &str);
}

/// Set the defines for `mode`, then run the caller's hook.
///
/// The hook runs last so it may override anything set here.
pub fn configure_environment(
    env: &mut dyn ShaderEnvironment,
    mode: VertexAttributeMode,
    hook: Option<&dyn Fn(&mut dyn ShaderEnvironment)>,
) {
    env.set_define(mode.define_name(), "1");
    if let Some(hook) = hook {
        hook(env);
    }
}

/// In-memory [`ShaderEnvironment`], ordered by define name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefineSet {
    defines: BTreeMap<String, String>,
}

impl DefineSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `name`, if defined.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.defines.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defines.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.defines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defines.is_empty()
    }

    /// `(name, value)` pairs in name order, as compilers take them.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.defines
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl ShaderEnvironment for DefineSet {
    fn set_define(&mut self, name: &str, value: &str) {
        log::trace!("Shader define {name}={value}");
        self.defines.insert(name.to_string(), value.to_string());
    }
}
