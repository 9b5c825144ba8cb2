//! Materials with feature-level requirements and fallbacks

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

use crate::caps::registry::CapabilityRegistry;
use crate::caps::resolver::{self, FallbackChain};
use crate::error::{CapsError, CapsResult};

/// Index of a material inside a [`MaterialLibrary`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(pub usize);

/// Surface description plus the hardware it needs.
///
/// A material with a feature level is only used when the system supports
/// that level; otherwise its fallback is tried.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub base_color: Vec4,
    pub lighting: bool,
    pub transparent: bool,

    /// Shader sources (None means fixed function)
    pub vertex_shader: Option<String>,
    pub fragment_shader: Option<String>,

    /// Name of the feature level this material requires
    pub feature_level: Option<String>,
    fallback: Option<MaterialId>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            base_color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            lighting: true,
            transparent: false,
            vertex_shader: None,
            fragment_shader: None,
            feature_level: None,
            fallback: None,
        }
    }
}

impl Material {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_base_color(mut self, color: Vec4) -> Self {
        self.base_color = color;
        self
    }

    pub fn with_lighting(mut self, lighting: bool) -> Self {
        self.lighting = lighting;
        self
    }

    pub fn with_shaders(mut self, vertex: &str, fragment: &str) -> Self {
        self.vertex_shader = Some(vertex.to_string());
        self.fragment_shader = Some(fragment.to_string());
        self
    }

    pub fn with_feature_level(mut self, level: &str) -> Self {
        self.feature_level = Some(level.to_string());
        self
    }

    /// Fallback material, set through [`MaterialLibrary::set_fallback`]
    pub fn fallback(&self) -> Option<MaterialId> {
        self.fallback
    }

    pub fn uses_shaders(&self) -> bool {
        self.vertex_shader.is_some() || self.fragment_shader.is_some()
    }

    /// Create a uniform data struct for GPU
    pub fn uniform_data(&self) -> MaterialUniformData {
        MaterialUniformData {
            base_color: self.base_color,
            flags: [
                self.lighting as u32,
                self.transparent as u32,
                self.uses_shaders() as u32,
                0,
            ],
        }
    }

    // Preset materials

    pub fn unlit(color: Vec3) -> Self {
        Self::new("unlit")
            .with_base_color(color.extend(1.0))
            .with_lighting(false)
    }

    pub fn glass() -> Self {
        let mut material = Self::new("glass").with_base_color(Vec4::new(1.0, 1.0, 1.0, 0.3));
        material.transparent = true;
        material
    }
}

/// Material uniform data for GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MaterialUniformData {
    pub base_color: Vec4,
    pub flags: [u32; 4], // x=lighting, y=transparent, z=shaded, w=padding
}

/// Arena of materials linked into fallback chains.
#[derive(Debug, Default)]
pub struct MaterialLibrary {
    materials: Vec<Material>,
    by_name: HashMap<String, MaterialId>,
}

impl MaterialLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a material; a later material with the same name shadows the
    /// earlier one for [`id`](Self::id) lookups.
    pub fn add(&mut self, material: Material) -> MaterialId {
        let id = MaterialId(self.materials.len());
        self.by_name.insert(material.name.clone(), id);
        self.materials.push(material);
        id
    }

    pub fn id(&self, name: &str) -> Option<MaterialId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    fn checked(&self, id: MaterialId) -> CapsResult<&Material> {
        self.get(id).ok_or(CapsError::UnknownMaterial(id.0))
    }

    /// Link `id` to `fallback`, or clear the link with `None`.
    ///
    /// Fails when either material is unknown or the link would close a loop.
    pub fn set_fallback(&mut self, id: MaterialId, fallback: Option<MaterialId>) -> CapsResult<()> {
        self.checked(id)?;
        if let Some(target) = fallback {
            self.checked(target)?;

            let mut next = Some(target);
            while let Some(current) = next {
                if current == id {
                    return Err(CapsError::FallbackCycle {
                        from: self.materials[id.0].name.clone(),
                        to: self.materials[target.0].name.clone(),
                    });
                }
                next = self.materials[current.0].fallback;
            }
        }

        self.materials[id.0].fallback = fallback;
        Ok(())
    }

    /// The first material in `id`'s chain the system can render
    pub fn resolve(&self, id: MaterialId, registry: &CapabilityRegistry) -> Option<MaterialId> {
        self.get(id)?;
        resolver::resolve(self, id, registry)
    }
}

impl FallbackChain for MaterialLibrary {
    type Id = MaterialId;

    fn name(&self, id: MaterialId) -> &str {
        self.get(id).map_or("<unknown>", |material| material.name.as_str())
    }

    fn feature_level(&self, id: MaterialId) -> Option<&str> {
        self.get(id)?.feature_level.as_deref()
    }

    fn fallback(&self, id: MaterialId) -> Option<MaterialId> {
        self.get(id)?.fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> (MaterialLibrary, MaterialId, MaterialId, MaterialId) {
        let mut library = MaterialLibrary::new();
        let a = library.add(Material::new("a"));
        let b = library.add(Material::new("b"));
        let c = library.add(Material::new("c"));
        (library, a, b, c)
    }

    #[test]
    fn test_lookup_by_name() {
        let (library, a, _, c) = library();
        assert_eq!(library.id("a"), Some(a));
        assert_eq!(library.id("c"), Some(c));
        assert_eq!(library.id("missing"), None);
        assert_eq!(library.len(), 3);
    }

    #[test]
    fn test_chain_links() {
        let (mut library, a, b, c) = library();
        library.set_fallback(a, Some(b)).unwrap();
        library.set_fallback(b, Some(c)).unwrap();
        assert_eq!(library.get(a).unwrap().fallback(), Some(b));
        assert_eq!(FallbackChain::fallback(&library, b), Some(c));

        library.set_fallback(a, None).unwrap();
        assert_eq!(library.get(a).unwrap().fallback(), None);
    }

    #[test]
    fn test_cycle_rejected() {
        let (mut library, a, b, c) = library();
        library.set_fallback(a, Some(b)).unwrap();
        library.set_fallback(b, Some(c)).unwrap();

        let err = library.set_fallback(c, Some(a)).unwrap_err();
        assert!(matches!(
            err,
            CapsError::FallbackCycle { ref from, ref to } if from == "c" && to == "a"
        ));
        assert!(library.set_fallback(a, Some(a)).is_err());
        assert_eq!(library.get(c).unwrap().fallback(), None);
    }

    #[test]
    fn test_unknown_material() {
        let (mut library, a, _, _) = library();
        assert!(matches!(
            library.set_fallback(a, Some(MaterialId(42))),
            Err(CapsError::UnknownMaterial(42))
        ));
    }

    #[test]
    fn test_uniform_flags() {
        let data = Material::unlit(Vec3::ONE)
            .with_shaders("vs", "fs")
            .uniform_data();
        assert_eq!(data.flags, [0, 0, 1, 0]);
        assert_eq!(Material::glass().uniform_data().flags, [1, 1, 0, 0]);
        assert_eq!(std::mem::size_of::<MaterialUniformData>(), 32);
    }

    #[test]
    fn test_glass_fallback_uniforms() {
        use crate::caps::feature_level::SystemFeatureLevel;
        use crate::{GatherStrategy, RegistryConfig};

        let registry = CapabilityRegistry::without_gpu(RegistryConfig {
            gather: GatherStrategy::Defaults,
            log_report: false,
            ..Default::default()
        });
        registry.set_feature_level("gl45", SystemFeatureLevel::new().with_gl_version(4.5));

        let mut library = MaterialLibrary::new();
        let glass = library.add(Material::glass());
        let mut refractive = Material::new("refractive")
            .with_shaders("vs", "fs")
            .with_feature_level("gl45");
        refractive.transparent = true;
        let refractive = library.add(refractive);
        library.set_fallback(refractive, Some(glass)).unwrap();

        let resolved = library.resolve(refractive, &registry).unwrap();
        assert_eq!(resolved, glass);
        let data = library.get(resolved).unwrap().uniform_data();
        assert_eq!(data.flags, [1, 1, 0, 0]);
        assert_eq!(data.base_color.w, 0.3);
        assert_eq!(bytemuck::bytes_of(&data).len(), 32);
    }
}
