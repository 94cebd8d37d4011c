// Shader module loading
//
// Vulkan consumes SPIR-V words. Files are read whole and decoded with
// ash's reader, which handles alignment and byte order for us.

use anyhow::{Context, Result};
use ash::vk;
use std::fs::File;
use std::path::Path;

/// Read a precompiled SPIR-V binary into 32-bit words
pub fn read_shader_file<P: AsRef<Path>>(path: P) -> Result<Vec<u32>> {
    let path = path.as_ref();
    let mut file = File::open(path)
        .with_context(|| format!("Failed to open a file: {}", path.display()))?;

    ash::util::read_spv(&mut file)
        .with_context(|| format!("Invalid SPIR-V in {}", path.display()))
}

/// Shader module destroyed when it goes out of scope
pub struct ShaderModule<'a> {
    device: &'a ash::Device,
    pub module: vk::ShaderModule,
}

impl<'a> ShaderModule<'a> {
    pub fn new(device: &'a ash::Device, code: &[u32]) -> Result<Self> {
        let create_info = vk::ShaderModuleCreateInfo::builder().code(code);

        let module = unsafe { device.create_shader_module(&create_info, None) }
            .context("Failed to create shader module")?;

        Ok(Self { device, module })
    }

    pub fn from_file<P: AsRef<Path>>(device: &'a ash::Device, path: P) -> Result<Self> {
        let code = read_shader_file(&path)?;
        log::debug!("Loaded {} SPIR-V words from {}", code.len(), path.as_ref().display());
        Self::new(device, &code)
    }
}

impl Drop for ShaderModule<'_> {
    fn drop(&mut self) {
        unsafe { self.device.destroy_shader_module(self.module, None) };
    }
}
