// Graphics pipeline setup
//
// Loads the shader pair and describes the fixed-function stages for the
// swapchain extent. There is no render pass yet, so the description is
// dropped (and the shader modules destroyed) before a pipeline object
// would be created.

use anyhow::Result;
use ash::vk;
use std::path::Path;

use super::shader::ShaderModule;
use super::VulkanDevice;

/// Fixed-function state that doesn't depend on any GPU object
#[derive(Debug, Clone, Copy)]
pub struct FixedFunctionState {
    pub topology: vk::PrimitiveTopology,
    pub viewport: vk::Viewport,
    pub scissor: vk::Rect2D,
    pub polygon_mode: vk::PolygonMode,
    pub cull_mode: vk::CullModeFlags,
    pub front_face: vk::FrontFace,
    pub line_width: f32,
}

impl FixedFunctionState {
    /// Full-extent viewport, filled back-face-culled triangles, clockwise front
    pub fn for_extent(extent: vk::Extent2D) -> Self {
        Self {
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            viewport: vk::Viewport {
                x: 0.0,
                y: 0.0,
                width: extent.width as f32,
                height: extent.height as f32,
                min_depth: 0.0,
                max_depth: 1.0,
            },
            scissor: vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            },
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: vk::CullModeFlags::BACK,
            front_face: vk::FrontFace::CLOCKWISE,
            line_width: 1.0,
        }
    }
}

/// Build every stage description up to the point a pipeline would be created.
///
/// Shader modules live only for the duration of this call.
pub fn prepare_graphics_pipeline(
    device: &VulkanDevice,
    extent: vk::Extent2D,
    vertex_path: &Path,
    fragment_path: &Path,
) -> Result<()> {
    let vertex_shader = ShaderModule::from_file(device.device(), vertex_path)?;
    let fragment_shader = ShaderModule::from_file(device.device(), fragment_path)?;

    let entry_point = c"main";

    let vert_stage = vk::PipelineShaderStageCreateInfo::builder()
        .stage(vk::ShaderStageFlags::VERTEX)
        .module(vertex_shader.module)
        .name(entry_point)
        .build();

    let frag_stage = vk::PipelineShaderStageCreateInfo::builder()
        .stage(vk::ShaderStageFlags::FRAGMENT)
        .module(fragment_shader.module)
        .name(entry_point)
        .build();

    let shader_stages = [vert_stage, frag_stage];

    let state = FixedFunctionState::for_extent(extent);

    // Vertices come from the shader itself, no buffers bound
    let vertex_input_info = vk::PipelineVertexInputStateCreateInfo::builder();

    let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder()
        .topology(state.topology)
        .primitive_restart_enable(false);

    let viewports = [state.viewport];
    let scissors = [state.scissor];
    let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
        .viewports(&viewports)
        .scissors(&scissors);

    let rasterizer = vk::PipelineRasterizationStateCreateInfo::builder()
        .depth_clamp_enable(false)
        .rasterizer_discard_enable(false)
        .polygon_mode(state.polygon_mode)
        .line_width(state.line_width)
        .cull_mode(state.cull_mode)
        .front_face(state.front_face);

    log::info!(
        "Pipeline state prepared: {} shader stages, {} vertex bindings, {:?}, {} viewport(s), {:?}/{:?}",
        shader_stages.len(),
        vertex_input_info.vertex_binding_description_count,
        input_assembly.topology,
        viewport_state.viewport_count,
        rasterizer.cull_mode,
        rasterizer.front_face
    );

    // TODO: create the render pass and pipeline layout so these infos can
    // feed vkCreateGraphicsPipelines
    drop(fragment_shader);
    drop(vertex_shader);
    log::debug!("Shader modules destroyed");

    Ok(())
}
