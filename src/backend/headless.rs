//! Headless backend that records instead of rendering
//!
//! Buffers keep their bytes and every render pass is captured as a list of
//! commands, so engine behavior can be inspected without a GPU.

use crate::backend::traits::*;
use crate::backend::types::*;
use std::collections::HashMap;

/// A command recorded inside a render pass
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    SetPipeline(RenderPipelineHandle),
    SetBindGroup { index: u32, bind_group: BindGroupHandle },
    SetVertexBuffer { slot: u32, buffer: BufferHandle, offset: u64 },
    SetIndexBuffer { buffer: BufferHandle, offset: u64, format: IndexFormat },
    SetViewport { width: f32, height: f32 },
    DrawIndexed { indices: std::ops::Range<u32>, base_vertex: i32, instances: std::ops::Range<u32> },
}

/// A completed render pass
#[derive(Debug, Clone)]
pub struct RecordedPass {
    pub label: Option<String>,
    pub clear_color: Option<[f32; 4]>,
    pub has_depth: bool,
    pub commands: Vec<RecordedCommand>,
}

impl RecordedPass {
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RecordedCommand::DrawIndexed { .. }))
            .count()
    }
}

/// Everything submitted between `begin_frame` and `end_frame`
#[derive(Debug, Clone, Default)]
pub struct RecordedFrame {
    pub passes: Vec<RecordedPass>,
}

#[derive(Debug, Clone)]
struct HeadlessBuffer {
    usage: BufferUsage,
    data: Vec<u8>,
}

/// Backend without a device or surface
pub struct HeadlessBackend {
    width: u32,
    height: u32,
    format: TextureFormat,
    buffers: HashMap<u64, HeadlessBuffer>,
    textures: HashMap<u64, TextureDescriptor>,
    pipelines: HashMap<u64, RenderPipelineDescriptor>,
    next_id: u64,
    current_frame: Option<RecordedFrame>,
    current_pass: Option<RecordedPass>,
    frames: Vec<RecordedFrame>,
}

impl HeadlessBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            format: TextureFormat::Bgra8UnormSrgb,
            buffers: HashMap::new(),
            textures: HashMap::new(),
            pipelines: HashMap::new(),
            next_id: 1,
            current_frame: None,
            current_pass: None,
            frames: Vec::new(),
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Contents of a live buffer
    pub fn buffer_data(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&buffer.0).map(|b| b.data.as_slice())
    }

    pub fn buffer_usage(&self, buffer: BufferHandle) -> Option<BufferUsage> {
        self.buffers.get(&buffer.0).map(|b| b.usage)
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn texture(&self, texture: TextureHandle) -> Option<&TextureDescriptor> {
        self.textures.get(&texture.0)
    }

    pub fn pipeline(&self, pipeline: RenderPipelineHandle) -> Option<&RenderPipelineDescriptor> {
        self.pipelines.get(&pipeline.0)
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    /// Frames completed so far, oldest first
    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&RecordedFrame> {
        self.frames.last()
    }

    fn record(&mut self, command: RecordedCommand) {
        match self.current_pass.as_mut() {
            Some(pass) => pass.commands.push(command),
            None => log::warn!("Command {:?} recorded outside a render pass", command),
        }
    }
}

impl GraphicsBackend for HeadlessBackend {
    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.width = width;
            self.height = height;
        }
    }

    fn surface_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn begin_frame(&mut self) -> BackendResult<FrameContext> {
        self.current_frame = Some(RecordedFrame::default());
        let view = self.next_id();
        Ok(FrameContext {
            swapchain_view: TextureViewHandle(view),
            width: self.width,
            height: self.height,
        })
    }

    fn end_frame(&mut self) -> BackendResult<()> {
        if let Some(frame) = self.current_frame.take() {
            self.frames.push(frame);
        }
        Ok(())
    }

    fn swapchain_format(&self) -> TextureFormat {
        self.format
    }

    fn create_buffer(&mut self, desc: &BufferDescriptor) -> BackendResult<BufferHandle> {
        let size = usize::try_from(desc.size)
            .map_err(|_| BackendError::BufferCreationFailed(format!("size {} too large", desc.size)))?;
        let id = self.next_id();
        self.buffers.insert(
            id,
            HeadlessBuffer {
                usage: desc.usage,
                data: vec![0; size],
            },
        );
        Ok(BufferHandle(id))
    }

    fn create_buffer_init(
        &mut self,
        desc: &BufferDescriptor,
        data: &[u8],
    ) -> BackendResult<BufferHandle> {
        let id = self.next_id();
        self.buffers.insert(
            id,
            HeadlessBuffer {
                usage: desc.usage,
                data: data.to_vec(),
            },
        );
        Ok(BufferHandle(id))
    }

    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) {
        let Some(buf) = self.buffers.get_mut(&buffer.0) else {
            log::warn!("write_buffer on unknown buffer {:?}", buffer);
            return;
        };
        let start = offset as usize;
        let end = start + data.len();
        if end > buf.data.len() {
            log::warn!(
                "write_buffer overruns buffer {:?} ({} > {})",
                buffer,
                end,
                buf.data.len()
            );
            return;
        }
        buf.data[start..end].copy_from_slice(data);
    }

    fn create_texture(&mut self, desc: &TextureDescriptor) -> BackendResult<TextureHandle> {
        let id = self.next_id();
        self.textures.insert(id, desc.clone());
        Ok(TextureHandle(id))
    }

    fn create_texture_view(&mut self, texture: TextureHandle) -> BackendResult<TextureViewHandle> {
        if !self.textures.contains_key(&texture.0) {
            return Err(BackendError::TextureCreationFailed("Texture not found".into()));
        }
        Ok(TextureViewHandle(self.next_id()))
    }

    fn create_bind_group_layout(
        &mut self,
        _entries: &[BindGroupLayoutEntry],
    ) -> BackendResult<BindGroupLayoutHandle> {
        Ok(BindGroupLayoutHandle(self.next_id()))
    }

    fn create_bind_group(
        &mut self,
        _layout: BindGroupLayoutHandle,
        entries: &[(u32, BindGroupEntry)],
    ) -> BackendResult<BindGroupHandle> {
        for (_, BindGroupEntry::Buffer { buffer, .. }) in entries {
            if !self.buffers.contains_key(&buffer.0) {
                return Err(BackendError::PipelineCreationFailed(format!(
                    "Buffer {:?} not found",
                    buffer
                )));
            }
        }
        Ok(BindGroupHandle(self.next_id()))
    }

    fn create_render_pipeline(
        &mut self,
        desc: &RenderPipelineDescriptor,
    ) -> BackendResult<RenderPipelineHandle> {
        if !desc.shader.contains("fn vs_main") || !desc.shader.contains("fn fs_main") {
            return Err(BackendError::PipelineCreationFailed(
                "shader lacks vs_main or fs_main".into(),
            ));
        }
        let id = self.next_id();
        self.pipelines.insert(id, desc.clone());
        Ok(RenderPipelineHandle(id))
    }

    fn begin_render_pass(&mut self, desc: &RenderPassDescriptor) {
        let clear_color = desc.color_attachments.first().and_then(|att| match att.load_op {
            LoadOp::Clear(color) => Some(color),
            LoadOp::Load => None,
        });
        self.current_pass = Some(RecordedPass {
            label: desc.label.clone(),
            clear_color,
            has_depth: desc.depth_stencil_attachment.is_some(),
            commands: Vec::new(),
        });
    }

    fn end_render_pass(&mut self) {
        let Some(pass) = self.current_pass.take() else {
            return;
        };
        match self.current_frame.as_mut() {
            Some(frame) => frame.passes.push(pass),
            None => log::warn!("end_render_pass called outside a frame"),
        }
    }

    fn set_render_pipeline(&mut self, pipeline: RenderPipelineHandle) {
        self.record(RecordedCommand::SetPipeline(pipeline));
    }

    fn set_bind_group(&mut self, index: u32, bind_group: BindGroupHandle) {
        self.record(RecordedCommand::SetBindGroup { index, bind_group });
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferHandle, offset: u64) {
        self.record(RecordedCommand::SetVertexBuffer { slot, buffer, offset });
    }

    fn set_index_buffer(&mut self, buffer: BufferHandle, offset: u64, format: IndexFormat) {
        self.record(RecordedCommand::SetIndexBuffer { buffer, offset, format });
    }

    fn set_viewport(&mut self, _x: f32, _y: f32, width: f32, height: f32, _min_depth: f32, _max_depth: f32) {
        self.record(RecordedCommand::SetViewport { width, height });
    }

    fn draw_indexed(
        &mut self,
        indices: std::ops::Range<u32>,
        base_vertex: i32,
        instances: std::ops::Range<u32>,
    ) {
        self.record(RecordedCommand::DrawIndexed { indices, base_vertex, instances });
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(&buffer.0);
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(&texture.0);
    }
}
