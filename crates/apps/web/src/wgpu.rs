#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Globals {
    pub view_proj: [[f32; 4]; 4],
    pub globe_model: [[f32; 4]; 4],
    pub lines_model: [[f32; 4]; 4],
    /// xyz: direction towards the light, w: ambient intensity.
    pub light_dir: [f32; 4],
    /// x: directional intensity, y: star opacity.
    pub params: [f32; 4],
}

impl Globals {
    pub fn from_view(view: &globe::FrameView, star_opacity: f32) -> Self {
        let l = view.lighting;
        let d = l.direction.as_f32();
        Self {
            view_proj: view.view_proj,
            globe_model: view.globe_model,
            lines_model: view.lines_model,
            light_dir: [d[0], d[1], d[2], l.ambient],
            params: [l.directional, star_opacity, 0.0, 0.0],
        }
    }
}

#[cfg(target_arch = "wasm32")]
mod imp {
    use ::wgpu::util::DeviceExt;
    use std::borrow::Cow;
    use wasm_bindgen::prelude::*;

    use globe::{FrameView, RenderSurface};
    use layers::{BORDER_LAYER, Layer, LineLayer, MapTexture, SELECTION_OUTLINE_LAYER, Starfield};

    use super::Globals;
    use crate::mesh::{
        GlobeVertex, LineVertex, StarVertex, generate_sphere_mesh, line_vertices, star_vertices,
    };

    const SPHERE_SEGMENTS: u32 = 64;
    const DEPTH_FORMAT: ::wgpu::TextureFormat = ::wgpu::TextureFormat::Depth24Plus;

    const GLOBALS_WGSL: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    globe_model: mat4x4<f32>,
    lines_model: mat4x4<f32>,
    light_dir: vec4<f32>,
    params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;
"#;

    const GLOBE_SHADER: &str = r#"
@group(1) @binding(0)
var map_tex: texture_2d<f32>;
@group(1) @binding(1)
var map_sampler: sampler;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) uv: vec2<f32>) -> VsOut {
    let world = globals.globe_model * vec4<f32>(position, 1.0);
    let normal = (globals.globe_model * vec4<f32>(position, 0.0)).xyz;
    return VsOut(globals.view_proj * world, normal, uv);
}

@fragment
fn fs_main(fs_in: VsOut) -> @location(0) vec4<f32> {
    let n = normalize(fs_in.normal);
    let l = normalize(globals.light_dir.xyz);
    let ndotl = max(dot(n, l), 0.0);
    let shade = min(globals.light_dir.w + globals.params.x * ndotl, 1.0);
    let base = textureSample(map_tex, map_sampler, fs_in.uv);
    return vec4<f32>(base.rgb * shade, 1.0);
}
"#;

    const LINES_SHADER: &str = r#"
struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) color: vec4<f32>) -> VsOut {
    let world = globals.lines_model * vec4<f32>(position, 1.0);
    return VsOut(globals.view_proj * world, color);
}

@fragment
fn fs_main(fs_in: VsOut) -> @location(0) vec4<f32> {
    return fs_in.color;
}
"#;

    const STARS_SHADER: &str = r#"
@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return globals.view_proj * vec4<f32>(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 1.0, 1.0, globals.params.y);
}
"#;

    struct MapBinding {
        texture: ::wgpu::Texture,
        bind_group: ::wgpu::BindGroup,
        width: u32,
        height: u32,
    }

    struct LineBuffer {
        buffer: Option<::wgpu::Buffer>,
        count: u32,
    }

    impl LineBuffer {
        fn empty() -> Self {
            Self {
                buffer: None,
                count: 0,
            }
        }

        fn replace(&mut self, device: &::wgpu::Device, label: &str, verts: &[LineVertex]) {
            if let Some(old) = self.buffer.take() {
                old.destroy();
            }
            self.count = verts.len() as u32;
            if verts.is_empty() {
                return;
            }
            self.buffer = Some(
                device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                    label: Some(label),
                    contents: bytemuck::cast_slice(verts),
                    usage: ::wgpu::BufferUsages::VERTEX,
                }),
            );
        }
    }

    /// Browser rendering backend: textured sphere, border and outline line
    /// lists and a point starfield, drawn in one depth-tested pass.
    pub struct WgpuSurface {
        canvas: web_sys::HtmlCanvasElement,
        surface: ::wgpu::Surface<'static>,
        device: ::wgpu::Device,
        queue: ::wgpu::Queue,
        config: ::wgpu::SurfaceConfiguration,
        depth: ::wgpu::Texture,
        depth_view: ::wgpu::TextureView,

        globe_pipeline: ::wgpu::RenderPipeline,
        lines_pipeline: ::wgpu::RenderPipeline,
        stars_pipeline: ::wgpu::RenderPipeline,

        globals_buffer: ::wgpu::Buffer,
        globals_bind_group: ::wgpu::BindGroup,
        map_layout: ::wgpu::BindGroupLayout,
        map_sampler: ::wgpu::Sampler,
        map: Option<MapBinding>,

        sphere_vertices: ::wgpu::Buffer,
        sphere_indices: ::wgpu::Buffer,
        sphere_index_count: u32,
        borders: LineBuffer,
        outline: LineBuffer,
        stars: ::wgpu::Buffer,
        star_count: u32,
        star_opacity: f32,

        released: bool,
        // Dropped last so the surface never outlives it.
        _instance: ::wgpu::Instance,
    }

    fn create_depth(
        device: &::wgpu::Device,
        config: &::wgpu::SurfaceConfiguration,
    ) -> (::wgpu::Texture, ::wgpu::TextureView) {
        let tex = device.create_texture(&::wgpu::TextureDescriptor {
            label: Some("globe-depth"),
            size: ::wgpu::Extent3d {
                width: config.width.max(1),
                height: config.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: ::wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = tex.create_view(&::wgpu::TextureViewDescriptor::default());
        (tex, view)
    }

    fn shader(device: &::wgpu::Device, label: &str, body: &str) -> ::wgpu::ShaderModule {
        let source = format!("{GLOBALS_WGSL}{body}");
        device.create_shader_module(::wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: ::wgpu::ShaderSource::Wgsl(Cow::Owned(source)),
        })
    }

    struct PipelineSpec<'a> {
        label: &'a str,
        module: &'a ::wgpu::ShaderModule,
        layout: &'a ::wgpu::PipelineLayout,
        buffers: &'a [::wgpu::VertexBufferLayout<'a>],
        topology: ::wgpu::PrimitiveTopology,
        blend: ::wgpu::BlendState,
        depth_write: bool,
        depth_compare: ::wgpu::CompareFunction,
        format: ::wgpu::TextureFormat,
    }

    fn pipeline(device: &::wgpu::Device, spec: PipelineSpec<'_>) -> ::wgpu::RenderPipeline {
        device.create_render_pipeline(&::wgpu::RenderPipelineDescriptor {
            label: Some(spec.label),
            layout: Some(spec.layout),
            vertex: ::wgpu::VertexState {
                module: spec.module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: spec.buffers,
            },
            fragment: Some(::wgpu::FragmentState {
                module: spec.module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(::wgpu::ColorTargetState {
                    format: spec.format,
                    blend: Some(spec.blend),
                    write_mask: ::wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: ::wgpu::PrimitiveState {
                topology: spec.topology,
                strip_index_format: None,
                front_face: ::wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: ::wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(::wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: spec.depth_write,
                depth_compare: spec.depth_compare,
                stencil: ::wgpu::StencilState::default(),
                bias: ::wgpu::DepthBiasState::default(),
            }),
            multisample: ::wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }

    impl WgpuSurface {
        pub async fn new(
            canvas: &web_sys::HtmlCanvasElement,
            stars: &Starfield,
        ) -> Result<Self, JsValue> {
            let instance = ::wgpu::Instance::new(&::wgpu::InstanceDescriptor {
                backends: ::wgpu::Backends::BROWSER_WEBGPU | ::wgpu::Backends::GL,
                ..Default::default()
            });

            let surface = instance
                .create_surface(::wgpu::SurfaceTarget::Canvas(canvas.clone()))
                .map_err(|e| JsValue::from_str(&format!("surface error: {e}")))?;

            let adapter = instance
                .request_adapter(&::wgpu::RequestAdapterOptions {
                    power_preference: ::wgpu::PowerPreference::HighPerformance,
                    compatible_surface: Some(&surface),
                    force_fallback_adapter: false,
                })
                .await
                .map_err(|e| JsValue::from_str(&format!("adapter error: {e}")))?;

            let (device, queue) = adapter
                .request_device(&::wgpu::DeviceDescriptor {
                    label: Some("globe-device"),
                    required_features: ::wgpu::Features::empty(),
                    required_limits: ::wgpu::Limits::downlevel_webgl2_defaults(),
                    ..Default::default()
                })
                .await
                .map_err(|e| JsValue::from_str(&format!("device error: {e}")))?;

            let caps = surface.get_capabilities(&adapter);
            let format = caps
                .formats
                .iter()
                .copied()
                .find(|f| f.is_srgb())
                .or_else(|| caps.formats.first().copied())
                .ok_or_else(|| JsValue::from_str("surface reports no formats"))?;
            let alpha_mode = caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(::wgpu::CompositeAlphaMode::Auto);

            let config = ::wgpu::SurfaceConfiguration {
                usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
                format,
                width: canvas.width().max(1),
                height: canvas.height().max(1),
                desired_maximum_frame_latency: 2,
                present_mode: ::wgpu::PresentMode::Fifo,
                alpha_mode,
                view_formats: vec![],
            };
            surface.configure(&device, &config);
            let (depth, depth_view) = create_depth(&device, &config);

            let globals_buffer = device.create_buffer(&::wgpu::BufferDescriptor {
                label: Some("globe-globals"),
                size: std::mem::size_of::<Globals>() as u64,
                usage: ::wgpu::BufferUsages::UNIFORM | ::wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });

            let globals_layout =
                device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
                    label: Some("globe-globals-bgl"),
                    entries: &[::wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: ::wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: ::wgpu::BindingType::Buffer {
                            ty: ::wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    }],
                });

            let globals_bind_group = device.create_bind_group(&::wgpu::BindGroupDescriptor {
                label: Some("globe-globals-bg"),
                layout: &globals_layout,
                entries: &[::wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buffer.as_entire_binding(),
                }],
            });

            let map_layout = device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
                label: Some("globe-map-bgl"),
                entries: &[
                    ::wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: ::wgpu::ShaderStages::FRAGMENT,
                        ty: ::wgpu::BindingType::Texture {
                            sample_type: ::wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: ::wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    ::wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: ::wgpu::ShaderStages::FRAGMENT,
                        ty: ::wgpu::BindingType::Sampler(::wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

            let map_sampler = device.create_sampler(&::wgpu::SamplerDescriptor {
                label: Some("globe-map-sampler"),
                address_mode_u: ::wgpu::AddressMode::Repeat,
                address_mode_v: ::wgpu::AddressMode::ClampToEdge,
                mag_filter: ::wgpu::FilterMode::Linear,
                min_filter: ::wgpu::FilterMode::Linear,
                ..Default::default()
            });

            let globe_layout = device.create_pipeline_layout(&::wgpu::PipelineLayoutDescriptor {
                label: Some("globe-pipeline-layout"),
                bind_group_layouts: &[&globals_layout, &map_layout],
                immediate_size: 0,
            });
            let overlay_layout =
                device.create_pipeline_layout(&::wgpu::PipelineLayoutDescriptor {
                    label: Some("globe-overlay-pipeline-layout"),
                    bind_group_layouts: &[&globals_layout],
                    immediate_size: 0,
                });

            let globe_shader = shader(&device, "globe-shader", GLOBE_SHADER);
            let lines_shader = shader(&device, "globe-lines-shader", LINES_SHADER);
            let stars_shader = shader(&device, "globe-stars-shader", STARS_SHADER);

            let globe_pipeline = pipeline(
                &device,
                PipelineSpec {
                    label: "globe-pipeline",
                    module: &globe_shader,
                    layout: &globe_layout,
                    buffers: &[::wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<GlobeVertex>() as ::wgpu::BufferAddress,
                        step_mode: ::wgpu::VertexStepMode::Vertex,
                        attributes: &::wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2],
                    }],
                    topology: ::wgpu::PrimitiveTopology::TriangleList,
                    blend: ::wgpu::BlendState::REPLACE,
                    depth_write: true,
                    depth_compare: ::wgpu::CompareFunction::Less,
                    format,
                },
            );

            let lines_pipeline = pipeline(
                &device,
                PipelineSpec {
                    label: "globe-lines-pipeline",
                    module: &lines_shader,
                    layout: &overlay_layout,
                    buffers: &[::wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<LineVertex>() as ::wgpu::BufferAddress,
                        step_mode: ::wgpu::VertexStepMode::Vertex,
                        attributes: &::wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4],
                    }],
                    topology: ::wgpu::PrimitiveTopology::LineList,
                    blend: ::wgpu::BlendState::ALPHA_BLENDING,
                    depth_write: false,
                    depth_compare: ::wgpu::CompareFunction::LessEqual,
                    format,
                },
            );

            let stars_pipeline = pipeline(
                &device,
                PipelineSpec {
                    label: "globe-stars-pipeline",
                    module: &stars_shader,
                    layout: &overlay_layout,
                    buffers: &[::wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<StarVertex>() as ::wgpu::BufferAddress,
                        step_mode: ::wgpu::VertexStepMode::Vertex,
                        attributes: &::wgpu::vertex_attr_array![0 => Float32x3],
                    }],
                    topology: ::wgpu::PrimitiveTopology::PointList,
                    blend: ::wgpu::BlendState::ALPHA_BLENDING,
                    depth_write: false,
                    depth_compare: ::wgpu::CompareFunction::LessEqual,
                    format,
                },
            );

            let (sphere, indices) = generate_sphere_mesh(SPHERE_SEGMENTS, SPHERE_SEGMENTS);
            let sphere_vertices = device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                label: Some("globe-sphere-vertices"),
                contents: bytemuck::cast_slice(&sphere),
                usage: ::wgpu::BufferUsages::VERTEX,
            });
            let sphere_indices = device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                label: Some("globe-sphere-indices"),
                contents: bytemuck::cast_slice(&indices),
                usage: ::wgpu::BufferUsages::INDEX,
            });

            let star_verts = star_vertices(stars);
            // Zero-length vertex buffers are rejected, keep one dummy point.
            let star_contents: Vec<StarVertex> = if star_verts.is_empty() {
                vec![StarVertex { position: [0.0; 3] }]
            } else {
                star_verts.clone()
            };
            let stars_buffer = device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                label: Some("globe-stars"),
                contents: bytemuck::cast_slice(&star_contents),
                usage: ::wgpu::BufferUsages::VERTEX,
            });

            tracing::info!(
                width = config.width,
                height = config.height,
                ?format,
                stars = star_verts.len(),
                "wgpu surface ready"
            );

            Ok(Self {
                canvas: canvas.clone(),
                surface,
                device,
                queue,
                config,
                depth,
                depth_view,
                globe_pipeline,
                lines_pipeline,
                stars_pipeline,
                globals_buffer,
                globals_bind_group,
                map_layout,
                map_sampler,
                map: None,
                sphere_vertices,
                sphere_indices,
                sphere_index_count: indices.len() as u32,
                borders: LineBuffer::empty(),
                outline: LineBuffer::empty(),
                stars: stars_buffer,
                star_count: star_verts.len() as u32,
                star_opacity: stars.opacity,
                released: false,
                _instance: instance,
            })
        }

        fn reconfigure(&mut self) {
            self.surface.configure(&self.device, &self.config);
            self.depth.destroy();
            let (depth, view) = create_depth(&self.device, &self.config);
            self.depth = depth;
            self.depth_view = view;
        }

        fn create_map(&self, width: u32, height: u32) -> MapBinding {
            let texture = self.device.create_texture(&::wgpu::TextureDescriptor {
                label: Some("globe-map-texture"),
                size: ::wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: ::wgpu::TextureDimension::D2,
                format: ::wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: ::wgpu::TextureUsages::TEXTURE_BINDING | ::wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
            let view = texture.create_view(&::wgpu::TextureViewDescriptor::default());
            let bind_group = self.device.create_bind_group(&::wgpu::BindGroupDescriptor {
                label: Some("globe-map-bg"),
                layout: &self.map_layout,
                entries: &[
                    ::wgpu::BindGroupEntry {
                        binding: 0,
                        resource: ::wgpu::BindingResource::TextureView(&view),
                    },
                    ::wgpu::BindGroupEntry {
                        binding: 1,
                        resource: ::wgpu::BindingResource::Sampler(&self.map_sampler),
                    },
                ],
            });
            MapBinding {
                texture,
                bind_group,
                width,
                height,
            }
        }
    }

    impl RenderSurface for WgpuSurface {
        fn resize(&mut self, width: u32, height: u32) {
            if self.released {
                return;
            }
            self.canvas.set_width(width.max(1));
            self.canvas.set_height(height.max(1));
            self.config.width = width.max(1);
            self.config.height = height.max(1);
            self.reconfigure();
        }

        fn upload_map_texture(&mut self, texture: &MapTexture) {
            if self.released {
                return;
            }
            let (w, h) = (texture.width(), texture.height());
            let stale = self
                .map
                .as_ref()
                .is_none_or(|m| m.width != w || m.height != h);
            if stale {
                if let Some(old) = self.map.take() {
                    old.texture.destroy();
                }
                self.map = Some(self.create_map(w, h));
            }
            let Some(map) = &self.map else {
                return;
            };
            self.queue.write_texture(
                ::wgpu::TexelCopyTextureInfo {
                    texture: &map.texture,
                    mip_level: 0,
                    origin: ::wgpu::Origin3d::ZERO,
                    aspect: ::wgpu::TextureAspect::All,
                },
                texture.pixels(),
                ::wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * w),
                    rows_per_image: Some(h),
                },
                ::wgpu::Extent3d {
                    width: w,
                    height: h,
                    depth_or_array_layers: 1,
                },
            );
        }

        fn set_lines(&mut self, layer: &LineLayer) {
            if self.released {
                return;
            }
            let verts = line_vertices(layer);
            let id = layer.id();
            if id == BORDER_LAYER {
                self.borders.replace(&self.device, "globe-borders", &verts);
            } else if id == SELECTION_OUTLINE_LAYER {
                self.outline.replace(&self.device, "globe-outline", &verts);
            } else {
                tracing::warn!(layer = id.0, "no line slot for layer");
            }
        }

        fn draw(&mut self, view: &FrameView) {
            if self.released {
                return;
            }
            let frame = match self.surface.get_current_texture() {
                Ok(frame) => frame,
                Err(::wgpu::SurfaceError::Lost | ::wgpu::SurfaceError::Outdated) => {
                    self.reconfigure();
                    return;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "surface acquire failed");
                    return;
                }
            };
            let target = frame
                .texture
                .create_view(&::wgpu::TextureViewDescriptor::default());

            let globals = Globals::from_view(view, self.star_opacity);
            self.queue
                .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));

            let [r, g, b] = view.clear_color.to_unit_f64();
            let mut encoder = self
                .device
                .create_command_encoder(&::wgpu::CommandEncoderDescriptor {
                    label: Some("globe-encoder"),
                });
            {
                let mut rpass = encoder.begin_render_pass(&::wgpu::RenderPassDescriptor {
                    label: Some("globe-pass"),
                    color_attachments: &[Some(::wgpu::RenderPassColorAttachment {
                        view: &target,
                        resolve_target: None,
                        depth_slice: None,
                        ops: ::wgpu::Operations {
                            load: ::wgpu::LoadOp::Clear(::wgpu::Color { r, g, b, a: 1.0 }),
                            store: ::wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: Some(::wgpu::RenderPassDepthStencilAttachment {
                        view: &self.depth_view,
                        depth_ops: Some(::wgpu::Operations {
                            load: ::wgpu::LoadOp::Clear(1.0),
                            store: ::wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    occlusion_query_set: None,
                    timestamp_writes: None,
                    multiview_mask: None,
                });
                rpass.set_bind_group(0, &self.globals_bind_group, &[]);

                if let Some(map) = &self.map {
                    rpass.set_pipeline(&self.globe_pipeline);
                    rpass.set_bind_group(1, &map.bind_group, &[]);
                    rpass.set_vertex_buffer(0, self.sphere_vertices.slice(..));
                    rpass.set_index_buffer(self.sphere_indices.slice(..), ::wgpu::IndexFormat::Uint16);
                    rpass.draw_indexed(0..self.sphere_index_count, 0, 0..1);
                }

                if self.star_count > 0 {
                    rpass.set_pipeline(&self.stars_pipeline);
                    rpass.set_vertex_buffer(0, self.stars.slice(..));
                    rpass.draw(0..self.star_count, 0..1);
                }

                rpass.set_pipeline(&self.lines_pipeline);
                for lines in [&self.borders, &self.outline] {
                    if let Some(buf) = &lines.buffer {
                        rpass.set_vertex_buffer(0, buf.slice(..));
                        rpass.draw(0..lines.count, 0..1);
                    }
                }
            }

            self.queue.submit(std::iter::once(encoder.finish()));
            frame.present();
        }

        fn release(&mut self) {
            if self.released {
                return;
            }
            self.released = true;
            if let Some(map) = self.map.take() {
                map.texture.destroy();
            }
            for lines in [&mut self.borders, &mut self.outline] {
                if let Some(buf) = lines.buffer.take() {
                    buf.destroy();
                }
                lines.count = 0;
            }
            self.sphere_vertices.destroy();
            self.sphere_indices.destroy();
            self.stars.destroy();
            self.globals_buffer.destroy();
            self.depth.destroy();
            tracing::debug!("wgpu surface released");
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod imp {
    use wasm_bindgen::prelude::JsValue;

    use globe::{FrameView, RenderSurface};
    use layers::{LineLayer, MapTexture, Starfield};

    #[derive(Debug, Default)]
    pub struct WgpuSurface;

    impl WgpuSurface {
        pub async fn new(
            _canvas: &web_sys::HtmlCanvasElement,
            _stars: &Starfield,
        ) -> Result<Self, JsValue> {
            Err(JsValue::from_str(
                "wgpu initialization is only available on wasm32 targets",
            ))
        }
    }

    impl RenderSurface for WgpuSurface {
        fn resize(&mut self, _width: u32, _height: u32) {}

        fn upload_map_texture(&mut self, _texture: &MapTexture) {}

        fn set_lines(&mut self, _layer: &LineLayer) {}

        fn draw(&mut self, _view: &FrameView) {}

        fn release(&mut self) {}
    }
}

pub use imp::WgpuSurface;
