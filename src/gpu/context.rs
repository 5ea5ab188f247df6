//! Adapter and device acquisition.

use anyhow::Context as _;

use crate::scene::backend::Viewport;

/// Device and queue shared by every resource of one backend.
#[derive(Debug)]
pub struct GpuContext {
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

pub fn instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        #[cfg(not(target_arch = "wasm32"))]
        backends: wgpu::Backends::PRIMARY,
        #[cfg(target_arch = "wasm32")]
        backends: wgpu::Backends::GL,
        ..Default::default()
    })
}

impl GpuContext {
    /// Picks an adapter able to present to `surface` (any adapter when
    /// rendering offscreen) and opens a device on it.
    pub async fn new(instance: &wgpu::Instance, surface: Option<&wgpu::Surface<'_>>) -> anyhow::Result<Self> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: surface,
                force_fallback_adapter: false,
            })
            .await
            .context("no compatible graphics adapter")?;
        log::debug!("using adapter {:?}", adapter.get_info());
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("backdrop_device"),
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: wgpu::Trace::Off,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
            })
            .await
            .context("opening graphics device")?;
        Ok(Self { adapter, device, queue })
    }

    /// Shrinks `viewport` to what the device can allocate as one texture.
    pub fn fit(&self, viewport: Viewport) -> Viewport {
        let max = self.device.limits().max_texture_dimension_2d;
        let fitted = viewport.clamped(max);
        if fitted != viewport {
            log::debug!(
                "clamped {}x{} to {}x{} (texture limit {max})",
                viewport.width,
                viewport.height,
                fitted.width,
                fitted.height
            );
        }
        fitted
    }
}
