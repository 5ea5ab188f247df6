//! Tunables of the city backdrop.
//!
//! Two variants exist: the first `Pixel` world (a handful of green voxels
//! rendered at half resolution) and the later `Neon` city with pipes, a train
//! track, drones and a bloom chain.

use std::str::FromStr;

/// Which iteration of the backdrop to build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SceneVariant {
    Pixel,
    #[default]
    Neon,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown scene variant {0:?}")]
pub struct UnknownVariant(pub String);

impl FromStr for SceneVariant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pixel" => Ok(SceneVariant::Pixel),
            "neon" => Ok(SceneVariant::Neon),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

/// Converts a `0xRRGGBB` sRGB colour into linear RGB.
pub fn hex(rgb: u32) -> [f32; 3] {
    let channel = |shift: u32| {
        let c = ((rgb >> shift) & 0xff) as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    [channel(16), channel(8), channel(0)]
}

#[derive(Clone, Debug, PartialEq)]
pub struct CameraParams {
    pub fovy_deg: f32,
    pub znear: f32,
    pub zfar: f32,
    /// Distance from the orbit axis.
    pub orbit_radius: f32,
    pub orbit_height: f32,
    /// Angular speed in radians per second.
    pub orbit_speed: f32,
    pub target: [f32; 3],
}

#[derive(Clone, Debug, PartialEq)]
pub struct BuildingParams {
    pub count: usize,
    /// Buildings are scattered over `[-half_extent, half_extent]` on x and z.
    pub half_extent: f32,
    pub width: (f32, f32),
    pub height: (f32, f32),
    pub palette: Vec<[f32; 3]>,
    /// Emissive strength range; 0 gives plain lit boxes.
    pub emissive: (f32, f32),
}

#[derive(Clone, Debug, PartialEq)]
pub struct GroundParams {
    pub size: f32,
    pub color: [f32; 3],
    /// Grid line colour; the ground renders as a glowing grid.
    pub grid_color: [f32; 3],
}

#[derive(Clone, Debug, PartialEq)]
pub struct PipeParams {
    pub count: usize,
    pub radius: f32,
    pub height: (f32, f32),
    pub palette: Vec<[f32; 3]>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrackParams {
    pub radius: f32,
    pub control_points: usize,
    /// Radial jitter of the control points, as a fraction of the radius.
    pub jitter: f32,
    pub height: f32,
    pub tube_radius: f32,
    pub color: [f32; 3],
    /// Laps per second of the train.
    pub train_speed: f32,
    pub train_size: [f32; 3],
    pub train_color: [f32; 3],
}

#[derive(Clone, Debug, PartialEq)]
pub struct DroneParams {
    pub count: usize,
    pub half_extent: f32,
    pub altitude: (f32, f32),
    pub size: f32,
    pub bob_amplitude: f32,
    /// Bobbing frequency in radians per second.
    pub bob_speed: f32,
    /// Spin in radians per second.
    pub spin_speed: f32,
    pub color: [f32; 3],
}

#[derive(Clone, Debug, PartialEq)]
pub struct LightParams {
    pub ambient: [f32; 3],
    pub directional_color: [f32; 3],
    /// The directional light shines from here towards the origin.
    pub directional_position: [f32; 3],
}

#[derive(Clone, Debug, PartialEq)]
pub struct BloomParams {
    /// Luminance above which pixels glow.
    pub threshold: f32,
    pub strength: f32,
    /// Blur tap spacing in texels.
    pub radius: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneParams {
    pub variant: SceneVariant,
    /// Seed of the placement generator; `None` seeds from entropy.
    pub seed: Option<u64>,
    pub background: [f32; 3],
    /// Output resolution relative to the container size.
    pub render_scale: f32,
    pub camera: CameraParams,
    pub buildings: BuildingParams,
    pub ground: Option<GroundParams>,
    pub pipes: Option<PipeParams>,
    pub track: Option<TrackParams>,
    pub drones: Option<DroneParams>,
    pub lights: LightParams,
    pub bloom: Option<BloomParams>,
}

impl SceneParams {
    pub fn for_variant(variant: SceneVariant) -> Self {
        match variant {
            SceneVariant::Pixel => Self::pixel(),
            SceneVariant::Neon => Self::neon(),
        }
    }

    /// The first iteration: green voxels on black, rendered at half resolution.
    pub fn pixel() -> Self {
        Self {
            variant: SceneVariant::Pixel,
            seed: None,
            background: [0.0, 0.0, 0.0],
            render_scale: 0.5,
            camera: CameraParams {
                fovy_deg: 75.0,
                znear: 0.1,
                zfar: 1000.0,
                orbit_radius: 8.0,
                orbit_height: 0.0,
                orbit_speed: 0.5,
                target: [0.0, 0.0, 0.0],
            },
            buildings: BuildingParams {
                count: 50,
                half_extent: 5.0,
                width: (1.0, 1.0),
                height: (0.5, 2.5),
                palette: vec![hex(0x00ff00)],
                emissive: (0.0, 0.0),
            },
            ground: None,
            pipes: None,
            track: None,
            drones: None,
            lights: LightParams {
                ambient: hex(0x404040),
                directional_color: [1.0, 1.0, 1.0],
                directional_position: [5.0, 5.0, 5.0],
            },
            bloom: None,
        }
    }

    /// The latest iteration: the full neon city.
    pub fn neon() -> Self {
        let palette = vec![hex(0xff00ff), hex(0x00ffff), hex(0x7b2fff), hex(0xff2e88)];
        Self {
            variant: SceneVariant::Neon,
            seed: None,
            background: hex(0x05010f),
            render_scale: 1.0,
            camera: CameraParams {
                fovy_deg: 60.0,
                znear: 0.1,
                zfar: 500.0,
                orbit_radius: 42.0,
                orbit_height: 18.0,
                orbit_speed: 0.08,
                target: [0.0, 4.0, 0.0],
            },
            buildings: BuildingParams {
                count: 140,
                half_extent: 30.0,
                width: (1.2, 3.5),
                height: (3.0, 18.0),
                palette: palette.clone(),
                emissive: (0.15, 0.6),
            },
            ground: Some(GroundParams {
                size: 120.0,
                color: hex(0x0a0418),
                grid_color: hex(0x00ffff),
            }),
            pipes: Some(PipeParams {
                count: 18,
                radius: 0.18,
                height: (2.0, 12.0),
                palette: vec![hex(0x00ffff), hex(0xff00ff)],
            }),
            track: Some(TrackParams {
                radius: 22.0,
                control_points: 12,
                jitter: 0.18,
                height: 6.0,
                tube_radius: 0.25,
                color: hex(0xff2e88),
                train_speed: 0.04,
                train_size: [1.2, 0.8, 3.2],
                train_color: hex(0x00ffff),
            }),
            drones: Some(DroneParams {
                count: 10,
                half_extent: 26.0,
                altitude: (10.0, 22.0),
                size: 0.6,
                bob_amplitude: 0.6,
                bob_speed: 1.6,
                spin_speed: 1.2,
                color: hex(0xfff200),
            }),
            lights: LightParams {
                ambient: hex(0x1a0b2e),
                directional_color: hex(0xff66ff),
                directional_position: [20.0, 40.0, 10.0],
            },
            bloom: Some(BloomParams {
                threshold: 0.55,
                strength: 1.3,
                radius: 1.5,
            }),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn has_post_processing(&self) -> bool {
        self.bloom.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_variants_case_insensitively() {
        assert_eq!("NEON".parse::<SceneVariant>().unwrap(), SceneVariant::Neon);
        assert_eq!(" pixel ".parse::<SceneVariant>().unwrap(), SceneVariant::Pixel);
        assert!("synthwave".parse::<SceneVariant>().is_err());
    }

    #[test]
    fn hex_maps_to_linear_rgb() {
        assert_eq!(hex(0xffffff), [1.0, 1.0, 1.0]);
        assert_eq!(hex(0x000000), [0.0, 0.0, 0.0]);
        let [r, g, b] = hex(0x808080);
        assert!((r - 0.2158).abs() < 1e-3 && r == g && g == b);
    }

    #[test]
    fn only_neon_composites() {
        assert!(!SceneParams::pixel().has_post_processing());
        assert!(SceneParams::neon().has_post_processing());
    }
}
