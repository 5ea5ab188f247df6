#![cfg(feature = "integration-tests")]

use cyber_blog::gpu::WgpuBackend;
use cyber_blog::scene::{SceneParams, SceneView, Viewport};

const WIDTH: u32 = 320;
const HEIGHT: u32 = 180;

fn render(params: SceneParams) -> Vec<u8> {
    let _ = env_logger::builder().is_test(true).try_init();
    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(async {
        let viewport = Viewport::new(WIDTH, HEIGHT, params.render_scale);
        let backend = WgpuBackend::offscreen(viewport).await.unwrap();
        let mut view = SceneView::mount(backend, &params).unwrap();
        view.frame(1.5).unwrap();
        let pixels = view.backend().unwrap().read_pixels().await.unwrap();
        let report = view.unmount();
        assert_eq!(report.frames, 1);
        pixels
    })
}

fn distinct_colours(pixels: &[u8]) -> usize {
    let mut colours: Vec<&[u8]> = pixels.chunks_exact(4).collect();
    colours.sort_unstable();
    colours.dedup();
    colours.len()
}

#[test]
fn neon_scene_renders_a_city() {
    let pixels = render(SceneParams::neon().with_seed(5));
    assert_eq!(pixels.len(), (WIDTH * HEIGHT * 4) as usize);
    assert!(pixels.chunks_exact(4).all(|p| p[3] == 255));
    assert!(distinct_colours(&pixels) > 16);
}

#[test]
fn pixel_scene_upscales_to_the_full_output() {
    let params = SceneParams::pixel().with_seed(5);
    assert!(params.render_scale < 1.0);
    let pixels = render(params);
    assert_eq!(pixels.len(), (WIDTH * HEIGHT * 4) as usize);
    // nearest upscaling repeats each scene texel, so neighbours mostly agree
    let row = (WIDTH * 4) as usize;
    let same = pixels
        .chunks_exact(row)
        .flat_map(|r| r.chunks_exact(8))
        .filter(|pair| pair[..4] == pair[4..])
        .count();
    let pairs = (WIDTH / 2 * HEIGHT) as usize;
    assert!(same * 2 > pairs);
    assert!(distinct_colours(&pixels) > 1);
}
