//! Headless panmap session.
//!
//! Reads a JSON script of input events and clock steps, replays it against a
//! recording canvas, and prints the last drawn frame as JSON on stdout.
//!
//! ```text
//! RUST_LOG=debug panmap-demo [script.json]
//! ```

mod layers;

use std::cell::Cell;
use std::rc::Rc;

use log::{info, warn};
use serde::Deserialize;

use panmap_core::{Affine, Color, Point};
use panmap_renderer::{
    Map, MapConfig, MapError, MapEvent, PointerEvent, RecordingCanvas, RenderFrame, Surface,
};

use layers::{GridLayer, Marker, MarkerLayer, SurfaceSize};

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Script error: {0}")]
    Script(#[from] serde_json::Error),
    #[error(transparent)]
    Map(#[from] MapError),
}

#[derive(Debug, Deserialize)]
struct Script {
    #[serde(default)]
    config: MapConfig,
    #[serde(default = "default_size")]
    size: (f64, f64),
    steps: Vec<Step>,
}

fn default_size() -> (f64, f64) {
    (800.0, 600.0)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Step {
    /// Move the clock forward by this many milliseconds.
    Advance(u64),
    Event(MapEvent),
    Focus { x: f64, y: f64 },
    /// The container changed size; the map hears about it as a resize event.
    Resize { width: f64, height: f64 },
}

const DEFAULT_SCRIPT: &str = r#"{
    "config": { "render_delay_ms": 10, "resize_delay_ms": 100 },
    "steps": [
        { "focus": { "x": 0.0, "y": 0.0 } },
        { "advance": 20 },
        { "event": { "type": "wheel", "x": 400.0, "y": 300.0, "delta_y": 3.0, "delta_factor": 100.0 } },
        { "event": { "type": "drag", "dx": 25.0, "dy": -10.0 } },
        { "event": { "type": "drag", "dx": 25.0, "dy": -10.0 } },
        { "advance": 20 },
        { "resize": { "width": 1024.0, "height": 768.0 } },
        { "advance": 200 },
        { "event": { "type": "pointer_down", "x": 512.0, "y": 384.0, "button": "primary" } }
    ]
}"#;

fn load_script() -> Result<Script, DemoError> {
    match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading script from {path}");
            let text = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&text)?)
        }
        None => Ok(serde_json::from_str(DEFAULT_SCRIPT)?),
    }
}

/// Marker edge length in pixels, also the click tolerance.
const MARKER_PX: f64 = 6.0;

fn sample_markers() -> Vec<Marker> {
    let palette = [
        Color::rgb(230, 80, 60),
        Color::rgb(60, 160, 90),
        Color::rgb(70, 110, 220),
    ];
    (0..30)
        .map(|i| {
            let t = i as f64 * 0.7;
            Marker {
                position: Point::new(t.cos() * 20.0 * t, t.sin() * 20.0 * t),
                color: palette[i % palette.len()],
            }
        })
        .collect()
}

fn build_map(
    script: &Script,
    container: Rc<Cell<(f64, f64)>>,
) -> Result<(Map<RecordingCanvas>, Rc<MarkerLayer>), DemoError> {
    let (width, height) = container.get();
    let mut map = Map::with_config(RecordingCanvas::new(width, height), script.config)?;
    let size: SurfaceSize = Rc::new(Cell::new((width, height)));

    let markers = Rc::new(MarkerLayer::new(sample_markers(), MARKER_PX, size.clone()));
    map.add_layer(markers.clone());
    let grid = Rc::new(GridLayer {
        spacing: 50.0,
        color: Color::rgba(0, 0, 0, 40),
        size: size.clone(),
    });
    // The grid goes underneath.
    map.insert_layer(0, grid);

    let surface_size = size.clone();
    map.set_before_render(move |ctx| {
        let (w, h) = surface_size.get();
        ctx.set_transform(Affine::IDENTITY);
        ctx.clear_rect(0.0, 0.0, w, h);
    });

    map.set_click_callback(|event| {
        info!("Click at ({}, {})", event.x, event.y);
        false
    });

    let delay = script.config.resize_delay_ms;
    map.install_resizer(
        move |canvas: &mut RecordingCanvas| {
            let (w, h) = container.get();
            canvas.set_size(w, h);
            size.set((w, h));
        },
        delay,
    );
    Ok((map, markers))
}

fn capture(map: &mut Map<RecordingCanvas>, seen: &mut u64, last: &mut Option<RenderFrame>) {
    let drawn = map.frames_drawn();
    if drawn == *seen {
        return;
    }
    *seen = drawn;
    let viewport = map.viewport().clone_for_transformation();
    *last = Some(map.surface_mut().take_frame(drawn, &viewport));
}

fn report_hits(map: &Map<RecordingCanvas>, markers: &MarkerLayer, pointer: &PointerEvent) {
    let viewport = map.viewport();
    let at = pointer.map_position(viewport);
    let radius = viewport.untransform_distance(MARKER_PX / 2.0);
    for index in markers.hit_test(at, radius) {
        if let Some(marker) = markers.marker(index) {
            info!("Pointer hit marker {index} at {:?}", marker.position);
        }
    }
}

fn run() -> Result<(), DemoError> {
    let script = load_script()?;
    let container = Rc::new(Cell::new(script.size));
    let (mut map, markers) = build_map(&script, container.clone())?;

    let mut seen = 0;
    let mut last = None;
    for step in &script.steps {
        match step {
            Step::Advance(ms) => {
                map.advance(*ms);
            }
            Step::Event(event) => {
                if let MapEvent::PointerDown(pointer) = event {
                    report_hits(&map, &markers, pointer);
                }
                match map.handle_event(*event) {
                    Ok(response) => info!("{event:?} -> {response:?}"),
                    Err(e) => warn!("Event {event:?} rejected: {e}"),
                }
            }
            Step::Focus { x, y } => {
                map.focus_map_coordinates(*x, *y);
                map.render();
            }
            Step::Resize { width, height } => {
                container.set((*width, *height));
                map.handle_event(MapEvent::Resize)?;
            }
        }
        capture(&mut map, &mut seen, &mut last);
    }
    map.run_until_idle();
    capture(&mut map, &mut seen, &mut last);

    let surface = map.surface();
    info!(
        "Session done at {} ms: {} frames, surface {}x{}, last {:?}",
        map.scheduler().now(),
        map.frames_drawn(),
        surface.width(),
        surface.height(),
        map.last_frame()
    );

    match last {
        Some(frame) => println!("{}", frame.to_json()?),
        None => warn!("No frame was drawn"),
    }
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("panmap-demo: {e}");
        std::process::exit(1);
    }
}
