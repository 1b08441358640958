use anyhow::Result;
use gazeflow::actions::PipelineKind;
use gazeflow::config::GazeConfig;
use gazeflow::core::{FrameContext, PageView, Rect, SystemClock, Vec2};
use gazeflow::engine::PageCommand;
use gazeflow::hal::SourceRegistry;
use gazeflow::runtime::GazeRuntime;
use gazeflow::trigger::DomTarget;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

const WIDTH: f64 = 1920.0;
const HEIGHT: f64 = 1080.0;
const FRAME_RATE: f64 = 60.0;
const RUN_SECONDS: f64 = 8.0;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gazeflow=info")),
        )
        .init();

    // Optional config file as first argument, simulated tracker otherwise
    let config = match std::env::args().nth(1) {
        Some(path) => GazeConfig::load(&path)?,
        None => GazeConfig::default(),
    };

    let clock = Arc::new(SystemClock::new());
    let registry = SourceRegistry::with_builtins();
    info!(sources = ?registry.list_sources(), kind = %config.source.kind, "Gaze demo");

    let mut runtime =
        GazeRuntime::from_config(config, &registry, clock, tokio::runtime::Handle::current())?;
    let mut events = runtime.subscribe();

    runtime.triggers_mut().insert(
        DomTarget {
            id: 1,
            node_type: "link".to_string(),
            rects: vec![Rect::new(300.0, 285.0, 200.0, 30.0)],
            fixed: false,
        },
        PipelineKind::Click,
    );
    runtime.triggers_mut().insert(
        DomTarget {
            id: 2,
            node_type: "link".to_string(),
            rects: vec![Rect::new(1400.0, 785.0, 200.0, 30.0)],
            fixed: false,
        },
        PipelineKind::Click,
    );

    runtime.start();

    let view = PageView::fullscreen(WIDTH, HEIGHT);
    let window = Rect::new(0.0, 0.0, WIDTH, HEIGHT);
    let dt = 1.0 / FRAME_RATE;
    let mut interval = tokio::time::interval(Duration::from_secs_f64(dt));

    let frames = (RUN_SECONDS * FRAME_RATE) as usize;
    for _ in 0..frames {
        interval.tick().await;

        let frame = FrameContext::new(dt, window)
            .with_screen_size(Vec2::new(WIDTH, HEIGHT))
            .with_pointer(Vec2::new(WIDTH / 2.0, HEIGHT / 2.0));
        let output = runtime.tick(&frame, &view);

        while let Ok(event) = events.try_recv() {
            info!(?event, "Tracker event");
        }
        for command in &output.commands {
            match command {
                PageCommand::SetView(_) => {}
                other => info!(command = ?other, "Page command"),
            }
        }
    }

    info!("\n{}", runtime.monitor().generate_report());
    Ok(())
}
