//! Belt placement demo
//!
//! Runs the engine headless: a scripted brush paints and erases belt lines
//! on the grid while an orbiting camera renders every tick through a
//! staging backend. Pass a `.toml` or `.ron` config path as the first
//! argument, otherwise defaults are used.

mod strokes;
mod upload_backend;

use std::cell::RefCell;
use std::rc::Rc;

use belt_engine::foundation::logging;
use belt_engine::prelude::*;
use strokes::{StrokeAction, StrokeScript};
use upload_backend::UploadBackend;

const DEFAULT_FRAME_LIMIT: u64 = 600;
const TICK_SECONDS: f32 = 1.0 / 60.0;

fn load_config() -> Result<(ApplicationConfig, String), Box<dyn std::error::Error>> {
    let mut config = match std::env::args().nth(1) {
        Some(path) => {
            let config = ApplicationConfig::load(&path)?;
            (config, path)
        }
        None => (ApplicationConfig::default(), "built-in defaults".to_string()),
    };
    if config.0.engine.frame_limit.is_none() {
        config.0.engine.frame_limit = Some(DEFAULT_FRAME_LIMIT);
    }
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config, source) = load_config()?;

    logging::init_with_level(&config.engine.log_level);

    log::info!("Starting belt demo");
    log::info!("Configuration from {}", source);

    let mesh_count = config.pool.mesh_count;
    let brush_radius = config.editing.brush_radius;
    let abort_on_capacity = config.engine.debug_mode;

    let meshes = (0..mesh_count)
        .map(|i| MeshDescriptor::new(MeshHandle(i as u64), Aabb::tile(0.2)))
        .collect();
    let engine = Rc::new(RefCell::new(Engine::new(config, meshes, MaterialHandle(0))?));
    let mut script = StrokeScript::new(0xbe17, engine.borrow().grid(), mesh_count, brush_radius);
    let center = script.center();
    let size = engine.borrow().grid().size();
    let backend = Rc::new(RefCell::new(UploadBackend::default()));
    let failure: Rc<RefCell<Option<EngineError>>> = Rc::new(RefCell::new(None));

    let mut scheduler = UpdateScheduler::new();

    // Input first so the render of the same tick sees the edit
    {
        let engine = Rc::clone(&engine);
        let failure = Rc::clone(&failure);
        scheduler.register(move |_| {
            let mut engine = engine.borrow_mut();
            match script.next_action() {
                StrokeAction::Edit(input) => match engine.apply_edit(&input) {
                    Ok(_) => {}
                    Err(e) if e.is_capacity_exceeded() && !abort_on_capacity => {
                        log::warn!("Dropping edit: {}", e);
                    }
                    Err(e) => {
                        engine.quit();
                        *failure.borrow_mut() = Some(e);
                    }
                },
                StrokeAction::Release => engine.release_brush(),
                StrokeAction::SwitchMesh(mesh) => {
                    engine.release_brush();
                    if mesh.index() < engine.pool().mesh_count() {
                        log::debug!("Painting with {}", mesh);
                        engine.editor_mut().set_paint_mesh(mesh);
                    }
                }
                StrokeAction::Idle => {}
            }
        });
    }

    {
        let engine = Rc::clone(&engine);
        let backend = Rc::clone(&backend);
        let mut camera = Camera::perspective(Vec3::new(0.0, 30.0, 30.0), 45.0, 16.0 / 9.0, 0.1, 1000.0);
        let radius = size.x.max(size.z) as f32 * 0.6;
        scheduler.register(move |info| {
            // Fixed-rate orbit so the culled set changes every frame
            let angle = info.frame as f32 * 0.01;
            camera.orbit(center, radius, radius * 0.5, angle);

            let stats = engine.borrow_mut().render_frame(&camera, &mut *backend.borrow_mut());
            if stats.frame % 120 == 0 {
                log::info!(
                    "Frame {}: {} / {} instances visible in {} draws ({:.0}% culled)",
                    stats.frame,
                    stats.visible_instances,
                    stats.total_instances,
                    stats.draw_calls,
                    stats.culled_ratio() * 100.0
                );
            }
        });
    }

    scheduler.start();
    while engine.borrow().is_running() {
        scheduler.tick(TICK_SECONDS)?;
    }
    scheduler.shutdown();

    if let Some(e) = failure.borrow_mut().take() {
        log::error!("Demo aborted: {}", e);
        return Err(e.into());
    }

    let engine = engine.borrow();
    let backend = backend.borrow();
    let pool_stats = engine.pool().stats();
    log::info!(
        "Finished after {} frames: {} tiles placed, {} draw calls, {} instances, {} KiB staged",
        engine.frame_count(),
        engine.pool().total_count(),
        backend.draw_calls,
        backend.instances,
        backend.bytes_uploaded / 1024
    );
    log::info!(
        "Pool activity: {} inserts, {} updates, {} removals",
        pool_stats.inserts,
        pool_stats.updates,
        pool_stats.removals
    );
    log::info!(
        "Frustum planes recomputed {} times",
        engine.renderer().culler().stats().plane_updates
    );

    Ok(())
}
