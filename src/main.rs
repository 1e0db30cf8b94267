/*
 * Shoal
 *
 * Interactive viewer for the fish school simulation. The school flocks
 * around rocks toward bait while predators hunt the nearest swimmer.
 *
 * Usage: shoal [params.json]
 * Log verbosity follows RUST_LOG (default "info").
 */

use shoal::app;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    nannou::app(app::model).update(app::update).run();
}
