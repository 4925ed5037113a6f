use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;

use survival::game::simulation::Stage;
use survival::game::GamePlugin;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_PREFIX: &str = "survival";
const KEEP_LOGS: usize = 25;

fn setup_file_logging() -> Option<String> {
    let log_dir = PathBuf::from("logs");
    let file_logging = match fs::create_dir_all(&log_dir) {
        Ok(()) => true,
        Err(e) => {
            eprintln!("Failed to create {}: {}", log_dir.display(), e);
            false
        }
    };

    // Clean up old log files, keeping only the most recent ones
    if file_logging {
        cleanup_old_logs(&log_dir, KEEP_LOGS);
    }

    let now = chrono::Local::now();
    let log_filename = format!("{}_{}.log", LOG_PREFIX, now.format("%Y%m%d_%H%M%S"));
    let log_path_str = log_dir.join(&log_filename).to_string_lossy().to_string();

    let file_layer = file_logging.then(|| {
        let file_appender = RollingFileAppender::new(Rotation::NEVER, &log_dir, &log_filename);
        fmt::layer().with_writer(file_appender).with_ansi(false)
    });

    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bevy_ecs=info,survival=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    file_logging.then_some(log_path_str)
}

fn cleanup_old_logs(log_dir: &Path, keep_count: usize) {
    let Ok(entries) = fs::read_dir(log_dir) else {
        return;
    };
    let mut log_files: Vec<_> = entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|s| s.starts_with(LOG_PREFIX) && s.ends_with(".log"))
        })
        .collect();

    // Oldest first
    log_files.sort_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()));

    if log_files.len() > keep_count {
        for file in log_files.iter().take(log_files.len() - keep_count) {
            let _ = fs::remove_file(file.path());
        }
    }
}

fn exit_on_game_over(stage: Option<Res<Stage>>, mut exit: MessageWriter<AppExit>) {
    if stage.is_some_and(|stage| stage.is_game_over()) {
        info!("[STAGE] Exiting");
        exit.write(AppExit::Success);
    }
}

fn main() -> AppExit {
    match setup_file_logging() {
        Some(log_file) => println!("Survival (headless) - logging to {}", log_file),
        None => println!("Survival (headless) - logging to stdout only"),
    }

    App::new()
        .add_plugins(
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(1.0 / 60.0))),
        )
        .add_plugins(AssetPlugin::default())
        .add_plugins(GamePlugin)
        .add_systems(Update, exit_on_game_over)
        .run()
}
