//! Runs every script under `tests/scripts`.
//!
//! Scripts in `ok/` must load and render. Scripts in `errors/` must fail to
//! load, and their first line names the expected message:
//!
//! ```text
//! # error: division by zero
//! ```

use datatest_stable::Utf8Path;
use minkowski::{Diagram, RecordingCanvas, Tick};
use std::sync::Once;
use std::time::Duration;

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// The message named by a leading `# error:` comment
fn expected_error(source: &str) -> Option<&str> {
    source
        .lines()
        .next()?
        .strip_prefix("# error:")
        .map(str::trim)
}

fn test_script_file(path: &Utf8Path) -> datatest_stable::Result<()> {
    init_tracing();
    let source = std::fs::read_to_string(path)?;
    let is_error_case = path.components().any(|c| c.as_str() == "errors");

    match (Diagram::load(path.as_str(), &source), is_error_case) {
        (Ok(mut diagram), false) => {
            let mut canvas = RecordingCanvas::new();
            diagram.render(&mut canvas);
            if canvas.ops().len() < 2 {
                return Err(format!("{path}: nothing was drawn").into());
            }

            // Walk a few frames of any animation to make sure every frame runs
            if let Some(mut driver) = diagram.animation_driver() {
                driver.play();
                for i in 0..5u64 {
                    if let Tick::Frame(frame) | Tick::Finished(frame) = driver.tick(Duration::from_millis(i * 33)) {
                        diagram.show_frame(frame).map_err(|e| format!("{:?}", diagram.report(e)))?;
                    }
                }
            }
            Ok(())
        }
        (Ok(_), true) => Err(format!("{path}: expected an error, but the script loaded").into()),
        (Err(e), false) => {
            let report = e.into_report(&minkowski::SourceContext::new(path.as_str(), source.as_str()));
            Err(format!("{path}: {report:?}").into())
        }
        (Err(e), true) => {
            let expected = expected_error(&source)
                .ok_or_else(|| format!("{path}: error scripts must start with `# error: <message>`"))?;
            let message = e.to_string();
            if message.contains(expected) {
                Ok(())
            } else {
                Err(format!("{path}: expected error containing {expected:?}, got {message:?}").into())
            }
        }
    }
}

datatest_stable::harness! {
    { test = test_script_file, root = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/scripts"), pattern = r"\.mink$" },
}
