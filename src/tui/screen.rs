//! Screen composition
//!
//! A screen is a menu plus a handler for the chosen index. Screens nest as a
//! plain call stack: a handler that opens a child screen calls [`run_screen`]
//! again and maps the child's result with [`Flow::from_child`].

use crate::error::{PodrigError, Result};
use crate::tui::app::App;
use crate::tui::menu::MenuSpec;
use crate::tui::theme::Tone;

/// What a screen does after handling a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Show this screen again
    Stay,
    /// Return to the parent screen
    Back,
    /// Leave the whole menu tree
    Exit,
}

impl Flow {
    /// A child going back keeps its parent on screen
    pub fn from_child(child: Flow) -> Flow {
        match child {
            Flow::Back => Flow::Stay,
            other => other,
        }
    }
}

/// One menu in the hierarchy
pub trait Screen {
    /// Build the menu; called before every run so subtitles stay current
    fn spec(&self, app: &App) -> Result<MenuSpec>;

    /// Handle the selected index
    fn on_select(&mut self, index: usize, app: &mut App) -> Result<Flow>;
}

/// Drive a screen until it returns `Back` or `Exit`
///
/// Handler errors are reported as a status line followed by a pause; the menu
/// is then shown again.
pub fn run_screen(app: &mut App, screen: &mut dyn Screen) -> Flow {
    loop {
        let spec = match screen.spec(app) {
            Ok(spec) => spec,
            Err(e) => {
                report_error(app, &e);
                app.pause();
                return Flow::Back;
            }
        };

        let index = app.menu(&spec);
        match screen.on_select(index, app) {
            Ok(Flow::Stay) => {}
            Ok(flow) => return flow,
            Err(e) => {
                report_error(app, &e);
                app.pause();
            }
        }
    }
}

/// Run an action for a leaf option, then wait so its output can be read
///
/// Ctrl-C during the action turns its result into [`PodrigError::Cancelled`].
pub fn run_leaf(app: &mut App, action: impl FnOnce(&mut App) -> Result<()>) -> Result<Flow> {
    let result = action(app);
    if app.interrupt().take() {
        return Err(PodrigError::Cancelled);
    }
    result?;
    app.pause();
    Ok(Flow::Stay)
}

fn report_error(app: &mut App, err: &PodrigError) {
    match err {
        PodrigError::Cancelled => app.say(Tone::Warning, "Cancelled."),
        _ => {
            tracing::warn!("Action failed: {}", err);
            app.say(Tone::Error, format!("Error: {}", err));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::tui::input::{KeyEvent, ScriptedKeys};
    use crate::tui::menu::options;
    use crate::tui::prompt::ScriptedPrompt;
    use crate::tui::sink::MemorySink;

    /// Fails on option 0, counts successes on option 1
    struct Flaky {
        ok_runs: usize,
    }

    impl Screen for Flaky {
        fn spec(&self, _app: &App) -> Result<MenuSpec> {
            MenuSpec::new("Flaky", options(&[("Fail", ""), ("Work", ""), ("Back", "")]))
        }

        fn on_select(&mut self, index: usize, _app: &mut App) -> Result<Flow> {
            match index {
                0 => Err(PodrigError::action("install", "exit status 1")),
                1 => {
                    self.ok_runs += 1;
                    Ok(Flow::Stay)
                }
                _ => Ok(Flow::Back),
            }
        }
    }

    fn app_with(keys: Vec<KeyEvent>, sink: &MemorySink) -> App {
        App::new(Config::default())
            .with_keys(ScriptedKeys::line(keys))
            .with_output(sink.clone())
            .with_prompt(ScriptedPrompt::default())
    }

    #[test]
    fn test_failure_returns_to_navigable_menu() {
        let sink = MemorySink::new();
        let mut app = app_with(
            vec![KeyEvent::Number(1), KeyEvent::Number(2), KeyEvent::Letter('b')],
            &sink,
        );
        let mut screen = Flaky { ok_runs: 0 };

        let flow = run_screen(&mut app, &mut screen);

        assert_eq!(flow, Flow::Back);
        assert_eq!(screen.ok_runs, 1);
        let errors = sink.lines_with(Tone::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("install"));
        // Menu shown before the failure, after it, and after the success
        assert_eq!(sink.frames().len(), 3);
    }

    #[test]
    fn test_from_child() {
        assert_eq!(Flow::from_child(Flow::Back), Flow::Stay);
        assert_eq!(Flow::from_child(Flow::Exit), Flow::Exit);
        assert_eq!(Flow::from_child(Flow::Stay), Flow::Stay);
    }

    #[test]
    fn test_cancelled_is_a_warning() {
        let sink = MemorySink::new();
        let mut app = app_with(Vec::new(), &sink);
        let flow = run_leaf(&mut app, |_| Err(PodrigError::Cancelled));
        assert!(flow.is_err());

        report_error(&mut app, &PodrigError::Cancelled);
        assert_eq!(sink.lines_with(Tone::Warning), vec!["Cancelled."]);
        assert!(sink.lines_with(Tone::Error).is_empty());
    }

    #[test]
    fn test_interrupt_during_leaf_cancels_it() {
        let sink = MemorySink::new();
        let mut app = app_with(Vec::new(), &sink);

        let result = run_leaf(&mut app, |app| {
            app.interrupt().raise();
            Ok(())
        });

        assert!(matches!(result, Err(PodrigError::Cancelled)));
        assert!(!app.interrupt().take());
    }
}
