//! ComfyUI manager
//!
//! Configurations pair a ComfyUI checkout with its virtualenv. They come from
//! template detection or are entered by hand, and the chosen one is
//! remembered in the workspace settings file. Everything else is delegated to
//! comfy-cli running inside that virtualenv.

pub mod cli;
pub mod detect;
pub mod manage;
pub mod settings;

use std::path::PathBuf;

use crate::core::process::Cmd;
use crate::error::{PodrigError, Result};
use crate::tui::app::App;
use crate::tui::menu::{MenuOption, MenuSpec};
use crate::tui::theme::Tone;

use self::cli::{comfy_cmd, ensure_cli};
use self::detect::{all_configurations, current, detect_templates, validate};
use self::settings::{ComfyConfig, Settings, TemplateKind, SETTINGS_FILE};

pub const SERVER_PORT: u16 = 8188;

fn settings_path(app: &App) -> PathBuf {
    app.workspace_file(SETTINGS_FILE)
}

fn load_settings(app: &App) -> Settings {
    Settings::load(&settings_path(app))
}

/// Saved `last_used` configuration, else the first detected template
pub fn current_configuration(app: &App) -> Option<ComfyConfig> {
    let detected = detect_templates(&app.config().workspace_dir);
    current(&load_settings(app), &detected)
}

/// Subtitle for ComfyUI menus
pub fn active_label(app: &App) -> String {
    match current_configuration(app) {
        Some(cfg) => format!("Active: {}", cfg.name),
        None => "No active configuration".to_string(),
    }
}

fn require_current(app: &mut App) -> Result<ComfyConfig> {
    let config = current_configuration(app).ok_or_else(|| {
        PodrigError::missing(
            "ComfyUI",
            "Please configure ComfyUI first using 'Configure ComfyUI'.",
        )
    })?;
    app.say(Tone::Info, format!("Using configuration: {}", config.name));
    Ok(config)
}

fn report_issues(app: &mut App, issues: &[String]) {
    app.section("Configuration Issues:");
    for issue in issues {
        app.bullet(Tone::Error, issue.clone());
    }
}

/// Current configuration, validated and with comfy-cli ready
pub fn prepare(app: &mut App) -> Result<ComfyConfig> {
    let config = require_current(app)?;
    let issues = validate(&config);
    if !issues.is_empty() {
        report_issues(app, &issues);
        return Err(PodrigError::InvalidInput(format!(
            "Configuration '{}' has {} issue(s). Fix them or choose another configuration.",
            config.name,
            issues.len()
        )));
    }
    ensure_cli(app, &config)?;
    Ok(config)
}

fn set_last_used(app: &mut App, config: ComfyConfig) -> Result<()> {
    let path = settings_path(app);
    let mut settings = Settings::load(&path);
    settings.last_used = Some(config.name.clone());
    if settings.find(&config.name).is_none() {
        settings.upsert(config);
    }
    settings.save(&path)?;
    tracing::info!(name = ?settings.last_used, "active ComfyUI configuration changed");
    Ok(())
}

/// Look for known templates and offer to use a single match
pub fn auto_detect(app: &mut App) -> Result<()> {
    app.heading("Auto-detect ComfyUI");
    let detected = detect_templates(&app.config().workspace_dir);
    if detected.is_empty() {
        app.say(Tone::Warning, "No ComfyUI templates detected.");
        app.say(Tone::Muted, "Use 'Add Custom Configuration' to enter paths by hand.");
        return Ok(());
    }

    app.say(
        Tone::Success,
        format!("Detected {} ComfyUI template(s):", detected.len()),
    );
    for cfg in &detected {
        app.bullet(Tone::Normal, format!("{} ({})", cfg.name, cfg.comfyui_path.display()));
    }

    if let [only] = detected.as_slice() {
        if app.confirm(&format!("Use '{}' as the active configuration?", only.name), true) {
            set_last_used(app, only.clone())?;
            app.say(Tone::Success, format!("Active configuration: {}", only.name));
        }
    } else {
        app.say(Tone::Muted, "Use 'Select Configuration' to choose one.");
    }
    Ok(())
}

/// Table of every known configuration with its validity
pub fn list(app: &mut App) -> Result<()> {
    app.heading("ComfyUI Configurations");
    let settings = load_settings(app);
    let detected = detect_templates(&app.config().workspace_dir);
    let all = all_configurations(&settings, &detected);
    if all.is_empty() {
        app.say(Tone::Warning, "No configurations found.");
        return Ok(());
    }

    let glyphs = app.glyphs();
    let active = current(&settings, &detected).map(|c| c.name);
    let rows: Vec<Vec<String>> = all
        .iter()
        .map(|cfg| {
            let issues = validate(cfg);
            let state = if issues.is_empty() {
                format!("{} valid", glyphs.ok)
            } else {
                format!("{} {} issue(s)", glyphs.issue, issues.len())
            };
            let marker = if active.as_deref() == Some(cfg.name.as_str()) {
                "*"
            } else {
                ""
            };
            vec![
                format!("{}{}", cfg.name, marker),
                cfg.kind.to_string(),
                cfg.comfyui_path.display().to_string(),
                cfg.venv_path.display().to_string(),
                state,
            ]
        })
        .collect();
    app.table(&["Name", "Type", "ComfyUI", "Venv", "Status"], &rows);
    app.blank();
    app.say(Tone::Muted, "* active configuration");
    Ok(())
}

/// Pick the active configuration from a menu
pub fn select(app: &mut App) -> Result<()> {
    let settings = load_settings(app);
    let detected = detect_templates(&app.config().workspace_dir);
    let all = all_configurations(&settings, &detected);
    if all.is_empty() {
        return Err(PodrigError::missing(
            "ComfyUI",
            "No configurations found. Run 'Auto-detect' or 'Add Custom Configuration' first.",
        ));
    }

    let mut opts: Vec<MenuOption> = all
        .iter()
        .map(|cfg| {
            let source = if cfg.detected { "detected" } else { "saved" };
            MenuOption::new(
                cfg.name.clone(),
                format!("{} ({})", cfg.comfyui_path.display(), source),
            )
        })
        .collect();
    opts.push(MenuOption::new("Back", "Cancel selection"));

    let spec = MenuSpec::new("Select Configuration", opts)?
        .breadcrumbs(["Home", "ComfyUI", "Configure", "Select"]);
    let index = app.menu(&spec);
    let Some(chosen) = all.get(index).cloned() else {
        return Err(PodrigError::Cancelled);
    };

    let issues = validate(&chosen);
    if !issues.is_empty() {
        report_issues(app, &issues);
        if !app.confirm("Use this configuration anyway?", false) {
            return Err(PodrigError::Cancelled);
        }
    }
    let name = chosen.name.clone();
    set_last_used(app, chosen)?;
    app.say(Tone::Success, format!("Active configuration: {}", name));
    Ok(())
}

/// Enter paths by hand and save them under a name
pub fn add_custom(app: &mut App) -> Result<()> {
    app.heading("Add Custom Configuration");
    let ask = |app: &mut App, question: &str, default: &str| -> Result<String> {
        let answer = app
            .ask(question, Some(default))
            .ok_or(PodrigError::Cancelled)?;
        let answer = answer.trim().to_string();
        if answer.is_empty() {
            return Err(PodrigError::InvalidInput(format!("{} cannot be empty.", question)));
        }
        Ok(answer)
    };

    let name = ask(app, "Configuration name", "Custom")?;
    let default_comfyui = app.workspace_file("ComfyUI");
    let comfyui_path = PathBuf::from(ask(app, "ComfyUI path", default_comfyui.to_string_lossy().as_ref())?);
    let default_venv = comfyui_path.join("venv");
    let venv_path = PathBuf::from(ask(
        app,
        "Virtual environment path",
        default_venv.to_string_lossy().as_ref(),
    )?);

    let config = ComfyConfig {
        name: name.clone(),
        kind: TemplateKind::Custom,
        comfyui_path,
        venv_path,
        detected: false,
    };

    let issues = validate(&config);
    if !issues.is_empty() {
        report_issues(app, &issues);
        if !app.confirm("Save this configuration anyway?", false) {
            return Err(PodrigError::Cancelled);
        }
    }

    let path = settings_path(app);
    let mut settings = Settings::load(&path);
    if settings.find(&name).is_some()
        && !app.confirm(&format!("Configuration '{}' exists. Overwrite?", name), false)
    {
        return Err(PodrigError::Cancelled);
    }
    settings.upsert(config);
    settings.last_used = Some(name.clone());
    settings.save(&path)?;

    tracing::info!(%name, "custom ComfyUI configuration saved");
    app.say(Tone::Success, format!("Saved and activated '{}'.", name));
    Ok(())
}

fn launch_command(config: &ComfyConfig) -> Cmd {
    comfy_cmd(config).args([
        "launch".to_string(),
        "--background".to_string(),
        "--".to_string(),
        "--listen".to_string(),
        "0.0.0.0".to_string(),
        "--port".to_string(),
        SERVER_PORT.to_string(),
    ])
}

/// Start the server in the background
pub fn launch(app: &mut App) -> Result<()> {
    app.heading("Launch ComfyUI");
    let config = prepare(app)?;
    app.say(Tone::Info, "Starting ComfyUI in the background...");
    cli::run(app, &launch_command(&config))?;
    app.say(Tone::Success, format!("ComfyUI is starting on port {}.", SERVER_PORT));
    if let Some(pod_id) = app.env().pod_id.clone() {
        app.field(
            "Proxy URL",
            format!("https://{}-{}.proxy.runpod.net", pod_id, SERVER_PORT),
        );
    }
    Ok(())
}

/// Stop the background server
pub fn stop(app: &mut App) -> Result<()> {
    app.heading("Stop ComfyUI");
    let config = prepare(app)?;
    cli::run(app, &comfy_cmd(&config).arg("stop"))?;
    app.say(Tone::Success, "ComfyUI stopped.");
    Ok(())
}

/// Configuration details, validation and whether the server runs
pub fn status(app: &mut App) -> Result<()> {
    app.heading("ComfyUI Status");
    let config = require_current(app)?;

    app.section("Configuration:");
    app.field("  Name", config.name.clone());
    app.field("  Type", config.kind.to_string());
    app.field("  ComfyUI Path", config.comfyui_path.display().to_string());
    app.field("  Venv Path", config.venv_path.display().to_string());

    let issues = validate(&config);
    if issues.is_empty() {
        app.say(Tone::Success, "Installation is valid.");
    } else {
        report_issues(app, &issues);
    }

    let running = app
        .runner()
        .output(&Cmd::new("pgrep").args(["-f", "main.py"]))
        .map(|out| out.success)
        .unwrap_or(false);
    app.section("Server:");
    if running {
        app.say(Tone::Success, format!("ComfyUI is running (port {}).", SERVER_PORT));
    } else {
        app.say(Tone::Warning, "ComfyUI is not running.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::process::{CommandOutput, MockCommandRunner};
    use crate::core::Config;
    use crate::tui::input::{KeyEvent, ScriptedKeys};
    use crate::tui::prompt::ScriptedPrompt;
    use crate::tui::sink::MemorySink;
    use std::fs;
    use std::path::Path;

    fn install(root: &Path, venv: &str) {
        fs::create_dir_all(root.join("models")).unwrap();
        fs::create_dir_all(root.join("custom_nodes")).unwrap();
        fs::write(root.join("main.py"), "").unwrap();
        fs::create_dir_all(root.join(venv).join("bin")).unwrap();
        fs::write(root.join(venv).join("bin").join("python"), "").unwrap();
    }

    fn app_in(workspace: &Path, runner: MockCommandRunner, answers: Vec<&str>, sink: &MemorySink) -> App {
        App::new(Config {
            workspace_dir: workspace.to_path_buf(),
            ..Config::default()
        })
        .with_runner(runner)
        .with_output(sink.clone())
        .with_prompt(ScriptedPrompt::new(answers))
    }

    #[test]
    fn test_active_label() {
        let ws = tempfile::tempdir().unwrap();
        let sink = MemorySink::new();
        let app = app_in(ws.path(), MockCommandRunner::new(), vec![], &sink);
        assert_eq!(active_label(&app), "No active configuration");

        install(&ws.path().join("ComfyUI"), ".venv");
        assert_eq!(active_label(&app), "Active: Standard ComfyUI (.venv)");
    }

    #[test]
    fn test_prepare_without_configuration() {
        let ws = tempfile::tempdir().unwrap();
        let sink = MemorySink::new();
        let mut app = app_in(ws.path(), MockCommandRunner::new(), vec![], &sink);

        let err = prepare(&mut app).unwrap_err();
        assert!(matches!(err, PodrigError::ConfigurationMissing { .. }));
        assert!(err.to_string().contains("Configure ComfyUI"));
    }

    #[test]
    fn test_prepare_rejects_invalid_install() {
        let ws = tempfile::tempdir().unwrap();
        fs::create_dir_all(ws.path().join("ComfyUI")).unwrap();
        let sink = MemorySink::new();
        let mut runner = MockCommandRunner::new();
        runner.expect_output().never();
        let mut app = app_in(ws.path(), runner, vec![], &sink);

        let err = prepare(&mut app).unwrap_err();
        assert!(matches!(err, PodrigError::InvalidInput(_)));
        assert!(!sink.lines_with(Tone::Error).is_empty());
    }

    #[test]
    fn test_auto_detect_saves_single_match() {
        let ws = tempfile::tempdir().unwrap();
        install(&ws.path().join("madapps").join("ComfyUI"), ".venv");
        let sink = MemorySink::new();
        let mut app = app_in(ws.path(), MockCommandRunner::new(), vec!["y"], &sink);

        auto_detect(&mut app).unwrap();

        let saved = Settings::load(&ws.path().join(SETTINGS_FILE));
        assert_eq!(saved.last_used.as_deref(), Some("Slim Template"));
        assert!(saved.find("Slim Template").is_some_and(|c| c.detected));
    }

    #[test]
    fn test_add_custom_then_overwrite_declined() {
        let ws = tempfile::tempdir().unwrap();
        let comfy = ws.path().join("mine");
        install(&comfy, "venv");
        let comfy_str = comfy.to_string_lossy().to_string();
        let sink = MemorySink::new();
        let mut app = app_in(
            ws.path(),
            MockCommandRunner::new(),
            vec!["Mine", comfy_str.as_str(), "", "Mine", comfy_str.as_str(), "", "n"],
            &sink,
        );

        add_custom(&mut app).unwrap();
        let saved = Settings::load(&ws.path().join(SETTINGS_FILE));
        let cfg = saved.find("Mine").unwrap();
        assert_eq!(cfg.venv_path, comfy.join("venv"));
        assert_eq!(cfg.kind, TemplateKind::Custom);
        assert_eq!(saved.last_used.as_deref(), Some("Mine"));

        let err = add_custom(&mut app).unwrap_err();
        assert!(matches!(err, PodrigError::Cancelled));
    }

    #[test]
    fn test_add_custom_invalid_needs_confirmation() {
        let ws = tempfile::tempdir().unwrap();
        let sink = MemorySink::new();
        let mut app = app_in(ws.path(), MockCommandRunner::new(), vec!["X", "/nope", "", "n"], &sink);

        let err = add_custom(&mut app).unwrap_err();
        assert!(matches!(err, PodrigError::Cancelled));
        assert!(!ws.path().join(SETTINGS_FILE).exists());
    }

    #[test]
    fn test_select_from_menu() {
        let ws = tempfile::tempdir().unwrap();
        install(&ws.path().join("ComfyUI"), ".venv");
        install(&ws.path().join("madapps").join("ComfyUI"), ".venv");
        let sink = MemorySink::new();
        let mut app = app_in(ws.path(), MockCommandRunner::new(), vec![], &sink)
            .with_keys(ScriptedKeys::line([KeyEvent::Number(2)]));

        select(&mut app).unwrap();
        let saved = Settings::load(&ws.path().join(SETTINGS_FILE));
        assert_eq!(saved.last_used.as_deref(), Some("Slim Template"));
    }

    #[test]
    fn test_select_back_is_cancel() {
        let ws = tempfile::tempdir().unwrap();
        install(&ws.path().join("ComfyUI"), ".venv");
        let sink = MemorySink::new();
        let mut app = app_in(ws.path(), MockCommandRunner::new(), vec![], &sink)
            .with_keys(ScriptedKeys::line([KeyEvent::Escape]));

        assert!(matches!(select(&mut app), Err(PodrigError::Cancelled)));
    }

    #[test]
    fn test_launch_command() {
        let cfg = ComfyConfig {
            name: "x".into(),
            kind: TemplateKind::Custom,
            comfyui_path: "/w/ComfyUI".into(),
            venv_path: "/w/ComfyUI/venv".into(),
            detected: false,
        };
        let cmd = launch_command(&cfg);
        let args: Vec<&str> = cmd.args.iter().skip(2).map(String::as_str).collect();
        assert_eq!(
            args,
            vec!["launch", "--background", "--", "--listen", "0.0.0.0", "--port", "8188"]
        );
    }

    #[test]
    fn test_status_reports_server() {
        let ws = tempfile::tempdir().unwrap();
        install(&ws.path().join("ComfyUI"), ".venv");
        let mut runner = MockCommandRunner::new();
        runner
            .expect_output()
            .withf(|cmd| cmd.is(&["pgrep", "-f", "main.py"]))
            .returning(|_| Ok(CommandOutput::ok("4242\n")));
        let sink = MemorySink::new();
        let mut app = app_in(ws.path(), runner, vec![], &sink);

        status(&mut app).unwrap();
        assert!(sink.text().contains("Installation is valid."));
        assert!(sink.text().contains("ComfyUI is running (port 8188)."));
    }
}
