//! Foreground probe backends for this host.
//!
//! The core trait stays platform-agnostic; the lookups live here. macOS
//! asks System Events via osascript, other unixes ask the X server via
//! xprop. Both shell out, so a missing tool degrades into probe errors
//! the tracker already knows how to absorb.

use std::sync::Arc;

use async_trait::async_trait;
use pomotrace_core::{ForegroundApp, ForegroundProbe, ProbeError};

/// Queries the operating system for the frontmost application.
pub struct SystemProbe;

#[async_trait]
impl ForegroundProbe for SystemProbe {
    async fn foreground_app(&self) -> Result<ForegroundApp, ProbeError> {
        query_system().await
    }
}

#[cfg(target_os = "macos")]
async fn query_system() -> Result<ForegroundApp, ProbeError> {
    let output = tokio::process::Command::new("osascript")
        .arg("-e")
        .arg(
            "tell application \"System Events\" to get {bundle identifier, name} \
             of first application process whose frontmost is true",
        )
        .output()
        .await
        .map_err(|e| ProbeError::Unavailable(format!("osascript: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ProbeError::QueryFailed(stderr.trim().to_string()));
    }

    // Reply shape: "com.example.app, Example App"
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.trim();
    let (id, name) = line
        .split_once(", ")
        .ok_or_else(|| ProbeError::QueryFailed(format!("unparseable reply: {line}")))?;
    if id.is_empty() || id == "missing value" {
        return Err(ProbeError::NoForegroundApp);
    }
    Ok(ForegroundApp::new(id, name))
}

#[cfg(all(unix, not(target_os = "macos")))]
async fn query_system() -> Result<ForegroundApp, ProbeError> {
    // X11 only: _NET_ACTIVE_WINDOW names the focused window, WM_CLASS its
    // instance and class strings.
    let root = tokio::process::Command::new("xprop")
        .args(["-root", "_NET_ACTIVE_WINDOW"])
        .output()
        .await
        .map_err(|e| ProbeError::Unavailable(format!("xprop: {e}")))?;
    if !root.status.success() {
        return Err(ProbeError::Unavailable(
            "xprop -root failed, is an X display available?".to_string(),
        ));
    }

    let stdout = String::from_utf8_lossy(&root.stdout);
    let window_id = stdout
        .rsplit_once("# ")
        .map(|(_, id)| id.trim().trim_end_matches(',').to_string())
        .ok_or(ProbeError::NoForegroundApp)?;
    if window_id == "0x0" {
        return Err(ProbeError::NoForegroundApp);
    }

    let class = tokio::process::Command::new("xprop")
        .args(["-id", &window_id, "WM_CLASS"])
        .output()
        .await
        .map_err(|e| ProbeError::Unavailable(format!("xprop: {e}")))?;
    if !class.status.success() {
        return Err(ProbeError::QueryFailed(format!(
            "xprop -id {window_id} failed"
        )));
    }

    let stdout = String::from_utf8_lossy(&class.stdout);
    parse_wm_class(&stdout)
        .ok_or_else(|| ProbeError::QueryFailed(format!("unparseable WM_CLASS: {}", stdout.trim())))
}

/// Parse `WM_CLASS(STRING) = "navigator", "Firefox"` into instance and
/// class. The instance becomes the stable id, the class the display name.
#[cfg(all(unix, not(target_os = "macos")))]
fn parse_wm_class(reply: &str) -> Option<ForegroundApp> {
    let (_, values) = reply.split_once('=')?;
    let mut names = values.split(',').map(|v| v.trim().trim_matches('"'));
    let instance = names.next()?;
    if instance.is_empty() {
        return None;
    }
    let class = names.next().filter(|c| !c.is_empty()).unwrap_or(instance);
    Some(ForegroundApp::new(instance, class))
}

#[cfg(not(unix))]
async fn query_system() -> Result<ForegroundApp, ProbeError> {
    Err(ProbeError::Unavailable(
        "no probe backend for this platform".to_string(),
    ))
}

/// Always reports the same application. Headless hosts and the CLI tests
/// select it with POMOTRACE_PROBE=static[:id[:name]].
pub struct StaticProbe {
    app: ForegroundApp,
}

#[async_trait]
impl ForegroundProbe for StaticProbe {
    async fn foreground_app(&self) -> Result<ForegroundApp, ProbeError> {
        Ok(self.app.clone())
    }
}

/// Pick the probe backend from the POMOTRACE_PROBE environment variable,
/// defaulting to the system probe.
pub fn probe_from_env() -> Arc<dyn ForegroundProbe> {
    match std::env::var("POMOTRACE_PROBE") {
        Ok(value) if value == "static" || value.starts_with("static:") => {
            let mut parts = value.splitn(3, ':').skip(1);
            let id = parts
                .next()
                .filter(|s| !s.is_empty())
                .unwrap_or("static-app")
                .to_string();
            let name = parts
                .next()
                .filter(|s| !s.is_empty())
                .unwrap_or(&id)
                .to_string();
            Arc::new(StaticProbe {
                app: ForegroundApp::new(id, name),
            })
        }
        _ => Arc::new(SystemProbe),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(all(unix, not(target_os = "macos")))]
    #[test]
    fn wm_class_parses_instance_and_class() {
        let app = parse_wm_class("WM_CLASS(STRING) = \"navigator\", \"Firefox\"").unwrap();
        assert_eq!(app.id, "navigator");
        assert_eq!(app.display_name, "Firefox");
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    #[test]
    fn wm_class_without_class_falls_back_to_instance() {
        let app = parse_wm_class("WM_CLASS(STRING) = \"alacritty\"").unwrap();
        assert_eq!(app.id, "alacritty");
        assert_eq!(app.display_name, "alacritty");
    }

    #[tokio::test]
    async fn static_probe_reports_fixed_app() {
        let probe = StaticProbe {
            app: ForegroundApp::new("editor", "Editor"),
        };
        let app = probe.foreground_app().await.unwrap();
        assert_eq!(app.id, "editor");
    }
}
