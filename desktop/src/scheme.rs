//! Registering the application as the OS handler for its URI scheme.
//!
//! - Linux: an XDG desktop entry plus `xdg-mime default`
//! - Windows: `HKCU\Software\Classes\<scheme>` via `reg add`
//! - macOS: the scheme is declared in the bundle's `Info.plist`, so there is
//!   nothing to do at runtime

use crate::error::{DesktopError, Result};
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

/// Result of a registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemeRegistration {
    /// The OS now routes the scheme to this executable.
    Registered,
    /// The platform declares schemes statically; nothing was changed.
    Static,
}

/// Register `exe` as the handler for `scheme://` URIs.
///
/// # Errors
///
/// Returns `DesktopError::SchemeRegistration` if a registration command
/// fails, or `DesktopError::Io` if the desktop entry cannot be written.
pub async fn register_scheme(scheme: &str, app_name: &str, exe: &Path) -> Result<SchemeRegistration> {
    #[cfg(target_os = "linux")]
    {
        register_xdg(scheme, app_name, exe).await
    }

    #[cfg(target_os = "windows")]
    {
        let _ = app_name;
        for args in windows_registry_commands(scheme, exe) {
            run("reg", &args).await?;
        }
        info!(scheme, "Registered URI scheme in HKCU");
        Ok(SchemeRegistration::Registered)
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        let _ = (app_name, exe);
        info!(scheme, "URI scheme is declared by the app bundle");
        Ok(SchemeRegistration::Static)
    }
}

#[cfg(target_os = "linux")]
async fn register_xdg(scheme: &str, app_name: &str, exe: &Path) -> Result<SchemeRegistration> {
    let applications = dirs::data_dir()
        .ok_or_else(|| DesktopError::SchemeRegistration("no XDG data directory".to_string()))?
        .join("applications");
    tokio::fs::create_dir_all(&applications).await?;

    let file_name = desktop_file_name(app_name);
    let entry_path = applications.join(&file_name);
    tokio::fs::write(&entry_path, desktop_entry(app_name, exe, scheme)).await?;
    debug!(path = %entry_path.display(), "Wrote desktop entry");

    let mime = format!("x-scheme-handler/{scheme}");
    run("xdg-mime", &["default".to_string(), file_name, mime]).await?;

    info!(scheme, "Registered URI scheme with xdg-mime");
    Ok(SchemeRegistration::Registered)
}

#[allow(dead_code)]
async fn run(program: &str, args: &[String]) -> Result<()> {
    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| DesktopError::SchemeRegistration(format!("{program}: {e}")))?;

    if output.status.success() {
        Ok(())
    } else {
        Err(DesktopError::SchemeRegistration(format!(
            "{program} exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }
}

/// File name of the XDG desktop entry for `app_name`.
#[must_use]
pub fn desktop_file_name(app_name: &str) -> String {
    format!("{}-handler.desktop", app_name.to_lowercase().replace(' ', "-"))
}

/// Contents of the XDG desktop entry routing `scheme` to `exe`.
#[must_use]
pub fn desktop_entry(app_name: &str, exe: &Path, scheme: &str) -> String {
    format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name={app_name}\n\
         Exec=\"{}\" %u\n\
         Terminal=false\n\
         NoDisplay=true\n\
         MimeType=x-scheme-handler/{scheme};\n",
        exe.display()
    )
}

/// `reg add` argument lists that register `scheme` under the current user.
#[must_use]
pub fn windows_registry_commands(scheme: &str, exe: &Path) -> Vec<Vec<String>> {
    let key = format!(r"HKCU\Software\Classes\{scheme}");
    let command = format!("\"{}\" \"%1\"", exe.display());

    let add = |key: String, name: Option<&str>, data: String| {
        let mut args = vec!["add".to_string(), key];
        match name {
            Some(name) => args.extend(["/v".to_string(), name.to_string()]),
            None => args.push("/ve".to_string()),
        }
        args.extend(["/d".to_string(), data, "/f".to_string()]);
        args
    };

    vec![
        add(key.clone(), None, format!("URL:{scheme} Protocol")),
        add(key.clone(), Some("URL Protocol"), String::new()),
        add(format!(r"{key}\shell\open\command"), None, command),
    ]
}
