//! Run-at-login registration under the per-user `Run` key
//!
//! Failures are logged and otherwise ignored; the overlay works the same
//! whether or not it starts with the session.

pub const RUN_KEY_PATH: &str = r"SOFTWARE\Microsoft\Windows\CurrentVersion\Run";

/// Registry value data for `exe`: the quoted path
pub fn run_command(exe: &std::path::Path) -> String {
    format!("\"{}\"", exe.display())
}

#[cfg(windows)]
mod imp {
    use windows::core::PCWSTR;
    use windows::Win32::Foundation::ERROR_FILE_NOT_FOUND;
    use windows::Win32::System::Registry::{
        RegCloseKey, RegDeleteValueW, RegOpenKeyExW, RegQueryValueExW, RegSetValueExW, HKEY,
        HKEY_CURRENT_USER, KEY_READ, KEY_SET_VALUE, REG_SAM_FLAGS, REG_SZ,
    };

    use super::{run_command, RUN_KEY_PATH};
    use crate::config::APP_NAME;
    use crate::error::{OverlayError, Result};
    use crate::host::wide;

    /// Open Run key, closed on drop
    struct RunKey(HKEY);

    impl RunKey {
        fn open(access: REG_SAM_FLAGS) -> Result<Self> {
            let path = wide(RUN_KEY_PATH);
            let mut hkey = HKEY::default();
            let status = unsafe { RegOpenKeyExW(HKEY_CURRENT_USER, PCWSTR(path.as_ptr()), 0, access, &mut hkey) };
            status
                .ok()
                .map_err(|e| OverlayError::Registry(format!("open Run key: {}", e)))?;
            Ok(Self(hkey))
        }
    }

    impl Drop for RunKey {
        fn drop(&mut self) {
            unsafe {
                let _ = RegCloseKey(self.0);
            }
        }
    }

    pub fn is_enabled() -> Result<bool> {
        let key = RunKey::open(KEY_READ)?;
        let name = wide(APP_NAME);
        let mut size: u32 = 0;
        let status = unsafe { RegQueryValueExW(key.0, PCWSTR(name.as_ptr()), None, None, None, Some(&mut size)) };
        Ok(status.is_ok())
    }

    pub fn set_enabled(enabled: bool) -> Result<()> {
        let key = RunKey::open(KEY_SET_VALUE)?;
        let name = wide(APP_NAME);

        let status = if enabled {
            let exe = std::env::current_exe().map_err(|e| OverlayError::Registry(e.to_string()))?;
            let data = wide(&run_command(&exe));
            let bytes: Vec<u8> = data.iter().flat_map(|c| c.to_le_bytes()).collect();
            unsafe { RegSetValueExW(key.0, PCWSTR(name.as_ptr()), 0, REG_SZ, Some(&bytes)) }
        } else {
            let status = unsafe { RegDeleteValueW(key.0, PCWSTR(name.as_ptr())) };
            if status == ERROR_FILE_NOT_FOUND {
                return Ok(());
            }
            status
        };

        status.ok().map_err(|e| OverlayError::Registry(e.to_string()))
    }
}

#[cfg(not(windows))]
mod imp {
    use crate::error::Result;

    pub fn is_enabled() -> Result<bool> {
        Ok(false)
    }

    pub fn set_enabled(_enabled: bool) -> Result<()> {
        Ok(())
    }
}

/// Whether the Run value exists. Errors read as "not registered".
pub fn is_enabled() -> bool {
    imp::is_enabled().unwrap_or_else(|e| {
        tracing::warn!("Could not read startup registration: {}", e);
        false
    })
}

pub fn set_enabled(enabled: bool) {
    match imp::set_enabled(enabled) {
        Ok(()) => tracing::info!(enabled, "Startup registration updated"),
        Err(e) => tracing::warn!("Could not update startup registration: {}", e),
    }
}

/// Register for login. Always rewrites the value so a moved executable
/// replaces the stale path.
pub fn ensure_enabled() {
    set_enabled(true);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_run_command_is_quoted() {
        let cmd = run_command(Path::new("/opt/menu 500/menu500_tracker"));
        assert_eq!(cmd, "\"/opt/menu 500/menu500_tracker\"");
    }

    #[test]
    fn test_run_command_follows_moved_exe() {
        let old = run_command(Path::new("/old/place/menu500_tracker"));
        let new = run_command(Path::new("/new/place/menu500_tracker"));
        assert_ne!(old, new);
        assert_eq!(new, "\"/new/place/menu500_tracker\"");
    }

    #[cfg(not(windows))]
    #[test]
    fn test_noop_off_windows() {
        set_enabled(true);
        assert!(!is_enabled());
        ensure_enabled();
    }
}
