//! Folder icon attachment.
//!
//! Attaching an icon to a folder is a platform capability: a `desktop.ini`
//! sidecar naming the icon resource, hidden+system attributes on the sidecar,
//! a system attribute on the folder itself, and a shell nudge to rebuild icon
//! caches. Platforms without folder-icon customization report
//! [`ApplyError::Unsupported`] instead of pretending success.

use std::path::Path;

use log::info;

#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error("folder icons are not supported on this platform")]
    Unsupported,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("shell integration failed: {0}")]
    Shell(String),
}

/// Capability seam for attaching an icon file to a folder.
pub trait IconApplier {
    fn apply(&self, folder: &Path, icon: &Path) -> Result<(), ApplyError>;
}

/// Production applier backed by the platform shell.
pub struct ShellIconApplier;

impl IconApplier for ShellIconApplier {
    fn apply(&self, folder: &Path, icon: &Path) -> Result<(), ApplyError> {
        if !platform::FOLDER_ICONS_SUPPORTED {
            return Err(ApplyError::Unsupported);
        }

        let icon_absolute = std::path::absolute(icon)?;
        let ini_path = folder.join("desktop.ini");
        std::fs::write(&ini_path, desktop_ini_contents(&icon_absolute))?;
        platform::finalize_folder_icon(folder, &ini_path)?;

        info!("Set icon for folder: {}", folder.display());
        Ok(())
    }
}

/// Sidecar contents understood by the shell: the icon resource (index 0) plus
/// the generic view-state block.
pub fn desktop_ini_contents(icon_path: &Path) -> String {
    format!(
        "[.ShellClassInfo]\r\nIconResource={},0\r\n[ViewState]\r\nMode=\r\nVid=\r\nFolderType=Generic\r\n",
        icon_path.display()
    )
}

#[cfg(windows)]
mod platform {
    use std::iter::once;
    use std::os::windows::ffi::OsStrExt;
    use std::path::Path;

    use windows_sys::Win32::Storage::FileSystem::{
        SetFileAttributesW, FILE_ATTRIBUTE_HIDDEN, FILE_ATTRIBUTE_SYSTEM,
    };
    use windows_sys::Win32::UI::Shell::{SHChangeNotify, SHCNE_ASSOCCHANGED, SHCNF_IDLIST};

    use super::ApplyError;

    pub const FOLDER_ICONS_SUPPORTED: bool = true;

    pub fn finalize_folder_icon(folder: &Path, ini_path: &Path) -> Result<(), ApplyError> {
        set_attributes(ini_path, FILE_ATTRIBUTE_HIDDEN | FILE_ATTRIBUTE_SYSTEM)?;
        // The folder must carry the system attribute for Explorer to honor a
        // custom icon.
        set_attributes(folder, FILE_ATTRIBUTE_SYSTEM)?;
        unsafe {
            SHChangeNotify(
                SHCNE_ASSOCCHANGED,
                SHCNF_IDLIST,
                std::ptr::null(),
                std::ptr::null(),
            );
        }
        Ok(())
    }

    fn set_attributes(path: &Path, attributes: u32) -> Result<(), ApplyError> {
        let wide: Vec<u16> = path.as_os_str().encode_wide().chain(once(0)).collect();
        let result = unsafe { SetFileAttributesW(wide.as_ptr(), attributes) };
        if result == 0 {
            return Err(ApplyError::Shell(format!(
                "SetFileAttributesW failed for {}: {}",
                path.display(),
                std::io::Error::last_os_error()
            )));
        }
        Ok(())
    }
}

#[cfg(not(windows))]
mod platform {
    use std::path::Path;

    use super::ApplyError;

    pub const FOLDER_ICONS_SUPPORTED: bool = false;

    pub fn finalize_folder_icon(_folder: &Path, _ini_path: &Path) -> Result<(), ApplyError> {
        Err(ApplyError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::desktop_ini_contents;

    #[test]
    fn test_desktop_ini_fields() {
        let contents = desktop_ini_contents(Path::new("C:\\icons\\Inception.ico"));
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(
            lines,
            [
                "[.ShellClassInfo]",
                "IconResource=C:\\icons\\Inception.ico,0",
                "[ViewState]",
                "Mode=",
                "Vid=",
                "FolderType=Generic",
            ]
        );
        assert!(contents.ends_with("\r\n"));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_unsupported_platform_is_explicit() {
        use super::{ApplyError, IconApplier, ShellIconApplier};

        let dir = tempfile::tempdir().unwrap();
        let result = ShellIconApplier.apply(dir.path(), Path::new("icon.ico"));
        assert!(matches!(result, Err(ApplyError::Unsupported)));
    }
}
