//! Platform detection and host-resource resolution.
//!
//! Detects the host OS to resolve resources the chaos containers need,
//! most importantly the container runtime control socket path, whose
//! host form differs on Windows.

use crate::constants::DOCKER_SOCKET_PATH;

/// Detected platform information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    /// Operating system.
    pub os: Os,
}

/// Operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Linux,
    Darwin,
    Windows,
    Unknown,
}

impl Platform {
    /// Detects the current platform.
    pub fn detect() -> Self {
        Self {
            os: Self::detect_os(),
        }
    }

    /// Builds a platform for a known OS. Used to resolve resources for a
    /// host other than the one the tests compile on.
    pub fn for_os(os: Os) -> Self {
        Self { os }
    }

    fn detect_os() -> Os {
        #[cfg(target_os = "linux")]
        return Os::Linux;

        #[cfg(target_os = "macos")]
        return Os::Darwin;

        #[cfg(target_os = "windows")]
        return Os::Windows;

        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        return Os::Unknown;
    }

    /// Returns the host path of the container runtime control socket.
    ///
    /// Docker Desktop on Windows exposes the Unix socket through its Linux
    /// VM but requires the bind source to carry an extra leading slash.
    pub fn docker_socket_host_path(&self) -> String {
        match self.os {
            Os::Windows => format!("/{}", DOCKER_SOCKET_PATH),
            _ => DOCKER_SOCKET_PATH.to_string(),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.os)
    }
}
