//! On-disk resource layout and preflight checks
//!
//! The executable, its fingerprint payloads and the hostlists live under a
//! single base directory:
//!
//! ```text
//! <base>/bin/winws_zapret.exe
//! <base>/bin/quic_initial_www_google_com.bin
//! <base>/bin/tls_clienthello_www_google_com.bin
//! <base>/lists/*.txt
//! ```

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Directory holding the executable and fingerprint payloads
pub const BIN_DIR: &str = "bin";

/// Directory holding hostlists and ipsets
pub const LISTS_DIR: &str = "lists";

/// Default image name of the external executable
pub const DEFAULT_EXECUTABLE: &str = "winws_zapret.exe";

/// Fake QUIC Initial payload
pub const QUIC_FINGERPRINT: &str = "quic_initial_www_google_com.bin";

/// Fake TLS ClientHello payload
pub const TLS_FINGERPRINT: &str = "tls_clienthello_www_google_com.bin";

/// List file names
pub mod lists {
    /// Catch-all ipset
    pub const IPSET_ALL: &str = "ipset-all.txt";
    /// Excluded addresses
    pub const IPSET_EXCLUDE: &str = "ipset-exclude.txt";
    /// Excluded domains
    pub const EXCLUDE: &str = "list-exclude.txt";
    /// Game domains
    pub const GAMES: &str = "list-games.txt";
    /// General domains
    pub const GENERAL: &str = "list-general.txt";
    /// Google / YouTube domains
    pub const GOOGLE: &str = "list-google.txt";
    /// User IP list, used only when non-empty
    pub const USER_IPS: &str = "list-ip.txt";
    /// Meta domains
    pub const META: &str = "list-meta.txt";
    /// User hostlist, used only when non-empty
    pub const USER_HOSTS: &str = "list-mylist.txt";
    /// Telegram domains
    pub const TELEGRAM: &str = "list-telegram.txt";
    /// TikTok domains
    pub const TIKTOK: &str = "list-tiktok.txt";
    /// X / Twitter domains
    pub const X: &str = "list-x.txt";
}

/// Every list file that must exist before a launch
pub const REQUIRED_LISTS: [&str; 12] = [
    lists::IPSET_ALL,
    lists::IPSET_EXCLUDE,
    lists::EXCLUDE,
    lists::GAMES,
    lists::GENERAL,
    lists::GOOGLE,
    lists::USER_IPS,
    lists::META,
    lists::USER_HOSTS,
    lists::TELEGRAM,
    lists::TIKTOK,
    lists::X,
];

/// Filesystem queries the planner depends on
pub trait FileProbe {
    /// Path exists
    fn exists(&self, path: &Path) -> bool;

    /// Path is a file with size > 0
    fn is_non_empty(&self, path: &Path) -> bool;
}

/// [`FileProbe`] backed by `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl FileProbe for FsProbe {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_non_empty(&self, path: &Path) -> bool {
        std::fs::metadata(path)
            .map(|meta| meta.is_file() && meta.len() > 0)
            .unwrap_or(false)
    }
}

/// Resolved locations of every resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLayout {
    base_dir: PathBuf,
    executable: String,
}

impl ResourceLayout {
    /// Layout rooted at `base_dir` with the given image name
    pub fn new(base_dir: impl Into<PathBuf>, executable: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            executable: executable.into(),
        }
    }

    /// Layout rooted next to the running binary
    pub fn beside_current_exe(executable: impl Into<String>) -> Self {
        Self::new(Self::current_exe_dir(), executable)
    }

    /// Directory of the running binary, `.` if it cannot be determined
    pub fn current_exe_dir() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Base directory
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// `<base>/bin`
    pub fn bin_dir(&self) -> PathBuf {
        self.base_dir.join(BIN_DIR)
    }

    /// `<base>/lists`
    pub fn lists_dir(&self) -> PathBuf {
        self.base_dir.join(LISTS_DIR)
    }

    /// Path of a list file
    pub fn list(&self, name: &str) -> PathBuf {
        self.lists_dir().join(name)
    }

    /// Path of a file in `bin`
    pub fn bin(&self, name: &str) -> PathBuf {
        self.bin_dir().join(name)
    }

    /// Image name used for terminate-by-name and process-list probes
    pub fn image_name(&self) -> &str {
        &self.executable
    }

    /// Full path of the executable
    pub fn executable_path(&self) -> PathBuf {
        self.bin(&self.executable)
    }

    /// Required list files that do not exist, in [`REQUIRED_LISTS`] order
    pub fn missing_lists(&self, probe: &dyn FileProbe) -> Vec<&'static str> {
        REQUIRED_LISTS
            .iter()
            .copied()
            .filter(|name| !probe.exists(&self.list(name)))
            .collect()
    }

    /// Check directories, list files, then `bin` contents
    ///
    /// Stops at the first group with missing entries and names all of them.
    pub fn preflight(&self, probe: &dyn FileProbe) -> Result<()> {
        let dirs: Vec<String> = [(BIN_DIR, self.bin_dir()), (LISTS_DIR, self.lists_dir())]
            .into_iter()
            .filter(|(_, path)| !probe.exists(path))
            .map(|(name, _)| format!("{name}/"))
            .collect();
        if !dirs.is_empty() {
            return Err(Error::missing(dirs));
        }

        let lists = self.missing_lists(probe);
        if !lists.is_empty() {
            return Err(Error::missing(lists));
        }

        let bin: Vec<&str> = [QUIC_FINGERPRINT, TLS_FINGERPRINT, self.executable.as_str()]
            .into_iter()
            .filter(|name| !probe.exists(&self.bin(name)))
            .collect();
        if !bin.is_empty() {
            return Err(Error::missing(bin));
        }

        Ok(())
    }
}
