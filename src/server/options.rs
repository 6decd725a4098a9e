//! Browser launch options.
//!
//! Handed unchanged to the [`Launcher`](crate::browser::Launcher) for every
//! connection.
//!
//! # Example
//!
//! ```ignore
//! use bidi_bridge::LaunchOptions;
//!
//! let options = LaunchOptions::new()
//!     .with_headless()
//!     .with_window_size(1280, 720)
//!     .with_arg("--no-sandbox");
//!
//! let args = options.to_args();
//! // ["--headless=new", "--window-size=1280,720", "--no-sandbox"]
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;

// ============================================================================
// LaunchOptions
// ============================================================================

/// How each session's browser is launched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Run without a visible window.
    pub headless: bool,

    /// Browser executable; `None` lets the launcher pick.
    pub executable: Option<PathBuf>,

    /// Initial window size in pixels, width first.
    pub window_size: Option<(u32, u32)>,

    /// Open developer tools for each page.
    pub devtools: bool,

    /// Delay applied by the library to every operation, in milliseconds.
    pub slow_mo_ms: Option<u64>,

    /// Additional command-line arguments.
    pub extra_args: Vec<String>,
}

// ============================================================================
// Constructors
// ============================================================================

impl LaunchOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            headless: false,
            executable: None,
            window_size: None,
            devtools: false,
            slow_mo_ms: None,
            extra_args: Vec::new(),
        }
    }

    /// Headless preset.
    #[inline]
    #[must_use]
    pub fn headless() -> Self {
        Self {
            headless: true,
            ..Default::default()
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl LaunchOptions {
    /// Runs without a visible window.
    #[inline]
    #[must_use]
    pub fn with_headless(mut self) -> Self {
        self.headless = true;
        self
    }

    /// Sets the browser executable.
    #[inline]
    #[must_use]
    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    /// Sets the window size in pixels.
    #[inline]
    #[must_use]
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = Some((width, height));
        self
    }

    /// Opens developer tools for each page.
    #[inline]
    #[must_use]
    pub fn with_devtools(mut self) -> Self {
        self.devtools = true;
        self
    }

    /// Slows every library operation down by `ms`.
    #[inline]
    #[must_use]
    pub fn with_slow_mo(mut self, ms: u64) -> Self {
        self.slow_mo_ms = Some(ms);
        self
    }

    /// Adds a command-line argument.
    #[inline]
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Adds several command-line arguments.
    #[inline]
    #[must_use]
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }
}

// ============================================================================
// Conversion Methods
// ============================================================================

impl LaunchOptions {
    /// Converts options to browser command-line arguments.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(4 + self.extra_args.len());

        if self.headless {
            args.push("--headless=new".to_string());
        }

        if let Some((width, height)) = self.window_size {
            args.push(format!("--window-size={width},{height}"));
        }

        if self.devtools {
            args.push("--auto-open-devtools-for-tabs".to_string());
        }

        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if let Some((width, height)) = self.window_size
            && width.min(height) == 0
        {
            return Err(format!("Window size must be non-zero, got {width}x{height}"));
        }

        if let Some(path) = &self.executable
            && !path.exists()
        {
            return Err(format!("Browser executable not found at: {}", path.display()));
        }

        Ok(())
    }

    /// Returns `true` if the browser runs without a window.
    #[inline]
    #[must_use]
    pub const fn is_headless(&self) -> bool {
        self.headless
    }
}

// ============================================================================
// Tests
// ============================================================================
