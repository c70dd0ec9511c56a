use std::path::PathBuf;

/// One interior generation call. Built per HTTP request and dropped after it.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub source_image: PathBuf,
    pub output_path: PathBuf,
    pub style: String,
    /// Root used to find per-style reference images. `None` disables them.
    pub base_dir: Option<PathBuf>,
}

impl GenerationRequest {
    pub fn new(
        prompt: impl Into<String>,
        source_image: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            source_image: source_image.into(),
            output_path: output_path.into(),
            style: String::new(),
            base_dir: None,
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// The artifact was written to this path.
    Generated(PathBuf),
    /// Every credential was rejected (401/402/403/429) or hit a transport error.
    Exhausted {
        attempts: usize,
        last_status: Option<u16>,
        last_error: Option<String>,
    },
    /// A non-retryable status stopped the credential loop early.
    Aborted { status: u16, body: String },
}

impl GenerationOutcome {
    pub fn into_path(self) -> Option<PathBuf> {
        match self {
            GenerationOutcome::Generated(path) => Some(path),
            _ => None,
        }
    }
}
