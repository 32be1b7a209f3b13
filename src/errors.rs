use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ReportError {
    /// Permission refused or no device matched any constraint rung
    AcquisitionDenied(String),
    /// The live track does not honor the requested control
    CapabilityUnsupported(String),
    /// The video source has no frame yet (zero natural dimensions)
    SourceNotReady(String),
    ControlError(String),
    CaptureError(String),
    EncodingError(String),
    InvalidArtifact(String),
    MissingPhoto,
    ShareUnavailable(String),
    ConfigError(String),
    IoError(String),
}

impl ReportError {
    /// Message suitable for a blocking user-facing alert
    pub fn user_message(&self) -> String {
        match self {
            ReportError::AcquisitionDenied(_) => {
                "Não foi possível acessar a câmera. Verifique as permissões.".to_string()
            }
            ReportError::MissingPhoto => {
                "Por favor, tire uma foto antes de enviar!".to_string()
            }
            ReportError::SourceNotReady(_) => {
                "Por favor, capture uma foto primeiro!".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReportError::AcquisitionDenied(msg) => write!(f, "Camera acquisition denied: {}", msg),
            ReportError::CapabilityUnsupported(msg) => {
                write!(f, "Capability unsupported: {}", msg)
            }
            ReportError::SourceNotReady(msg) => write!(f, "Source not ready: {}", msg),
            ReportError::ControlError(msg) => write!(f, "Camera control error: {}", msg),
            ReportError::CaptureError(msg) => write!(f, "Capture error: {}", msg),
            ReportError::EncodingError(msg) => write!(f, "Encoding error: {}", msg),
            ReportError::InvalidArtifact(msg) => write!(f, "Invalid image artifact: {}", msg),
            ReportError::MissingPhoto => write!(f, "Report has no attached photo"),
            ReportError::ShareUnavailable(msg) => write!(f, "Share unavailable: {}", msg),
            ReportError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            ReportError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for ReportError {}

impl From<std::io::Error> for ReportError {
    fn from(e: std::io::Error) -> Self {
        ReportError::IoError(e.to_string())
    }
}
