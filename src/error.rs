use std::fmt;

use thiserror::Error;

/// Pipeline stage a failure is attributed to when reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Narration,
    Transcription,
    Alignment,
    Captions,
    Intro,
    Timeline,
    Background,
    Encode,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Narration => "narration",
            Self::Transcription => "transcription",
            Self::Alignment => "alignment",
            Self::Captions => "captions",
            Self::Intro => "intro",
            Self::Timeline => "timeline",
            Self::Background => "background",
            Self::Encode => "encode",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse failure classes. The runtime decides fallback behaviour from these alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Inconsistent durations or invalid settings; always aborts the run.
    Configuration,
    /// Synthesis, transcription or encode collaborator failed.
    UpstreamService,
    /// Unusable transcription or alignment input; degrades to no captions.
    DataQuality,
    /// Missing, empty or unreadable media/artifact.
    Resource,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("configuration error: {message}")]
    Configuration { message: String },
    #[error("{service} failed: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },
    #[error("data quality: {message}")]
    DataQuality { message: String },
    #[error("{context}: {message}")]
    Resource {
        context: &'static str,
        message: String,
    },
    #[error("stage '{stage}' failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn synthesis(err: impl fmt::Display) -> Self {
        Self::Upstream {
            service: "narration synthesis",
            message: err.to_string(),
        }
    }

    pub fn transcription(err: impl fmt::Display) -> Self {
        Self::Upstream {
            service: "transcription",
            message: err.to_string(),
        }
    }

    pub fn encode(err: impl fmt::Display) -> Self {
        Self::Upstream {
            service: "encode",
            message: err.to_string(),
        }
    }

    pub(crate) fn data_quality(message: impl Into<String>) -> Self {
        Self::DataQuality {
            message: message.into(),
        }
    }

    pub fn resource(context: &'static str, err: impl fmt::Display) -> Self {
        Self::Resource {
            context,
            message: err.to_string(),
        }
    }

    pub(crate) fn at_stage(self, stage: Stage) -> Self {
        match self {
            already @ Self::Stage { .. } => already,
            other => Self::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } | Self::Json { .. } | Self::Resource { .. } => ErrorKind::Resource,
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::Upstream { .. } => ErrorKind::UpstreamService,
            Self::DataQuality { .. } => ErrorKind::DataQuality,
            Self::Stage { source, .. } => source.kind(),
        }
    }

    /// Stage the error was attributed to, if it passed through the runtime.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
