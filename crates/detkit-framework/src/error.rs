use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Step of the framework workflow a failure belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Train,
    Validate,
    Export,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Train => "training",
            Stage::Validate => "validation",
            Stage::Export => "export",
        })
    }
}

#[derive(Debug, Error)]
pub enum FrameworkError {
    #[error("failed to run {program}")]
    Process {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{stage} failed: {program} exited with {status}")]
    Exit {
        stage: Stage,
        program: String,
        status: ExitStatus,
    },
    #[error("validation output has no `all` summary row")]
    MissingMetrics,
    #[error("{stage} finished but {} does not exist", path.display())]
    MissingArtifact { stage: Stage, path: PathBuf },
    #[error("validation needs the training dataset; train the model first")]
    NotTrained,
    #[error("failed to start an async runtime for the framework process")]
    Runtime(#[source] std::io::Error),
}
