use std::io;
use std::path::PathBuf;

use crate::engine::EngineError;
use crate::tag::TagError;
use crate::wav::WavError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("error opening {}: {source}", path.display())]
    SourceRead { path: PathBuf, source: io::Error },

    #[error("invalid SPC image: {0}")]
    Metadata(#[from] TagError),

    #[error("synthesis engine rejected the image: {0}")]
    EngineLoad(#[source] EngineError),

    #[error("synthesis engine failed: {0}")]
    Engine(#[source] EngineError),

    #[error("error opening {}: {source}", path.display())]
    OutputOpen { path: PathBuf, source: io::Error },

    #[error("error writing {}: {source}", path.display())]
    OutputWrite { path: PathBuf, source: WavError },

    #[error(transparent)]
    Wav(#[from] WavError),
}
