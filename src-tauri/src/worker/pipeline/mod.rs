mod config;
mod generate;
mod model;

pub use config::{LoadProgress, PipelineConfig, PipelineError, Translation};
pub use generate::greedy_pick;
pub use model::{MarianModel, OnnxPipelineLoader};

/// A loaded sequence-to-sequence translator for one language pair.
pub trait Pipeline: Send {
    /// `on_partial` sees the decoded prefix after every generated token.
    fn translate(
        &mut self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        on_partial: &mut dyn FnMut(&str),
    ) -> Result<Translation, PipelineError>;
}

pub trait PipelineLoader: Send + Sync {
    fn load(
        &self,
        model_id: &str,
        on_progress: &mut dyn FnMut(LoadProgress),
    ) -> Result<Box<dyn Pipeline>, PipelineError>;
}
