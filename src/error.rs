use hanzi_core::decoder::DecodeError;
use hanzi_core::evaluate::EvalError;
use hanzi_core::settings::SettingsError;
use hanzi_core::store::StoreError;
use hanzi_core::trainer::TrainError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("training failed: {0}")]
    Train(#[from] TrainError),

    #[error("decoding failed: {0}")]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("evaluation failed: {0}")]
    Eval(#[from] EvalError),
}
