pub mod engine;
pub mod state;

pub use engine::{Engine, EngineSettings, Services};
pub use state::{
    BESPOKE_CATEGORY, DRAFT_FAILURE_PLACEHOLDER, Effect, Phase, WorkflowEvent, WorkflowState,
    apply,
};
