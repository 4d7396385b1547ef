//! Legion factory coordination
//!
//! Factory-side half of the coordination core, plus the head-side launcher
//! issuing the directives it consumes.
//!
//! # Control flow
//!
//! ```text
//! head: CampaignLauncher::prepare_minions
//!   └─ MinionsCreationPreparation (single-use count)
//!        └─ MinionsCreation (one queue of minion ids per DAG)
//!             └─ MinionRuntime::create + MinionAssignmentKeeper registration
//! head: CampaignLauncher::start_ramp_up
//!   └─ MinionsRampUpPreparation (descriptive)
//!        └─ MinionsStart (list of start instants)
//!             └─ MinionRuntime::schedule_start
//! runtime: MinionAssignmentKeeper::execution_complete
//!   └─ minion → scenario → campaign completion
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod assignment;
pub mod config;
pub mod directives;
pub mod error;
pub mod launcher;
pub mod processors;
pub mod runtime;
pub mod scenario;
pub mod types;

pub use assignment::{MinionAssignmentKeeper, SchedulePlan};
pub use config::{LegionConfig, RampUpDefaults};
pub use directives::{ChannelDirectiveProducer, DirectiveProducer, FactoryDirective};
pub use error::{AssignmentError, ConfigError, ProcessingError, RuntimeError};
pub use launcher::CampaignLauncher;
pub use processors::{
    plan_minion_starts, starting_lines, CreatedMinions, DirectiveDispatcher, DirectiveProcessor, FactoryServices,
    MinionsCreationPreparationProcessor, MinionsCreationProcessor, MinionsRampUpPreparationProcessor,
    MinionsStartProcessor,
};
pub use runtime::MinionRuntime;
pub use scenario::{DagDefinition, InMemoryScenarioRegistry, ScenarioDefinition, ScenarioRegistry};
pub use types::{
    now_ms, CampaignCompletionState, CampaignKey, DagId, MinionId, MinionStartDefinition, ScenarioName,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for wiring a factory
    pub use crate::assignment::MinionAssignmentKeeper;
    pub use crate::config::{LegionConfig, RampUpDefaults};
    pub use crate::directives::{ChannelDirectiveProducer, DirectiveProducer, FactoryDirective};
    pub use crate::launcher::CampaignLauncher;
    pub use crate::processors::{CreatedMinions, DirectiveDispatcher, DirectiveProcessor, FactoryServices};
    pub use crate::runtime::MinionRuntime;
    pub use crate::scenario::{DagDefinition, InMemoryScenarioRegistry, ScenarioDefinition, ScenarioRegistry};
    pub use crate::types::{CampaignCompletionState, MinionStartDefinition};
}
