use super::{
    CreatedMinions, DirectiveProcessor, MinionsCreationPreparationProcessor, MinionsCreationProcessor,
    MinionsRampUpPreparationProcessor, MinionsStartProcessor,
};
use crate::assignment::MinionAssignmentKeeper;
use crate::directives::{DirectiveProducer, FactoryDirective};
use crate::error::ProcessingError;
use crate::runtime::MinionRuntime;
use crate::scenario::ScenarioRegistry;
use legion_directive::{DirectiveRegistry, FeedbackProducer, IdGenerator};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, trace};

/// Collaborators shared by the processors of one factory
#[derive(Debug, Clone)]
pub struct FactoryServices {
    /// Local directive registry
    pub registry: DirectiveRegistry,
    /// Feedback channel toward the head
    pub feedback: Arc<dyn FeedbackProducer>,
    /// Directive channel toward the factories
    pub directives: Arc<dyn DirectiveProducer>,
    /// Scenarios the factory can execute
    pub scenarios: Arc<dyn ScenarioRegistry>,
    /// Local minion runtime
    pub runtime: Arc<dyn MinionRuntime>,
    /// Assignment and completion tracking
    pub keeper: Arc<MinionAssignmentKeeper>,
    /// Minions waiting for their ramp-up
    pub created_minions: Arc<CreatedMinions>,
    /// Minion identifier source
    pub id_generator: Arc<dyn IdGenerator>,
}

/// Fans directives out to the processors accepting them
///
/// Each accepting processor runs in its own tokio task.
#[derive(Debug, Clone, Default)]
pub struct DirectiveDispatcher {
    processors: Vec<Arc<dyn DirectiveProcessor>>,
}

impl DirectiveDispatcher {
    /// Create new dispatcher without processors
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatcher with the four built-in processors
    #[must_use]
    pub fn with_default_processors(services: &FactoryServices) -> Self {
        Self::new()
            .with_processor(Arc::new(MinionsCreationPreparationProcessor::new(
                services.registry.clone(),
                Arc::clone(&services.scenarios),
                Arc::clone(&services.directives),
                Arc::clone(&services.feedback),
                Arc::clone(&services.id_generator),
                Arc::clone(&services.created_minions),
            )))
            .with_processor(Arc::new(MinionsCreationProcessor::new(
                services.registry.clone(),
                Arc::clone(&services.scenarios),
                Arc::clone(&services.runtime),
                Arc::clone(&services.keeper),
                Arc::clone(&services.feedback),
            )))
            .with_processor(Arc::new(MinionsRampUpPreparationProcessor::new(
                services.registry.clone(),
                Arc::clone(&services.scenarios),
                Arc::clone(&services.directives),
                Arc::clone(&services.feedback),
                Arc::clone(&services.keeper),
                Arc::clone(&services.created_minions),
            )))
            .with_processor(Arc::new(MinionsStartProcessor::new(
                services.registry.clone(),
                Arc::clone(&services.scenarios),
                Arc::clone(&services.runtime),
                Arc::clone(&services.feedback),
            )))
    }

    /// Add a processor
    #[must_use]
    pub fn with_processor(mut self, processor: Arc<dyn DirectiveProcessor>) -> Self {
        self.processors.push(processor);
        self
    }

    /// Number of registered processors
    #[inline]
    #[must_use]
    pub fn processor_count(&self) -> usize {
        self.processors.len()
    }

    /// Spawn one task per processor accepting the directive
    ///
    /// Returns the handles of the spawned tasks, empty when no processor
    /// accepted the directive. Failures are logged at the task boundary and
    /// returned through the handle.
    pub fn dispatch(&self, directive: FactoryDirective) -> Vec<JoinHandle<Result<(), ProcessingError>>> {
        let directive = Arc::new(directive);
        self.processors
            .iter()
            .filter(|processor| processor.accept(&directive))
            .map(|processor| {
                let processor = Arc::clone(processor);
                let directive = Arc::clone(&directive);
                trace!(processor = processor.name(), kind = directive.kind(), key = %directive.key(), "directive accepted");
                tokio::spawn(async move {
                    let result = processor.process(&directive).await;
                    if let Err(e) = &result {
                        error!(
                            processor = processor.name(),
                            kind = directive.kind(),
                            key = %directive.key(),
                            error = %e,
                            "directive processing task failed"
                        );
                    }
                    result
                })
            })
            .collect()
    }
}
