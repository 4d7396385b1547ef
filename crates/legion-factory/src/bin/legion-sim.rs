//! In-process simulation of a campaign driven through the coordination core

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::{value_parser, Arg, Command};
use futures::future::join_all;
use legion_directive::{ChannelFeedbackProducer, DirectiveFeedback, DirectiveRegistry, FeedbackStatus, UlidGenerator};
use legion_factory::prelude::*;
use legion_factory::{CampaignKey, DagId, MinionId, RuntimeError, ScenarioName};
use legion_rampup::RampUpConfiguration;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Runtime recording created minions and scheduled starts
#[derive(Debug, Default)]
struct SimulatedRuntime {
    created: parking_lot::Mutex<usize>,
    starts: parking_lot::Mutex<Vec<(ScenarioName, MinionStartDefinition)>>,
}

#[async_trait]
impl MinionRuntime for SimulatedRuntime {
    async fn create(
        &self,
        _campaign: &CampaignKey,
        _scenario: &ScenarioName,
        _dag: &DagId,
        _minion: &MinionId,
    ) -> Result<(), RuntimeError> {
        *self.created.lock() += 1;
        Ok(())
    }

    async fn schedule_start(
        &self,
        _campaign: &CampaignKey,
        scenario: &ScenarioName,
        start: &MinionStartDefinition,
    ) -> Result<(), RuntimeError> {
        self.starts.lock().push((scenario.clone(), start.clone()));
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let matches = Command::new("legion-sim")
        .version(legion_factory::VERSION)
        .about("Simulate a campaign through directives, ramp-up and completion tracking")
        .arg(
            Arg::new("scenarios")
                .long("scenarios")
                .default_value("2")
                .value_parser(value_parser!(u32))
                .help("Number of scenarios in the campaign"),
        )
        .arg(
            Arg::new("minions")
                .long("minions")
                .default_value("100")
                .value_parser(value_parser!(u32))
                .help("Minions under load per scenario"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .default_value("42")
                .value_parser(value_parser!(u64))
                .help("Random seed for the completion order"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(std::path::PathBuf))
                .help("TOML configuration file"),
        )
        .get_matches();

    let scenarios_count = *matches.get_one::<u32>("scenarios").context("missing --scenarios")?;
    let minions = *matches.get_one::<u32>("minions").context("missing --minions")?;
    let seed = *matches.get_one::<u64>("seed").context("missing --seed")?;
    let config = match matches.get_one::<std::path::PathBuf>("config") {
        Some(path) => LegionConfig::from_file(path)?,
        None => LegionConfig::default(),
    };

    println!("Running Legion simulation...");
    println!("Scenarios: {scenarios_count}");
    println!("Minions per scenario: {minions}");
    println!("Seed: {seed}");
    println!();

    let (feedback, mut feedback_receiver) = ChannelFeedbackProducer::new();
    let feedback: Arc<dyn legion_directive::FeedbackProducer> = Arc::new(feedback);
    let (directives, mut directive_receiver) = ChannelDirectiveProducer::new();
    let directives: Arc<dyn DirectiveProducer> = Arc::new(directives);
    let registry = DirectiveRegistry::with_config(config.registry, Arc::clone(&feedback));

    let scenario_registry = Arc::new(InMemoryScenarioRegistry::new());
    let ramp_up = RampUpConfiguration::Accelerating {
        start_period_ms: 500,
        accelerator: 1.5,
        min_period_ms: 20,
        minions_count_pro_launch: 10,
    }
    .build()?;
    let scenario_names: Vec<ScenarioName> = (1..=scenarios_count).map(|i| format!("scenario-{i}")).collect();
    for name in &scenario_names {
        scenario_registry.register(
            ScenarioDefinition::new(name.clone(), minions, Arc::clone(&ramp_up))
                .with_dag(DagDefinition::under_load("browse"))
                .with_dag(DagDefinition::under_load("checkout"))
                .with_dag(DagDefinition::singleton("warm-up")),
        );
    }

    let runtime = Arc::new(SimulatedRuntime::default());
    let services = FactoryServices {
        registry: registry.clone(),
        feedback,
        directives: Arc::clone(&directives),
        scenarios: scenario_registry,
        runtime: Arc::clone(&runtime) as Arc<dyn MinionRuntime>,
        keeper: Arc::new(MinionAssignmentKeeper::new()),
        created_minions: Arc::new(CreatedMinions::new()),
        id_generator: Arc::new(UlidGenerator),
    };
    let dispatcher = DirectiveDispatcher::with_default_processors(&services);
    let launcher = CampaignLauncher::new(registry, directives, config.ramp_up);
    let campaign: CampaignKey = "simulated-campaign".to_owned();

    for scenario in &scenario_names {
        launcher.prepare_minions(&campaign, scenario, minions).await?;
    }
    pump(&dispatcher, &mut directive_receiver).await?;
    info!(created = *runtime.created.lock(), "minions created");

    for scenario in &scenario_names {
        launcher.start_ramp_up(&campaign, scenario).await?;
    }
    pump(&dispatcher, &mut directive_receiver).await?;
    let scheduled = runtime.starts.lock().len();
    info!(scheduled, "minion starts scheduled");

    let mut executions = Vec::new();
    for scenario in &scenario_names {
        for (minion, dags) in services.keeper.assignments(&campaign, scenario).await {
            executions.push((scenario.clone(), minion, dags));
        }
    }

    let mut rng = StdRng::seed_from_u64(seed);
    executions.shuffle(&mut rng);
    let (mut minions_complete, mut scenarios_complete, mut campaigns_complete) = (0, 0, 0);
    for (scenario, minion, dags) in executions {
        let mut remaining: &[DagId] = &dags;
        while !remaining.is_empty() {
            let (done, rest) = remaining.split_at(rng.random_range(1..=remaining.len()));
            remaining = rest;
            let state = services.keeper.execution_complete(&campaign, &scenario, &minion, done).await;
            minions_complete += usize::from(state.minion_complete);
            scenarios_complete += usize::from(state.scenario_complete);
            campaigns_complete += usize::from(state.campaign_complete);
        }
    }

    let (completed, failed) = count_feedback(&mut feedback_receiver);

    println!("Simulation Report:");
    println!("  Minions created: {}", *runtime.created.lock());
    println!("  Starts scheduled: {scheduled}");
    println!("  Minions complete: {minions_complete}");
    println!("  Scenarios complete: {scenarios_complete}");
    println!("  Campaigns complete: {campaigns_complete}");
    println!("  Directives completed: {completed}");
    println!("  Directives failed: {failed}");

    if failed > 0 || campaigns_complete != 1 || scenarios_complete != scenario_names.len() {
        bail!("simulation did not complete the campaign cleanly");
    }
    Ok(())
}

/// Dispatch directives until no processor publishes new ones
async fn pump(
    dispatcher: &DirectiveDispatcher,
    receiver: &mut UnboundedReceiver<FactoryDirective>,
) -> Result<()> {
    loop {
        let mut handles = Vec::new();
        while let Ok(directive) = receiver.try_recv() {
            handles.extend(dispatcher.dispatch(directive));
        }
        if handles.is_empty() {
            return Ok(());
        }
        for result in join_all(handles).await {
            result.context("processor task panicked")??;
        }
    }
}

fn count_feedback(receiver: &mut UnboundedReceiver<DirectiveFeedback>) -> (usize, usize) {
    let mut counts = (0, 0);
    while let Ok(feedback) = receiver.try_recv() {
        match feedback.status {
            FeedbackStatus::Completed => counts.0 += 1,
            FeedbackStatus::Failed => counts.1 += 1,
            FeedbackStatus::InProgress => {}
        }
    }
    counts
}
