use futures::future::join_all;
use legion_directive::FeedbackStatus;
use legion_factory::prelude::*;
use legion_factory::FactoryDirective;
use legion_test_utils::{init_tracing, mixed_scenario, regular_ramp_up, TestFactory};
use std::collections::HashSet;
use std::sync::Arc;

/// Dispatch published directives until the factory goes quiet
async fn pump(factory: &TestFactory, dispatcher: &DirectiveDispatcher) -> Vec<FactoryDirective> {
    let mut seen = Vec::new();
    loop {
        let directives = factory.directives.take();
        if directives.is_empty() {
            return seen;
        }
        let handles: Vec<_> = directives
            .iter()
            .cloned()
            .flat_map(|directive| dispatcher.dispatch(directive))
            .collect();
        for result in join_all(handles).await {
            result.unwrap().unwrap();
        }
        seen.extend(directives);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_campaign_runs_from_preparation_to_completion() {
    init_tracing();
    let factory = TestFactory::new();
    factory.scenarios.register(mixed_scenario("alpha", 20, regular_ramp_up(100, 5)));
    factory.scenarios.register(mixed_scenario("beta", 7, regular_ramp_up(50, 3)));

    let dispatcher = DirectiveDispatcher::with_default_processors(&factory.services);
    let launcher = CampaignLauncher::new(
        factory.registry().clone(),
        Arc::clone(&factory.services.directives),
        RampUpDefaults::default(),
    );

    let mut preparation_keys = Vec::new();
    for (scenario, count) in [("alpha", 20), ("beta", 7)] {
        preparation_keys.push(launcher.prepare_minions("campaign", scenario, count).await.unwrap());
    }
    let creations = pump(&factory, &dispatcher).await;
    assert_eq!(creations.len(), 2 + 6);
    assert_eq!(factory.runtime.created().len(), 20 + 2 + 7 + 2);

    let mut rampup_keys = Vec::new();
    for scenario in ["alpha", "beta"] {
        rampup_keys.push(launcher.start_ramp_up("campaign", scenario).await.unwrap());
    }
    pump(&factory, &dispatcher).await;

    let starts = factory.runtime.starts();
    assert_eq!(starts.len(), 27);
    let started: HashSet<_> = starts.iter().map(|s| s.minion_id.clone()).collect();
    assert_eq!(started.len(), 27);

    for key in preparation_keys.iter().chain(&rampup_keys) {
        assert_eq!(
            factory.feedback.statuses_for(key),
            vec![FeedbackStatus::InProgress, FeedbackStatus::Completed]
        );
    }

    let keeper = &factory.services.keeper;
    for (scenario, count) in [("alpha", 20), ("beta", 7)] {
        let plan = keeper.read_schedule_plan("campaign", scenario).await;
        assert_eq!(plan.values().map(Vec::len).sum::<usize>(), count);
    }

    let mut work = Vec::new();
    for scenario in ["alpha", "beta"] {
        for (minion, dags) in keeper.assignments("campaign", scenario).await {
            work.push((scenario, minion, dags));
        }
    }

    // singleton and background minions never hold a scenario open, run them first
    work.sort_by_key(|(_, _, dags)| dags.iter().any(|dag| dag == "dag-under-load"));

    let mut scenario_completions = 0;
    let mut campaign_completions = 0;
    for (scenario, minion, dags) in work {
        let state = keeper.execution_complete("campaign", scenario, &minion, &dags).await;
        assert!(state.minion_complete, "{minion} of {scenario} should complete");
        scenario_completions += usize::from(state.scenario_complete);
        campaign_completions += usize::from(state.campaign_complete);
    }
    assert_eq!(scenario_completions, 2);
    assert_eq!(campaign_completions, 1);
    assert!(factory.feedback.all().iter().all(|f| f.status != FeedbackStatus::Failed));
}
