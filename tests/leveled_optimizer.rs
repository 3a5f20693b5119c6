mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{fork, histories, visit, TrackedPlan};
use leveled_opt::cost::Cost;
use leveled_opt::error::OptimizerError;
use leveled_opt::leveled::{LeveledOptimizer, PlanRanking};
use leveled_opt::listener::{OptimizerEvent, RecordingListener};
use leveled_opt::optimizer::{CancellationToken, OptimizerConfig};
use leveled_opt::rules::{RuleLevel, RuleRegistry, RuleResult};

fn ranked_histories(ranking: &PlanRanking<TrackedPlan>) -> Vec<Vec<String>> {
    histories(ranking.iter().map(|ranked| &ranked.plan))
}

fn costs(values: &[f64]) -> Vec<Cost> {
    values.iter().copied().map(Cost::from).collect()
}

fn forking_registry() -> RuleRegistry<TrackedPlan> {
    RuleRegistry::builder()
        .register("split", 10, fork("split", &[3.0, 1.0]))
        .register("check", 20, visit("check"))
        .register("refine", 30, fork("refine", &[0.5, 2.0]))
        .build()
        .unwrap()
}

/// Five levels, each doubling the number of plans.
fn doubling_registry() -> RuleRegistry<TrackedPlan> {
    (1..=5)
        .fold(RuleRegistry::builder(), |builder, step: RuleLevel| {
            builder.register(format!("split-{}", step), step * 10, fork("split", &[1.0, 2.0]))
        })
        .build()
        .unwrap()
}

fn jump(
    plan: TrackedPlan,
    _level: RuleLevel,
    results: &mut RuleResult<TrackedPlan>,
) -> anyhow::Result<()> {
    results.push(plan.clone().visit("jump"), 30);
    results.push(plan.visit("stay"), 10);
    Ok(())
}

fn regress(
    plan: TrackedPlan,
    _level: RuleLevel,
    results: &mut RuleResult<TrackedPlan>,
) -> anyhow::Result<()> {
    results.push(plan, 10);
    Ok(())
}

fn overshoot(
    plan: TrackedPlan,
    _level: RuleLevel,
    results: &mut RuleResult<TrackedPlan>,
) -> anyhow::Result<()> {
    results.push(plan, 99);
    Ok(())
}

fn discard(
    _plan: TrackedPlan,
    _level: RuleLevel,
    _results: &mut RuleResult<TrackedPlan>,
) -> anyhow::Result<()> {
    Ok(())
}

#[test]
fn test_runs_are_deterministic() {
    let registry = forking_registry();
    let optimizer = LeveledOptimizer::new(&registry, OptimizerConfig::default());

    let first = optimizer.create_plans(TrackedPlan::new(0.0)).unwrap();
    let second = optimizer.create_plans(TrackedPlan::new(0.0)).unwrap();

    assert_eq!(costs(&[1.5, 3.0, 3.5, 5.0]), first.costs());
    assert_eq!(first.costs(), second.costs());
    assert_eq!(ranked_histories(&first), ranked_histories(&second));
    assert_eq!(first.passes(), second.passes());
    assert!(first.iter().all(|ranked| ranked.level == 30));
}

#[test]
fn test_plans_are_sorted_by_cost() {
    let registry = RuleRegistry::builder()
        .register("spread", 10, fork("spread", &[9.0, 1.0, 5.0]))
        .build()
        .unwrap();

    let ranking = LeveledOptimizer::new(&registry, OptimizerConfig::default())
        .create_plans(TrackedPlan::new(0.0))
        .unwrap();

    assert_eq!(costs(&[1.0, 5.0, 9.0]), ranking.costs());
    assert_eq!(Cost::from(1.0), ranking.best().unwrap().cost);
}

#[test]
fn test_levels_only_increase() {
    let registry = forking_registry();
    let listener = Arc::new(RecordingListener::new());

    let ranking = LeveledOptimizer::new(&registry, OptimizerConfig::default())
        .with_listener(listener.clone())
        .create_plans(TrackedPlan::new(0.0))
        .unwrap();

    let applied: Vec<(usize, RuleLevel)> = listener
        .events()
        .into_iter()
        .filter_map(|event| match event {
            OptimizerEvent::RuleApplied { pass, level, .. } => Some((pass, level)),
            _ => None,
        })
        .collect();
    assert_eq!(vec![(1, 10), (2, 20), (2, 20), (3, 30), (3, 30)], applied);

    for history in ranked_histories(&ranking) {
        assert_eq!(vec!["split", "check", "refine"], history);
    }
}

#[test]
fn test_passes_are_bounded_by_distinct_levels() {
    let registry = RuleRegistry::builder()
        .register("a", 10, visit("a"))
        .register("b", 10, visit("b"))
        .register("c", 20, fork("c", &[1.0, 2.0, 3.0]))
        .register("d", 20, visit("d"))
        .register("e", 40, visit("e"))
        .build()
        .unwrap();

    let ranking = LeveledOptimizer::new(&registry, OptimizerConfig::default())
        .create_plans(TrackedPlan::new(0.0))
        .unwrap();

    assert_eq!(3, ranking.len());
    assert!(ranking.passes() <= registry.levels().len());
    assert_eq!(3, ranking.passes());
}

#[test]
fn test_plan_at_max_level_skips_remaining_rules() {
    let registry = RuleRegistry::builder()
        .register("jump", 10, jump)
        .register("check", 20, visit("check"))
        .register("finish", 30, visit("finish"))
        .build()
        .unwrap();

    let ranking = LeveledOptimizer::new(&registry, OptimizerConfig::default())
        .create_plans(TrackedPlan::new(0.0))
        .unwrap();

    assert_eq!(3, ranking.passes());
    assert_eq!(
        vec![vec!["jump"], vec!["stay", "check", "finish"]],
        ranked_histories(&ranking)
    );
}

#[test]
fn test_seeded_at_max_level_passes_through() {
    let registry = forking_registry();
    let listener = Arc::new(RecordingListener::new());

    let ranking = LeveledOptimizer::new(&registry, OptimizerConfig::default())
        .with_listener(listener.clone())
        .create_plans_at(TrackedPlan::new(4.0), 30)
        .unwrap();

    assert_eq!(0, ranking.passes());
    assert_eq!(costs(&[4.0]), ranking.costs());
    assert!(ranking.best().unwrap().plan.history.is_empty());
    assert!(listener.applied_rules().is_empty());
}

#[test]
fn test_plan_cap_stops_search() {
    let registry = doubling_registry();
    let listener = Arc::new(RecordingListener::new());

    let ranking = LeveledOptimizer::new(
        &registry,
        OptimizerConfig::default().with_max_plan_count(5),
    )
    .with_listener(listener.clone())
    .create_plans(TrackedPlan::new(0.0))
    .unwrap();

    assert_eq!(8, ranking.len());
    assert_eq!(3, ranking.passes());
    assert!(ranking.truncated());
    assert!(ranking.iter().all(|ranked| ranked.level == 30));
    assert!(listener.events().contains(&OptimizerEvent::PlanCapReached {
        plans: 8,
        max_plan_count: 5,
    }));
}

#[test]
fn test_plan_cap_reached_exactly() {
    let registry = doubling_registry();

    let ranking = LeveledOptimizer::new(
        &registry,
        OptimizerConfig::default().with_max_plan_count(2),
    )
    .create_plans(TrackedPlan::new(0.0))
    .unwrap();

    assert_eq!(2, ranking.len());
    assert_eq!(1, ranking.passes());
    assert!(ranking.truncated());
}

#[test]
fn test_plan_cap_ignored_once_done() {
    let registry = RuleRegistry::builder()
        .register("split", 10, fork("split", &[1.0, 2.0]))
        .build()
        .unwrap();

    let ranking = LeveledOptimizer::new(
        &registry,
        OptimizerConfig::default().with_max_plan_count(2),
    )
    .create_plans(TrackedPlan::new(0.0))
    .unwrap();

    assert_eq!(2, ranking.len());
    assert_eq!(1, ranking.passes());
    assert!(!ranking.truncated());
}

#[test]
fn test_plan_cap_of_one_runs_first_pass() {
    let registry = forking_registry();

    let ranking = LeveledOptimizer::new(
        &registry,
        OptimizerConfig::default().with_max_plan_count(1),
    )
    .create_plans(TrackedPlan::new(7.0))
    .unwrap();

    assert_eq!(1, ranking.passes());
    assert!(ranking.truncated());
    assert_eq!(costs(&[8.0, 10.0]), ranking.costs());
    assert!(ranking.iter().all(|ranked| ranked.level == 10));
}

#[test]
fn test_seed_above_max_level_is_rejected() {
    let registry = forking_registry();
    let seed = TrackedPlan::new(0.0);
    let live = seed.live();

    let err = LeveledOptimizer::new(&registry, OptimizerConfig::default())
        .create_plans_at(seed, 31)
        .unwrap_err();

    assert!(matches!(err, OptimizerError::Configuration(_)));
    assert!(err.to_string().contains("31"));
    assert_eq!(0, live.load(Ordering::SeqCst));
}

#[test]
fn test_same_level_rules_run_in_registration_order() {
    let registry = RuleRegistry::builder()
        .register("late", 20, visit("late"))
        .register("a", 10, visit("a"))
        .register("b", 10, visit("b"))
        .build()
        .unwrap();
    let listener = Arc::new(RecordingListener::new());

    let ranking = LeveledOptimizer::new(&registry, OptimizerConfig::default())
        .with_listener(listener.clone())
        .create_plans(TrackedPlan::new(0.0))
        .unwrap();

    assert_eq!(vec!["a", "b", "late"], listener.applied_rules());
    assert_eq!(2, ranking.passes());
    assert_eq!(vec![vec!["a", "b", "late"]], ranked_histories(&ranking));
}

#[test]
fn test_same_level_rules_see_every_alternative() {
    let registry = RuleRegistry::builder()
        .register("split", 10, fork("split", &[1.0, 2.0]))
        .register("check", 10, visit("check"))
        .build()
        .unwrap();
    let listener = Arc::new(RecordingListener::new());

    let ranking = LeveledOptimizer::new(&registry, OptimizerConfig::default())
        .with_listener(listener.clone())
        .create_plans(TrackedPlan::new(0.0))
        .unwrap();

    assert_eq!(vec!["split", "check", "check"], listener.applied_rules());
    assert_eq!(1, ranking.passes());
    assert_eq!(
        vec![vec!["split", "check"], vec!["split", "check"]],
        ranked_histories(&ranking)
    );
}

#[test]
fn test_all_plans_discarded() {
    let registry = RuleRegistry::builder()
        .register("discard", 10, discard)
        .register("check", 20, visit("check"))
        .build()
        .unwrap();
    let listener = Arc::new(RecordingListener::new());

    let seed = TrackedPlan::new(0.0);
    let live = seed.live();
    let ranking = LeveledOptimizer::new(&registry, OptimizerConfig::default())
        .with_listener(listener.clone())
        .create_plans(seed)
        .unwrap();

    assert!(ranking.is_empty());
    assert!(ranking.best().is_none());
    assert_eq!(1, ranking.passes());
    assert_eq!(0, live.load(Ordering::SeqCst));
    assert_eq!(
        Some(&OptimizerEvent::Finished { costs: vec![] }),
        listener.events().last()
    );
}

/// Two splits followed by a rule failing on its third invocation.
fn flaky_registry(calls: Arc<AtomicUsize>) -> RuleRegistry<TrackedPlan> {
    RuleRegistry::builder()
        .register("split", 10, fork("split", &[1.0, 2.0]))
        .register("split-again", 20, fork("split-again", &[1.0, 2.0]))
        .register(
            "flaky",
            30,
            move |plan: TrackedPlan,
                  level: RuleLevel,
                  results: &mut RuleResult<TrackedPlan>|
                  -> anyhow::Result<()> {
                if calls.fetch_add(1, Ordering::SeqCst) == 2 {
                    anyhow::bail!("third invocation fails");
                }
                results.push(plan, level);
                Ok(())
            },
        )
        .build()
        .unwrap()
}

fn assert_flaky_failure(err: &OptimizerError) {
    match err {
        OptimizerError::RuleExecution {
            rule, level, pass, ..
        } => {
            assert_eq!("flaky", rule);
            assert_eq!(30, *level);
            assert_eq!(3, *pass);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(err.to_string().contains("third invocation fails"));
}

#[test]
fn test_failing_rule_releases_every_plan() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = flaky_registry(calls.clone());

    let seed = TrackedPlan::new(0.0);
    let live = seed.live();
    let err = LeveledOptimizer::new(&registry, OptimizerConfig::default())
        .create_plans(seed)
        .unwrap_err();

    assert_flaky_failure(&err);
    assert_eq!(3, calls.load(Ordering::SeqCst));
    assert_eq!(0, live.load(Ordering::SeqCst));
}

#[test]
fn test_failing_rule_releases_every_plan_in_parallel() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = flaky_registry(calls.clone());

    let seed = TrackedPlan::new(0.0);
    let live = seed.live();
    let err = LeveledOptimizer::new(&registry, OptimizerConfig::default().with_parallel(true))
        .create_plans(seed)
        .unwrap_err();

    assert_flaky_failure(&err);
    // the pool may start every plan of the pass before the failure is seen
    let calls = calls.load(Ordering::SeqCst);
    assert!((3..=4).contains(&calls));
    assert_eq!(0, live.load(Ordering::SeqCst));
}

#[test]
fn test_plan_below_rule_level_is_rejected() {
    let registry = RuleRegistry::builder()
        .register("a", 10, visit("a"))
        .register("regress", 20, regress)
        .build()
        .unwrap();

    let err = LeveledOptimizer::new(&registry, OptimizerConfig::default())
        .create_plans(TrackedPlan::new(0.0))
        .unwrap_err();

    assert!(matches!(
        err,
        OptimizerError::InvalidLevel {
            level: 20,
            emitted: 10,
            max_level: 20,
            ..
        }
    ));
}

#[test]
fn test_plan_above_max_level_is_rejected() {
    let registry = RuleRegistry::builder()
        .register("overshoot", 10, overshoot)
        .register("b", 20, visit("b"))
        .build()
        .unwrap();

    let err = LeveledOptimizer::new(&registry, OptimizerConfig::default())
        .create_plans(TrackedPlan::new(0.0))
        .unwrap_err();

    assert!(matches!(
        err,
        OptimizerError::InvalidLevel { emitted: 99, .. }
    ));
}

#[test]
fn test_cancelled_before_first_pass() {
    let registry = forking_registry();
    let token = CancellationToken::new();
    token.cancel();

    let seed = TrackedPlan::new(0.0);
    let live = seed.live();
    let err = LeveledOptimizer::new(&registry, OptimizerConfig::default())
        .with_cancellation(token)
        .create_plans(seed)
        .unwrap_err();

    assert!(matches!(err, OptimizerError::Cancelled { pass: 1 }));
    assert_eq!(0, live.load(Ordering::SeqCst));
}

#[test]
fn test_cancelled_by_rule() {
    let token = CancellationToken::new();
    let trigger = token.clone();
    let registry = RuleRegistry::builder()
        .register(
            "cancel",
            10,
            move |plan: TrackedPlan,
                  level: RuleLevel,
                  results: &mut RuleResult<TrackedPlan>|
                  -> anyhow::Result<()> {
                trigger.cancel();
                results.push(plan, level);
                Ok(())
            },
        )
        .register("never", 20, visit("never"))
        .build()
        .unwrap();

    let err = LeveledOptimizer::new(&registry, OptimizerConfig::default())
        .with_cancellation(token)
        .create_plans(TrackedPlan::new(0.0))
        .unwrap_err();

    assert!(matches!(err, OptimizerError::Cancelled { pass: 2 }));
}

#[test]
fn test_parallel_matches_sequential() {
    let registry = RuleRegistry::builder()
        .register("split", 10, fork("split", &[3.0, 1.0, 2.0]))
        .register("check", 20, visit("check"))
        .register("refine", 30, fork("refine", &[0.5, 0.25]))
        .register("split-more", 40, fork("split-more", &[1.0, 0.0, 4.0]))
        .build()
        .unwrap();

    let sequential = LeveledOptimizer::new(&registry, OptimizerConfig::default())
        .create_plans(TrackedPlan::new(0.0))
        .unwrap();
    let parallel = LeveledOptimizer::new(&registry, OptimizerConfig::default().with_parallel(true))
        .create_plans(TrackedPlan::new(0.0))
        .unwrap();

    assert_eq!(18, sequential.len());
    assert_eq!(sequential.costs(), parallel.costs());
    assert_eq!(ranked_histories(&sequential), ranked_histories(&parallel));
    assert_eq!(sequential.passes(), parallel.passes());
}

#[test]
fn test_variable_usage_computed_once_per_change() {
    let registry = RuleRegistry::builder()
        .register("a", 10, visit("a"))
        .register("split", 20, fork("split", &[1.0, 2.0]))
        .register("b", 30, visit("b"))
        .register("c", 40, visit("c"))
        .build()
        .unwrap();

    let seed = TrackedPlan::new(0.0);
    let analyses = seed.analyses();
    let ranking = LeveledOptimizer::new(&registry, OptimizerConfig::default())
        .create_plans(seed)
        .unwrap();

    assert_eq!(2, ranking.len());
    // once for the seed, once for each rewritten alternative
    assert_eq!(3, analyses.load(Ordering::SeqCst));
}

#[test]
fn test_empty_registry_is_rejected() {
    let result = RuleRegistry::<TrackedPlan>::builder().build();
    assert!(matches!(result, Err(OptimizerError::Configuration(_))));
}
