use std::path::PathBuf;

use approx::assert_abs_diff_eq;

use dslab_resources::command::ResourceCommand;
use dslab_resources::error::ReplayError;
use dslab_resources::machine::Machine;
use dslab_resources::trace::read_fragments;
use dslab_resources::workload::{Fragment, TraceWorkload, TraceWorkloadBuilder};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn two_fragments() -> Vec<Fragment> {
    vec![Fragment::new(1000, 1.0, 2), Fragment::new(500, 0.5, 1)]
}

#[test]
fn test_cores_advance_in_lockstep() {
    init_logger();
    let mut workload = TraceWorkload::new(two_fragments());
    let mut cores = workload.on_start(0, 2);

    let consume = ResourceCommand::Consume {
        work: 1.0,
        limit: 1.0,
        deadline: 1000,
    };
    assert_eq!(cores[0].next_command(0), Ok(consume));
    // the first fragment stays current until every core has arrived
    assert_eq!(workload.offset(), Some(0));
    assert_eq!(workload.current_fragment(), Some(two_fragments()[0]));
    assert_eq!(cores[1].next_command(0), Ok(consume));
    assert_eq!(workload.offset(), Some(1000));
    assert_eq!(workload.current_fragment(), Some(two_fragments()[1]));

    assert_eq!(cores[1].next_command(1000), Ok(ResourceCommand::Idle { deadline: 1500 }));
    assert_eq!(
        cores[0].next_command(1000),
        Ok(ResourceCommand::Consume {
            work: 0.25,
            limit: 0.5,
            deadline: 1500
        })
    );
    assert_eq!(workload.offset(), Some(1500));
    assert_eq!(workload.current_fragment(), None);

    assert_eq!(cores[0].next_command(1500), Ok(ResourceCommand::Exit));
    assert_eq!(cores[1].next_command(1500), Ok(ResourceCommand::Exit));
}

#[test]
fn test_lazy_fragment_source() {
    init_logger();
    let fragments = (0..3).map(|i| Fragment::new(100 * (i + 1), 1.0, 1));
    let mut workload = TraceWorkload::new(fragments);
    let mut cores = workload.on_start(50, 1);

    let mut deadlines = Vec::new();
    let mut now = 50;
    while let Some(deadline) = cores[0].next_command(now).unwrap().deadline() {
        deadlines.push(deadline);
        now = deadline;
    }
    assert_eq!(deadlines, vec![150, 350, 650]);
}

#[test]
fn test_machine_run() {
    init_logger();
    let mut machine = Machine::new(2, 1.0);
    let report = machine.run(TraceWorkload::new(two_fragments()), 0).unwrap();
    assert_eq!(report.end_time, 1500);
    assert_abs_diff_eq!(report.demand, 2.25);
    assert_abs_diff_eq!(report.actual, 2.25);
    assert_abs_diff_eq!(report.overcommit, 0.);
    assert_eq!(machine.switch().available_count(), 2);

    // slower cores can't keep up with the demand
    let mut machine = Machine::new(2, 0.5);
    let report = machine.run(TraceWorkload::new(two_fragments()), 1000).unwrap();
    assert_eq!(report.end_time, 2500);
    assert_abs_diff_eq!(report.actual, 1.25);
    assert_abs_diff_eq!(report.overcommit, 1.0);

    // the machine is reusable and counters start from zero
    let report = machine.run(TraceWorkload::new(vec![Fragment::new(2000, 0.5, 1)]), 0).unwrap();
    assert_abs_diff_eq!(report.demand, 1.0);
    assert_abs_diff_eq!(report.actual, 1.0);
}

#[test]
fn test_machine_after_close() {
    init_logger();
    let mut machine = Machine::new(1, 1.0);
    machine.close();
    let result = machine.run(TraceWorkload::new(two_fragments()), 0);
    assert!(matches!(result, Err(ReplayError::Switch(_))));
}

#[test]
#[should_panic(expected = "at least one core")]
fn test_machine_without_cores() {
    Machine::new(0, 1.0);
}

#[test]
fn test_machine_releases_outputs() {
    init_logger();
    let mut machine = Machine::new(3, 1.0);
    assert_eq!(machine.switch().input_count(), 3);
    machine.run(TraceWorkload::new(two_fragments()), 0).unwrap();
    assert_eq!(machine.switch().output_count(), 0);
    assert_eq!(machine.switch().available_count(), 3);
}

#[test]
fn test_read_fragments() {
    init_logger();
    let path: PathBuf = std::env::temp_dir().join(format!("dslab-resources-{}-trace.csv", std::process::id()));
    std::fs::write(
        &path,
        "id,duration,cpu_count,cpu_usage
1,1000,2,1.0
2,300,1,0.5
1,500,1,0.5
",
    )
    .unwrap();
    let traces = read_fragments(&path).unwrap();
    assert_eq!(traces.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(traces[&1].fragments_count(), 2);
    assert_eq!(traces[&1].total_duration(), 1500);

    let builder: TraceWorkloadBuilder = traces.into_iter().next().unwrap().1;
    let report = Machine::new(2, 1.0).run(builder.build(), 0).unwrap();
    assert_eq!(report.end_time, 1500);
    assert_abs_diff_eq!(report.demand, 2.25);
}
