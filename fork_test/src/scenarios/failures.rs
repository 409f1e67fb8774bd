use riru_xfingerprint_pay_wechat::{
    AccessProbe, ClassLookup, CycleState, ForkKind, ForkResult, RiruXfpErrno,
};

use crate::test_ctx::{Event, PRIMARY_DEX, RecordingRuntime, WorkDir, new_hooks, pre_wechat};

fn run_target(runtime: &mut RecordingRuntime) -> CycleState {
    let mut hooks = new_hooks();
    pre_wechat(&mut hooks, ForkKind::AppSpecialize, runtime);
    hooks.post_fork(
        ForkKind::AppSpecialize,
        runtime,
        &AccessProbe,
        ForkResult::Child,
    )
}

pub fn scenario_missing_dex() {
    let _work = WorkDir::with(&[]);
    let mut runtime = RecordingRuntime::default();

    let state = run_target(&mut runtime);

    assert_eq!(state, CycleState::Failed(RiruXfpErrno::NoDexFile));
    assert_eq!(runtime.loader_events(), 0);
}

pub fn scenario_missing_entry() {
    let _work = WorkDir::with(&[PRIMARY_DEX]);
    let mut runtime = RecordingRuntime {
        missing_entry: true,
        ..RecordingRuntime::default()
    };

    let state = run_target(&mut runtime);

    assert_eq!(state, CycleState::Failed(RiruXfpErrno::EntryNotFound));
    assert!(runtime.invocations().is_empty());
}

pub fn scenario_missing_class() {
    let _work = WorkDir::with(&[PRIMARY_DEX]);
    let mut runtime = RecordingRuntime {
        missing_class: true,
        ..RecordingRuntime::default()
    };

    let state = run_target(&mut runtime);

    assert_eq!(state, CycleState::Failed(RiruXfpErrno::ClassNotFound));
    assert!(
        !runtime
            .events
            .iter()
            .any(|event| matches!(event, Event::StaticEntry(_) | Event::Invoke(_)))
    );
}

pub fn scenario_lookup_fallback() {
    let _work = WorkDir::with(&[PRIMARY_DEX]);
    let mut runtime = RecordingRuntime {
        missing_lookups: vec![ClassLookup::FindClass],
        ..RecordingRuntime::default()
    };

    let state = run_target(&mut runtime);

    assert_eq!(state, CycleState::Injected);
    let lookups: Vec<ClassLookup> = runtime
        .events
        .iter()
        .filter_map(|event| match event {
            Event::ClassLookup(lookup) => Some(*lookup),
            _ => None,
        })
        .collect();
    assert_eq!(lookups, vec![ClassLookup::FindClass, ClassLookup::LoadClass]);
}

pub fn scenario_throwing_entry() {
    let _work = WorkDir::with(&[PRIMARY_DEX]);
    let mut runtime = RecordingRuntime {
        throwing_entry: true,
        ..RecordingRuntime::default()
    };

    let state = run_target(&mut runtime);

    assert_eq!(state, CycleState::Failed(RiruXfpErrno::InvokeFailed));
    assert_eq!(runtime.invocations().len(), 1);
}
