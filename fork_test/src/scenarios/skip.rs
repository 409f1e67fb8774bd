use riru_xfingerprint_pay_wechat::{AccessProbe, CycleState, ForkKind, ForkResult};

use crate::test_ctx::{
    PRIMARY_DEX, RecordingRuntime, Text, WECHAT, WECHAT_DATA, WorkDir, new_hooks, pre_app,
    pre_wechat,
};

pub fn scenario_other_app() {
    let _work = WorkDir::with(&[PRIMARY_DEX]);
    let mut hooks = new_hooks();
    let mut runtime = RecordingRuntime::default();

    let state = pre_app(
        &mut hooks,
        ForkKind::AppSpecialize,
        &mut runtime,
        Some(Text::new("/data/user/0/com.other.app")),
        Some(Text::new("com.other.app")),
    );
    assert_eq!(state, CycleState::PreCaptured { enabled: false });
    let state = hooks.post_fork(
        ForkKind::AppSpecialize,
        &mut runtime,
        &AccessProbe,
        ForkResult::Child,
    );

    assert_eq!(state, CycleState::NotMatched);
    assert_eq!(runtime.loader_events(), 0);
}

pub fn scenario_parent_branch() {
    let _work = WorkDir::with(&[PRIMARY_DEX]);
    let mut hooks = new_hooks();
    let mut runtime = RecordingRuntime::default();

    pre_wechat(&mut hooks, ForkKind::AppSpecialize, &mut runtime);
    let state = hooks.post_fork(
        ForkKind::AppSpecialize,
        &mut runtime,
        &AccessProbe,
        ForkResult::from_code(31337),
    );

    assert_eq!(state, CycleState::Idle);
    assert_eq!(runtime.loader_events(), 0);
    assert!(hooks.pending(ForkKind::AppSpecialize).is_none());
}

pub fn scenario_system_server() {
    let _work = WorkDir::with(&[PRIMARY_DEX]);
    let mut hooks = new_hooks();
    let mut runtime = RecordingRuntime::default();

    assert_eq!(
        pre_wechat(&mut hooks, ForkKind::SystemServer, &mut runtime),
        CycleState::Idle
    );
    assert_eq!(
        hooks.post_fork(
            ForkKind::SystemServer,
            &mut runtime,
            &AccessProbe,
            ForkResult::Child
        ),
        CycleState::Idle
    );
    assert!(runtime.events.is_empty());
}

pub fn scenario_unreadable_data_dir() {
    let _work = WorkDir::with(&[PRIMARY_DEX]);
    let mut hooks = new_hooks();
    let mut runtime = RecordingRuntime::default();

    let state = pre_app(
        &mut hooks,
        ForkKind::AppSpecialize,
        &mut runtime,
        Some(Text::Unreadable),
        Some(Text::new(WECHAT)),
    );
    assert_eq!(state, CycleState::Idle);
    let state = hooks.post_fork(
        ForkKind::AppSpecialize,
        &mut runtime,
        &AccessProbe,
        ForkResult::Child,
    );

    assert_eq!(state, CycleState::Idle);
    assert_eq!(runtime.loader_events(), 0);
}

pub fn scenario_missing_nice_name() {
    let _work = WorkDir::with(&[PRIMARY_DEX]);
    let mut hooks = new_hooks();
    let mut runtime = RecordingRuntime::default();

    let state = pre_app(
        &mut hooks,
        ForkKind::AppSpecialize,
        &mut runtime,
        Some(Text::new(WECHAT_DATA)),
        None,
    );
    assert_eq!(state, CycleState::PreCaptured { enabled: false });
    let state = hooks.post_fork(
        ForkKind::AppSpecialize,
        &mut runtime,
        &AccessProbe,
        ForkResult::Child,
    );
    assert_eq!(state, CycleState::NotMatched);
}
