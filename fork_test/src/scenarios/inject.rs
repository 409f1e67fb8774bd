use riru_xfingerprint_pay_wechat::{AccessProbe, CycleState, ForkKind, ForkResult};

use crate::test_ctx::{
    Event, FALLBACK_DEX, PRIMARY_DEX, RecordingRuntime, WECHAT_DATA, WorkDir, new_hooks,
    pre_wechat,
};

pub fn scenario_target_primary() {
    let _work = WorkDir::with(&[PRIMARY_DEX, FALLBACK_DEX]);
    let mut hooks = new_hooks();
    let mut runtime = RecordingRuntime::default();

    let state = pre_wechat(&mut hooks, ForkKind::AppSpecialize, &mut runtime);
    assert_eq!(state, CycleState::PreCaptured { enabled: true });
    let state = hooks.post_fork(
        ForkKind::AppSpecialize,
        &mut runtime,
        &AccessProbe,
        ForkResult::from_code(0),
    );

    assert_eq!(state, CycleState::Injected);
    assert!(runtime.events.contains(&Event::DexLoader {
        dex_path: PRIMARY_DEX.to_string_lossy().into_owned(),
        staging_dir: format!("{WECHAT_DATA}/cache"),
    }));
    assert!(runtime.events.contains(&Event::LoadClass(
        "com.yyxx.wechatfp.xposed.plugin.XposedWeChatPlugin".to_string()
    )));
    assert_eq!(runtime.invocations(), vec![WECHAT_DATA.to_string()]);
}

pub fn scenario_target_fallback() {
    let _work = WorkDir::with(&[FALLBACK_DEX]);
    let mut hooks = new_hooks();
    let mut runtime = RecordingRuntime::default();

    pre_wechat(&mut hooks, ForkKind::AppSpecialize, &mut runtime);
    let state = hooks.post_fork(
        ForkKind::AppSpecialize,
        &mut runtime,
        &AccessProbe,
        ForkResult::Child,
    );

    assert_eq!(state, CycleState::Injected);
    assert!(runtime.events.contains(&Event::DexLoader {
        dex_path: FALLBACK_DEX.to_string_lossy().into_owned(),
        staging_dir: format!("{WECHAT_DATA}/cache"),
    }));
}

pub fn scenario_app_process_specialize() {
    let _work = WorkDir::with(&[PRIMARY_DEX]);
    let mut hooks = new_hooks();
    let mut runtime = RecordingRuntime::default();

    pre_wechat(&mut hooks, ForkKind::AppProcessSpecialize, &mut runtime);
    let state = hooks.post_fork(
        ForkKind::AppProcessSpecialize,
        &mut runtime,
        &AccessProbe,
        ForkResult::Child,
    );

    assert_eq!(state, CycleState::Injected);
    assert_eq!(runtime.invocations().len(), 1);
}

pub fn scenario_inject_once_per_process() {
    let _work = WorkDir::with(&[PRIMARY_DEX]);
    let mut hooks = new_hooks();
    let mut runtime = RecordingRuntime::default();

    for _ in 0..3 {
        pre_wechat(&mut hooks, ForkKind::AppSpecialize, &mut runtime);
        let state = hooks.post_fork(
            ForkKind::AppSpecialize,
            &mut runtime,
            &AccessProbe,
            ForkResult::Child,
        );
        assert_eq!(state, CycleState::Injected);
    }

    assert_eq!(runtime.invocations().len(), 1, "payload invoked more than once");
}
