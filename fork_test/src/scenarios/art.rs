// 真实 ART 上的 JNI 路径：字符串桥接、DexClassLoader、入口调用与异常清理
use jni::JNIEnv;
use jni::objects::{JObject, JString};
use riru_xfingerprint_pay_wechat::{
    AccessProbe, ArtRuntime, ClassLookup, CycleState, DexLoadRequest, EntryPoint, ForkArgs,
    ForkKind, ForkResult, ManagedRuntime, ModuleHooks, PAYLOAD_ENTRY, RiruXfpErrno,
};

use crate::test_ctx::{ART_DATA_DIR, PRIMARY_DEX, WECHAT, WECHAT_DATA, WORK_DIR, WorkDir, art_config};
use crate::vm::with_env;

const FIXTURE_PAYLOAD: EntryPoint = EntryPoint {
    class_name: c"riru.xfp.fixture.Payload",
    ..PAYLOAD_ENTRY
};
const FIXTURE_THROWING: EntryPoint = EntryPoint {
    class_name: c"riru.xfp.fixture.Throwing",
    ..PAYLOAD_ENTRY
};
const FIXTURE_NO_ENTRY: EntryPoint = EntryPoint {
    class_name: c"riru.xfp.fixture.NoEntry",
    ..PAYLOAD_ENTRY
};
const FIXTURE_ABSENT: EntryPoint = EntryPoint {
    class_name: c"riru.xfp.fixture.Absent",
    ..PAYLOAD_ENTRY
};

fn assert_no_pending_exception(env: &JNIEnv<'_>) {
    let pending = env.exception_check().expect("ExceptionCheck failed");
    assert!(!pending, "java exception left pending");
}

// 走完整的 pre/post 周期，返回 post 后的状态
fn run_wechat_cycle(entry: EntryPoint) -> CycleState {
    let _work = WorkDir::with_payload(&[PRIMARY_DEX]);
    let mut hooks = ModuleHooks::new(art_config(entry));
    let mut state = CycleState::Idle;
    with_env(|env| {
        let data_dir = env.new_string(WORK_DIR).expect("NewStringUTF failed");
        let nice_name = env.new_string(WECHAT).expect("NewStringUTF failed");
        let mut runtime = ArtRuntime::new(env);
        let pre = hooks.pre_fork(
            ForkKind::AppSpecialize,
            &mut runtime,
            ForkArgs::new(Some(&data_dir), Some(&nice_name)),
        );
        assert_eq!(pre, CycleState::PreCaptured { enabled: true });
        state = hooks.post_fork(
            ForkKind::AppSpecialize,
            &mut runtime,
            &AccessProbe,
            ForkResult::Child,
        );
        drop(runtime);
        assert_no_pending_exception(env);
    });
    state
}

pub fn scenario_string_bridge() {
    with_env(|env| {
        let null = JString::from(JObject::null());
        let empty = env.new_string("").expect("NewStringUTF failed");
        let data_dir = env.new_string(WECHAT_DATA).expect("NewStringUTF failed");
        let mut runtime = ArtRuntime::new(env);

        assert_eq!(runtime.read_text(&null), None);
        assert_eq!(runtime.read_text(&empty).as_deref(), Some(c""));
        // 反复读取同一句柄，每次都应拿到独立副本
        for _ in 0..64 {
            let owned = runtime.read_text(&data_dir).expect("data dir unreadable");
            assert_eq!(owned.to_bytes(), WECHAT_DATA.as_bytes());
        }

        drop(runtime);
        assert_no_pending_exception(env);
    });
}

pub fn scenario_entry_present() {
    let _work = WorkDir::with_payload(&[PRIMARY_DEX]);
    let config = art_config(FIXTURE_PAYLOAD);
    let request =
        DexLoadRequest::resolve(&config, &AccessProbe, ART_DATA_DIR).expect("fixture dex missing");
    assert_eq!(request.dex_path, PRIMARY_DEX);

    with_env(|env| {
        let mut runtime = ArtRuntime::new(env);
        let parent = runtime.system_loader().expect("system class loader");
        let loader = runtime
            .dex_loader(&request, &parent)
            .expect("DexClassLoader construction");
        let find_class = runtime
            .class_lookup(ClassLookup::FindClass)
            .expect("findClass lookup");
        let class = runtime
            .load_class(&loader, &find_class, request.entry.class_name)
            .expect("load fixture class");
        let load_class = runtime
            .class_lookup(ClassLookup::LoadClass)
            .expect("loadClass lookup");
        let same_class = runtime
            .load_class(&loader, &load_class, request.entry.class_name)
            .expect("load fixture class via loadClass");
        let entry = runtime
            .static_entry(&class, &request.entry)
            .expect("main(String) lookup");
        runtime
            .invoke_entry(&class, &entry, request.argument)
            .expect("invoke main(String)");
        drop(runtime);

        assert!(env.is_same_object(&class, &same_class).expect("IsSameObject failed"));
        let seen = env
            .get_static_field(&class, "seen", "Ljava/lang/String;")
            .and_then(|value| value.l())
            .expect("read Payload.seen");
        let seen = JString::from(seen);
        let seen: String = env.get_string(&seen).expect("GetStringUTFChars failed").into();
        assert_eq!(seen, WORK_DIR);
        assert_no_pending_exception(env);
    });
}

pub fn scenario_inject_cycle() {
    assert_eq!(run_wechat_cycle(FIXTURE_PAYLOAD), CycleState::Injected);
}

pub fn scenario_missing_class() {
    assert_eq!(
        run_wechat_cycle(FIXTURE_ABSENT),
        CycleState::Failed(RiruXfpErrno::ClassNotFound)
    );
}

pub fn scenario_missing_main() {
    assert_eq!(
        run_wechat_cycle(FIXTURE_NO_ENTRY),
        CycleState::Failed(RiruXfpErrno::EntryNotFound)
    );
}

pub fn scenario_throwing_main() {
    assert_eq!(
        run_wechat_cycle(FIXTURE_THROWING),
        CycleState::Failed(RiruXfpErrno::InvokeFailed)
    );
}
