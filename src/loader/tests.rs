// 动态加载流程的单元测试
use super::{DexLoadRequest, inject, staging_dir};
use crate::config::{DEX_FALLBACK_PATH, DEX_PRIMARY_PATH, InjectConfig};
use crate::errno::Errno;
use crate::runtime::ClassLookup;
use crate::testing::{Call, FakeRuntime, FixtureProbe, Step};
use std::ffi::CString;

const DATA_DIR: &std::ffi::CStr = c"/data/user/0/com.tencent.mm";

#[test]
fn primary_dex_runs_full_sequence() {
    let mut runtime = FakeRuntime::default();
    let probe = FixtureProbe::with(&[DEX_PRIMARY_PATH, DEX_FALLBACK_PATH]);

    let result = inject(&mut runtime, &probe, &InjectConfig::default(), DATA_DIR);

    assert_eq!(result, Ok(()));
    assert_eq!(
        runtime.calls,
        vec![
            Call::SystemLoader,
            Call::DexLoader {
                dex_path: "/data/local/tmp/libriru_module_xfingerprint_pay_wechat.dex".into(),
                staging_dir: "/data/user/0/com.tencent.mm/cache".into(),
            },
            Call::ClassLookup(ClassLookup::FindClass),
            Call::LoadClass {
                lookup: ClassLookup::FindClass,
                class_name: "com.yyxx.wechatfp.xposed.plugin.XposedWeChatPlugin".into(),
            },
            Call::StaticEntry {
                method: "main".into(),
                signature: "(Ljava/lang/String;)V".into(),
            },
            Call::Invoke {
                argument: "/data/user/0/com.tencent.mm".into(),
            },
        ]
    );
}

#[test]
fn primary_hit_does_not_probe_fallback() {
    let mut runtime = FakeRuntime::default();
    let probe = FixtureProbe::with(&[DEX_PRIMARY_PATH]);

    inject(&mut runtime, &probe, &InjectConfig::default(), DATA_DIR).unwrap();

    assert_eq!(probe.probed(), vec![DEX_PRIMARY_PATH.to_owned()]);
}

#[test]
fn missing_primary_falls_back() {
    let mut runtime = FakeRuntime::default();
    let probe = FixtureProbe::with(&[DEX_FALLBACK_PATH]);

    inject(&mut runtime, &probe, &InjectConfig::default(), DATA_DIR).unwrap();

    assert_eq!(
        probe.probed(),
        vec![DEX_PRIMARY_PATH.to_owned(), DEX_FALLBACK_PATH.to_owned()]
    );
    assert!(runtime.calls.contains(&Call::DexLoader {
        dex_path: "/system/framework/libriru_module_xfingerprint_pay_wechat.dex".into(),
        staging_dir: "/data/user/0/com.tencent.mm/cache".into(),
    }));
}

#[test]
fn no_dex_file_skips_class_loading() {
    let mut runtime = FakeRuntime::default();
    let probe = FixtureProbe::default();

    let result = inject(&mut runtime, &probe, &InjectConfig::default(), DATA_DIR);

    assert_eq!(result, Err(Errno::NoDexFile));
    assert_eq!(probe.probed().len(), 2);
    assert!(runtime.calls.is_empty());
}

#[test]
fn load_class_is_used_when_find_class_is_missing() {
    let mut runtime = FakeRuntime {
        missing_lookups: vec![ClassLookup::FindClass],
        ..FakeRuntime::default()
    };
    let probe = FixtureProbe::with(&[DEX_PRIMARY_PATH]);

    inject(&mut runtime, &probe, &InjectConfig::default(), DATA_DIR).unwrap();

    assert!(runtime.calls.contains(&Call::ClassLookup(ClassLookup::LoadClass)));
    assert!(runtime.calls.contains(&Call::LoadClass {
        lookup: ClassLookup::LoadClass,
        class_name: "com.yyxx.wechatfp.xposed.plugin.XposedWeChatPlugin".into(),
    }));
    assert_eq!(runtime.invocations().len(), 1);
}

#[test]
fn no_lookup_method_stops_before_loading() {
    let mut runtime = FakeRuntime {
        missing_lookups: vec![ClassLookup::FindClass, ClassLookup::LoadClass],
        ..FakeRuntime::default()
    };
    let probe = FixtureProbe::with(&[DEX_PRIMARY_PATH]);

    let result = inject(&mut runtime, &probe, &InjectConfig::default(), DATA_DIR);

    assert_eq!(result, Err(Errno::NoClassLookup));
    assert!(
        !runtime
            .calls
            .iter()
            .any(|call| matches!(call, Call::LoadClass { .. } | Call::Invoke { .. }))
    );
}

#[test]
fn missing_entry_point_is_never_invoked() {
    let mut runtime = FakeRuntime::failing_at(Step::StaticEntry);
    let probe = FixtureProbe::with(&[DEX_PRIMARY_PATH]);

    let result = inject(&mut runtime, &probe, &InjectConfig::default(), DATA_DIR);

    assert_eq!(result, Err(Errno::EntryNotFound));
    assert!(runtime.invocations().is_empty());
}

#[test]
fn missing_class_stops_before_entry_lookup() {
    let mut runtime = FakeRuntime::failing_at(Step::LoadClass);
    let probe = FixtureProbe::with(&[DEX_PRIMARY_PATH]);

    let result = inject(&mut runtime, &probe, &InjectConfig::default(), DATA_DIR);

    assert_eq!(result, Err(Errno::ClassNotFound));
    assert!(
        !runtime
            .calls
            .iter()
            .any(|call| matches!(call, Call::StaticEntry { .. } | Call::Invoke { .. }))
    );
}

#[test]
fn loader_construction_failure_is_reported() {
    let mut runtime = FakeRuntime::failing_at(Step::DexLoader);
    let probe = FixtureProbe::with(&[DEX_PRIMARY_PATH]);

    let result = inject(&mut runtime, &probe, &InjectConfig::default(), DATA_DIR);

    assert_eq!(result, Err(Errno::NoDexLoader));
    assert_eq!(runtime.loader_calls(), 2);
}

#[test]
fn throwing_entry_point_reports_invoke_failure() {
    let mut runtime = FakeRuntime::failing_at(Step::Invoke);
    let probe = FixtureProbe::with(&[DEX_PRIMARY_PATH]);

    let result = inject(&mut runtime, &probe, &InjectConfig::default(), DATA_DIR);

    assert_eq!(result, Err(Errno::InvokeFailed));
    assert_eq!(runtime.invocations(), vec!["/data/user/0/com.tencent.mm"]);
}

#[test]
fn request_carries_entry_contract_and_argument() {
    let probe = FixtureProbe::with(&[DEX_PRIMARY_PATH]);
    let config = InjectConfig::default();

    let request = DexLoadRequest::resolve(&config, &probe, DATA_DIR).unwrap();

    assert_eq!(request.dex_path, DEX_PRIMARY_PATH);
    assert_eq!(request.staging_dir.as_c_str(), c"/data/user/0/com.tencent.mm/cache");
    assert_eq!(request.entry, config.entry);
    assert_eq!(request.argument, DATA_DIR);
}

#[test]
fn staging_dir_longer_than_path_max_is_rejected() {
    let long = CString::new(vec![b'a'; libc::PATH_MAX as usize]).unwrap();
    assert_eq!(staging_dir(&long, "cache"), Err(Errno::PathTooLong));
}

#[test]
fn staging_dir_appends_subdir() {
    assert_eq!(
        staging_dir(c"/data/user/10/com.tencent.mm", "cache").unwrap().as_c_str(),
        c"/data/user/10/com.tencent.mm/cache"
    );
}
