use std::ffi::{CStr, CString};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use riru_xfingerprint_pay_wechat::{
    CandidateOrigin, ClassLookup, DexCandidate, DexLoadRequest, EntryPoint, ForkArgs, ForkKind,
    InjectConfig, ManagedRuntime, ModuleHooks, PAYLOAD_ENTRY, RiruXfpErrno, TARGET_PACKAGE,
};

pub const WORK_DIR: &str = "/data/local/tmp/riru_xfp_fork_test";
pub const PRIMARY_DEX: &CStr = c"/data/local/tmp/riru_xfp_fork_test/primary/payload.dex";
pub const FALLBACK_DEX: &CStr = c"/data/local/tmp/riru_xfp_fork_test/fallback/payload.dex";
pub const WECHAT: &str = "com.tencent.mm";
pub const WECHAT_DATA: &str = "/data/user/0/com.tencent.mm";
// 真实 ART 场景把工作目录当作数据目录，staging 目录落在其下
pub const ART_DATA_DIR: &CStr = c"/data/local/tmp/riru_xfp_fork_test";

const PAYLOAD_DEX: &[u8] = include_bytes!("../fixtures/payload.dex");

const CANDIDATES: &[DexCandidate] = &[
    DexCandidate {
        origin: CandidateOrigin::Primary,
        path: PRIMARY_DEX,
    },
    DexCandidate {
        origin: CandidateOrigin::Fallback,
        path: FALLBACK_DEX,
    },
];

// 与默认配置相同，仅把 dex 候选路径指向测试工作目录
pub fn test_config() -> InjectConfig {
    InjectConfig {
        target_package: TARGET_PACKAGE,
        dex_candidates: CANDIDATES,
        ..InjectConfig::default()
    }
}

// 入口改为测试 dex 中的类，方法名与签名不变
pub fn art_config(entry: EntryPoint) -> InjectConfig {
    InjectConfig {
        entry,
        ..test_config()
    }
}

pub fn new_hooks() -> ModuleHooks {
    ModuleHooks::new(test_config())
}

#[derive(Clone, Debug)]
pub enum Text {
    Value(CString),
    Unreadable,
}

impl Text {
    pub fn new(value: &str) -> Self {
        Self::Value(CString::new(value).expect("text contains interior nul"))
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event {
    ReadText,
    SystemLoader,
    DexLoader { dex_path: String, staging_dir: String },
    ClassLookup(ClassLookup),
    LoadClass(String),
    StaticEntry(String),
    Invoke(String),
}

// 记录所有调用的运行时替身，可按需让某一步失败
#[derive(Default)]
pub struct RecordingRuntime {
    pub events: Vec<Event>,
    pub missing_lookups: Vec<ClassLookup>,
    pub missing_class: bool,
    pub missing_entry: bool,
    pub throwing_entry: bool,
}

impl RecordingRuntime {
    pub fn invocations(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Invoke(argument) => Some(argument.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn loader_events(&self) -> usize {
        self.events
            .iter()
            .filter(|event| !matches!(event, Event::ReadText))
            .count()
    }
}

impl ManagedRuntime for RecordingRuntime {
    type Text = Text;
    type Loader = usize;
    type Class = String;
    type Lookup = ClassLookup;
    type Entry = EntryPoint;

    fn read_text(&mut self, text: &Text) -> Option<CString> {
        self.events.push(Event::ReadText);
        match text {
            Text::Value(value) => Some(value.clone()),
            Text::Unreadable => None,
        }
    }

    fn system_loader(&mut self) -> Result<usize, RiruXfpErrno> {
        self.events.push(Event::SystemLoader);
        Ok(1)
    }

    fn dex_loader(
        &mut self,
        request: &DexLoadRequest<'_>,
        parent: &usize,
    ) -> Result<usize, RiruXfpErrno> {
        self.events.push(Event::DexLoader {
            dex_path: request.dex_path.to_string_lossy().into_owned(),
            staging_dir: request.staging_dir.to_string_lossy().into_owned(),
        });
        Ok(parent + 1)
    }

    fn class_lookup(&mut self, lookup: ClassLookup) -> Result<ClassLookup, RiruXfpErrno> {
        self.events.push(Event::ClassLookup(lookup));
        if self.missing_lookups.contains(&lookup) {
            return Err(RiruXfpErrno::NoClassLookup);
        }
        Ok(lookup)
    }

    fn load_class(
        &mut self,
        _loader: &usize,
        _lookup: &ClassLookup,
        class_name: &CStr,
    ) -> Result<String, RiruXfpErrno> {
        let class_name = class_name.to_string_lossy().into_owned();
        self.events.push(Event::LoadClass(class_name.clone()));
        if self.missing_class {
            return Err(RiruXfpErrno::ClassNotFound);
        }
        Ok(class_name)
    }

    fn static_entry(
        &mut self,
        _class: &String,
        entry: &EntryPoint,
    ) -> Result<EntryPoint, RiruXfpErrno> {
        self.events.push(Event::StaticEntry(format!(
            "{}{}",
            entry.method, entry.signature
        )));
        if self.missing_entry {
            return Err(RiruXfpErrno::EntryNotFound);
        }
        Ok(*entry)
    }

    fn invoke_entry(
        &mut self,
        _class: &String,
        entry: &EntryPoint,
        argument: &CStr,
    ) -> Result<(), RiruXfpErrno> {
        assert_eq!(*entry, PAYLOAD_ENTRY, "unexpected entry point");
        self.events
            .push(Event::Invoke(argument.to_string_lossy().into_owned()));
        if self.throwing_entry {
            return Err(RiruXfpErrno::InvokeFailed);
        }
        Ok(())
    }
}

// 在工作目录下放置 dex 占位文件，drop 时整体删除
pub struct WorkDir;

impl WorkDir {
    pub fn with(paths: &[&CStr]) -> Self {
        Self::write(paths, b"dex\n035\0")
    }

    // 写入可加载的测试 dex；设为只读，新版 ART 拒绝加载可写 dex
    pub fn with_payload(paths: &[&CStr]) -> Self {
        let work = Self::write(paths, PAYLOAD_DEX);
        for path in paths {
            let path = Path::new(path.to_str().expect("fixture path is not utf-8"));
            fs::set_permissions(path, fs::Permissions::from_mode(0o444))
                .expect("chmod fixture dex failed");
        }
        work
    }

    fn write(paths: &[&CStr], contents: &[u8]) -> Self {
        let _ = fs::remove_dir_all(WORK_DIR);
        for path in paths {
            let path = Path::new(path.to_str().expect("fixture path is not utf-8"));
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("create fixture dir failed");
            }
            fs::write(path, contents).expect("write fixture dex failed");
        }
        Self
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(WORK_DIR);
    }
}

pub fn pre_app(
    hooks: &mut ModuleHooks,
    kind: ForkKind,
    runtime: &mut RecordingRuntime,
    data_dir: Option<Text>,
    nice_name: Option<Text>,
) -> riru_xfingerprint_pay_wechat::CycleState {
    hooks.pre_fork(
        kind,
        runtime,
        ForkArgs::new(data_dir.as_ref(), nice_name.as_ref()),
    )
}

pub fn pre_wechat(
    hooks: &mut ModuleHooks,
    kind: ForkKind,
    runtime: &mut RecordingRuntime,
) -> riru_xfingerprint_pay_wechat::CycleState {
    pre_app(
        hooks,
        kind,
        runtime,
        Some(Text::new(WECHAT_DATA)),
        Some(Text::new(WECHAT)),
    )
}

pub fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .map(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(false)
}
