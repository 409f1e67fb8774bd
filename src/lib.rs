#![allow(unsafe_op_in_unsafe_fn)]
#![allow(clippy::missing_safety_doc)]

#[cfg(all(not(target_os = "android"), not(any(clippy, test, doc))))]
compile_error!(
    "riru_xfingerprint_pay_wechat supports Android only (use cargo clippy/test/doc on host for development)"
);

// 宿主字符串句柄到自有字节串的转换
mod bridge;
// 固定注入参数：目标包名、dex 路径、入口契约
mod config;
// 错误码定义
mod errno;
// fork 前的进程身份采集
mod identity;
// fork 生命周期钩子适配与周期状态
mod lifecycle;
// dex 路径解析与动态加载调用
mod loader;
// 日志输出，使用 Android logcat
mod log;
// 目标进程判定
mod matcher;
// Riru 模块注册与回调表
mod riru;
// 托管运行时晚绑定契约及 JNI 实现
mod runtime;
// 版本信息与 API 协商
mod version;

#[cfg(test)]
mod testing;

pub use config::{
    CandidateOrigin, DEX_CANDIDATES, DexCandidate, EntryPoint, InjectConfig, PAYLOAD_ENTRY,
    TARGET_PACKAGE,
};
pub use errno::Errno as RiruXfpErrno;
pub use identity::ProcessIdentity;
pub use lifecycle::{CycleState, ForkArgs, ForkCycle, ForkKind, ForkResult, ModuleHooks};
pub use loader::{AccessProbe, DexLoadRequest, PathProbe};
pub use matcher::is_target;
pub use riru::abi::{Riru, RiruModuleInfo, RiruVersionedModuleInfo};
pub use runtime::{ArtRuntime, ClassLookup, ManagedRuntime};

pub fn set_debug(debug: bool) {
    log::set_debug_enabled(debug);
}

pub fn get_version() -> String {
    version::version_str_full()
}
