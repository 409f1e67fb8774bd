// 生命周期钩子适配层：把宿主的 pre/post 回调串成
// 身份采集 -> 目标判定 -> 动态加载。
//
// 状态按 fork 类型存放，post 钩子取走对应上下文，不跨周期残留。
use crate::config::InjectConfig;
use crate::errno::Errno;
use crate::identity;
use crate::loader::{self, AccessProbe, PathProbe};
use crate::log;
use crate::matcher;
use crate::runtime::ManagedRuntime;
use once_cell::sync::Lazy;
use std::ffi::CStr;
use std::sync::{Mutex, MutexGuard};

mod cycle;

pub use cycle::{CycleState, ForkCycle, ForkKind, ForkResult};
use cycle::ForkCycles;

// Mutex poison 恢复，避免持锁线程 panic 后后续钩子连锁 panic
pub(crate) trait MutexPoisonRecover<T> {
    fn lock_or_poison(&self) -> MutexGuard<'_, T>;
}

impl<T> MutexPoisonRecover<T> for Mutex<T> {
    fn lock_or_poison(&self) -> MutexGuard<'_, T> {
        self.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// pre 钩子只读取这两个句柄，其余宿主参数一律忽略
pub struct ForkArgs<'a, T> {
    pub data_dir: Option<&'a T>,
    pub nice_name: Option<&'a T>,
}

impl<'a, T> ForkArgs<'a, T> {
    pub fn new(data_dir: Option<&'a T>, nice_name: Option<&'a T>) -> Self {
        Self {
            data_dir,
            nice_name,
        }
    }
}

pub struct ModuleHooks {
    config: InjectConfig,
    cycles: ForkCycles,
    // 本进程的注入结果，入口只解析和调用一次
    injection: Option<Result<(), Errno>>,
}

impl ModuleHooks {
    pub fn new(config: InjectConfig) -> Self {
        Self {
            config,
            cycles: ForkCycles::default(),
            injection: None,
        }
    }

    pub fn config(&self) -> &InjectConfig {
        &self.config
    }

    pub fn pending(&self, kind: ForkKind) -> Option<&ForkCycle> {
        self.cycles.get(kind)
    }

    pub fn injection(&self) -> Option<Result<(), Errno>> {
        self.injection
    }

    pub fn pre_fork<R: ManagedRuntime>(
        &mut self,
        kind: ForkKind,
        runtime: &mut R,
        args: ForkArgs<'_, R::Text>,
    ) -> CycleState {
        if kind.injects() {
            self.app_pre(kind, runtime, args)
        } else {
            self.system_server_pre()
        }
    }

    pub fn post_fork<R, P>(
        &mut self,
        kind: ForkKind,
        runtime: &mut R,
        probe: &P,
        result: ForkResult,
    ) -> CycleState
    where
        R: ManagedRuntime,
        P: PathProbe + ?Sized,
    {
        if kind.injects() {
            self.app_post(kind, runtime, probe, result)
        } else {
            self.system_server_post(result)
        }
    }

    fn app_pre<R: ManagedRuntime>(
        &mut self,
        kind: ForkKind,
        runtime: &mut R,
        args: ForkArgs<'_, R::Text>,
    ) -> CycleState {
        let identity = match identity::capture(runtime, args.data_dir, args.nice_name) {
            Ok(identity) => identity,
            Err(errno) => {
                // 采集失败时不保留任何上下文，post 钩子据此跳过
                let _ = self.cycles.take(kind);
                log::warn(format_args!("{kind:?} capture skipped: {errno:?}"));
                return CycleState::Idle;
            }
        };
        let enabled = matcher::is_target(identity.nice_name(), self.config.target_package);
        if enabled {
            log::info(format_args!(
                "{kind:?} target {:?} data_dir={:?}",
                identity.nice_name(),
                identity.data_dir()
            ));
        }
        if self.cycles.begin(kind, ForkCycle::new(identity, enabled)) {
            log::debug(format_args!("{kind:?} replaced an unfinished cycle"));
        }
        CycleState::PreCaptured { enabled }
    }

    fn app_post<R, P>(
        &mut self,
        kind: ForkKind,
        runtime: &mut R,
        probe: &P,
        result: ForkResult,
    ) -> CycleState
    where
        R: ManagedRuntime,
        P: PathProbe + ?Sized,
    {
        let cycle = self.cycles.take(kind);
        // zygote 侧不保证 fd 可写，此分支禁止输出任何日志
        let ForkResult::Child = result else {
            return CycleState::Idle;
        };
        let Some(cycle) = cycle else {
            log::debug(format_args!("{kind:?} post without captured identity"));
            return CycleState::Idle;
        };
        if !cycle.enabled() {
            return CycleState::NotMatched;
        }
        self.inject_once(runtime, probe, cycle.identity().data_dir())
    }

    // system_server 路径只接线，不采集也不注入
    fn system_server_pre(&mut self) -> CycleState {
        CycleState::Idle
    }

    fn system_server_post(&mut self, _result: ForkResult) -> CycleState {
        CycleState::Idle
    }

    fn inject_once<R, P>(&mut self, runtime: &mut R, probe: &P, data_dir: &CStr) -> CycleState
    where
        R: ManagedRuntime,
        P: PathProbe + ?Sized,
    {
        if let Some(previous) = self.injection {
            log::debug(format_args!("payload already handled in this process: {previous:?}"));
            return CycleState::from_injection(previous);
        }
        let outcome = loader::inject(runtime, probe, &self.config, data_dir);
        match outcome {
            Ok(()) => log::info(format_args!("payload entry returned")),
            Err(errno) => log::error(format_args!(
                "inject skipped: {errno:?} (code {})",
                errno.as_i32()
            )),
        }
        self.injection = Some(outcome);
        CycleState::from_injection(outcome)
    }
}

impl Default for ModuleHooks {
    fn default() -> Self {
        Self::new(InjectConfig::default())
    }
}

static HOOKS: Lazy<Mutex<ModuleHooks>> = Lazy::new(|| Mutex::new(ModuleHooks::default()));

pub(crate) fn pre_fork<R: ManagedRuntime>(
    kind: ForkKind,
    runtime: &mut R,
    args: ForkArgs<'_, R::Text>,
) -> CycleState {
    HOOKS.lock_or_poison().pre_fork(kind, runtime, args)
}

pub(crate) fn post_fork<R: ManagedRuntime>(
    kind: ForkKind,
    runtime: &mut R,
    result: ForkResult,
) -> CycleState {
    HOOKS
        .lock_or_poison()
        .post_fork(kind, runtime, &AccessProbe, result)
}

pub(crate) fn system_server_pre() -> CycleState {
    HOOKS.lock_or_poison().system_server_pre()
}

pub(crate) fn system_server_post(result: ForkResult) -> CycleState {
    HOOKS.lock_or_poison().system_server_post(result)
}
