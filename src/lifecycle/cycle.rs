// fork 周期上下文：pre 钩子写入，匹配的 post 钩子取走
use crate::errno::Errno;
use crate::identity::ProcessIdentity;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ForkKind {
    // nativeForkAndSpecialize
    AppSpecialize,
    // nativeSpecializeAppProcess，Android 10 起的变体路径
    AppProcessSpecialize,
    // nativeForkSystemServer，只接线不处理
    SystemServer,
}

impl ForkKind {
    // 只有 app 两类 fork 参与身份采集与注入
    pub const fn injects(self) -> bool {
        matches!(self, Self::AppSpecialize | Self::AppProcessSpecialize)
    }

    const fn slot(self) -> usize {
        match self {
            Self::AppSpecialize => 0,
            Self::AppProcessSpecialize => 1,
            Self::SystemServer => 2,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ForkResult {
    Child,
    // zygote 侧，携带子进程 pid，对本模块无意义
    Parent(i32),
}

impl ForkResult {
    pub const fn from_code(code: i32) -> Self {
        if code == 0 {
            Self::Child
        } else {
            Self::Parent(code)
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ForkCycle {
    identity: ProcessIdentity,
    enabled: bool,
}

impl ForkCycle {
    pub(crate) fn new(identity: ProcessIdentity, enabled: bool) -> Self {
        Self { identity, enabled }
    }

    pub fn identity(&self) -> &ProcessIdentity {
        &self.identity
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }
}

// 每类 fork 最多一个未完成的周期
#[derive(Debug, Default)]
pub(crate) struct ForkCycles {
    slots: [Option<ForkCycle>; 3],
}

impl ForkCycles {
    // 覆盖同类未完成的旧周期，返回是否发生了覆盖
    pub(crate) fn begin(&mut self, kind: ForkKind, cycle: ForkCycle) -> bool {
        self.slots[kind.slot()].replace(cycle).is_some()
    }

    pub(crate) fn take(&mut self, kind: ForkKind) -> Option<ForkCycle> {
        self.slots[kind.slot()].take()
    }

    pub(crate) fn get(&self, kind: ForkKind) -> Option<&ForkCycle> {
        self.slots[kind.slot()].as_ref()
    }
}

// 单次钩子调用后周期所处的状态
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CycleState {
    Idle,
    PreCaptured { enabled: bool },
    NotMatched,
    Injected,
    Failed(Errno),
}

impl CycleState {
    pub(crate) fn from_injection(outcome: Result<(), Errno>) -> Self {
        match outcome {
            Ok(()) => Self::Injected,
            Err(errno) => Self::Failed(errno),
        }
    }
}
