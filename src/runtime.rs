// 托管运行时的晚绑定契约
// 注入流程只通过此 trait 与 ART 交互，类/方法按名称在运行时解析
use crate::config::EntryPoint;
use crate::errno::Errno;
use crate::loader::DexLoadRequest;
use std::ffi::{CStr, CString};

pub(crate) mod art;

pub use art::ArtRuntime;

// DexClassLoader 上解析类的两种方法，按 ORDER 顺序尝试
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ClassLookup {
    FindClass,
    LoadClass,
}

impl ClassLookup {
    pub const ORDER: [ClassLookup; 2] = [ClassLookup::FindClass, ClassLookup::LoadClass];
    pub const SIGNATURE: &'static str = "(Ljava/lang/String;)Ljava/lang/Class;";

    pub const fn method_name(self) -> &'static str {
        match self {
            Self::FindClass => "findClass",
            Self::LoadClass => "loadClass",
        }
    }
}

// 注入流程需要的运行时操作
// 任何失败都必须先清掉挂起的异常，再以 Errno 返回，不得终止进程
pub trait ManagedRuntime {
    // fork 钩子传入的宿主字符串句柄
    type Text;
    type Loader;
    type Class;
    type Lookup;
    type Entry;

    // 拷贝后立即释放运行时侧缓冲；空句柄或读取失败返回 None
    fn read_text(&mut self, text: &Self::Text) -> Option<CString>;

    fn system_loader(&mut self) -> Result<Self::Loader, Errno>;

    fn dex_loader(
        &mut self,
        request: &DexLoadRequest<'_>,
        parent: &Self::Loader,
    ) -> Result<Self::Loader, Errno>;

    fn class_lookup(&mut self, lookup: ClassLookup) -> Result<Self::Lookup, Errno>;

    fn load_class(
        &mut self,
        loader: &Self::Loader,
        lookup: &Self::Lookup,
        class_name: &CStr,
    ) -> Result<Self::Class, Errno>;

    fn static_entry(&mut self, class: &Self::Class, entry: &EntryPoint)
    -> Result<Self::Entry, Errno>;

    fn invoke_entry(
        &mut self,
        class: &Self::Class,
        entry: &Self::Entry,
        argument: &CStr,
    ) -> Result<(), Errno>;
}
