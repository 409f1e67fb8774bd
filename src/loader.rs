// 动态加载调用：在当前进程的 ART 中加载外部 dex 并调用其静态入口
//
// 顺序固定：解析 dex 路径 -> 系统 ClassLoader -> DexClassLoader
// -> findClass/loadClass -> 静态入口 -> 同步调用。
// 任一步失败即返回，入口方法要么完整调用，要么完全不调用。
use crate::config::{EntryPoint, InjectConfig};
use crate::errno::Errno;
use crate::log;
use crate::runtime::{ClassLookup, ManagedRuntime};
use std::ffi::{CStr, CString};

pub mod candidate;

pub use candidate::{AccessProbe, PathProbe};

// 单次加载调用请求，每次现建，不跨调用保留
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DexLoadRequest<'a> {
    pub dex_path: &'static CStr,
    // <dataDir>/cache，存放 ART 优化产物
    pub staging_dir: CString,
    pub entry: EntryPoint,
    pub argument: &'a CStr,
}

impl<'a> DexLoadRequest<'a> {
    pub fn resolve<P: PathProbe + ?Sized>(
        config: &InjectConfig,
        probe: &P,
        data_dir: &'a CStr,
    ) -> Result<Self, Errno> {
        let staging_dir = staging_dir(data_dir, config.staging_subdir)?;
        let Some(candidate) = candidate::resolve(config.dex_candidates, probe) else {
            log::error(format_args!("no dex file found in {} candidates", config.dex_candidates.len()));
            return Err(Errno::NoDexFile);
        };
        Ok(Self {
            dex_path: candidate.path,
            staging_dir,
            entry: config.entry,
            argument: data_dir,
        })
    }
}

pub(crate) fn staging_dir(data_dir: &CStr, subdir: &str) -> Result<CString, Errno> {
    let mut path = Vec::with_capacity(data_dir.to_bytes().len() + subdir.len() + 1);
    path.extend_from_slice(data_dir.to_bytes());
    path.push(b'/');
    path.extend_from_slice(subdir.as_bytes());
    // 含结尾 NUL 在内不得超过 PATH_MAX
    if path.len() >= libc::PATH_MAX as usize {
        log::warn(format_args!("staging dir exceeds PATH_MAX ({} bytes)", path.len()));
        return Err(Errno::PathTooLong);
    }
    CString::new(path).map_err(|_| Errno::InvalidArg)
}

pub(crate) fn inject<R, P>(
    runtime: &mut R,
    probe: &P,
    config: &InjectConfig,
    data_dir: &CStr,
) -> Result<(), Errno>
where
    R: ManagedRuntime,
    P: PathProbe + ?Sized,
{
    let request = DexLoadRequest::resolve(config, probe, data_dir)?;
    log::info(format_args!(
        "load {:?} staging={:?}",
        request.dex_path, request.staging_dir
    ));

    let parent = runtime.system_loader()?;
    let loader = runtime.dex_loader(&request, &parent)?;
    let (lookup_kind, lookup) = resolve_class_lookup(runtime)?;
    let class = runtime
        .load_class(&loader, &lookup, request.entry.class_name)
        .inspect_err(|errno| {
            log::error(format_args!(
                "{:?} via {} failed: {errno:?}",
                request.entry.class_name,
                lookup_kind.method_name()
            ))
        })?;
    let entry = match runtime.static_entry(&class, &request.entry) {
        Ok(entry) => entry,
        Err(errno) => {
            log::error(format_args!(
                "target method({}{}) not found",
                request.entry.method, request.entry.signature
            ));
            return Err(errno);
        }
    };

    runtime.invoke_entry(&class, &entry, request.argument)?;
    log::info(format_args!(
        "{:?}.{} returned",
        request.entry.class_name, request.entry.method
    ));
    Ok(())
}

// findClass 不可用时退回 loadClass
fn resolve_class_lookup<R: ManagedRuntime>(runtime: &mut R) -> Result<(ClassLookup, R::Lookup), Errno> {
    for kind in ClassLookup::ORDER {
        if let Ok(lookup) = runtime.class_lookup(kind) {
            return Ok((kind, lookup));
        }
        log::debug(format_args!("{} unavailable", kind.method_name()));
    }
    Err(Errno::NoClassLookup)
}

#[cfg(test)]
mod tests;
