// Riru 模块注册：导出 init，协商 API 版本并返回回调描述符
use crate::errno::Errno;
use crate::log;
use crate::version;
use once_cell::sync::OnceCell;
use std::ffi::{CStr, CString};
use std::panic::{self, AssertUnwindSafe};

pub mod abi;
mod entry;

use abi::{Riru, RiruVersionedModuleInfo};

// 宿主在 init 时提供、整个进程生命周期内保留的信息
#[derive(Debug)]
pub(crate) struct HostRegistration {
    api_version: i32,
    // 宿主指针不保留，复制一份自有路径
    module_path: CString,
    // *mut c_int，API < 25 时为 0
    allow_unload: usize,
}

impl HostRegistration {
    pub(crate) unsafe fn from_host(riru: *const Riru) -> Result<Self, Errno> {
        if riru.is_null() {
            return Err(Errno::InvalidArg);
        }
        let host = &*riru;
        let Some(api_version) = version::negotiate_api_version(host.riru_api_version) else {
            log::warn(format_args!(
                "riru api {} is older than {}",
                host.riru_api_version,
                version::MIN_API_VERSION
            ));
            return Err(Errno::ApiTooOld);
        };
        let module_path = if host.magisk_module_path.is_null() {
            CString::default()
        } else {
            CStr::from_ptr(host.magisk_module_path).to_owned()
        };
        let allow_unload = if api_version >= version::ALLOW_UNLOAD_API_VERSION {
            host.allow_unload as usize
        } else {
            0
        };
        Ok(Self {
            api_version,
            module_path,
            allow_unload,
        })
    }

    // 只能在子进程调用；zygote 中卸载会破坏后续 fork
    pub(crate) fn allow_unload(&self) {
        if self.allow_unload == 0 {
            return;
        }
        unsafe {
            *(self.allow_unload as *mut libc::c_int) = 1;
        }
    }
}

static HOST: OnceCell<HostRegistration> = OnceCell::new();
// 泄漏的 RiruVersionedModuleInfo 地址，宿主持有至进程结束
static DESCRIPTOR: OnceCell<usize> = OnceCell::new();

pub(crate) fn api_version() -> i32 {
    HOST.get().map(|host| host.api_version).unwrap_or(0)
}

pub(crate) fn magisk_module_path() -> Option<&'static CStr> {
    HOST.get()
        .map(|host| host.module_path.as_c_str())
        .filter(|path| !path.is_empty())
}

pub(crate) fn allow_unload() {
    if let Some(host) = HOST.get() {
        host.allow_unload();
    }
}

unsafe fn register(riru: *const Riru) -> Result<*mut RiruVersionedModuleInfo, Errno> {
    let registration = HostRegistration::from_host(riru)?;
    let host = HOST.get_or_init(|| registration);
    let descriptor = *DESCRIPTOR.get_or_init(|| {
        Box::into_raw(Box::new(entry::descriptor(host.api_version))) as usize
    });
    Ok(descriptor as *mut RiruVersionedModuleInfo)
}

// Riru 入口，无法服务宿主时返回空指针
#[unsafe(no_mangle)]
pub unsafe extern "C" fn init(riru: *mut Riru) -> *mut RiruVersionedModuleInfo {
    entry::install_panic_hook();
    let registered = panic::catch_unwind(AssertUnwindSafe(|| unsafe { register(riru) }));
    match registered {
        Ok(Ok(descriptor)) => descriptor,
        Ok(Err(errno)) => {
            log::warn(format_args!(
                "riru init declined: {errno:?} (code {})",
                errno.as_i32()
            ));
            std::ptr::null_mut()
        }
        Err(_) => std::ptr::null_mut(),
    }
}

#[cfg(test)]
mod tests {
    use super::HostRegistration;
    use super::abi::Riru;
    use super::entry::{self, descriptor, guard_post};
    use crate::lifecycle::ForkResult;
    use crate::errno::Errno;
    use crate::version;
    use std::ffi::CStr;

    fn host(api: i32, path: &CStr, allow_unload: *mut libc::c_int) -> Riru {
        Riru {
            riru_api_version: api,
            unused: std::ptr::null_mut(),
            magisk_module_path: path.as_ptr(),
            allow_unload,
        }
    }

    #[test]
    fn null_host_is_rejected() {
        let result = unsafe { HostRegistration::from_host(std::ptr::null()) };
        assert_eq!(result.unwrap_err(), Errno::InvalidArg);
    }

    #[test]
    fn old_host_is_declined() {
        let riru = host(23, c"/data/adb/modules/riru_xfp", std::ptr::null_mut());
        let result = unsafe { HostRegistration::from_host(&riru) };
        assert_eq!(result.unwrap_err(), Errno::ApiTooOld);
    }

    #[test]
    fn module_path_is_copied() {
        let path = c"/data/adb/modules/riru_xfp".to_owned();
        let riru = host(26, &path, std::ptr::null_mut());
        let registration = unsafe { HostRegistration::from_host(&riru) }.unwrap();
        drop(path);
        assert_eq!(
            registration.module_path.as_c_str(),
            c"/data/adb/modules/riru_xfp"
        );
        assert_eq!(registration.api_version, version::MODULE_API_VERSION);
    }

    #[test]
    fn allow_unload_is_written_from_api_25() {
        let mut flag: libc::c_int = 0;
        let riru = host(25, c"/m", &mut flag);
        let registration = unsafe { HostRegistration::from_host(&riru) }.unwrap();
        registration.allow_unload();
        assert_eq!(flag, 1);
    }

    #[test]
    fn allow_unload_is_ignored_before_api_25() {
        let mut flag: libc::c_int = 0;
        let riru = host(24, c"/m", &mut flag);
        let registration = unsafe { HostRegistration::from_host(&riru) }.unwrap();
        registration.allow_unload();
        assert_eq!(flag, 0);
    }

    #[test]
    fn descriptor_wires_every_fork_hook() {
        let info = descriptor(25);
        assert_eq!(info.module_api_version, 25);
        let module = &info.module_info;
        assert_eq!(module.support_hide, 1);
        assert_eq!(module.version, version::version_code());
        let name = unsafe { CStr::from_ptr(module.version_name) };
        assert_eq!(name.to_str().unwrap(), version::version_str());
        assert!(module.on_module_loaded.is_some());
        assert!(module.should_skip_uid.is_none());
        assert!(module.fork_and_specialize_pre.is_some());
        assert!(module.fork_and_specialize_post.is_some());
        assert!(module.fork_system_server_pre.is_some());
        assert!(module.fork_system_server_post.is_some());
        assert!(module.specialize_app_process_pre.is_some());
        assert!(module.specialize_app_process_post.is_some());
    }

    #[test]
    fn parent_branch_panic_is_not_reported() {
        entry::install_panic_hook();

        let before = entry::reported_panics();
        guard_post(ForkResult::Parent(4242), || panic!("zygote side"));
        assert_eq!(entry::reported_panics(), before);

        guard_post(ForkResult::Child, || panic!("child side"));
        assert!(entry::reported_panics() > before);
    }
}
