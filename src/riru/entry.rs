// 注册到宿主的回调函数表
// 每个回调都在 catch_unwind 内执行，panic 只会让本次注入跳过
use crate::lifecycle::{self, ForkArgs, ForkKind, ForkResult};
use crate::log;
use crate::runtime::ArtRuntime;
use crate::version;
use jni::JNIEnv;
use jni::objects::JString;
use jni::sys::{self, jboolean, jclass, jint, jintArray, jlong, jobjectArray, jstring};
use libc::{gid_t, uid_t};
use once_cell::sync::OnceCell;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::abi::{RiruModuleInfo, RiruVersionedModuleInfo};

pub(super) fn descriptor(api_version: i32) -> RiruVersionedModuleInfo {
    RiruVersionedModuleInfo {
        module_api_version: api_version,
        module_info: RiruModuleInfo {
            support_hide: 1,
            version: version::version_code(),
            version_name: version::version_name_ptr(),
            on_module_loaded: Some(on_module_loaded),
            should_skip_uid: None,
            fork_and_specialize_pre: Some(fork_and_specialize_pre),
            fork_and_specialize_post: Some(fork_and_specialize_post),
            fork_system_server_pre: Some(fork_system_server_pre),
            fork_system_server_post: Some(fork_system_server_post),
            specialize_app_process_pre: Some(specialize_app_process_pre),
            specialize_app_process_post: Some(specialize_app_process_post),
        },
    }
}

thread_local! {
    // zygote 侧 post 回调执行期间置位，panic 信息同样不能输出
    static PARENT_BRANCH: Cell<bool> = const { Cell::new(false) };
}

static PANIC_HOOK: OnceCell<()> = OnceCell::new();
static REPORTED_PANICS: AtomicUsize = AtomicUsize::new(0);

// 替换默认的 stderr 输出：子进程里转到 logcat，zygote 侧静默丢弃
pub(super) fn install_panic_hook() {
    PANIC_HOOK.get_or_init(|| {
        panic::set_hook(Box::new(|info| {
            if PARENT_BRANCH.with(Cell::get) {
                return;
            }
            REPORTED_PANICS.fetch_add(1, Ordering::Relaxed);
            log::error(format_args!("callback panicked: {info}"));
        }));
    });
}

#[cfg(test)]
pub(super) fn reported_panics() -> usize {
    REPORTED_PANICS.load(Ordering::Relaxed)
}

pub(super) fn guard<F: FnOnce()>(f: F) {
    let _ = panic::catch_unwind(AssertUnwindSafe(f));
}

pub(super) fn guard_post<F: FnOnce()>(result: ForkResult, f: F) {
    let parent = matches!(result, ForkResult::Parent(_));
    PARENT_BRANCH.with(|flag| flag.set(parent));
    guard(f);
    PARENT_BRANCH.with(|flag| flag.set(false));
}

unsafe fn read_handle<'local>(slot: *mut jstring) -> Option<JString<'local>> {
    if slot.is_null() || (*slot).is_null() {
        return None;
    }
    Some(JString::from_raw(*slot))
}

unsafe fn app_pre(
    kind: ForkKind,
    raw_env: *mut sys::JNIEnv,
    app_data_dir: *mut jstring,
    nice_name: *mut jstring,
) {
    let Ok(mut env) = JNIEnv::from_raw(raw_env) else {
        log::warn(format_args!("{kind:?} pre without JNIEnv"));
        return;
    };
    let data_dir = read_handle(app_data_dir);
    let nice_name = read_handle(nice_name);
    let mut runtime = ArtRuntime::new(&mut env);
    lifecycle::pre_fork(
        kind,
        &mut runtime,
        ForkArgs::new(data_dir.as_ref(), nice_name.as_ref()),
    );
}

// zygote 侧也会进入这里，失败路径保持静默
unsafe fn app_post(kind: ForkKind, raw_env: *mut sys::JNIEnv, result: ForkResult) {
    let Ok(mut env) = JNIEnv::from_raw(raw_env) else {
        return;
    };
    let mut runtime = ArtRuntime::new(&mut env);
    lifecycle::post_fork(kind, &mut runtime, result);
    if result == ForkResult::Child {
        super::allow_unload();
    }
}

unsafe extern "C" fn on_module_loaded() {
    guard(|| {
        log::info(format_args!(
            "{} loaded, riru api {}, module path {:?}",
            version::version_str_full(),
            super::api_version(),
            super::magisk_module_path()
        ));
    });
}

#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn fork_and_specialize_pre(
    env: *mut sys::JNIEnv,
    _clazz: jclass,
    _uid: *mut jint,
    _gid: *mut jint,
    _gids: *mut jintArray,
    _runtime_flags: *mut jint,
    _rlimits: *mut jobjectArray,
    _mount_external: *mut jint,
    _se_info: *mut jstring,
    nice_name: *mut jstring,
    _fds_to_close: *mut jintArray,
    _fds_to_ignore: *mut jintArray,
    _is_child_zygote: *mut jboolean,
    _instruction_set: *mut jstring,
    app_data_dir: *mut jstring,
    _is_top_app: *mut jboolean,
    _pkg_data_info_list: *mut jobjectArray,
    _whitelisted_data_info_list: *mut jobjectArray,
    _bind_mount_app_data_dirs: *mut jboolean,
    _bind_mount_app_storage_dirs: *mut jboolean,
) {
    guard(|| unsafe { app_pre(ForkKind::AppSpecialize, env, app_data_dir, nice_name) });
}

unsafe extern "C" fn fork_and_specialize_post(env: *mut sys::JNIEnv, _clazz: jclass, res: jint) {
    let result = ForkResult::from_code(res);
    guard_post(result, || unsafe { app_post(ForkKind::AppSpecialize, env, result) });
}

#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn fork_system_server_pre(
    _env: *mut sys::JNIEnv,
    _clazz: jclass,
    _uid: *mut uid_t,
    _gid: *mut gid_t,
    _gids: *mut jintArray,
    _runtime_flags: *mut jint,
    _rlimits: *mut jobjectArray,
    _permitted_capabilities: *mut jlong,
    _effective_capabilities: *mut jlong,
) {
    guard(|| {
        lifecycle::system_server_pre();
    });
}

unsafe extern "C" fn fork_system_server_post(_env: *mut sys::JNIEnv, _clazz: jclass, res: jint) {
    let result = ForkResult::from_code(res);
    guard_post(result, || {
        lifecycle::system_server_post(result);
    });
}

// Android 10 起新增，部分设备（如 Pixel）上未启用
#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn specialize_app_process_pre(
    env: *mut sys::JNIEnv,
    _clazz: jclass,
    _uid: *mut jint,
    _gid: *mut jint,
    _gids: *mut jintArray,
    _runtime_flags: *mut jint,
    _rlimits: *mut jobjectArray,
    _mount_external: *mut jint,
    _se_info: *mut jstring,
    nice_name: *mut jstring,
    _start_child_zygote: *mut jboolean,
    _instruction_set: *mut jstring,
    app_data_dir: *mut jstring,
    _is_top_app: *mut jboolean,
    _pkg_data_info_list: *mut jobjectArray,
    _whitelisted_data_info_list: *mut jobjectArray,
    _bind_mount_app_data_dirs: *mut jboolean,
    _bind_mount_app_storage_dirs: *mut jboolean,
) {
    guard(|| unsafe {
        app_pre(ForkKind::AppProcessSpecialize, env, app_data_dir, nice_name)
    });
}

unsafe extern "C" fn specialize_app_process_post(env: *mut sys::JNIEnv, _clazz: jclass) {
    guard_post(ForkResult::Child, || unsafe {
        app_post(ForkKind::AppProcessSpecialize, env, ForkResult::Child)
    });
}
