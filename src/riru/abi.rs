// Riru v25/v26 模块接口的 C 布局，字段顺序必须与 riru.h 一致
use jni::sys::{JNIEnv, jboolean, jclass, jint, jintArray, jlong, jobjectArray, jstring};
use libc::{c_char, c_int, c_void, gid_t, uid_t};

pub type OnModuleLoaded = unsafe extern "C" fn();

pub type ShouldSkipUid = unsafe extern "C" fn(uid: c_int) -> c_int;

pub type ForkAndSpecializePre = unsafe extern "C" fn(
    env: *mut JNIEnv,
    clazz: jclass,
    uid: *mut jint,
    gid: *mut jint,
    gids: *mut jintArray,
    runtime_flags: *mut jint,
    rlimits: *mut jobjectArray,
    mount_external: *mut jint,
    se_info: *mut jstring,
    nice_name: *mut jstring,
    fds_to_close: *mut jintArray,
    fds_to_ignore: *mut jintArray,
    is_child_zygote: *mut jboolean,
    instruction_set: *mut jstring,
    app_data_dir: *mut jstring,
    is_top_app: *mut jboolean,
    pkg_data_info_list: *mut jobjectArray,
    whitelisted_data_info_list: *mut jobjectArray,
    bind_mount_app_data_dirs: *mut jboolean,
    bind_mount_app_storage_dirs: *mut jboolean,
);

// res == 0 表示子进程，否则为 zygote 侧且 res 为子进程 pid
pub type ForkAndSpecializePost = unsafe extern "C" fn(env: *mut JNIEnv, clazz: jclass, res: jint);

pub type ForkSystemServerPre = unsafe extern "C" fn(
    env: *mut JNIEnv,
    clazz: jclass,
    uid: *mut uid_t,
    gid: *mut gid_t,
    gids: *mut jintArray,
    runtime_flags: *mut jint,
    rlimits: *mut jobjectArray,
    permitted_capabilities: *mut jlong,
    effective_capabilities: *mut jlong,
);

pub type ForkSystemServerPost = unsafe extern "C" fn(env: *mut JNIEnv, clazz: jclass, res: jint);

pub type SpecializeAppProcessPre = unsafe extern "C" fn(
    env: *mut JNIEnv,
    clazz: jclass,
    uid: *mut jint,
    gid: *mut jint,
    gids: *mut jintArray,
    runtime_flags: *mut jint,
    rlimits: *mut jobjectArray,
    mount_external: *mut jint,
    se_info: *mut jstring,
    nice_name: *mut jstring,
    start_child_zygote: *mut jboolean,
    instruction_set: *mut jstring,
    app_data_dir: *mut jstring,
    is_top_app: *mut jboolean,
    pkg_data_info_list: *mut jobjectArray,
    whitelisted_data_info_list: *mut jobjectArray,
    bind_mount_app_data_dirs: *mut jboolean,
    bind_mount_app_storage_dirs: *mut jboolean,
);

// 只在已特化的进程内调用，没有返回码
pub type SpecializeAppProcessPost = unsafe extern "C" fn(env: *mut JNIEnv, clazz: jclass);

#[repr(C)]
pub struct RiruModuleInfo {
    pub support_hide: c_int,
    pub version: c_int,
    pub version_name: *const c_char,
    pub on_module_loaded: Option<OnModuleLoaded>,
    pub should_skip_uid: Option<ShouldSkipUid>,
    pub fork_and_specialize_pre: Option<ForkAndSpecializePre>,
    pub fork_and_specialize_post: Option<ForkAndSpecializePost>,
    pub fork_system_server_pre: Option<ForkSystemServerPre>,
    pub fork_system_server_post: Option<ForkSystemServerPost>,
    pub specialize_app_process_pre: Option<SpecializeAppProcessPre>,
    pub specialize_app_process_post: Option<SpecializeAppProcessPost>,
}

#[repr(C)]
pub struct RiruVersionedModuleInfo {
    pub module_api_version: c_int,
    pub module_info: RiruModuleInfo,
}

// 宿主传给 init 的参数块
#[repr(C)]
pub struct Riru {
    pub riru_api_version: c_int,
    pub unused: *mut c_void,
    pub magisk_module_path: *const c_char,
    // API >= 25 才有效
    pub allow_unload: *mut c_int,
}
