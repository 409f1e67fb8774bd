// 在测试进程内启动 ART，真实 JNI 场景共用同一个 VM
use std::ffi::OsString;

use jni::{InitArgsBuilder, JNIEnv, JNIVersion, JavaVM};
use once_cell::sync::OnceCell;

#[cfg(target_pointer_width = "64")]
const DEFAULT_LIBART: &str = "/apex/com.android.art/lib64/libart.so";
#[cfg(target_pointer_width = "32")]
const DEFAULT_LIBART: &str = "/apex/com.android.art/lib/libart.so";

// 一个进程只能创建一次 VM
static VM: OnceCell<JavaVM> = OnceCell::new();

fn libart_path() -> OsString {
    std::env::var_os("FORK_TEST_LIBART").unwrap_or_else(|| DEFAULT_LIBART.into())
}

pub fn vm() -> &'static JavaVM {
    VM.get_or_init(|| {
        // CheckJNI 下带着挂起异常继续调用 JNI 会直接 abort
        let args = InitArgsBuilder::new()
            .version(JNIVersion::V6)
            .option("-Xcheck:jni")
            .ignore_unrecognized(true)
            .build()
            .expect("build ART init args failed");
        JavaVM::with_libjvm(args, || Ok(libart_path())).expect("start ART failed")
    })
}

// 每个场景在独立的 local frame 中运行，返回前释放全部局部引用
pub fn with_env<F>(f: F)
where
    F: FnOnce(&mut JNIEnv<'_>),
{
    let mut env = vm()
        .attach_current_thread()
        .expect("attach current thread failed");
    env.with_local_frame(64, |env| -> jni::errors::Result<()> {
        f(env);
        Ok(())
    })
    .expect("local frame failed");
}
