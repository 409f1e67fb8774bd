// 宿主字符串句柄到进程内自有字节串的转换
// 返回的 CString 与句柄生命周期无关；None 表示缺失，与空串严格区分
use crate::log;
use crate::runtime::ManagedRuntime;
use crate::runtime::art::clear_pending_exception;
use jni::JNIEnv;
use jni::objects::JString;
use std::ffi::{CStr, CString};

pub(crate) fn to_owned<R: ManagedRuntime>(runtime: &mut R, handle: Option<&R::Text>) -> Option<CString> {
    runtime.read_text(handle?)
}

// GetStringUTFChars 拷贝后立即释放；释放由 JavaStr 的 Drop 完成，失败路径同样成立
pub(crate) fn jstring_to_owned(env: &mut JNIEnv<'_>, handle: &JString<'_>) -> Option<CString> {
    if handle.is_null() {
        return None;
    }
    let chars = match env.get_string(handle) {
        Ok(chars) => chars,
        Err(err) => {
            clear_pending_exception(env);
            log::warn(format_args!("GetStringUTFChars failed: {err}"));
            return None;
        }
    };
    let raw = chars.get_raw();
    if raw.is_null() {
        return None;
    }
    let owned = unsafe { CStr::from_ptr(raw) }.to_owned();
    drop(chars);
    Some(owned)
}

#[cfg(test)]
mod tests {
    use super::to_owned;
    use crate::testing::{Call, FakeRuntime, FakeText};

    #[test]
    fn null_handle_is_absent_without_touching_runtime() {
        let mut runtime = FakeRuntime::default();
        assert_eq!(to_owned(&mut runtime, None), None);
        assert!(runtime.calls.is_empty());
    }

    #[test]
    fn empty_string_is_not_absent() {
        let mut runtime = FakeRuntime::default();
        let text = FakeText::new("");
        let owned = to_owned(&mut runtime, Some(&text)).unwrap();
        assert!(owned.as_bytes().is_empty());
        assert_eq!(runtime.calls, vec![Call::ReadText]);
    }

    #[test]
    fn unreadable_handle_is_absent() {
        let mut runtime = FakeRuntime::default();
        assert_eq!(to_owned(&mut runtime, Some(&FakeText::Unreadable)), None);
    }

    #[test]
    fn copy_outlives_source_handle() {
        let mut runtime = FakeRuntime::default();
        let text = FakeText::new("/data/user/0/com.tencent.mm");
        let owned = to_owned(&mut runtime, Some(&text));
        drop(text);
        assert_eq!(owned.as_deref(), Some(c"/data/user/0/com.tencent.mm"));
    }
}
