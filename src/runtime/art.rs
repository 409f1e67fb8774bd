// 基于 JNI 的 ManagedRuntime 实现，运行在 zygote 派生出的 ART 进程中
use crate::bridge;
use crate::config::EntryPoint;
use crate::errno::Errno;
use crate::loader::DexLoadRequest;
use crate::log;
use jni::JNIEnv;
use jni::objects::{JClass, JMethodID, JObject, JStaticMethodID, JString, JValue};
use jni::signature::{Primitive, ReturnType};
use std::ffi::{CStr, CString};

use super::{ClassLookup, ManagedRuntime};

const CLASS_LOADER: &str = "java/lang/ClassLoader";
const GET_SYSTEM_CLASS_LOADER: &str = "getSystemClassLoader";
const GET_SYSTEM_CLASS_LOADER_SIG: &str = "()Ljava/lang/ClassLoader;";
const DEX_CLASS_LOADER: &str = "dalvik/system/DexClassLoader";
// (dexPath, optimizedDirectory, librarySearchPath, parent)
const DEX_CLASS_LOADER_INIT_SIG: &str =
    "(Ljava/lang/String;Ljava/lang/String;Ljava/lang/String;Ljava/lang/ClassLoader;)V";

pub struct ArtRuntime<'a, 'local> {
    env: &'a mut JNIEnv<'local>,
}

impl<'a, 'local> ArtRuntime<'a, 'local> {
    pub fn new(env: &'a mut JNIEnv<'local>) -> Self {
        Self { env }
    }

    // 失败时清理挂起的 Java 异常，再映射为错误码
    fn settle<T>(&mut self, result: jni::errors::Result<T>, errno: Errno, op: &str) -> Result<T, Errno> {
        match result {
            Ok(value) => Ok(value),
            Err(err) => {
                clear_pending_exception(self.env);
                log::warn(format_args!("{op} failed: {err} ({errno:?})"));
                Err(errno)
            }
        }
    }

    fn new_text(&mut self, value: &CStr) -> Result<JString<'local>, Errno> {
        let Ok(text) = value.to_str() else {
            log::warn(format_args!("{value:?} is not valid utf-8"));
            return Err(Errno::Encoding);
        };
        let result = self.env.new_string(text);
        self.settle(result, Errno::Oom, "NewStringUTF")
    }
}

impl<'a, 'local> ManagedRuntime for ArtRuntime<'a, 'local> {
    type Text = JString<'local>;
    type Loader = JObject<'local>;
    type Class = JClass<'local>;
    type Lookup = JMethodID;
    type Entry = JStaticMethodID;

    fn read_text(&mut self, text: &JString<'local>) -> Option<CString> {
        bridge::jstring_to_owned(self.env, text)
    }

    fn system_loader(&mut self) -> Result<JObject<'local>, Errno> {
        let result = self
            .env
            .call_static_method(
                CLASS_LOADER,
                GET_SYSTEM_CLASS_LOADER,
                GET_SYSTEM_CLASS_LOADER_SIG,
                &[],
            )
            .and_then(|value| value.l());
        let loader = self.settle(result, Errno::NoSystemLoader, "ClassLoader.getSystemClassLoader")?;
        if loader.is_null() {
            return Err(Errno::NoSystemLoader);
        }
        Ok(loader)
    }

    fn dex_loader(
        &mut self,
        request: &DexLoadRequest<'_>,
        parent: &JObject<'local>,
    ) -> Result<JObject<'local>, Errno> {
        let dex_path = self.new_text(request.dex_path)?;
        let staging_dir = self.new_text(&request.staging_dir)?;
        let no_library_path = JObject::null();
        let result = self.env.new_object(
            DEX_CLASS_LOADER,
            DEX_CLASS_LOADER_INIT_SIG,
            &[
                JValue::Object(&dex_path),
                JValue::Object(&staging_dir),
                JValue::Object(&no_library_path),
                JValue::Object(parent),
            ],
        );
        let loader = self.settle(result, Errno::NoDexLoader, "DexClassLoader.<init>")?;
        if loader.is_null() {
            return Err(Errno::NoDexLoader);
        }
        Ok(loader)
    }

    fn class_lookup(&mut self, lookup: ClassLookup) -> Result<JMethodID, Errno> {
        let result = self
            .env
            .get_method_id(DEX_CLASS_LOADER, lookup.method_name(), ClassLookup::SIGNATURE);
        self.settle(result, Errno::NoClassLookup, lookup.method_name())
    }

    fn load_class(
        &mut self,
        loader: &JObject<'local>,
        lookup: &JMethodID,
        class_name: &CStr,
    ) -> Result<JClass<'local>, Errno> {
        let name = self.new_text(class_name)?;
        let args = [JValue::Object(&name).as_jni()];
        let result = unsafe {
            self.env
                .call_method_unchecked(loader, *lookup, ReturnType::Object, &args)
        }
        .and_then(|value| value.l());
        let class = self.settle(result, Errno::ClassNotFound, "load payload class")?;
        if class.is_null() {
            return Err(Errno::ClassNotFound);
        }
        Ok(JClass::from(class))
    }

    fn static_entry(
        &mut self,
        class: &JClass<'local>,
        entry: &EntryPoint,
    ) -> Result<JStaticMethodID, Errno> {
        let result = self
            .env
            .get_static_method_id(class, entry.method, entry.signature);
        self.settle(result, Errno::EntryNotFound, entry.method)
    }

    fn invoke_entry(
        &mut self,
        class: &JClass<'local>,
        entry: &JStaticMethodID,
        argument: &CStr,
    ) -> Result<(), Errno> {
        let argument = self.new_text(argument)?;
        let args = [JValue::Object(&argument).as_jni()];
        let result = unsafe {
            self.env.call_static_method_unchecked(
                class,
                *entry,
                ReturnType::Primitive(Primitive::Void),
                &args,
            )
        };
        self.settle(result, Errno::InvokeFailed, "invoke payload entry")
            .map(|_| ())
    }
}

// 打印并清除挂起的 Java 异常，避免带着异常返回宿主
pub(crate) fn clear_pending_exception(env: &mut JNIEnv<'_>) {
    if env.exception_check().unwrap_or(false) {
        if log::debug_enabled() {
            let _ = env.exception_describe();
        }
        let _ = env.exception_clear();
    }
}
