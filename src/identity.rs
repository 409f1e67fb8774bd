// fork 前的进程身份采集
use crate::bridge;
use crate::errno::Errno;
use crate::log;
use crate::runtime::ManagedRuntime;
use std::ffi::{CStr, CString};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProcessIdentity {
    data_dir: CString,
    // 读取失败视为缺失，等同于不匹配任何目标
    nice_name: Option<CString>,
}

impl ProcessIdentity {
    pub fn new(data_dir: CString, nice_name: Option<CString>) -> Self {
        Self {
            data_dir,
            nice_name,
        }
    }

    pub fn data_dir(&self) -> &CStr {
        &self.data_dir
    }

    pub fn nice_name(&self) -> Option<&CStr> {
        self.nice_name.as_deref()
    }
}

// 数据目录缺失则放弃本次采集；进程名缺失不影响采集
pub(crate) fn capture<R: ManagedRuntime>(
    runtime: &mut R,
    data_dir: Option<&R::Text>,
    nice_name: Option<&R::Text>,
) -> Result<ProcessIdentity, Errno> {
    let Some(data_dir) = bridge::to_owned(runtime, data_dir) else {
        log::debug(format_args!("app data dir unavailable, skip capture"));
        return Err(Errno::NoDataDir);
    };
    let nice_name = bridge::to_owned(runtime, nice_name);
    if nice_name.is_none() {
        log::debug(format_args!("nice name unavailable for {data_dir:?}"));
    }
    Ok(ProcessIdentity::new(data_dir, nice_name))
}
