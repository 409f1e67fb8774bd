// dex 候选路径解析：按顺序探测，首个存在者胜出，不存在时不再兜底
use crate::config::DexCandidate;
use crate::log;
use std::ffi::CStr;

pub trait PathProbe {
    fn exists(&self, path: &CStr) -> bool;
}

// 等价于 access(path, F_OK)，不做权限协商
#[derive(Copy, Clone, Debug, Default)]
pub struct AccessProbe;

impl PathProbe for AccessProbe {
    fn exists(&self, path: &CStr) -> bool {
        unsafe { libc::access(path.as_ptr(), libc::F_OK) == 0 }
    }
}

pub(crate) fn resolve<'c, P: PathProbe + ?Sized>(
    candidates: &'c [DexCandidate],
    probe: &P,
) -> Option<&'c DexCandidate> {
    candidates.iter().find(|candidate| {
        let found = probe.exists(candidate.path);
        log::debug(format_args!(
            "dex candidate {:?} {:?} exists={found}",
            candidate.origin, candidate.path
        ));
        found
    })
}
