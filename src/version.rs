// 模块版本与 Riru API 版本协商
const VERSION_STR: &str = env!("CARGO_PKG_VERSION");
const VERSION_NAME_C: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();

// 模块按此版本的结构体布局构建
pub const MODULE_API_VERSION: i32 = 26;
// 低于此版本的宿主描述符布局不同，无法对接
pub const MIN_API_VERSION: i32 = 24;
// allowUnload 指针自此版本起提供
pub const ALLOW_UNLOAD_API_VERSION: i32 = 25;

#[cfg(target_arch = "aarch64")]
const VERSION_ARCH: &str = "aarch64";
#[cfg(target_arch = "arm")]
const VERSION_ARCH: &str = "arm";
#[cfg(target_arch = "x86_64")]
const VERSION_ARCH: &str = "x86_64";
#[cfg(target_arch = "x86")]
const VERSION_ARCH: &str = "x86";
#[cfg(not(any(
    target_arch = "aarch64",
    target_arch = "arm",
    target_arch = "x86_64",
    target_arch = "x86"
)))]
const VERSION_ARCH: &str = "unknown";

// 返回十进制版本号：major * 10000 + minor * 100 + patch
pub fn version_code() -> i32 {
    let normalized = VERSION_STR.split(['-', '+']).next().unwrap_or(VERSION_STR);
    let mut parts = normalized.split('.');

    let major = parse_part(parts.next());
    let minor = parse_part(parts.next());
    let patch = parse_part(parts.next());

    major * 10000 + minor * 100 + patch
}

pub fn version_str() -> &'static str {
    VERSION_STR
}

// 以 NUL 结尾的版本名，直接填入描述符
pub fn version_name_ptr() -> *const libc::c_char {
    VERSION_NAME_C.as_ptr() as *const libc::c_char
}

pub fn version_str_full() -> String {
    format!(
        "riru_xfingerprint_pay_wechat {} ({}) api {}",
        version_str(),
        VERSION_ARCH,
        MODULE_API_VERSION
    )
}

// 取宿主与模块支持版本的较小值；宿主过旧时返回 None
pub fn negotiate_api_version(host_api_version: i32) -> Option<i32> {
    if host_api_version < MIN_API_VERSION {
        return None;
    }
    Some(host_api_version.min(MODULE_API_VERSION))
}

fn parse_part(part: Option<&str>) -> i32 {
    part.and_then(|value| value.parse::<i32>().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{MIN_API_VERSION, MODULE_API_VERSION, negotiate_api_version, version_code};

    #[test]
    fn newer_host_is_capped_to_module_version() {
        assert_eq!(negotiate_api_version(MODULE_API_VERSION + 4), Some(MODULE_API_VERSION));
    }

    #[test]
    fn older_supported_host_keeps_its_version() {
        assert_eq!(negotiate_api_version(25), Some(25));
        assert_eq!(negotiate_api_version(MIN_API_VERSION), Some(MIN_API_VERSION));
    }

    #[test]
    fn host_below_minimum_is_declined() {
        assert_eq!(negotiate_api_version(MIN_API_VERSION - 1), None);
        assert_eq!(negotiate_api_version(0), None);
    }

    #[test]
    fn version_code_matches_package_version() {
        assert_eq!(version_code(), 10000);
    }
}
