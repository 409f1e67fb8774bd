// 目标进程判定，是注入行为的唯一开关
use std::ffi::CStr;

// 两侧都缺失才相等，仅一侧缺失永不相等；比较按字节、区分大小写
pub fn nullable_equals(left: Option<&CStr>, right: Option<&CStr>) -> bool {
    match (left, right) {
        (None, None) => true,
        (Some(left), Some(right)) => left.to_bytes() == right.to_bytes(),
        _ => false,
    }
}

pub fn is_target(nice_name: Option<&CStr>, target_package: &CStr) -> bool {
    nullable_equals(nice_name, Some(target_package))
}

#[cfg(test)]
mod tests {
    use super::{is_target, nullable_equals};

    #[test]
    fn exact_name_matches() {
        assert!(is_target(Some(c"com.tencent.mm"), c"com.tencent.mm"));
    }

    #[test]
    fn absent_name_never_matches() {
        assert!(!is_target(None, c"com.tencent.mm"));
    }

    #[test]
    fn comparison_is_byte_exact() {
        assert!(!is_target(Some(c"com.tencent.MM"), c"com.tencent.mm"));
        assert!(!is_target(Some(c"com.tencent.mm:push"), c"com.tencent.mm"));
        assert!(!is_target(Some(c"com.tencent.m"), c"com.tencent.mm"));
        assert!(!is_target(Some(c""), c"com.tencent.mm"));
    }

    #[test]
    fn both_absent_compare_equal() {
        assert!(nullable_equals(None, None));
        assert!(!nullable_equals(Some(c""), None));
        assert!(!nullable_equals(None, Some(c"")));
    }
}
