// 注入流程错误码
// 所有错误都只终止当前 fork 周期，不会回传给宿主；数值只用于日志
#[repr(i32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Errno {
    InvalidArg = 1,      // 宿主传入的参数无效
    ApiTooOld = 2,       // 宿主 Riru API 版本过低
    NoDataDir = 3,       // 数据目录句柄为空或无法读取
    PathTooLong = 4,     // 拼接后的路径超过 PATH_MAX
    Encoding = 5,        // 字符串无法转为托管字符串
    NoDexFile = 6,       // 所有候选 dex 路径均不存在
    NoSystemLoader = 7,  // 获取系统 ClassLoader 失败
    NoDexLoader = 8,     // 构造 DexClassLoader 失败
    NoClassLookup = 9,   // findClass/loadClass 均不可用
    ClassNotFound = 10,  // 目标类加载失败
    EntryNotFound = 11,  // 入口静态方法不存在
    InvokeFailed = 12,   // 入口方法调用抛出异常
    Oom = 13,            // 托管堆分配失败
}

impl Errno {
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

#[cfg(test)]
mod tests {
    use super::Errno;

    #[test]
    fn codes_are_stable() {
        assert_eq!(Errno::InvalidArg.as_i32(), 1);
        assert_eq!(Errno::NoDexFile.as_i32(), 6);
        assert_eq!(Errno::InvokeFailed.as_i32(), 12);
        assert_eq!(Errno::Oom.as_i32(), 13);
    }
}
