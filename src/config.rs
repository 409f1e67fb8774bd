// 注入参数：目标包名、dex 候选路径、入口契约
// 所有取值在编译期固定，不读取环境变量或配置文件
use std::ffi::CStr;

pub const TARGET_PACKAGE: &CStr = c"com.tencent.mm";
pub const DEX_PRIMARY_PATH: &CStr = c"/data/local/tmp/libriru_module_xfingerprint_pay_wechat.dex";
pub const DEX_FALLBACK_PATH: &CStr =
    c"/system/framework/libriru_module_xfingerprint_pay_wechat.dex";
pub const STAGING_SUBDIR: &str = "cache";
pub const ENTRY_CLASS: &CStr = c"com.yyxx.wechatfp.xposed.plugin.XposedWeChatPlugin";
pub const ENTRY_METHOD: &str = "main";
pub const ENTRY_SIGNATURE: &str = "(Ljava/lang/String;)V";

// dex 候选位置的来源，仅用于日志
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CandidateOrigin {
    Primary,
    Fallback,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DexCandidate {
    pub origin: CandidateOrigin,
    pub path: &'static CStr,
}

pub const DEX_CANDIDATES: &[DexCandidate] = &[
    DexCandidate {
        origin: CandidateOrigin::Primary,
        path: DEX_PRIMARY_PATH,
    },
    DexCandidate {
        origin: CandidateOrigin::Fallback,
        path: DEX_FALLBACK_PATH,
    },
];

// 载荷须导出的入口：public static void main(String)
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EntryPoint {
    pub class_name: &'static CStr,
    pub method: &'static str,
    pub signature: &'static str,
}

pub const PAYLOAD_ENTRY: EntryPoint = EntryPoint {
    class_name: ENTRY_CLASS,
    method: ENTRY_METHOD,
    signature: ENTRY_SIGNATURE,
};

#[derive(Copy, Clone, Debug)]
pub struct InjectConfig {
    pub target_package: &'static CStr,
    // 按顺序探测，首个存在的路径胜出
    pub dex_candidates: &'static [DexCandidate],
    pub staging_subdir: &'static str,
    pub entry: EntryPoint,
}

impl Default for InjectConfig {
    fn default() -> Self {
        Self {
            target_package: TARGET_PACKAGE,
            dex_candidates: DEX_CANDIDATES,
            staging_subdir: STAGING_SUBDIR,
            entry: PAYLOAD_ENTRY,
        }
    }
}
