mod scenarios;
mod test_ctx;
mod vm;

use riru_xfingerprint_pay_wechat::{get_version, set_debug};

use crate::test_ctx::env_flag;

fn main() {
    set_debug(env_flag("FORK_TEST_VERBOSE"));
    println!("{}", get_version());
    scenarios::run_all();
    println!("fork_test all scenarios passed");
}
