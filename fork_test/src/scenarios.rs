mod art;
mod failures;
mod inject;
mod skip;

use crate::test_ctx::env_flag;

pub fn run_all() {
    run("target-primary", inject::scenario_target_primary);
    run("target-fallback", inject::scenario_target_fallback);
    run("app-process-specialize", inject::scenario_app_process_specialize);
    run("inject-once-per-process", inject::scenario_inject_once_per_process);
    run("other-app", skip::scenario_other_app);
    run("parent-branch", skip::scenario_parent_branch);
    run("system-server", skip::scenario_system_server);
    run("unreadable-data-dir", skip::scenario_unreadable_data_dir);
    run("missing-nice-name", skip::scenario_missing_nice_name);
    run("missing-dex", failures::scenario_missing_dex);
    run("missing-entry", failures::scenario_missing_entry);
    run("missing-class", failures::scenario_missing_class);
    run("lookup-fallback", failures::scenario_lookup_fallback);
    run("throwing-entry", failures::scenario_throwing_entry);

    // 无法加载 libart 的环境下可跳过真实 JNI 场景
    if env_flag("FORK_TEST_NO_ART") {
        println!("skip art scenarios");
        return;
    }
    run("art-string-bridge", art::scenario_string_bridge);
    run("art-entry-present", art::scenario_entry_present);
    run("art-inject-cycle", art::scenario_inject_cycle);
    run("art-missing-class", art::scenario_missing_class);
    run("art-missing-main", art::scenario_missing_main);
    run("art-throwing-main", art::scenario_throwing_main);
}

fn run(name: &str, scenario: fn()) {
    println!("scenario: {name}");
    scenario();
}
