#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validate must never panic; both kinds of rejection are fine.
    if let Ok(cfg) = rover_config::load_toml(data) {
        if cfg.validate().is_ok() {
            // Anything that validates must also convert cleanly.
            let _t: rover_core::TransformCfg = (&cfg.control).into();
            let _s: rover_core::SafetyCfg = (&cfg.safety).into();
            let _l: rover_core::LoopCfg = (&cfg.runner).into();
        }
    }
});
