include!(concat!(env!("OUT_DIR"), "/vhs_action_config.rs"));
