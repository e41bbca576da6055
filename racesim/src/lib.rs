pub mod error;

pub mod core {
    pub mod agent;
    pub mod handle_race;
    pub mod pit_stop;
    pub mod race;
    pub mod race_events;
    pub mod ranking;
    pub mod scheduler;
    pub mod state_handler;
    pub mod tireset;
    pub mod track;
}

pub mod interfaces {
    pub mod advisory_interface;
    pub mod control_interface;
    pub mod render_interface;
}

pub mod post {
    pub mod race_result;
}

pub mod pre {
    pub mod read_sim_pars;
    pub mod sim_opts;
}
