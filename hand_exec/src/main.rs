//! # Hand Executable
//!
//! Host side executable for the sensor glove. Streams telemetry from the glove over its serial
//! link, maps it into a hand pose and sends contact feedback commands back.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise session, logging and parameters
//!     - Open the link to the glove
//!     - Main loop:
//!         - Poll the link for one telemetry line
//!         - Decode, calibrate and map it into the latest pose
//!         - Sleep out the rest of the cycle
//!     - On Ctrl+C save the last pose and calibration into the session and close the link

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Result};
use log::{debug, info, trace, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use hand_lib::{
    hand_ctrl::{HandCtrl, PollOutcome},
    link::LinkSession,
    params::HandExecParams,
};
use util::{
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Period between pose summaries in the log.
const SUMMARY_PERIOD: Duration = Duration::from_secs(5);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "hand_exec", about = "Sensor glove host executable")]
struct Opt {
    /// Parameter file, relative to the params directory
    #[structopt(long, default_value = "hand_exec.toml")]
    params: String,

    /// Serial port of the glove, overrides the one in the parameter file
    #[structopt(long)]
    port: Option<String>,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("hand_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Sensor Glove Hand Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    debug!("CLI arguments: {:?}", opt);

    // ---- LOAD PARAMETERS ----

    let mut params: HandExecParams =
        util::params::load(&opt.params).wrap_err("Could not load hand_exec params")?;

    if let Some(port) = opt.port {
        params.link.port_name = port;
    }

    params.are_valid().wrap_err("Invalid hand_exec params")?;

    info!("Exec parameters loaded");

    // ---- SHUTDOWN HANDLER ----

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
        })
        .wrap_err("Failed to install the Ctrl+C handler")?;
    }

    // ---- INITIALISE HAND CONTROL ----

    let link = LinkSession::serial(params.read_timeout());
    let mut hand_ctrl = HandCtrl::new(link, &params, Some(&session))
        .wrap_err("Failed to initialise HandCtrl")?;

    info!("HandCtrl initialised");

    hand_ctrl
        .open(&params.link.port_name, params.link.baud_rate)
        .wrap_err("Failed to open the glove link")?;

    // ---- MAIN LOOP ----

    info!("Beginning main loop\n");

    let cycle_period = params.cycle_period();
    let mut last_summary = Instant::now();
    let mut num_transport_faults: u64 = 0;

    while running.load(Ordering::SeqCst) {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        let outcome = hand_ctrl.poll();
        if outcome == PollOutcome::TransportFault {
            num_transport_faults += 1;
        }

        if last_summary.elapsed() >= SUMMARY_PERIOD {
            last_summary = Instant::now();
            debug!(
                "{} frames applied, {} rejected, {} transport faults, wrist orientation {:?}",
                hand_ctrl.num_frames,
                hand_ctrl.num_rejected,
                num_transport_faults,
                hand_ctrl.latest_wrist_pose().euler_deg
            );
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            // An idle tick spent its time waiting out the read timeout, which is expected
            None if outcome == PollOutcome::Idle => trace!(
                "Idle cycle overran by {:.06} s",
                cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
            ),
            None => warn!(
                "Cycle overran by {:.06} s",
                cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
            ),
        }
    }

    // ---- SHUTDOWN ----

    info!("Shutdown requested");

    session.save("hand_pose.json", hand_ctrl.latest_pose().clone());
    session.save("calib.json", *hand_ctrl.calib());

    hand_ctrl.close();

    session.exit();

    info!("End of execution");

    Ok(())
}
