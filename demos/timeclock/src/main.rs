//! Time clock demo
//!
//! Brings up, in one process:
//! - N clock replicas, each a one-slot servant registry on its own ORB
//! - a shift office publishing the shift factory
//! - a terminal that consumes the shift factory and provides its display
//!
//! The terminal connects to every clock replica it finds in the naming
//! directory, clocks employees in (one transient shift each), shows the
//! replica times on its display, and clocks everyone out again.
//!
//! USAGE:
//!   timeclock [OPTIONS] [-- ORB OPTIONS]
//!
//! EXAMPLES:
//!   timeclock                                  # two replicas, two employees
//!   timeclock -r 3 -e alice -e bob             # three replicas, named employees
//!   timeclock --serve -- -ORBDomain timeclock  # keep serving until Ctrl+C

mod common;

use std::sync::Arc;
use std::thread;

use clap::Parser;
use orbkit::{compose_roles, Destroyable, MultiClient, RegistryConfig, ServantRegistry, StopSignal};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use common::*;

#[derive(Parser, Debug)]
#[command(name = "timeclock")]
#[command(version)]
#[command(about = "Time clock demo: clock replicas, a shift office and a terminal")]
struct Args {
    /// Number of clock replicas to publish
    #[arg(short, long, default_value_t = 2)]
    replicas: usize,

    /// Employees to clock in (repeatable)
    #[arg(short, long = "employee")]
    employees: Vec<String>,

    /// Keep serving after clocking in until Ctrl+C
    #[arg(long)]
    serve: bool,

    /// Log lifecycle steps at debug level
    #[arg(short, long)]
    verbose: bool,

    /// Options passed to every ORB, e.g. `-ORBDomain timeclock`
    #[arg(last = true)]
    orb_args: Vec<String>,
}

compose_roles! {
    /// Publishes the shift factory
    struct ShiftOffice {
        Provided<ShiftFactoryServant>,
    }
}

compose_roles! {
    /// Opens shifts at the office and shows them on its own display
    struct Terminal {
        Consumed<ShiftFactory>,
        Provided<DisplayServant>,
    }
}

/// Trigger `stop` when the process receives Ctrl+C
fn forward_ctrl_c(stop: StopSignal) -> std::io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    thread::Builder::new()
        .name("ctrl-c".to_string())
        .spawn(move || {
            match runtime.block_on(tokio::signal::ctrl_c()) {
                Ok(()) => info!("Ctrl+C received, shutting down"),
                Err(e) => warn!("cannot listen for Ctrl+C: {}", e),
            }
            stop.trigger();
        })?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    println!("========================================================");
    println!("                  Time Clock Demo");
    println!("========================================================");
    println!("  Replicas:  {}", args.replicas);
    println!("  ORB args:  {:?}", args.orb_args);
    println!("  Clocks:    {}/<replica>", CLOCKS_CONTEXT);
    println!("  Shifts:    {}", SHIFT_OFFICE);
    println!("  Display:   {}", TERMINAL_DISPLAY);
    println!("========================================================");
    println!();

    // Clock replicas, one ORB each
    let mut replicas = Vec::with_capacity(args.replicas);
    for i in 0..args.replicas {
        let name = format!("clock{}", i);
        let mut registry =
            ServantRegistry::<1>::create(&name, &args.orb_args, RegistryConfig::default())?;
        registry.register(
            0,
            &format!("{}/{}", CLOCKS_CONTEXT, name),
            Arc::new(ClockServant::new(name.as_str(), i as i64)),
            None,
        )?;
        registry.start()?;
        replicas.push(registry);
    }

    let mut office = ShiftOffice::new("office", &args.orb_args)?;
    office.register::<ShiftFactoryServant>(SHIFT_OFFICE, Arc::new(ShiftFactoryServant::default()))?;
    office.registry_mut().start()?;

    let mut terminal = Terminal::new("terminal", &args.orb_args, [SHIFT_OFFICE])?;
    let display =
        terminal.register::<DisplayServant>(TERMINAL_DISPLAY, Arc::new(DisplayServant::default()))?;
    terminal.registry_mut().start()?;

    println!("Published names:");
    for name in terminal.session().enumerate_names()? {
        println!("  {}", name);
    }
    println!();

    let mut clocks = MultiClient::<Clock>::new(terminal.session().clone());
    let prefix = format!("{}/", CLOCKS_CONTEXT);
    let clock_names: Vec<String> = terminal
        .session()
        .enumerate_names()?
        .into_iter()
        .filter(|name| name.starts_with(&prefix))
        .collect();
    let failures = clocks.try_connect_all(clock_names.iter().map(String::as_str));
    info!("connected to {} clock replicas ({} failed)", clocks.size(), failures.len());

    let factory = terminal.stub::<ShiftFactory>()?;
    let employees = if args.employees.is_empty() {
        vec!["ada".to_string(), "grace".to_string()]
    } else {
        args.employees.clone()
    };

    let mut shifts = Vec::with_capacity(employees.len());
    for employee in &employees {
        let shift = Destroyable::new(factory.open(employee)?);
        for connection in clocks.iter() {
            let now = connection.stub().now()?;
            display.show(&format!("{} in at {} ({})", employee, now, connection.stub().label()?))?;
        }
        shifts.push(shift);
    }

    if args.serve {
        println!("Serving; press Ctrl+C to clock everyone out");
        let stop = StopSignal::new();
        forward_ctrl_c(stop.clone())?;
        terminal.run(&stop)?;
    }

    for mut shift in shifts.drain(..) {
        if let Some(open) = shift.get() {
            display.show(&format!("{} out after {} ms", open.employee()?, open.elapsed_ms()?))?;
        }
        shift.close()?;
    }

    if let Some(factory) = office.skeleton::<ShiftFactoryServant>() {
        println!();
        println!("Shifts opened: {}, closed: {}", factory.opened(), factory.closed());
    }
    if let Some(panel) = terminal.skeleton::<DisplayServant>() {
        println!("Display lines: {}", panel.lines().len());
    }

    drop(clocks);
    terminal.stop();
    office.stop();
    for replica in &mut replicas {
        replica.stop();
    }
    info!("time clock demo finished");
    Ok(())
}
