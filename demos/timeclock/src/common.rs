//! Interfaces and servants shared by the clock replicas, the shift office
//! and the terminal

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use orbkit::orb::cdr::{CdrReader, CdrWriter};
use orbkit::orb::{Current, Interface, ObjectRef, OrbError, Result, Servant, Skeleton, Transient};
use parking_lot::Mutex;
use tracing::{debug, info};

// =============================================================================
// Directory layout
// =============================================================================

/// Context holding one binding per clock replica
pub const CLOCKS_CONTEXT: &str = "TimeClock/Clocks";
pub const SHIFT_OFFICE: &str = "TimeClock/Shifts";
pub const TERMINAL_DISPLAY: &str = "TimeClock/Terminal/Display";

/// Operation names
pub mod op {
    pub const NOW: &str = "now";
    pub const LABEL: &str = "label";
    pub const OPEN: &str = "open";
    pub const EMPLOYEE: &str = "employee";
    pub const ELAPSED: &str = "elapsed";
    pub const DESTROY: &str = "destroy";
    pub const SHOW: &str = "show";
}

fn bad_operation(operation: &str) -> OrbError {
    OrbError::BadOperation(operation.to_string())
}

// =============================================================================
// Clock
// =============================================================================

/// Wall clock replica
#[derive(Clone, Debug)]
pub struct Clock(ObjectRef);

impl Interface for Clock {
    const REPOSITORY_ID: &'static str = "IDL:timeclock/Clock:1.0";

    fn from_object(obj: ObjectRef) -> Self {
        Clock(obj)
    }

    fn as_object(&self) -> &ObjectRef {
        &self.0
    }
}

impl Clock {
    /// Seconds since the Unix epoch as seen by the replica
    pub fn now(&self) -> Result<i64> {
        let reply = self.0.invoke(op::NOW, Bytes::new())?;
        CdrReader::new(reply).read_i64()
    }

    pub fn label(&self) -> Result<String> {
        let reply = self.0.invoke(op::LABEL, Bytes::new())?;
        CdrReader::new(reply).read_string()
    }
}

pub struct ClockServant {
    label: String,
    skew: i64,
}

impl ClockServant {
    /// A replica whose clock runs `skew` seconds off
    pub fn new(label: impl Into<String>, skew: i64) -> Self {
        Self {
            label: label.into(),
            skew,
        }
    }
}

impl Servant for ClockServant {
    fn repository_id(&self) -> &'static str {
        Clock::REPOSITORY_ID
    }

    fn invoke(&self, _current: &Current, operation: &str, _args: Bytes) -> Result<Bytes> {
        let mut reply = CdrWriter::new();
        match operation {
            op::NOW => {
                let now = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map_err(|e| OrbError::User {
                        repository_id: "IDL:timeclock/ClockError:1.0".to_string(),
                        message: e.to_string(),
                    })?
                    .as_secs() as i64;
                reply.write_i64(now + self.skew);
            }
            op::LABEL => {
                reply.write_string(&self.label);
            }
            other => return Err(bad_operation(other)),
        }
        Ok(reply.finish())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Skeleton for ClockServant {
    type Interface = Clock;
}

// =============================================================================
// Shifts
// =============================================================================

/// One open shift; destroyed when the employee clocks out
#[derive(Clone, Debug)]
pub struct Shift(ObjectRef);

impl Interface for Shift {
    const REPOSITORY_ID: &'static str = "IDL:timeclock/Shift:1.0";

    fn from_object(obj: ObjectRef) -> Self {
        Shift(obj)
    }

    fn as_object(&self) -> &ObjectRef {
        &self.0
    }
}

impl Transient for Shift {}

impl Shift {
    pub fn employee(&self) -> Result<String> {
        let reply = self.0.invoke(op::EMPLOYEE, Bytes::new())?;
        CdrReader::new(reply).read_string()
    }

    /// Milliseconds since the shift was opened
    pub fn elapsed_ms(&self) -> Result<u64> {
        let reply = self.0.invoke(op::ELAPSED, Bytes::new())?;
        CdrReader::new(reply).read_u64()
    }
}

struct ShiftServant {
    employee: String,
    opened: Instant,
    closed: Arc<AtomicU64>,
}

impl Servant for ShiftServant {
    fn repository_id(&self) -> &'static str {
        Shift::REPOSITORY_ID
    }

    fn invoke(&self, current: &Current, operation: &str, _args: Bytes) -> Result<Bytes> {
        let mut reply = CdrWriter::new();
        match operation {
            op::EMPLOYEE => {
                reply.write_string(&self.employee);
            }
            op::ELAPSED => {
                reply.write_u64(self.opened.elapsed().as_millis() as u64);
            }
            op::DESTROY => {
                current.adapter().deactivate(&current.object_id())?;
                self.closed.fetch_add(1, Ordering::SeqCst);
                info!("{} clocked out after {:?}", self.employee, self.opened.elapsed());
            }
            other => return Err(bad_operation(other)),
        }
        Ok(reply.finish())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Factory handing out one transient shift per clock-in
#[derive(Clone, Debug)]
pub struct ShiftFactory(ObjectRef);

impl Interface for ShiftFactory {
    const REPOSITORY_ID: &'static str = "IDL:timeclock/ShiftFactory:1.0";

    fn from_object(obj: ObjectRef) -> Self {
        ShiftFactory(obj)
    }

    fn as_object(&self) -> &ObjectRef {
        &self.0
    }
}

impl ShiftFactory {
    pub fn open(&self, employee: &str) -> Result<Shift> {
        let mut args = CdrWriter::new();
        args.write_string(employee);
        let reply = self.0.invoke(op::OPEN, args.finish())?;
        CdrReader::new(reply).read_interface()
    }
}

#[derive(Default)]
pub struct ShiftFactoryServant {
    opened: AtomicU64,
    closed: Arc<AtomicU64>,
}

impl ShiftFactoryServant {
    pub fn opened(&self) -> u64 {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> u64 {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Servant for ShiftFactoryServant {
    fn repository_id(&self) -> &'static str {
        ShiftFactory::REPOSITORY_ID
    }

    fn invoke(&self, current: &Current, operation: &str, args: Bytes) -> Result<Bytes> {
        if operation != op::OPEN {
            return Err(bad_operation(operation));
        }
        let employee = CdrReader::new(args).read_string()?;
        let shift = Arc::new(ShiftServant {
            employee: employee.clone(),
            opened: Instant::now(),
            closed: self.closed.clone(),
        });
        let oid = current.adapter().activate(shift)?;
        let obj = current.adapter().id_to_reference(&oid)?;
        self.opened.fetch_add(1, Ordering::SeqCst);
        debug!("opened shift {} for {}", oid, employee);

        let mut reply = CdrWriter::new();
        reply.write_object(&obj)?;
        Ok(reply.finish())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Skeleton for ShiftFactoryServant {
    type Interface = ShiftFactory;
}

// =============================================================================
// Display
// =============================================================================

/// Terminal display panel
#[derive(Clone, Debug)]
pub struct Display(ObjectRef);

impl Interface for Display {
    const REPOSITORY_ID: &'static str = "IDL:timeclock/Display:1.0";

    fn from_object(obj: ObjectRef) -> Self {
        Display(obj)
    }

    fn as_object(&self) -> &ObjectRef {
        &self.0
    }
}

impl Display {
    pub fn show(&self, line: &str) -> Result<()> {
        let mut args = CdrWriter::new();
        args.write_string(line);
        self.0.invoke(op::SHOW, args.finish()).map(|_| ())
    }
}

#[derive(Default)]
pub struct DisplayServant {
    lines: Mutex<Vec<String>>,
}

impl DisplayServant {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl Servant for DisplayServant {
    fn repository_id(&self) -> &'static str {
        Display::REPOSITORY_ID
    }

    fn invoke(&self, _current: &Current, operation: &str, args: Bytes) -> Result<Bytes> {
        if operation != op::SHOW {
            return Err(bad_operation(operation));
        }
        let line = CdrReader::new(args).read_string()?;
        println!("  | {}", line);
        self.lines.lock().push(line);
        Ok(Bytes::new())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Skeleton for DisplayServant {
    type Interface = Display;
}
