//! ORB runtime
//!
//! Bring-up from process arguments, initial references, and the blocking
//! request-processing loop.
//!
//! Every ORB owns an [`Endpoint`]: the queue its request loop drains plus
//! the table of adapters requests can be routed to. Callers on other
//! threads enqueue a request and block on a one-shot reply; a caller that
//! is itself the loop thread is served inline so collocated calls made
//! from inside a servant cannot deadlock.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::adapter::{AdapterCore, ObjectAdapter};
use crate::domain::Domain;
use crate::error::{OrbError, Result};
use crate::identifiers::{AdapterId, ObjectId, OrbId};
use crate::naming::NamingContext;
use crate::reference::{Interface, ObjectRef};

/// Request queued to an ORB's processing loop
struct Request {
    /// Adapter the target object is active in
    adapter: AdapterId,
    /// Target object
    object: ObjectId,
    /// Operation name
    operation: String,
    /// Encoded arguments
    args: Bytes,
    /// Where the loop sends the result
    reply: oneshot::Sender<Result<Bytes>>,
}

enum Message {
    Request(Request),
    Shutdown,
}

/// Routing target for requests addressed to one ORB
pub(crate) struct Endpoint {
    /// Owning ORB
    orb: OrbId,
    /// Request queue; `None` once the ORB is shut down
    sender: Mutex<Option<mpsc::UnboundedSender<Message>>>,
    /// Thread currently inside `Orb::run`
    runner: Mutex<Option<ThreadId>>,
    /// Adapters requests can be routed to
    adapters: RwLock<HashMap<AdapterId, Weak<AdapterCore>>>,
}

/// How the current thread may wait for the request loop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Blocking {
    /// Plain thread, block directly
    Direct,
    /// Worker of a multi-thread async runtime, block in place
    InPlace,
}

impl Blocking {
    /// `None` on a current-thread async runtime, which must never block
    fn current() -> Option<Blocking> {
        match Handle::try_current() {
            Err(_) => Some(Blocking::Direct),
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => Some(Blocking::InPlace),
            Ok(_) => None,
        }
    }

    fn run<T>(self, wait: impl FnOnce() -> T) -> T {
        match self {
            Blocking::Direct => wait(),
            Blocking::InPlace => tokio::task::block_in_place(wait),
        }
    }
}

impl Endpoint {
    fn new(orb: OrbId, sender: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            orb,
            sender: Mutex::new(Some(sender)),
            runner: Mutex::new(None),
            adapters: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn add_adapter(&self, id: &AdapterId, core: &Arc<AdapterCore>) {
        self.adapters.write().insert(id.clone(), Arc::downgrade(core));
    }

    pub(crate) fn remove_adapter(&self, id: &AdapterId) {
        self.adapters.write().remove(id);
    }

    fn adapter(&self, id: &AdapterId) -> Option<Arc<AdapterCore>> {
        self.adapters.read().get(id).and_then(Weak::upgrade)
    }

    fn on_loop_thread(&self) -> bool {
        *self.runner.lock() == Some(thread::current().id())
    }

    fn dispatch(&self, adapter: &AdapterId, object: ObjectId, operation: &str, args: Bytes) -> Result<Bytes> {
        let core = self
            .adapter(adapter)
            .ok_or_else(|| OrbError::ObjectNotExist(format!("no adapter {} in ORB {}", adapter, self.orb)))?;
        core.dispatch(object, operation, args)
    }

    /// Route a request to the processing loop and wait for the reply
    pub(crate) fn invoke(
        &self,
        adapter: &AdapterId,
        object: ObjectId,
        operation: &str,
        args: Bytes,
    ) -> Result<Bytes> {
        if self.on_loop_thread() {
            return self.dispatch(adapter, object, operation, args);
        }

        let blocking = Blocking::current().ok_or_else(|| {
            OrbError::CommFailure(format!(
                "{} on ORB {} would block a current-thread async runtime",
                operation, self.orb
            ))
        })?;
        let sender = self
            .sender
            .lock()
            .clone()
            .ok_or_else(|| OrbError::CommFailure(format!("ORB {} is shut down", self.orb)))?;

        let (reply, response) = oneshot::channel();
        let request = Request {
            adapter: adapter.clone(),
            object,
            operation: operation.to_string(),
            args,
            reply,
        };
        sender
            .send(Message::Request(request))
            .map_err(|_| OrbError::CommFailure(format!("ORB {} stopped accepting requests", self.orb)))?;

        blocking.run(|| response.blocking_recv()).map_err(|_| {
            OrbError::CommFailure(format!("ORB {} dropped {} before replying", self.orb, operation))
        })?
    }

    /// Answer `_is_a` without a round trip through the queue
    pub(crate) fn is_a(&self, adapter: &AdapterId, object: ObjectId, repository_id: &str) -> Result<bool> {
        let core = self
            .adapter(adapter)
            .ok_or_else(|| OrbError::ObjectNotExist(format!("no adapter {} in ORB {}", adapter, self.orb)))?;
        let servant = core
            .servant(&object)
            .ok_or_else(|| OrbError::ObjectNotExist(format!("{} in {}", object, adapter)))?;
        Ok(servant.is_a(repository_id))
    }

    /// Whether the object is currently active
    pub(crate) fn locate(&self, adapter: &AdapterId, object: ObjectId) -> bool {
        self.adapter(adapter)
            .is_some_and(|core| !core.is_destroyed() && core.servant(&object).is_some())
    }

    /// Stop accepting requests and wake the loop
    fn close(&self) {
        if let Some(sender) = self.sender.lock().take() {
            let _ = sender.send(Message::Shutdown);
        }
    }
}

/// ORB configuration, normally parsed from process arguments
#[derive(Clone, Debug)]
pub struct OrbConfig {
    /// Naming domain shared with other ORBs
    pub domain: String,
    /// Logical ORB id; generated when absent
    pub orb_id: Option<String>,
    /// Whether `NameService` is available as an initial reference
    pub name_service: bool,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            domain: crate::DEFAULT_DOMAIN.to_string(),
            orb_id: None,
            name_service: true,
        }
    }
}

impl OrbConfig {
    /// Extract `-ORB*` options, returning the remaining arguments
    ///
    /// Recognised: `-ORBDomain <name>`, `-ORBId <id>`, `-ORBNoNameService`.
    pub fn from_args<I, S>(args: I) -> Result<(Self, Vec<String>)>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config = Self::default();
        let mut rest = Vec::new();
        let mut args = args.into_iter().map(|a| a.as_ref().to_string());

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-ORBDomain" => config.domain = required_value(&arg, args.next())?,
                "-ORBId" => config.orb_id = Some(required_value(&arg, args.next())?),
                "-ORBNoNameService" => config.name_service = false,
                other if other.starts_with("-ORB") => {
                    return Err(OrbError::Initialize(format!("unknown option {}", other)));
                }
                _ => rest.push(arg),
            }
        }
        Ok((config, rest))
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_orb_id(mut self, id: impl Into<String>) -> Self {
        self.orb_id = Some(id.into());
        self
    }
}

fn required_value(option: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(v) if !v.is_empty() && !v.contains('|') => Ok(v),
        Some(v) => Err(OrbError::Initialize(format!("invalid value {:?} for {}", v, option))),
        None => Err(OrbError::Initialize(format!("{} requires a value", option))),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OrbState {
    Active,
    ShutDown,
    Destroyed,
}

struct OrbInner {
    /// ORB id, unique among live ORBs of the domain
    id: OrbId,
    /// Domain shared with other ORBs
    domain: Arc<Domain>,
    /// Configuration the ORB was brought up with
    config: OrbConfig,
    /// Routing target for requests to this ORB
    endpoint: Arc<Endpoint>,
    /// Queue drained by `run`; taken while the loop is running
    receiver: Mutex<Option<mpsc::UnboundedReceiver<Message>>>,
    /// `RootPOA`
    root: ObjectAdapter,
    /// Lifecycle state
    state: Mutex<OrbState>,
}

impl Drop for OrbInner {
    fn drop(&mut self) {
        self.endpoint.close();
        self.root.destroy();
        self.domain.remove_endpoint(&self.id);
    }
}

/// Handle to an object request broker
///
/// Clones share the same ORB.
#[derive(Clone)]
pub struct Orb {
    inner: Arc<OrbInner>,
}

impl Orb {
    /// Initialize an ORB from process arguments
    pub fn init<I, S>(args: I) -> Result<Orb>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (config, _rest) = OrbConfig::from_args(args)?;
        Self::with_config(config)
    }

    /// Initialize an ORB from an explicit configuration
    pub fn with_config(config: OrbConfig) -> Result<Orb> {
        if config.domain.is_empty() || config.domain.contains('|') {
            return Err(OrbError::Initialize(format!("invalid domain {:?}", config.domain)));
        }
        let id = match &config.orb_id {
            Some(id) => OrbId::new(id.as_str()),
            None => OrbId::generate(),
        };

        let domain = Domain::attach(&config.domain);
        let (sender, receiver) = mpsc::unbounded_channel();
        let endpoint = Arc::new(Endpoint::new(id.clone(), sender));
        if !domain.register_endpoint(&id, &endpoint) {
            return Err(OrbError::Initialize(format!(
                "ORB id {} already in use in domain {}",
                id,
                domain.name()
            )));
        }
        let root = ObjectAdapter::root(&id, domain.name(), &endpoint);

        info!("ORB {} initialized in domain {}", id, domain.name());
        Ok(Orb {
            inner: Arc::new(OrbInner {
                id,
                domain,
                config,
                endpoint,
                receiver: Mutex::new(Some(receiver)),
                root,
                state: Mutex::new(OrbState::Active),
            }),
        })
    }

    pub fn id(&self) -> &OrbId {
        &self.inner.id
    }

    pub fn domain(&self) -> &str {
        self.inner.domain.name()
    }

    pub fn config(&self) -> &OrbConfig {
        &self.inner.config
    }

    fn ensure_active(&self) -> Result<()> {
        match *self.inner.state.lock() {
            OrbState::Active => Ok(()),
            OrbState::ShutDown => Err(OrbError::BadInvOrder(format!("ORB {} is shut down", self.inner.id))),
            OrbState::Destroyed => Err(OrbError::BadInvOrder(format!("ORB {} is destroyed", self.inner.id))),
        }
    }

    /// Resolve `RootPOA` or `NameService`
    pub fn resolve_initial_references(&self, id: &str) -> Result<ObjectRef> {
        self.ensure_active()?;
        match id {
            crate::ROOT_POA => Ok(self.inner.root.as_object()),
            crate::NAME_SERVICE if self.inner.config.name_service => {
                Ok(self.inner.domain.naming().root_reference())
            }
            _ => Err(OrbError::InvalidName(format!("no initial reference {}", id))),
        }
    }

    /// The root adapter, without going through a reference
    pub fn root_adapter(&self) -> Result<ObjectAdapter> {
        self.ensure_active()?;
        Ok(self.inner.root.clone())
    }

    /// The root naming context of this ORB's domain
    pub fn name_service(&self) -> Result<NamingContext> {
        let obj = self.resolve_initial_references(crate::NAME_SERVICE)?;
        NamingContext::narrow(&obj)?
            .ok_or_else(|| OrbError::Initialize("NameService is not a naming context".to_string()))
    }

    pub fn object_to_string(&self, obj: &ObjectRef) -> Result<String> {
        obj.to_ior_string()
    }

    pub fn string_to_object(&self, ior: &str) -> Result<ObjectRef> {
        ObjectRef::from_ior_string(ior)
    }

    /// Whether a thread is currently inside [`Orb::run`]
    pub fn is_running(&self) -> bool {
        self.inner.endpoint.runner.lock().is_some()
    }

    /// Process requests on the calling thread until [`Orb::shutdown`]
    ///
    /// Refused with `BadInvOrder` on a current-thread async runtime.
    pub fn run(&self) -> Result<()> {
        self.ensure_active()?;
        let blocking = Blocking::current().ok_or_else(|| {
            OrbError::BadInvOrder(format!(
                "ORB {} loop cannot run on a current-thread async runtime",
                self.inner.id
            ))
        })?;
        let mut receiver = self
            .inner
            .receiver
            .lock()
            .take()
            .ok_or_else(|| OrbError::BadInvOrder(format!("ORB {} loop is already running", self.inner.id)))?;

        *self.inner.endpoint.runner.lock() = Some(thread::current().id());
        info!("ORB {} processing requests", self.inner.id);

        let served = blocking.run(|| self.serve(&mut receiver));

        *self.inner.endpoint.runner.lock() = None;
        info!("ORB {} loop stopped after {} requests", self.inner.id, served);
        // Anything still queued is dropped with the receiver; callers see CommFailure.
        Ok(())
    }

    fn serve(&self, receiver: &mut mpsc::UnboundedReceiver<Message>) -> u64 {
        let mut served = 0u64;
        while let Some(message) = receiver.blocking_recv() {
            match message {
                Message::Request(request) => {
                    let result = self.inner.endpoint.dispatch(
                        &request.adapter,
                        request.object,
                        &request.operation,
                        request.args,
                    );
                    if request.reply.send(result).is_err() {
                        debug!("caller of {} went away before the reply", request.operation);
                    }
                    served += 1;
                }
                Message::Shutdown => break,
            }
        }
        served
    }

    /// Stop the request loop and refuse further requests
    pub fn shutdown(&self) {
        let mut state = self.inner.state.lock();
        if *state != OrbState::Active {
            return;
        }
        *state = OrbState::ShutDown;
        drop(state);

        self.inner.endpoint.close();
        self.inner.root.the_manager().deactivate();
        debug!("ORB {} shut down", self.inner.id);
    }

    /// Shut down and release the ORB
    pub fn destroy(&self) -> Result<()> {
        {
            let state = self.inner.state.lock();
            if *state == OrbState::Destroyed {
                return Err(OrbError::BadInvOrder(format!("ORB {} already destroyed", self.inner.id)));
            }
        }
        self.shutdown();

        if self.inner.endpoint.on_loop_thread() {
            warn!("ORB {} destroyed from inside its own request loop", self.inner.id);
        }
        self.inner.root.destroy();
        self.inner.domain.remove_endpoint(&self.inner.id);
        *self.inner.state.lock() = OrbState::Destroyed;
        info!("ORB {} destroyed", self.inner.id);
        Ok(())
    }
}

impl std::fmt::Debug for Orb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orb")
            .field("id", &self.inner.id)
            .field("domain", &self.inner.domain.name())
            .finish()
    }
}
