//! Session context
//!
//! A [`Session`] owns the ORB and the resolved root naming context. Every
//! registry, resolver and multi-client built on it holds an
//! `Arc<Session>`, so one process unit shares a single runtime no matter
//! how many of them it composes.

use orb::{Interface, Name, NamingContext, ObjectRef, Orb, OrbError, BindingType};
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{OrbkitError, Result};

/// Runtime handle plus naming directory handle
pub struct Session {
    name: String,
    orb: Orb,
    naming: NamingContext,
    config: SessionConfig,
}

impl Session {
    /// Initialize the ORB from `args` and resolve the naming directory
    pub fn create<A, S>(name: &str, args: A) -> Result<Self>
    where
        A: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_config(name, args, SessionConfig::default())
    }

    pub fn with_config<A, S>(name: &str, args: A, config: SessionConfig) -> Result<Self>
    where
        A: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let init = |source| OrbkitError::Initialization {
            session: name.to_string(),
            source,
        };
        if name.is_empty() || name.contains('/') {
            return Err(OrbkitError::InvalidArgument(format!("session name {:?}", name)));
        }

        let orb = Orb::init(args).map_err(init)?;
        let naming = match orb.name_service() {
            Ok(naming) => naming,
            Err(e) => {
                // Release the runtime we did bring up before reporting.
                if let Err(destroy) = orb.destroy() {
                    debug!("session {}: ORB destroy after failed bring-up: {}", name, destroy);
                }
                return Err(init(e));
            }
        };

        info!("session {} started on ORB {} (domain {})", name, orb.id(), orb.domain());
        Ok(Self {
            name: name.to_string(),
            orb,
            naming,
            config,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn orb(&self) -> &Orb {
        &self.orb
    }

    /// Root naming context
    pub fn naming(&self) -> &NamingContext {
        &self.naming
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Resolve a stringified path against the root context
    pub fn resolve(&self, path: &str) -> Result<ObjectRef> {
        let name = Name::parse(path).map_err(|e| OrbkitError::resolution(path, e))?;
        self.naming
            .resolve(&name)
            .map_err(|e| OrbkitError::resolution(path, e))
    }

    /// Rebind `path`, creating any missing intermediate contexts
    pub fn bind_path(&self, path: &Name, obj: &ObjectRef) -> Result<()> {
        let components = path.components();
        for depth in 1..components.len() {
            let prefix = Name::from_components(components[..depth].to_vec())
                .map_err(|e| OrbkitError::binding(path.to_string(), e))?;
            match self.naming.bind_new_context(&prefix) {
                Ok(_) => debug!("session {}: created context {}", self.name, prefix),
                Err(OrbError::AlreadyBound(_)) => {}
                Err(e) => return Err(OrbkitError::binding(path.to_string(), e)),
            }
        }
        self.naming
            .rebind(path, obj)
            .map_err(|e| OrbkitError::binding(path.to_string(), e))
    }

    /// Every object path bound anywhere under the root context
    ///
    /// Contexts are walked depth-first; each level is fetched in pages of
    /// `list_page_size` through the binding iterator. Context paths
    /// themselves are not reported, only the objects below them.
    pub fn enumerate_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut ancestors = Vec::new();
        self.collect(&self.naming, "", &mut ancestors, &mut names)
            .map_err(|e| OrbkitError::resolution("<root>", e))?;
        Ok(names)
    }

    fn collect(
        &self,
        context: &NamingContext,
        prefix: &str,
        ancestors: &mut Vec<NamingContext>,
        names: &mut Vec<String>,
    ) -> orb::Result<()> {
        let page = self.config.list_page_size.max(1);
        ancestors.push(context.duplicate());

        let (mut bindings, iterator) = context.list(page)?;
        loop {
            for binding in bindings {
                let path = format!("{}{}", prefix, binding.binding_name);
                match binding.binding_type {
                    BindingType::Object => names.push(path),
                    BindingType::Context => {
                        let obj = context.resolve(&binding.binding_name)?;
                        let Some(child) = NamingContext::narrow(&obj)? else {
                            continue;
                        };
                        if ancestors
                            .iter()
                            .any(|seen| seen.as_object().is_equivalent(child.as_object()))
                        {
                            debug!("session {}: skipping cyclic context {}", self.name, path);
                            continue;
                        }
                        self.collect(&child, &format!("{}/", path), ancestors, names)?;
                    }
                }
            }
            bindings = match &iterator {
                Some(it) => it.next_n(page)?,
                None => Vec::new(),
            };
            if bindings.is_empty() {
                break;
            }
        }
        if let Some(it) = iterator {
            it.destroy();
        }

        ancestors.pop();
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        match self.orb.destroy() {
            Ok(()) => info!("session {} closed", self.name),
            Err(e) => warn!("session {}: ORB teardown failed: {}", self.name, e),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("name", &self.name)
            .field("orb", &self.orb)
            .finish()
    }
}
