use tracing::{debug, warn};

use crate::pipeline::traits::MediaResource;

/// Handle to a resource held by a [`ResourceScope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceId(usize);

/// Owns every media handle acquired during one run and releases them in
/// reverse acquisition order when dropped, on success and on error alike.
#[derive(Default)]
pub struct ResourceScope {
    held: Vec<Box<dyn MediaResource>>,
}

impl ResourceScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&mut self, resource: Box<dyn MediaResource>) -> ResourceId {
        debug!(resource = %resource.label(), "acquired media resource");
        self.held.push(resource);
        ResourceId(self.held.len() - 1)
    }

    pub fn get(&self, id: ResourceId) -> Option<&dyn MediaResource> {
        self.held.get(id.0).map(|r| &**r)
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Releases everything still held. Failures are logged and do not stop
    /// the remaining releases.
    pub fn release_all(&mut self) {
        while let Some(mut resource) = self.held.pop() {
            let label = resource.label();
            match resource.release() {
                Ok(()) => debug!(resource = %label, "released media resource"),
                Err(e) => warn!(resource = %label, error = %e, "failed to release media resource"),
            }
        }
    }
}

impl Drop for ResourceScope {
    fn drop(&mut self) {
        self.release_all();
    }
}
