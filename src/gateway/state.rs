use std::sync::Arc;

use crate::replication::ReplicationTrigger;

#[derive(Clone)]
pub struct TriggerState {
    pub trigger: Arc<ReplicationTrigger>,
}

impl TriggerState {
    pub fn new(trigger: ReplicationTrigger) -> Self {
        Self {
            trigger: Arc::new(trigger),
        }
    }
}
