use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use tracing::info;
use zywrap_schema::BundleDocument;

use super::engine::SyncEngine;
use super::report::SyncOutcome;
use crate::error::SyncError;

#[derive(Debug)]
pub enum SyncActorMessage {
    /// Run one pass against the remote catalog.
    RunSync(RpcReplyPort<Result<SyncOutcome, SyncError>>),

    /// Apply a local bundle as a full reset.
    Import(Box<BundleDocument>, RpcReplyPort<Result<SyncOutcome, SyncError>>),
}

/// Cloneable handle; every pass sent through it runs strictly after the
/// previous one finished.
#[derive(Clone)]
pub struct SyncActorHandle {
    actor: ActorRef<SyncActorMessage>,
}

impl SyncActorHandle {
    pub async fn run_sync(&self) -> Result<SyncOutcome, SyncError> {
        ractor::call!(self.actor, SyncActorMessage::RunSync)
            .map_err(|e| SyncError::Actor(format!("SyncActor RunSync RPC failed: {e}")))?
    }

    pub async fn import(&self, bundle: BundleDocument) -> Result<SyncOutcome, SyncError> {
        ractor::call!(self.actor, SyncActorMessage::Import, Box::new(bundle))
            .map_err(|e| SyncError::Actor(format!("SyncActor Import RPC failed: {e}")))?
    }

    pub fn stop(&self) {
        self.actor.stop(Some("shutdown".to_string()));
    }
}

struct SyncActor;

#[ractor::async_trait]
impl Actor for SyncActor {
    type Msg = SyncActorMessage;
    type State = SyncEngine;
    type Arguments = SyncEngine;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        engine: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        info!("SyncActor initialized");
        Ok(engine)
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        engine: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SyncActorMessage::RunSync(reply) => {
                let res = engine.run().await;
                let _ = reply.send(res);
            }
            SyncActorMessage::Import(bundle, reply) => {
                let res = engine.import_bundle(&bundle).await;
                let _ = reply.send(res);
            }
        }
        Ok(())
    }
}

/// Spawn the sync actor and return a cloneable handle.
pub async fn spawn(engine: SyncEngine) -> Result<SyncActorHandle, SyncError> {
    let (actor, _jh) = Actor::spawn(None, SyncActor, engine)
        .await
        .map_err(|e| SyncError::Actor(format!("failed to spawn SyncActor: {e}")))?;

    Ok(SyncActorHandle { actor })
}
