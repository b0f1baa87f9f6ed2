//! Supervisor scaffolding — shared by every long-running piece wired up in
//! `main.rs`. Adapted directly from the teacher's generic subsystem runtime:
//! a [`Component`] captures its own state and runs until cancelled;
//! [`spawn_components`] runs them all concurrently and cancels the shared
//! token the moment any one of them errors or panics, so the rest shut down
//! cooperatively instead of leaking tasks.

use std::future::Future;
use std::pin::Pin;

use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::error::AppError;

pub type ComponentFuture = Pin<Box<dyn Future<Output = Result<(), AppError>> + Send + 'static>>;

pub trait Component: Send + 'static {
    fn id(&self) -> &str;

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture;
}

pub struct SupervisorHandle {
    inner: JoinHandle<Result<(), AppError>>,
}

impl SupervisorHandle {
    pub async fn join(self) -> Result<(), AppError> {
        match self.inner.await {
            Ok(r) => r,
            Err(e) => Err(AppError::Internal(format!("supervisor task panicked: {e}"))),
        }
    }
}

pub fn spawn_components(components: Vec<Box<dyn Component>>, shutdown: CancellationToken) -> SupervisorHandle {
    let handle = tokio::spawn(async move {
        let mut set: JoinSet<Result<(), AppError>> = JoinSet::new();

        for component in components {
            let id = component.id().to_string();
            let component_shutdown = shutdown.clone();
            debug!(component = %id, "spawning component");
            set.spawn(component.run(component_shutdown));
        }

        let mut first_err: Option<AppError> = None;

        while let Some(res) = set.join_next().await {
            match res {
                Err(e) => {
                    error!("component panicked: {e}");
                    shutdown.cancel();
                    first_err.get_or_insert_with(|| AppError::Internal(format!("component panicked: {e}")));
                }
                Ok(Err(e)) => {
                    error!("component error: {e}");
                    shutdown.cancel();
                    first_err.get_or_insert(e);
                }
                Ok(Ok(())) => {}
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    });

    SupervisorHandle { inner: handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct ImmediateOk;

    impl Component for ImmediateOk {
        fn id(&self) -> &str {
            "immediate-ok"
        }

        fn run(self: Box<Self>, _shutdown: CancellationToken) -> ComponentFuture {
            Box::pin(async { Ok(()) })
        }
    }

    struct FailsFast;

    impl Component for FailsFast {
        fn id(&self) -> &str {
            "fails-fast"
        }

        fn run(self: Box<Self>, _shutdown: CancellationToken) -> ComponentFuture {
            Box::pin(async { Err(AppError::Internal("boom".into())) })
        }
    }

    struct RunsUntilCancelled(Arc<AtomicBool>);

    impl Component for RunsUntilCancelled {
        fn id(&self) -> &str {
            "runs-until-cancelled"
        }

        fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
            let observed = self.0;
            Box::pin(async move {
                shutdown.cancelled().await;
                observed.store(true, Ordering::SeqCst);
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn all_components_exiting_cleanly_joins_ok() {
        let shutdown = CancellationToken::new();
        let handle = spawn_components(vec![Box::new(ImmediateOk), Box::new(ImmediateOk)], shutdown);
        assert!(handle.join().await.is_ok());
    }

    #[tokio::test]
    async fn one_failure_cancels_the_shared_token_and_stops_siblings() {
        let observed = Arc::new(AtomicBool::new(false));
        let shutdown = CancellationToken::new();
        let handle = spawn_components(
            vec![Box::new(FailsFast), Box::new(RunsUntilCancelled(observed.clone()))],
            shutdown,
        );
        assert!(handle.join().await.is_err());
        assert!(observed.load(Ordering::SeqCst));
    }
}
