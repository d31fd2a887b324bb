//! The owner thread that holds a span tree and applies every command to it.

use std::ops::ControlFlow;
use std::thread::{self, JoinHandle};

use crossbeam::channel::Receiver;
use tracing::{debug, trace, warn};

use crate::command::Command;
use crate::tree::SpanTree;
use crate::{EMPTY_DOCUMENT, Render};

/// Exclusive holder of one span tree.
///
/// Nothing outside the owner ever touches the tree. Commands are applied one at a time in the
/// order they are received, and a reply (if any) is sent before the next command is accepted.
#[derive(Debug)]
pub(crate) struct Owner {
    tree: SpanTree,
    renderer: Box<dyn Render>,
}

impl Owner {
    pub(crate) fn new(tree: SpanTree, renderer: Box<dyn Render>) -> Self {
        Self { tree, renderer }
    }

    /// Starts the owner on a dedicated thread.
    ///
    /// The thread exits when it receives [`Command::Terminate`] or when every sender of the
    /// command channel has been dropped.
    pub(crate) fn spawn(self, commands: Receiver<Command>) -> JoinHandle<()> {
        thread::Builder::new()
            .name(format!("e2e-timer-{}", self.tree.correlation_id()))
            .spawn(move || self.run(&commands))
            .expect("failed to spawn timer owner thread: thread spawning failure is not supported")
    }

    fn run(mut self, commands: &Receiver<Command>) {
        debug!(
            timer = self.tree.name(),
            correlation_id = self.tree.correlation_id(),
            "timer owner started"
        );

        while let Ok(command) = commands.recv() {
            trace!(
                correlation_id = self.tree.correlation_id(),
                operation = command.operation(),
                "applying command"
            );

            if self.apply(command).is_break() {
                debug!(
                    correlation_id = self.tree.correlation_id(),
                    "timer owner terminated"
                );
                return;
            }
        }

        debug!(
            correlation_id = self.tree.correlation_id(),
            "all timer handles dropped, timer owner exiting"
        );
    }

    pub(crate) fn apply(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::StopTimer { stopped_at, error } => {
                if let Some(error) = &error {
                    debug!(
                        correlation_id = self.tree.correlation_id(),
                        %error, "timer stopped with error"
                    );
                }

                self.tree.stop(stopped_at, error);
            }
            Command::TimerDuration { reply } => respond(reply, self.tree.duration()),
            Command::TimerError { reply } => {
                respond(reply, self.tree.error().map(str::to_string));
            }
            Command::TimerErrorFree { reply } => respond(reply, self.tree.is_error_free()),
            Command::StartContributor {
                name,
                started_at,
                reply,
            } => {
                let id = self.tree.start_contributor(name, started_at);
                respond(reply, id);
            }
            Command::EndContributor {
                contributor,
                ended_at,
                error,
            } => {
                if let Some(error) = &error {
                    debug!(
                        correlation_id = self.tree.correlation_id(),
                        %error, "contributor ended with error"
                    );
                }

                self.tree.end_contributor(contributor, ended_at, error);
            }
            Command::ContributorDuration { contributor, reply } => {
                respond(reply, self.tree.contributor(contributor).duration());
            }
            Command::ContributorError { contributor, reply } => {
                let error = self.tree.contributor(contributor).error().map(str::to_string);
                respond(reply, error);
            }
            Command::StartServiceCall {
                contributor,
                name,
                endpoint,
                started_at,
                reply,
            } => {
                let id = self
                    .tree
                    .start_service_call(contributor, name, endpoint, started_at);
                respond(reply, id);
            }
            Command::EndServiceCall {
                call,
                ended_at,
                error,
            } => {
                if let Some(error) = &error {
                    debug!(
                        correlation_id = self.tree.correlation_id(),
                        contributor = ?self.tree.service_call(call).contributor(),
                        %error,
                        "service call ended with error"
                    );
                }

                self.tree.end_service_call(call, ended_at, error);
            }
            Command::ServiceCallDuration { call, reply } => {
                respond(reply, self.tree.service_call(call).duration());
            }
            Command::ServiceCallError { call, reply } => {
                respond(reply, self.tree.service_call(call).error().map(str::to_string));
            }
            Command::Snapshot { reply } => respond(reply, self.tree.snapshot()),
            Command::Document { reply } => respond(reply, self.render_document()),
            Command::Terminate => return ControlFlow::Break(()),
        }

        ControlFlow::Continue(())
    }

    fn render_document(&self) -> String {
        match self.renderer.render(&self.tree.snapshot()) {
            Ok(document) => document,
            Err(error) => {
                warn!(
                    correlation_id = self.tree.correlation_id(),
                    %error,
                    "rendering timer failed, substituting an empty document"
                );

                EMPTY_DOCUMENT.to_string()
            }
        }
    }
}

fn respond<T>(reply: oneshot::Sender<T>, value: T) {
    if reply.send(value).is_err() {
        warn!("requester stopped waiting before the reply was sent");
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::time::{Duration, Instant};

    use crossbeam::channel;

    use super::*;
    use crate::{ErrorPropagation, JsonRenderer, MockRender, RenderError};

    fn owner_with(renderer: Box<dyn Render>) -> (Owner, Instant) {
        let origin = Instant::now();
        let tree = SpanTree::new(
            "checkout".to_string(),
            "txn-1".to_string(),
            origin,
            ErrorPropagation::default(),
        );

        (Owner::new(tree, renderer), origin)
    }

    fn after(origin: Instant, millis: u64) -> Instant {
        origin.checked_add(Duration::from_millis(millis)).unwrap()
    }

    fn ask<T>(owner: &mut Owner, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> T {
        let (reply, response) = oneshot::channel();
        assert!(owner.apply(make(reply)).is_continue());
        response.recv().unwrap()
    }

    #[test]
    fn stop_then_query_timer_state() {
        let (mut owner, origin) = owner_with(Box::new(JsonRenderer::new()));

        let flow = owner.apply(Command::StopTimer {
            stopped_at: after(origin, 50),
            error: Some("problem".to_string()),
        });
        assert!(flow.is_continue());

        let duration = ask(&mut owner, |reply| Command::TimerDuration { reply });
        let error = ask(&mut owner, |reply| Command::TimerError { reply });
        let error_free = ask(&mut owner, |reply| Command::TimerErrorFree { reply });

        assert_eq!(duration, Some(Duration::from_millis(50)));
        assert_eq!(error.as_deref(), Some("problem"));
        assert!(!error_free);
    }

    #[test]
    fn start_and_end_spans_through_commands() {
        let (mut owner, origin) = owner_with(Box::new(JsonRenderer::new()));

        let contributor = ask(&mut owner, |reply| Command::StartContributor {
            name: "inventory".to_string(),
            started_at: after(origin, 10),
            reply,
        });
        let call = ask(&mut owner, |reply| Command::StartServiceCall {
            contributor,
            name: "stock".to_string(),
            endpoint: "http://stock-svc".to_string(),
            started_at: after(origin, 12),
            reply,
        });

        let flow = owner.apply(Command::EndServiceCall {
            call,
            ended_at: after(origin, 20),
            error: Some("timeout".to_string()),
        });
        assert!(flow.is_continue());
        let flow = owner.apply(Command::EndContributor {
            contributor,
            ended_at: after(origin, 25),
            error: None,
        });
        assert!(flow.is_continue());

        let call_duration = ask(&mut owner, |reply| Command::ServiceCallDuration { call, reply });
        let call_error = ask(&mut owner, |reply| Command::ServiceCallError { call, reply });
        let contributor_duration = ask(&mut owner, |reply| Command::ContributorDuration {
            contributor,
            reply,
        });
        let contributor_error = ask(&mut owner, |reply| Command::ContributorError {
            contributor,
            reply,
        });

        assert_eq!(call_duration, Some(Duration::from_millis(8)));
        assert_eq!(call_error.as_deref(), Some("timeout"));
        assert_eq!(contributor_duration, Some(Duration::from_millis(15)));
        assert_eq!(contributor_error, None);
    }

    #[test]
    fn terminate_breaks_the_loop() {
        let (mut owner, _) = owner_with(Box::new(JsonRenderer::new()));

        assert!(owner.apply(Command::Terminate).is_break());
    }

    #[test]
    fn failed_render_yields_empty_document() {
        let mut renderer = MockRender::new();
        renderer
            .expect_render()
            .times(1)
            .returning(|_| Err(RenderError::new("unrepresentable")));

        let (mut owner, _) = owner_with(Box::new(renderer));

        let document = ask(&mut owner, |reply| Command::Document { reply });

        assert_eq!(document, EMPTY_DOCUMENT);
    }

    #[test]
    fn document_uses_configured_renderer() {
        let mut renderer = MockRender::new();
        renderer
            .expect_render()
            .withf(|snapshot| snapshot.name() == "checkout")
            .times(1)
            .returning(|_| Ok("<timer/>".to_string()));

        let (mut owner, _) = owner_with(Box::new(renderer));

        let document = ask(&mut owner, |reply| Command::Document { reply });

        assert_eq!(document, "<timer/>");
    }

    #[test]
    fn abandoned_reply_does_not_disturb_owner() {
        let (mut owner, _) = owner_with(Box::new(JsonRenderer::new()));

        let (reply, response) = oneshot::channel();
        drop(response);

        assert!(owner.apply(Command::TimerErrorFree { reply }).is_continue());
        assert!(ask(&mut owner, |reply| Command::TimerErrorFree { reply }));
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn thread_exits_when_all_senders_dropped() {
        let (owner, _) = owner_with(Box::new(JsonRenderer::new()));
        let (sender, receiver) = channel::bounded(0);

        let handle = owner.spawn(receiver);
        drop(sender);

        handle.join().unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn thread_exits_on_terminate() {
        let (owner, _) = owner_with(Box::new(JsonRenderer::new()));
        let (sender, receiver) = channel::bounded(0);

        let handle = owner.spawn(receiver);
        sender.send(Command::Terminate).unwrap();

        handle.join().unwrap();
        sender.send(Command::Terminate).unwrap_err();
    }
}
