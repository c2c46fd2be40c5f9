//! The session executor: the single owner of the game session.
//!
//! Every input source (console, telnet sessions, the web form and the
//! auto-fight task) talks to the session only through a [`SessionHandle`].
//! Requests are applied one at a time, in arrival order, and after each
//! visible change the executor renders a fresh payload and broadcasts it.

use std::fmt::Write as _;
use std::sync::Arc;

use gmconsole_core::command::{CommandLine, Origin};
use gmconsole_core::error::DomainError;
use gmconsole_session::application::autofight::{self, AutoAttack, StopReason, TurnPlan};
use gmconsole_session::application::combat::{self, RollMode};
use gmconsole_session::application::interpreter::{CommandTable, Outcome};
use gmconsole_session::application::render::render;
use gmconsole_session::application::session::Session;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use crate::autofight::{self as scheduler, Pacing};
use crate::error::AppError;
use crate::hub::{Connection, Hub, Payload};

const INBOX_CAPACITY: usize = 256;

/// Auto-fight bookkeeping, for status output and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoFightStatus {
    pub running: bool,
    /// Runs started since the executor was spawned.
    pub runs_started: u32,
}

type Inspection = Box<dyn FnOnce(&Session) + Send>;

enum Request {
    Command {
        line: CommandLine,
        origin: Origin,
        reply: oneshot::Sender<Outcome>,
    },
    WebAttack {
        attacker: String,
        target: String,
        attack: usize,
        reply: oneshot::Sender<Result<(), DomainError>>,
    },
    Snapshot(oneshot::Sender<Payload>),
    Join(Connection),
    Inspect(Inspection),
    AutoFightStatus(oneshot::Sender<AutoFightStatus>),
    AutoPlan(oneshot::Sender<TurnPlan>),
    AutoAttack {
        attacker: String,
        reply: oneshot::Sender<Option<StopReason>>,
    },
    AutoAdvance(oneshot::Sender<Option<StopReason>>),
    AutoFinished(StopReason),
}

/// Sends requests to the executor. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Request>,
}

impl SessionHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Request,
    ) -> Result<T, AppError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| AppError::SessionClosed)?;
        rx.await.map_err(|_| AppError::SessionClosed)
    }

    /// Runs an operator command.
    ///
    /// # Errors
    ///
    /// Returns `AppError::SessionClosed` when the executor has stopped.
    pub async fn submit(&self, line: CommandLine, origin: Origin) -> Result<Outcome, AppError> {
        self.request(|reply| Request::Command {
            line,
            origin,
            reply,
        })
        .await
    }

    /// Parses and runs one input line; a blank line does nothing.
    ///
    /// # Errors
    ///
    /// Returns `AppError::SessionClosed` when the executor has stopped.
    pub async fn execute(&self, raw: &str, origin: Origin) -> Result<Outcome, AppError> {
        match CommandLine::parse(raw) {
            Some(line) => self.submit(line, origin).await,
            None => Ok(Outcome::Unchanged),
        }
    }

    /// An attack from the web form. Only the character holding the current
    /// turn may attack.
    ///
    /// # Errors
    ///
    /// Returns `AppError::SessionClosed` when the executor has stopped. The
    /// inner result carries the rejection, if any.
    pub async fn web_attack(
        &self,
        attacker: String,
        target: String,
        attack: usize,
    ) -> Result<Result<(), DomainError>, AppError> {
        self.request(|reply| Request::WebAttack {
            attacker,
            target,
            attack,
            reply,
        })
        .await
    }

    /// The most recently rendered payload.
    ///
    /// # Errors
    ///
    /// Returns `AppError::SessionClosed` when the executor has stopped.
    pub async fn snapshot(&self) -> Result<Payload, AppError> {
        self.request(Request::Snapshot).await
    }

    /// Registers a spectator and queues the current payload for it. Every
    /// later broadcast reaches the connection after that payload.
    ///
    /// # Errors
    ///
    /// Returns `AppError::SessionClosed` when the executor has stopped.
    pub async fn join(&self, conn: Connection) -> Result<(), AppError> {
        self.tx
            .send(Request::Join(conn))
            .await
            .map_err(|_| AppError::SessionClosed)
    }

    /// Runs `f` against the session between two requests.
    ///
    /// # Errors
    ///
    /// Returns `AppError::SessionClosed` when the executor has stopped.
    pub async fn inspect<T, F>(&self, f: F) -> Result<T, AppError>
    where
        T: Send + 'static,
        F: FnOnce(&Session) -> T + Send + 'static,
    {
        self.request(|reply| {
            Request::Inspect(Box::new(move |session: &Session| {
                let _ = reply.send(f(session));
            }))
        })
        .await
    }

    /// # Errors
    ///
    /// Returns `AppError::SessionClosed` when the executor has stopped.
    pub async fn auto_fight_status(&self) -> Result<AutoFightStatus, AppError> {
        self.request(Request::AutoFightStatus).await
    }

    pub(crate) async fn auto_plan(&self) -> Result<TurnPlan, AppError> {
        self.request(Request::AutoPlan).await
    }

    pub(crate) async fn auto_attack(&self, attacker: String) -> Result<Option<StopReason>, AppError> {
        self.request(|reply| Request::AutoAttack { attacker, reply }).await
    }

    pub(crate) async fn auto_advance(&self) -> Result<Option<StopReason>, AppError> {
        self.request(Request::AutoAdvance).await
    }

    pub(crate) async fn auto_finished(&self, reason: StopReason) -> Result<(), AppError> {
        self.tx
            .send(Request::AutoFinished(reason))
            .await
            .map_err(|_| AppError::SessionClosed)
    }
}

/// Owns the session and applies requests to it.
pub struct SessionExecutor {
    session: Session,
    table: CommandTable,
    hub: Hub,
    pacing: Pacing,
    inbox: mpsc::Receiver<Request>,
    /// Used to hand the auto-fight task a handle without keeping the inbox
    /// open on our own account.
    me: mpsc::WeakSender<Request>,
    auto_fight: AutoFightStatus,
    last_output: Payload,
}

impl SessionExecutor {
    /// Spawns the executor task. It stops once every handle is dropped.
    #[must_use]
    pub fn spawn(session: Session, hub: Hub, pacing: Pacing) -> (SessionHandle, JoinHandle<()>) {
        let (tx, inbox) = mpsc::channel(INBOX_CAPACITY);
        let last_output: Payload = render(&session.world, &Outcome::Refresh)
            .unwrap_or_default()
            .into();
        let executor = Self {
            session,
            table: CommandTable::standard(),
            hub,
            pacing,
            inbox,
            me: tx.downgrade(),
            auto_fight: AutoFightStatus::default(),
            last_output,
        };
        let task = tokio::spawn(executor.run());
        (SessionHandle { tx }, task)
    }

    async fn run(mut self) {
        info!("session executor started");
        while let Some(request) = self.inbox.recv().await {
            self.handle(request);
        }
        info!("session executor stopped");
    }

    fn handle(&mut self, request: Request) {
        match request {
            Request::Command {
                line,
                origin,
                reply,
            } => {
                let outcome = self.command(&line, origin);
                let _ = reply.send(outcome);
            }
            Request::WebAttack {
                attacker,
                target,
                attack,
                reply,
            } => {
                let result = self.web_attack(&attacker, &target, attack);
                if let Err(e) = &result {
                    warn!(%attacker, %target, attack, error = %e, "web attack rejected");
                }
                let _ = reply.send(result);
            }
            Request::Snapshot(reply) => {
                let _ = reply.send(Arc::clone(&self.last_output));
            }
            Request::Join(conn) => {
                let id = conn.id;
                self.hub.register(conn);
                self.hub.send_to(id, Arc::clone(&self.last_output));
            }
            Request::Inspect(f) => f(&self.session),
            Request::AutoFightStatus(reply) => {
                let _ = reply.send(self.auto_fight);
            }
            Request::AutoPlan(reply) => {
                let _ = reply.send(autofight::plan_turn(&self.session.world));
            }
            Request::AutoAttack { attacker, reply } => {
                let stop = self.auto_attack(&attacker);
                let _ = reply.send(stop);
            }
            Request::AutoAdvance(reply) => {
                let stop = autofight::advance(&mut self.session.world);
                self.publish(&Outcome::Refresh);
                let _ = reply.send(stop);
            }
            Request::AutoFinished(reason) => {
                self.auto_fight.running = false;
                self.publish(&Outcome::Message(format!("Auto-fight over: {reason}.")));
            }
        }
    }

    fn command(&mut self, line: &CommandLine, origin: Origin) -> Outcome {
        let outcome = self.table.execute(&mut self.session, line, origin);
        let outcome = match outcome {
            Outcome::StartAutoFight => self.start_auto_fight(),
            Outcome::Listing(text) if self.is_status(line) => {
                let mut text = text;
                let state = if self.auto_fight.running { "running" } else { "idle" };
                let _ = write!(text, "\nauto-fight: {state}");
                Outcome::Listing(text)
            }
            other => other,
        };
        self.publish(&outcome);
        outcome
    }

    fn is_status(&self, line: &CommandLine) -> bool {
        self.table.get(&line.name).is_some_and(|spec| spec.name == "stat")
    }

    fn start_auto_fight(&mut self) -> Outcome {
        if self.auto_fight.running {
            warn!("auto-fight already running, ignoring request");
            return Outcome::Unchanged;
        }
        let Some(tx) = self.me.upgrade() else {
            return Outcome::Unchanged;
        };
        self.auto_fight.running = true;
        self.auto_fight.runs_started += 1;
        info!(run = self.auto_fight.runs_started, "auto-fight started");
        tokio::spawn(scheduler::run(SessionHandle { tx }, self.pacing));
        Outcome::StartAutoFight
    }

    #[instrument(skip(self))]
    fn web_attack(&mut self, attacker: &str, target: &str, attack: usize) -> Result<(), DomainError> {
        let world = &self.session.world;
        let current = world
            .turns
            .current()
            .ok_or_else(|| DomainError::Validation("no combat in progress".to_owned()))?;
        let character = world
            .roster
            .find(attacker)
            .ok_or_else(|| DomainError::EntityNotFound(attacker.to_owned()))?;
        if character.name() != current.name {
            return Err(DomainError::Validation(format!(
                "it is {}'s turn, not {}'s",
                current.name,
                character.name()
            )));
        }
        let (world, oracle, clock) = self.session.parts();
        let report = combat::attack(world, oracle, clock, attacker, attack, target, RollMode::Normal)?;
        self.publish(&Outcome::Battle {
            narration: report.to_string(),
            attacker: report.attacker_key,
            target: report.target_key,
        });
        Ok(())
    }

    fn auto_attack(&mut self, attacker: &str) -> Option<StopReason> {
        let (world, oracle, clock) = self.session.parts();
        match autofight::auto_attack(world, oracle, clock, attacker) {
            Ok(AutoAttack::Attacked(report)) => self.publish(&Outcome::Battle {
                narration: report.to_string(),
                attacker: report.attacker_key,
                target: report.target_key,
            }),
            Ok(other) => self.publish(&Outcome::Message(other.narration())),
            Err(e) => warn!(%attacker, error = %e, "auto-fight attack failed"),
        }
        autofight::stop_reason(&self.session.world)
    }

    fn publish(&mut self, outcome: &Outcome) {
        if let Some(html) = render(&self.session.world, outcome) {
            self.last_output = html.into();
            self.hub.broadcast(Arc::clone(&self.last_output));
        }
    }
}
